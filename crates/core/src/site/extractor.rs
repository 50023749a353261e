use regex::Regex;
use tracing::trace;

use super::noise::{NoiseFilter, content_quality, dedupe_adjacent};
use super::{ExtractionMetadata, ExtractionResult, SiteExtractor, SiteProfile};
use crate::Document;
use crate::dom_tree::{BLOCK_TAGS, DomTree, NodeData, NodeId, collapse_whitespace};
use crate::selector::Selector;
use crate::{Result, SiftError};

/// Minimum characters before a secondary block is appended
const MIN_SECONDARY_CHARS: usize = 50;
/// Minimum confidence for a result to be returned
const MIN_QUALITY: u32 = 60;
/// Minimum characters for a result to be returned
const MIN_CONTENT_CHARS: usize = 100;

/// A [`SiteExtractor`] driven by a [`SiteProfile`]
#[derive(Debug, Clone)]
pub struct ProfileExtractor {
    profile: SiteProfile,
    url_patterns: Vec<Regex>,
    selectors: Vec<Selector>,
    noise: NoiseFilter,
}

/// Lines gathered from one anchor kind
#[derive(Debug, Default)]
struct Collected {
    lines: Vec<String>,
    shadow_depth: usize,
}

impl ProfileExtractor {
    /// Compile a profile's patterns and selectors
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::ConfigError`] or [`SiftError::InvalidSelector`]
    /// if the profile holds an invalid regex or selector.
    pub fn new(profile: SiteProfile) -> Result<Self> {
        let url_patterns = profile
            .url_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| SiftError::ConfigError(format!("invalid url pattern {p}: {e}"))))
            .collect::<Result<Vec<_>>>()?;
        let selectors = profile
            .content_selectors
            .iter()
            .map(|s| Selector::parse(s))
            .collect::<Result<Vec<_>>>()?;
        let noise = NoiseFilter::new(&profile.noise_patterns)?;

        Ok(Self { profile, url_patterns, selectors, noise })
    }

    /// The built-in Reddit extractor
    pub fn reddit() -> Result<Self> {
        Self::new(SiteProfile::reddit())
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Anchor elements of the primary kind, after checking the source URL
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::StrategyPrecondition`] when the source does not
    /// match or no anchor is present.
    pub fn check_preconditions(&self, doc: &Document) -> Result<Vec<NodeId>> {
        let source = doc
            .source()
            .ok_or_else(|| SiftError::StrategyPrecondition(format!("{}: document has no source", self.profile.name)))?;
        if !self.url_patterns.iter().any(|p| p.is_match(source)) {
            return Err(SiftError::StrategyPrecondition(format!("{}: {source} does not match", self.profile.name)));
        }

        let anchors = find_anchors(doc.tree(), &self.profile.anchors);
        if anchors.is_empty() {
            return Err(SiftError::StrategyPrecondition(format!("{}: no anchor element", self.profile.name)));
        }
        Ok(anchors)
    }

    /// Shadow traversal first, then a selector scan of the light tree, per anchor
    fn collect(&self, tree: &DomTree, anchors: &[NodeId]) -> Collected {
        let mut collected = Collected::default();
        for &anchor in anchors {
            let shadow_lines = tree.shadow_root(anchor).and_then(|_| {
                let mut walker = LineWalker::new(tree, self.profile.max_shadow_depth);
                walker.walk(anchor, 0, &[]);
                let deepest = walker.deepest;
                let lines = walker.finish();
                (!lines.is_empty()).then_some((lines, deepest))
            });

            match shadow_lines {
                Some((lines, deepest)) => {
                    collected.shadow_depth = collected.shadow_depth.max(deepest);
                    collected.lines.extend(lines);
                }
                None => collected.lines.extend(self.scan_light_tree(tree, anchor)),
            }
        }
        collected
    }

    /// Text of the first content selector that matches inside `anchor`
    fn scan_light_tree(&self, tree: &DomTree, anchor: NodeId) -> Vec<String> {
        self.selectors
            .iter()
            .map(|selector| {
                selector
                    .select(tree, anchor)
                    .into_iter()
                    .flat_map(|id| {
                        let mut walker = LineWalker::new(tree, 0);
                        walker.walk(id, 0, &[]);
                        walker.finish()
                    })
                    .collect::<Vec<_>>()
            })
            .find(|lines| !lines.is_empty())
            .unwrap_or_default()
    }
}

impl SiteExtractor for ProfileExtractor {
    fn name(&self) -> &str {
        &self.profile.name
    }

    fn extract(&self, doc: &Document) -> Option<ExtractionResult> {
        let anchors = match self.check_preconditions(doc) {
            Ok(anchors) => anchors,
            Err(e) => {
                trace!(error = %e, "site extractor skipped");
                return None;
            }
        };
        let tree = doc.tree();

        let primary = self.collect(tree, &anchors);
        let secondary_anchors = find_anchors(tree, &self.profile.secondary_anchors);
        let secondary = self.collect(tree, &secondary_anchors);

        let raw_chars = char_total(&primary.lines) + char_total(&secondary.lines);
        let primary_lines = dedupe_adjacent(self.noise.filter(primary.lines));
        let secondary_lines = dedupe_adjacent(self.noise.filter(secondary.lines));

        let mut content = primary_lines.join("\n");
        let secondary_text = secondary_lines.join("\n");
        if secondary_text.chars().count() >= MIN_SECONDARY_CHARS {
            content.push_str(&format!("\n\n## {}\n\n{}", self.profile.secondary_heading, secondary_text));
        }

        let kept_chars = char_total(&primary_lines) + char_total(&secondary_lines);
        let removed_ratio =
            if raw_chars == 0 { 0.0 } else { raw_chars.saturating_sub(kept_chars) as f64 / raw_chars as f64 };
        let quality_score = content_quality(&content, removed_ratio);

        trace!(
            strategy = %self.profile.name,
            quality_score,
            removed_ratio,
            chars = content.chars().count(),
            "site extraction finished"
        );

        if quality_score < MIN_QUALITY || content.chars().count() < MIN_CONTENT_CHARS {
            return None;
        }

        Some(ExtractionResult {
            content,
            metadata: ExtractionMetadata {
                strategy: self.profile.name.clone(),
                shadow_depth: primary.shadow_depth.max(secondary.shadow_depth),
                noise_filtered: kept_chars < raw_chars,
                quality_score,
            },
        })
    }
}

fn find_anchors(tree: &DomTree, tags: &[String]) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|id| tree.tag_name(*id).is_some_and(|tag| tags.iter().any(|t| t == tag)))
        .collect()
}

fn char_total(lines: &[String]) -> usize {
    lines.iter().map(|l| l.chars().count()).sum()
}

/// Lays out text as block-level lines, entering shadow roots and projecting slots
struct LineWalker<'a> {
    tree: &'a DomTree,
    max_depth: usize,
    deepest: usize,
    lines: Vec<String>,
    current: String,
}

impl<'a> LineWalker<'a> {
    fn new(tree: &'a DomTree, max_depth: usize) -> Self {
        Self { tree, max_depth, deepest: 0, lines: Vec::new(), current: String::new() }
    }

    fn flush(&mut self) {
        let line = collapse_whitespace(&self.current);
        if !line.is_empty() {
            self.lines.push(line);
        }
        self.current.clear();
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.lines
    }

    /// Walk `id` at shadow `depth`. `hosts` is the chain of shadow hosts
    /// whose trees enclose `id`, innermost last.
    fn walk(&mut self, id: NodeId, depth: usize, hosts: &[NodeId]) {
        let tree = self.tree;
        let (tag, is_block) = match &tree.node(id).data {
            NodeData::Text(text) => {
                self.current.push_str(text);
                return;
            }
            NodeData::ShadowRoot { .. } => (None, false),
            NodeData::Element { tag, .. } => (Some(tag.as_str()), BLOCK_TAGS.contains(&tag.as_str()) || tag == "br"),
        };

        if is_block {
            self.flush();
        }

        if tag == Some("slot")
            && let Some((&host, outer)) = hosts.split_last()
        {
            let assigned = assigned_nodes(tree, host, tree.attr(id, "name"));
            if assigned.is_empty() {
                self.walk_children(id, depth, hosts);
            } else {
                for node in assigned {
                    self.walk(node, depth - 1, outer);
                }
            }
        } else if let Some(shadow) = tree.shadow_root(id)
            && depth < self.max_depth
        {
            self.deepest = self.deepest.max(depth + 1);
            let mut inner = hosts.to_vec();
            inner.push(id);
            self.walk_children(shadow, depth + 1, &inner);
        } else {
            self.walk_children(id, depth, hosts);
        }

        if is_block {
            self.flush();
        }
    }

    fn walk_children(&mut self, id: NodeId, depth: usize, hosts: &[NodeId]) {
        for &child in self.tree.children(id) {
            self.walk(child, depth, hosts);
        }
    }
}

/// Light children of `host` rendered by a slot with the given name
fn assigned_nodes(tree: &DomTree, host: NodeId, slot_name: Option<&str>) -> Vec<NodeId> {
    tree.children(host)
        .iter()
        .copied()
        .filter(|child| {
            let assigned_to = tree.attr(*child, "slot").filter(|s| !s.is_empty());
            match slot_name.filter(|s| !s.is_empty()) {
                Some(name) => assigned_to == Some(name),
                None => assigned_to.is_none(),
            }
        })
        .collect()
}
