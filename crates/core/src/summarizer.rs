//! Readability-style summarization.
//!
//! The pipeline's third stage delegates to a [`Summarizer`]. The default
//! [`ReadabilitySummarizer`] scores paragraph-bearing containers, lets each
//! candidate lend part of its score to its parent and grandparent, and
//! returns the best-scoring container along with the document title.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::Document;
use crate::dom_tree::NodeId;
use crate::scoring::ScoringEngine;

/// Main content located by a summarizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// The element holding the main content
    pub node: NodeId,
    /// Title discovered alongside the content
    pub title: Option<String>,
}

/// Locates main content in a parsed document.
///
/// Implementations must be pure functions of the document so a single
/// instance can serve concurrent pipeline invocations.
pub trait Summarizer: Send + Sync {
    /// Returns `None` when the document has nothing article-like.
    fn summarize(&self, doc: &Document) -> Option<Summary>;
}

/// Configuration for the default summarizer
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Minimum score threshold for the top candidate
    pub min_score_threshold: f64,
    /// Minimum text length for non-sectioning candidates
    pub min_candidate_chars: usize,
    /// Maximum elements to consider
    pub max_elements: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self { min_score_threshold: 10.0, min_candidate_chars: 50, max_elements: 1000 }
    }
}

/// Tags that are considered potential content containers
const CANDIDATE_TAGS: &[&str] = &["div", "article", "section", "main", "p", "td", "pre", "blockquote"];

/// Candidate scoring with parent and grandparent score propagation
#[derive(Debug, Clone, Default)]
pub struct ReadabilitySummarizer {
    config: SummarizerConfig,
    engine: Option<ScoringEngine>,
}

impl ReadabilitySummarizer {
    pub fn new(config: SummarizerConfig) -> Self {
        Self { config, engine: None }
    }

    /// Use a custom scoring engine instead of the shared default
    pub fn with_engine(mut self, engine: ScoringEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    fn engine(&self) -> &ScoringEngine {
        self.engine.as_ref().unwrap_or_else(|| ScoringEngine::global())
    }

    /// Score every candidate container in the light tree.
    ///
    /// Parents receive half of a candidate's score and grandparents a third,
    /// on top of their own score.
    fn score_candidates(&self, doc: &Document) -> HashMap<NodeId, f64> {
        let tree = doc.tree();
        let engine = self.engine();
        let max_elements = if self.config.max_elements == 0 { usize::MAX } else { self.config.max_elements };

        let candidates: Vec<NodeId> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|id| tree.tag_name(*id).is_some_and(|tag| CANDIDATE_TAGS.contains(&tag)))
            .filter(|id| {
                matches!(tree.tag_name(*id), Some("article" | "section" | "main"))
                    || tree.normalized_text(*id).chars().count() >= self.config.min_candidate_chars
            })
            .take(max_elements)
            .collect();

        let mut scores: HashMap<NodeId, f64> = HashMap::new();
        let own_score = |scores: &mut HashMap<NodeId, f64>, id: NodeId| {
            *scores.entry(id).or_insert_with(|| engine.score_node(tree, id).final_score)
        };

        for id in candidates {
            let score = own_score(&mut scores, id);
            let Some(parent) = tree.parent(id).filter(|p| tree.is_element(*p)) else {
                continue;
            };
            own_score(&mut scores, parent);
            *scores.entry(parent).or_default() += score / 2.0;

            if let Some(grandparent) = tree.parent(parent).filter(|g| tree.is_element(*g)) {
                own_score(&mut scores, grandparent);
                *scores.entry(grandparent).or_default() += score / 3.0;
            }
        }

        scores
    }
}

impl Summarizer for ReadabilitySummarizer {
    fn summarize(&self, doc: &Document) -> Option<Summary> {
        let tree = doc.tree();
        let scores = self.score_candidates(doc);

        let (node, score) = scores
            .into_iter()
            .filter(|(id, _)| !matches!(tree.tag_name(*id), Some("html" | "body")))
            .max_by(|a, b| compare_candidates(doc, *a, *b))?;

        if score < self.config.min_score_threshold {
            return None;
        }

        Some(Summary { node, title: doc.extract_title() })
    }
}

/// Order by score, then sectioning tags, then text length, then earlier position
fn compare_candidates(doc: &Document, a: (NodeId, f64), b: (NodeId, f64)) -> Ordering {
    let tree = doc.tree();
    a.1.partial_cmp(&b.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| candidate_priority(tree.tag_name(a.0)).cmp(&candidate_priority(tree.tag_name(b.0))))
        .then_with(|| {
            tree.normalized_text(a.0)
                .chars()
                .count()
                .cmp(&tree.normalized_text(b.0).chars().count())
        })
        .then_with(|| b.0.cmp(&a.0))
}

fn candidate_priority(tag_name: Option<&str>) -> u8 {
    match tag_name {
        Some("article" | "main" | "section") => 3,
        Some("div") => 2,
        _ => 1,
    }
}
