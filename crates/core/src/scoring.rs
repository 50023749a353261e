use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use crate::dom_tree::{BLOCK_TAGS, DomTree, NodeId};
use crate::{Result, SiftError};

/// Positive patterns that suggest an element contains main content
pub const POSITIVE_PATTERNS: &str =
    r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story|prose)";

/// Negative patterns that suggest an element does NOT contain main content
pub const NEGATIVE_PATTERNS: &str = r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|share|shoutbox|sidebar|skyscraper|social|sponsor|promo|widget|newsletter|subscribe|cookie|ad-break|agegate|pagination|pager|popup|(^|[-_])ads?($|[-_]))";

/// Tunable weights for the scoring engine
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Weight for positive class/ID patterns
    pub positive_weight: f64,
    /// Weight for negative class/ID patterns
    pub negative_weight: f64,
    /// Maximum content density score from character count
    pub max_char_density_score: f64,
    /// Maximum content density score from comma count
    pub max_comma_density_score: f64,
    /// Characters per point for content density scoring
    pub chars_per_point: usize,
    /// Bonus per direct paragraph child carrying real text
    pub paragraph_bonus: f64,
    /// Cap on the total paragraph bonus
    pub max_paragraph_bonus: f64,
    /// Points removed at a link density of 1.0
    pub link_density_penalty: f64,
    /// Minimum text length for an element to be considered a candidate
    pub min_candidate_chars: usize,
    /// Maximum depth below the scoring root that is still considered
    pub max_depth: usize,
    /// Block elements scoring below this are dropped by [`prune`]
    pub removal_threshold: f64,
    /// Regex matched against class and id tokens for a bonus
    pub positive_patterns: String,
    /// Regex matched against class and id tokens for a penalty
    pub negative_patterns: String,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            positive_weight: 25.0,
            negative_weight: -25.0,
            max_char_density_score: 3.0,
            max_comma_density_score: 3.0,
            chars_per_point: 100,
            paragraph_bonus: 2.0,
            max_paragraph_bonus: 10.0,
            link_density_penalty: 20.0,
            min_candidate_chars: 25,
            max_depth: 32,
            removal_threshold: -10.0,
            positive_patterns: POSITIVE_PATTERNS.to_string(),
            negative_patterns: NEGATIVE_PATTERNS.to_string(),
        }
    }
}

/// Result of scoring an element
#[derive(Debug, Clone)]
pub struct ScoreResult {
    /// The element's tag name
    pub tag_name: String,
    /// Base score from tag type
    pub base_score: f64,
    /// Weight adjustment from class/ID patterns
    pub class_weight: f64,
    /// Content density score
    pub content_density: f64,
    /// Bonus from direct paragraph children
    pub paragraph_bonus: f64,
    /// Link density (0.0 to 1.0)
    pub link_density: f64,
    /// Final calculated score
    pub final_score: f64,
}

/// The best element found below a scoring root
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub node: NodeId,
    pub score: f64,
}

/// Calculate the base score for an element based on its tag name
///
/// - ARTICLE: +10 (primary content container)
/// - SECTION, MAIN: +8
/// - DIV: +5 (generic container)
/// - TD, BLOCKQUOTE: +3
/// - FORM, ADDRESS, lists and list items: -3
/// - H1-H6, TH, HEADER, FOOTER, NAV, ASIDE: -5
pub fn base_tag_score(tag: &str) -> f64 {
    match tag {
        "article" => 10.0,
        "section" | "main" => 8.0,
        "div" => 5.0,
        "td" | "blockquote" => 3.0,
        "form" | "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" | "header" | "footer" | "nav" | "aside" => -5.0,
        _ => 0.0,
    }
}

/// Scores elements and isolates the most content-like region of a tree
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoreConfig,
    positive: Regex,
    negative: Regex,
}

static DEFAULT_ENGINE: LazyLock<ScoringEngine> = LazyLock::new(|| {
    let config = ScoreConfig::default();
    ScoringEngine {
        positive: Regex::new(&config.positive_patterns).expect("default positive patterns compile"),
        negative: Regex::new(&config.negative_patterns).expect("default negative patterns compile"),
        config,
    }
});

impl ScoringEngine {
    /// Build an engine from custom weights and keyword lists
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::ConfigError`] if a keyword pattern is not a valid regex.
    pub fn new(config: ScoreConfig) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| SiftError::ConfigError(format!("invalid keyword pattern: {e}")))
        };
        Ok(Self {
            positive: compile(&config.positive_patterns)?,
            negative: compile(&config.negative_patterns)?,
            config,
        })
    }

    /// Shared engine with the default configuration
    pub fn global() -> &'static ScoringEngine {
        &DEFAULT_ENGINE
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Calculate the class/ID weight adjustment for an element
    ///
    /// A positive match anywhere in the id or class list wins over a negative one.
    pub fn class_id_weight(&self, tree: &DomTree, id: NodeId) -> f64 {
        let tokens: Vec<&str> = tree.attr(id, "id").into_iter().chain(tree.classes(id)).collect();

        if tokens.iter().any(|t| self.positive.is_match(t)) {
            self.config.positive_weight
        } else if tokens.iter().any(|t| self.negative.is_match(t)) {
            self.config.negative_weight
        } else {
            0.0
        }
    }

    /// Score from text length and comma count
    pub fn content_density_score(&self, text: &str) -> f64 {
        let chars_per_point = self.config.chars_per_point.max(1);
        let char_score = ((text.chars().count() / chars_per_point) as f64).min(self.config.max_char_density_score);
        let comma_score = (text.matches(',').count() as f64).min(self.config.max_comma_density_score);
        char_score + comma_score
    }

    /// Bonus for direct `<p>` children holding at least `min_candidate_chars` of text
    pub fn paragraph_bonus(&self, tree: &DomTree, id: NodeId) -> f64 {
        let paragraphs = tree
            .element_children(id)
            .filter(|c| tree.tag_name(*c) == Some("p"))
            .filter(|p| tree.normalized_text(*p).chars().count() >= self.config.min_candidate_chars)
            .count();
        (paragraphs as f64 * self.config.paragraph_bonus).min(self.config.max_paragraph_bonus)
    }

    /// Calculate the full score of one element
    pub fn score_node(&self, tree: &DomTree, id: NodeId) -> ScoreResult {
        let tag_name = tree.tag_name(id).unwrap_or_default().to_string();
        let text = tree.normalized_text(id);

        let base_score = base_tag_score(&tag_name);
        let class_weight = self.class_id_weight(tree, id);
        let content_density = self.content_density_score(&text);
        let paragraph_bonus = self.paragraph_bonus(tree, id);
        let link_density = tree.link_density(id);

        let final_score = base_score + class_weight + content_density + paragraph_bonus
            - link_density * self.config.link_density_penalty;

        ScoreResult { tag_name, base_score, class_weight, content_density, paragraph_bonus, link_density, final_score }
    }

    /// Find the highest scoring element at or below `root`.
    ///
    /// Elements with too little text or nested too deeply are skipped. Ties
    /// keep the element that comes first in document order.
    pub fn find_best_candidate(&self, tree: &DomTree, root: NodeId) -> Option<ScoredCandidate> {
        let root_depth = tree.depth(root);
        let mut best: Option<ScoredCandidate> = None;

        for node in std::iter::once(root).chain(tree.descendants(root)) {
            if !tree.is_element(node) || tree.depth(node) - root_depth > self.config.max_depth {
                continue;
            }
            if tree.normalized_text(node).chars().count() < self.config.min_candidate_chars {
                continue;
            }

            let score = self.score_node(tree, node).final_score;
            if best.is_none_or(|b| score > b.score) {
                best = Some(ScoredCandidate { node, score });
            }
        }

        best
    }

    /// Copy the subtree at `root` into a new tree, dropping low-scoring blocks.
    ///
    /// Children are pruned before their parent is scored, so removals cascade
    /// from the leaves upward. Inline elements, text, and shadow roots are
    /// always kept, as is `root` itself. `tree` is never modified.
    pub fn prune(&self, tree: &DomTree, root: NodeId) -> DomTree {
        let mut out = DomTree::with_root_data(tree.node(root).data.clone());
        let out_root = out.root();
        tree.copy_shadow_into(root, &mut out, out_root);
        for child in tree.children(root) {
            self.prune_into(tree, *child, &mut out, out_root);
        }
        out
    }

    fn prune_into(&self, tree: &DomTree, id: NodeId, out: &mut DomTree, parent: NodeId) {
        let checkpoint = out.checkpoint();
        let copy = out.push_child(parent, tree.node(id).data.clone());
        tree.copy_shadow_into(id, out, copy);
        for child in tree.children(id) {
            self.prune_into(tree, *child, out, copy);
        }

        let Some(tag) = tree.tag_name(id) else {
            return;
        };
        if !BLOCK_TAGS.contains(&tag) {
            return;
        }

        let score = self.score_node(out, copy).final_score;
        if score < self.config.removal_threshold {
            trace!(tag, score, "pruned subtree");
            out.rollback(checkpoint);
        }
    }
}

/// Find the best candidate below `root` with the default engine
pub fn find_best_candidate(tree: &DomTree, root: NodeId) -> Option<ScoredCandidate> {
    ScoringEngine::global().find_best_candidate(tree, root)
}

/// Prune a copy of the subtree at `root` with the default engine
pub fn prune(tree: &DomTree, root: NodeId) -> DomTree {
    ScoringEngine::global().prune(tree, root)
}
