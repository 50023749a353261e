//! Quality gate evaluation.
//!
//! Every candidate a strategy proposes is measured here before the pipeline
//! decides whether to accept it. The score is a 0–100 sum of five bucketed
//! metrics; each stage then applies its own threshold and hard limits.
//!
//! # Example
//!
//! ```rust
//! use sift_core::{Candidate, Document, StageKind, evaluate, generate_report};
//!
//! let doc = Document::parse("<html><body><article><p>Short.</p></article></body></html>", None).unwrap();
//! let article = doc.select("article").unwrap()[0];
//! let result = evaluate(Some(Candidate::node(doc.tree(), article)), StageKind::Semantic);
//! assert!(!result.passed);
//! println!("{}", generate_report(&result));
//! ```

use serde::Serialize;
use std::fmt;

use crate::dom_tree::{DomTree, NodeId};

/// The extraction stages, in the order the pipeline tries them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    SiteSpecific,
    Semantic,
    #[serde(rename = "readability")]
    ReadabilityStyle,
    Heuristic,
}

impl StageKind {
    /// Every stage in pipeline order
    pub const ALL: [StageKind; 4] =
        [StageKind::SiteSpecific, StageKind::Semantic, StageKind::ReadabilityStyle, StageKind::Heuristic];

    /// Stable machine-readable identifier
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::SiteSpecific => "site-specific",
            StageKind::Semantic => "semantic",
            StageKind::ReadabilityStyle => "readability",
            StageKind::Heuristic => "heuristic",
        }
    }

    /// Thresholds and hard limits applied by this stage's gate
    pub fn gate_policy(self) -> Option<GatePolicy> {
        match self {
            StageKind::SiteSpecific | StageKind::Semantic => Some(GatePolicy::STRICT),
            StageKind::ReadabilityStyle => Some(GatePolicy::LENIENT),
            StageKind::Heuristic => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass requirements for a gated stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatePolicy {
    /// Human-readable policy name
    pub name: &'static str,
    /// Minimum total score
    pub min_score: u32,
    /// Minimum character count
    pub min_chars: usize,
    /// Minimum paragraph count
    pub min_paragraphs: usize,
    /// Maximum link density (0.0 to 1.0)
    pub max_link_density: f64,
}

impl GatePolicy {
    pub const STRICT: GatePolicy =
        GatePolicy { name: "strict", min_score: 60, min_chars: 500, min_paragraphs: 3, max_link_density: 0.4 };

    pub const LENIENT: GatePolicy =
        GatePolicy { name: "lenient", min_score: 40, min_chars: 250, min_paragraphs: 1, max_link_density: 0.5 };
}

/// Something a strategy proposes as the main content
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    /// An element inside a tree
    Node { tree: &'a DomTree, id: NodeId },
    /// Plain text produced by a strategy that does not return nodes
    Text(&'a str),
}

impl<'a> Candidate<'a> {
    pub fn node(tree: &'a DomTree, id: NodeId) -> Self {
        Candidate::Node { tree, id }
    }

    pub fn text(text: &'a str) -> Self {
        Candidate::Text(text)
    }
}

/// Measurements taken from a candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub char_count: usize,
    pub paragraph_count: usize,
    /// Link text over total text, 0.0 to 1.0
    pub link_density: f64,
    pub avg_paragraph_length: f64,
    pub heading_count: usize,
    /// Text length over serialized markup length, 0.0 to 1.0
    pub signal_to_noise: f64,
    /// 0 to 15
    pub structure_score: u32,
}

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const SEMANTIC_CONTAINERS: &[&str] = &["article", "main", "section"];
const RICH_BLOCKS: &[&str] = &["ul", "ol", "dl", "blockquote", "pre", "figure", "table"];

impl QualityMetrics {
    /// Measure an element and its light-tree descendants
    pub fn from_node(tree: &DomTree, id: NodeId) -> Self {
        let text = tree.normalized_text(id);
        let char_count = text.chars().count();

        let mut nodes = vec![id];
        nodes.extend(tree.descendants(id));
        let tags: Vec<&str> = nodes.iter().filter_map(|n| tree.tag_name(*n)).collect();

        let paragraph_lengths: Vec<usize> = nodes
            .iter()
            .filter(|n| tree.tag_name(**n) == Some("p"))
            .map(|p| tree.normalized_text(*p).chars().count())
            .filter(|len| *len > 0)
            .collect();
        let paragraph_count = paragraph_lengths.len();
        let avg_paragraph_length = if paragraph_count == 0 {
            0.0
        } else {
            paragraph_lengths.iter().sum::<usize>() as f64 / paragraph_count as f64
        };

        let heading_count = tags.iter().filter(|t| HEADING_TAGS.contains(*t)).count();
        let has_container = tags.iter().any(|t| SEMANTIC_CONTAINERS.contains(t));
        let has_rich_block = tags.iter().any(|t| RICH_BLOCKS.contains(t));

        let html_length = tree.outer_html(id).chars().count();
        let signal_to_noise = if html_length == 0 { 0.0 } else { (char_count as f64 / html_length as f64).min(1.0) };

        Self {
            char_count,
            paragraph_count,
            link_density: tree.link_density(id),
            avg_paragraph_length,
            heading_count,
            signal_to_noise,
            structure_score: structure_points(heading_count > 0, has_container, has_rich_block),
        }
    }

    /// Measure extracted plain text.
    ///
    /// Lines are paragraphs, except Markdown-style `#` headings which are
    /// counted as headings. Plain text has no markup, so link density is 0
    /// and the signal-to-noise ratio is 1.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let heading_count = lines.iter().filter(|l| l.starts_with('#')).count();
        let paragraph_lengths: Vec<usize> = lines
            .iter()
            .filter(|l| !l.starts_with('#'))
            .map(|l| l.chars().count())
            .collect();
        let paragraph_count = paragraph_lengths.len();
        let char_count = lines.iter().map(|l| l.chars().count()).sum();

        Self {
            char_count,
            paragraph_count,
            link_density: 0.0,
            avg_paragraph_length: if paragraph_count == 0 {
                0.0
            } else {
                paragraph_lengths.iter().sum::<usize>() as f64 / paragraph_count as f64
            },
            heading_count,
            signal_to_noise: if char_count == 0 { 0.0 } else { 1.0 },
            structure_score: structure_points(heading_count > 0, false, false),
        }
    }

    /// Total 0–100 score across the five weighted metrics
    pub fn score(&self) -> u32 {
        char_points(self.char_count)
            + paragraph_points(self.paragraph_count)
            + link_density_points(self.link_density)
            + signal_to_noise_points(self.signal_to_noise)
            + self.structure_score.min(15)
    }
}

fn structure_points(has_heading: bool, has_container: bool, has_rich_block: bool) -> u32 {
    [has_heading, has_container, has_rich_block]
        .iter()
        .filter(|present| **present)
        .count() as u32
        * 5
}

/// 0–30
fn char_points(chars: usize) -> u32 {
    match chars {
        0..300 => 0,
        300..1000 => 15,
        1000..5000 => 25,
        _ => 30,
    }
}

/// 0–20
fn paragraph_points(paragraphs: usize) -> u32 {
    match paragraphs {
        0 => 0,
        1..3 => 10,
        3..5 => 15,
        _ => 20,
    }
}

/// 0–20, falling linearly from 20 below 10% to 0 at 60%
fn link_density_points(density: f64) -> u32 {
    let percent = (density.clamp(0.0, 1.0) * 100.0).round() as u32;
    match percent {
        0..10 => 20,
        60.. => 0,
        _ => (60 - percent) * 20 / 50,
    }
}

/// 0–15
fn signal_to_noise_points(ratio: f64) -> u32 {
    if ratio > 0.5 {
        15
    } else if ratio > 0.3 {
        10
    } else if ratio > 0.1 {
        5
    } else {
        0
    }
}

/// Verdict of one gate evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityGateResult {
    pub stage: StageKind,
    pub passed: bool,
    /// 0 to 100
    pub score: u32,
    pub failure_reasons: Vec<String>,
    pub metrics: QualityMetrics,
}

/// Evaluate a candidate against the gate of `stage`.
///
/// A missing candidate always fails with a score of 0. The heuristic stage
/// has no gate and always passes; its score is still computed for reporting.
pub fn evaluate(candidate: Option<Candidate<'_>>, stage: StageKind) -> QualityGateResult {
    let Some(candidate) = candidate else {
        return QualityGateResult {
            stage,
            passed: false,
            score: 0,
            failure_reasons: vec!["no content extracted".to_string()],
            metrics: QualityMetrics::default(),
        };
    };

    let metrics = match candidate {
        Candidate::Node { tree, id } => QualityMetrics::from_node(tree, id),
        Candidate::Text(text) => QualityMetrics::from_text(text),
    };
    let score = metrics.score().min(100);

    let Some(policy) = stage.gate_policy() else {
        return QualityGateResult { stage, passed: true, score, failure_reasons: Vec::new(), metrics };
    };

    let mut reasons = Vec::new();
    if score < policy.min_score {
        reasons.push(format!("quality score {} below {} threshold {}", score, policy.name, policy.min_score));
    }
    if metrics.char_count < policy.min_chars {
        reasons.push(format!("insufficient content: {} < {} characters", metrics.char_count, policy.min_chars));
    }
    if metrics.paragraph_count < policy.min_paragraphs {
        reasons.push(format!(
            "insufficient paragraphs: {} < {}",
            metrics.paragraph_count, policy.min_paragraphs
        ));
    }
    if metrics.link_density > policy.max_link_density {
        reasons.push(format!(
            "link density {:.0}% exceeds {:.0}% limit",
            metrics.link_density * 100.0,
            policy.max_link_density * 100.0
        ));
    }

    QualityGateResult { stage, passed: reasons.is_empty(), score, failure_reasons: reasons, metrics }
}

/// Render a gate result as a human-readable, deterministic report
pub fn generate_report(result: &QualityGateResult) -> String {
    let m = &result.metrics;
    let mut report = format!(
        "Quality report [{}]: {} (score {}/100)\n",
        result.stage,
        if result.passed { "PASSED" } else { "FAILED" },
        result.score
    );
    report.push_str(&format!(
        "  characters:      {} ({} pts)\n",
        m.char_count,
        char_points(m.char_count)
    ));
    report.push_str(&format!(
        "  paragraphs:      {} ({} pts), avg length {:.1}\n",
        m.paragraph_count,
        paragraph_points(m.paragraph_count),
        m.avg_paragraph_length
    ));
    report.push_str(&format!(
        "  link density:    {:.1}% ({} pts)\n",
        m.link_density * 100.0,
        link_density_points(m.link_density)
    ));
    report.push_str(&format!(
        "  signal/noise:    {:.1}% ({} pts)\n",
        m.signal_to_noise * 100.0,
        signal_to_noise_points(m.signal_to_noise)
    ));
    report.push_str(&format!(
        "  structure:       {} pts, {} heading(s)\n",
        m.structure_score, m.heading_count
    ));
    for reason in &result.failure_reasons {
        report.push_str(&format!("  - {}\n", reason));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use rstest::rstest;

    fn article(paragraphs: usize, words_per_paragraph: usize) -> Document {
        let sentence = "Measured prose keeps the reader moving, ";
        let body: String = (0..paragraphs)
            .map(|_| format!("<p>{}</p>", sentence.repeat(words_per_paragraph / 6 + 1)))
            .collect();
        let html = format!("<html><body><article><h1>Title</h1>{body}</article></body></html>");
        Document::parse(&html, None).unwrap()
    }

    #[test]
    fn test_missing_candidate_fails_with_zero() {
        for stage in StageKind::ALL {
            let result = evaluate(None, stage);
            assert!(!result.passed);
            assert_eq!(result.score, 0);
            assert_eq!(result.failure_reasons, vec!["no content extracted".to_string()]);
        }
    }

    #[test]
    fn test_rich_article_passes_strict_gate() {
        let doc = article(5, 40);
        let node = doc.select("article").unwrap()[0];
        let result = evaluate(Some(Candidate::node(doc.tree(), node)), StageKind::Semantic);

        assert!(result.passed, "{:?}", result.failure_reasons);
        assert!(result.score >= 60);
        assert_eq!(result.metrics.paragraph_count, 5);
        assert_eq!(result.metrics.heading_count, 1);
        assert_eq!(result.metrics.structure_score, 10);
    }

    #[test]
    fn test_single_paragraph_reasons() {
        let doc = article(1, 200);
        let node = doc.select("article").unwrap()[0];
        let result = evaluate(Some(Candidate::node(doc.tree(), node)), StageKind::Semantic);

        assert!(!result.passed);
        assert!(result.failure_reasons.contains(&"insufficient paragraphs: 1 < 3".to_string()));
    }

    #[test]
    fn test_link_density_reason() {
        let html = r##"<html><body><div>
            <p>Some words here that are not links at all, and more.</p>
            <p><a href="#">A long link label that dominates the text</a></p>
            <p><a href="#">Another long link label that dominates</a></p>
            </div></body></html>"##;
        let doc = Document::parse(html, None).unwrap();
        let node = doc.select("div").unwrap()[0];
        let result = evaluate(Some(Candidate::node(doc.tree(), node)), StageKind::ReadabilityStyle);

        assert!(result.failure_reasons.iter().any(|r| r.starts_with("link density") && r.ends_with("50% limit")));
    }

    #[test]
    fn test_heuristic_always_passes() {
        let doc = Document::parse("<html><body><div>x</div></body></html>", None).unwrap();
        let node = doc.select("div").unwrap()[0];
        let result = evaluate(Some(Candidate::node(doc.tree(), node)), StageKind::Heuristic);
        assert!(result.passed);
        assert!(result.failure_reasons.is_empty());
    }

    #[test]
    fn test_text_candidate_metrics() {
        let text = "## Comments\nFirst line of prose\nSecond line of prose";
        let metrics = QualityMetrics::from_text(text);
        assert_eq!(metrics.heading_count, 1);
        assert_eq!(metrics.paragraph_count, 2);
        assert_eq!(metrics.link_density, 0.0);
        assert_eq!(metrics.signal_to_noise, 1.0);
        assert_eq!(metrics.structure_score, 5);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(299, 0)]
    #[case(300, 15)]
    #[case(999, 15)]
    #[case(1000, 25)]
    #[case(4999, 25)]
    #[case(5000, 30)]
    fn test_char_buckets(#[case] chars: usize, #[case] points: u32) {
        assert_eq!(char_points(chars), points);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 10)]
    #[case(3, 15)]
    #[case(5, 20)]
    #[case(12, 20)]
    fn test_paragraph_buckets(#[case] paragraphs: usize, #[case] points: u32) {
        assert_eq!(paragraph_points(paragraphs), points);
    }

    #[rstest]
    #[case(0.0, 20)]
    #[case(0.09, 20)]
    #[case(0.1, 20)]
    #[case(0.35, 10)]
    #[case(0.45, 6)]
    #[case(0.59, 0)]
    #[case(0.6, 0)]
    #[case(1.0, 0)]
    fn test_link_density_buckets(#[case] density: f64, #[case] points: u32) {
        assert_eq!(link_density_points(density), points);
    }

    #[test]
    fn test_score_never_exceeds_100() {
        let metrics = QualityMetrics {
            char_count: 100_000,
            paragraph_count: 100,
            link_density: 0.0,
            avg_paragraph_length: 1000.0,
            heading_count: 10,
            signal_to_noise: 1.0,
            structure_score: 40,
        };
        assert_eq!(metrics.score(), 100);
    }

    #[test]
    fn test_report_is_deterministic() {
        let doc = article(3, 30);
        let node = doc.select("article").unwrap()[0];
        let result = evaluate(Some(Candidate::node(doc.tree(), node)), StageKind::ReadabilityStyle);
        let report = generate_report(&result);
        assert_eq!(report, generate_report(&result));
        assert!(report.starts_with("Quality report [readability]"));
        assert!(report.contains("paragraphs:      3"));
    }
}
