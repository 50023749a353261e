//! Staged extraction with quality gates.
//!
//! [`Pipeline`] tries each enabled [`StageKind`] in order: site-specific
//! extractors, semantic markup, a readability-style [`Summarizer`], and
//! finally heuristic scoring. Every candidate passes through
//! [`evaluate`](crate::quality::evaluate); the first one that passes its
//! gate and the configured quality floor wins. Heuristic scoring is the
//! safety net and is accepted unconditionally.
//!
//! # Example
//!
//! ```rust
//! use sift_core::{Document, PartialPipelineConfig, Pipeline, StageKind};
//!
//! let html = "<html><body><div><p>Only a little text lives here.</p></div></body></html>";
//! let doc = Document::parse(html, None).unwrap();
//!
//! let config = PartialPipelineConfig { enable_site_specific: Some(false), ..Default::default() };
//! let result = Pipeline::new().execute(&doc, config).unwrap();
//!
//! assert_eq!(result.stage, StageKind::Heuristic);
//! assert_eq!(result.fallbacks_used, vec!["semantic-gate-failed", "readability-gate-failed"]);
//! assert!(result.text_content.contains("Only a little text"));
//! ```

use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::debug;

use crate::Document;
use crate::dom_tree::{DomTree, NodeId, collapse_whitespace};
use crate::metrics::{PipelineMetric, SessionMetricsStore};
use crate::quality::{Candidate, QualityGateResult, StageKind, evaluate, generate_report};
use crate::scoring::{find_best_candidate, prune};
use crate::semantic::find_semantic_content;
use crate::site::{ExtractionMetadata, ProfileExtractor, SiteExtractor};
use crate::summarizer::{ReadabilitySummarizer, Summarizer};
use crate::{Result, SiftError};

/// Default time budget for one invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Configuration for one pipeline invocation.
///
/// # Example
///
/// ```rust
/// use sift_core::PipelineConfig;
/// use std::time::Duration;
///
/// let config = PipelineConfig::builder()
///     .minimum_quality_score(50)
///     .timeout(Duration::from_millis(250))
///     .debug(true)
///     .build();
/// assert!(config.enable_semantic);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Run registered site extractors (default: true).
    pub enable_site_specific: bool,

    /// Look for semantic content containers (default: true).
    pub enable_semantic: bool,

    /// Run the readability-style summarizer (default: true).
    pub enable_readability: bool,

    /// Fall back to heuristic scoring (default: true).
    pub enable_heuristic: bool,

    /// Floor a passing gate score must also reach, 0 to 100 (default: 0).
    pub minimum_quality_score: u32,

    /// Budget checked before each gated stage; zero disables it (default: 5000 ms).
    pub timeout: Duration,

    /// Log every stage decision through `tracing` (default: false).
    pub debug: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_site_specific: true,
            enable_semantic: true,
            enable_readability: true,
            enable_heuristic: true,
            minimum_quality_score: 0,
            timeout: DEFAULT_TIMEOUT,
            debug: false,
        }
    }
}

impl PipelineConfig {
    /// Creates a new builder for PipelineConfig.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Whether `stage` should run
    pub fn is_enabled(&self, stage: StageKind) -> bool {
        match stage {
            StageKind::SiteSpecific => self.enable_site_specific,
            StageKind::Semantic => self.enable_semantic,
            StageKind::ReadabilityStyle => self.enable_readability,
            StageKind::Heuristic => self.enable_heuristic,
        }
    }
}

/// Builder for PipelineConfig.
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    /// Enables or disables one stage.
    pub fn stage(mut self, stage: StageKind, enabled: bool) -> Self {
        match stage {
            StageKind::SiteSpecific => self.config.enable_site_specific = enabled,
            StageKind::Semantic => self.config.enable_semantic = enabled,
            StageKind::ReadabilityStyle => self.config.enable_readability = enabled,
            StageKind::Heuristic => self.config.enable_heuristic = enabled,
        }
        self
    }

    /// Sets the minimum quality score, capped at 100.
    pub fn minimum_quality_score(mut self, value: u32) -> Self {
        self.config.minimum_quality_score = value.min(100);
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, value: Duration) -> Self {
        self.config.timeout = value;
        self
    }

    /// Sets debug logging.
    pub fn debug(mut self, value: bool) -> Self {
        self.config.debug = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline settings where every field is optional.
///
/// Missing fields take their [`PipelineConfig::default`] value. This is the
/// shape accepted by [`Pipeline::execute`] and by JSON configuration:
///
/// ```rust
/// use sift_core::PartialPipelineConfig;
///
/// let partial = PartialPipelineConfig::from_json(r#"{"minimum_quality_score": 40, "timeout_ms": 0}"#).unwrap();
/// let config = partial.resolve();
/// assert_eq!(config.minimum_quality_score, 40);
/// assert!(config.timeout.is_zero());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialPipelineConfig {
    pub enable_site_specific: Option<bool>,
    pub enable_semantic: Option<bool>,
    pub enable_readability: Option<bool>,
    pub enable_heuristic: Option<bool>,
    pub minimum_quality_score: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub debug: Option<bool>,
}

impl PartialPipelineConfig {
    /// Parse from JSON
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::ConfigError`] for malformed JSON or unknown fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply the fields that are set on top of `base`
    pub fn merge_over(&self, base: &PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            enable_site_specific: self.enable_site_specific.unwrap_or(base.enable_site_specific),
            enable_semantic: self.enable_semantic.unwrap_or(base.enable_semantic),
            enable_readability: self.enable_readability.unwrap_or(base.enable_readability),
            enable_heuristic: self.enable_heuristic.unwrap_or(base.enable_heuristic),
            minimum_quality_score: self.minimum_quality_score.unwrap_or(base.minimum_quality_score).min(100),
            timeout: self.timeout_ms.map(Duration::from_millis).unwrap_or(base.timeout),
            debug: self.debug.unwrap_or(base.debug),
        }
    }

    /// Apply the fields that are set on top of the defaults
    pub fn resolve(&self) -> PipelineConfig {
        self.merge_over(&PipelineConfig::default())
    }
}

impl From<PartialPipelineConfig> for PipelineConfig {
    fn from(partial: PartialPipelineConfig) -> Self {
        partial.resolve()
    }
}

/// Provenance attached to every result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMetadata {
    /// Source identifier of the document
    pub source: Option<String>,
    pub title: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Details from the site extractor, when that stage won
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<ExtractionMetadata>,
}

/// Outcome of a successful invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    /// Serialized markup of the winning candidate, or text for site extractors
    pub content: String,
    /// Plain text of the winning candidate
    pub text_content: String,
    /// Stage that produced the content
    pub stage: StageKind,
    /// Gate score of the winning candidate, 0 to 100
    pub quality_score: u32,
    /// Human-readable report of the winning gate evaluation
    pub quality_report: String,
    /// One entry per rejected stage, in attempt order
    pub fallbacks_used: Vec<String>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Winning element in the input document, when the stage selected one
    pub node: Option<NodeId>,
    pub metadata: ResultMetadata,
}

pub(crate) fn serialize_millis<S: Serializer>(
    duration: &Duration, serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Content proposed by a stage, before the orchestrator decides on it
struct Proposal {
    content: String,
    text_content: String,
    node: Option<NodeId>,
    title: Option<String>,
    site: Option<ExtractionMetadata>,
    gate: QualityGateResult,
}

/// Runs the extraction stages in order until one is accepted.
///
/// A pipeline holds only immutable collaborators (plus an optional shared
/// metrics store), so one instance can serve concurrent invocations.
pub struct Pipeline {
    site_extractors: Vec<Box<dyn SiteExtractor>>,
    summarizer: Box<dyn Summarizer>,
    metrics: Option<Arc<SessionMetricsStore>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let extractors: Vec<&str> = self.site_extractors.iter().map(|e| e.name()).collect();
        f.debug_struct("Pipeline")
            .field("site_extractors", &extractors)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl Pipeline {
    /// A pipeline with the built-in site extractors and the default summarizer
    pub fn new() -> Self {
        let site_extractors = ProfileExtractor::reddit()
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn SiteExtractor>)
            .collect();
        Self { site_extractors, summarizer: Box::new(ReadabilitySummarizer::default()), metrics: None }
    }

    /// A pipeline with no site extractors
    pub fn generic() -> Self {
        Self { site_extractors: Vec::new(), ..Self::new() }
    }

    /// Replace the readability-style summarizer
    pub fn with_summarizer(mut self, summarizer: impl Summarizer + 'static) -> Self {
        self.summarizer = Box::new(summarizer);
        self
    }

    /// Register an additional site extractor, tried after those already present
    pub fn with_site_extractor(mut self, extractor: impl SiteExtractor + 'static) -> Self {
        self.site_extractors.push(Box::new(extractor));
        self
    }

    /// Record every successful result in `store`
    pub fn with_metrics(mut self, store: Arc<SessionMetricsStore>) -> Self {
        self.metrics = Some(store);
        self
    }

    pub fn metrics(&self) -> Option<&Arc<SessionMetricsStore>> {
        self.metrics.as_ref()
    }

    /// Extract the main content of `doc`, merging `config` over the defaults.
    ///
    /// # Errors
    ///
    /// - [`SiftError::NoContent`] if the document holds no text, or no enabled
    ///   stage produced content.
    /// - [`SiftError::Timeout`] if the time budget ran out before a gated stage.
    pub fn execute(&self, doc: &Document, config: PartialPipelineConfig) -> Result<PipelineResult> {
        self.execute_with_config(doc, &config.resolve())
    }

    /// Extract the main content of `doc` with a complete configuration.
    pub fn execute_with_config(&self, doc: &Document, config: &PipelineConfig) -> Result<PipelineResult> {
        let start = Instant::now();
        if !doc.has_text() {
            return Err(SiftError::NoContent);
        }

        let mut fallbacks_used = Vec::new();

        for stage in StageKind::ALL {
            let strategy = strategy_name(stage);
            if !config.is_enabled(stage) {
                if config.debug {
                    debug!(%stage, strategy, skipped = true, "stage disabled");
                }
                continue;
            }

            if stage != StageKind::Heuristic {
                check_timeout(start, config.timeout)?;
            }

            let proposal = self.propose(stage, doc)?;
            let gate = match &proposal {
                Some(p) => p.gate.clone(),
                None => evaluate(None, stage),
            };
            let accepted = stage == StageKind::Heuristic
                || (gate.passed && gate.score >= config.minimum_quality_score);

            if config.debug {
                debug!(
                    %stage,
                    strategy,
                    skipped = false,
                    passed = gate.passed,
                    score = gate.score,
                    reasons = ?gate.failure_reasons,
                    accepted,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "stage evaluated"
                );
            }

            match proposal {
                Some(proposal) if accepted => {
                    let result = self.finish(doc, stage, proposal, fallbacks_used, start);
                    if let Some(store) = &self.metrics {
                        store.record(PipelineMetric::from(&result));
                    }
                    return Ok(result);
                }
                _ => {
                    let reason = if gate.passed { "low-quality" } else { "gate-failed" };
                    fallbacks_used.push(format!("{stage}-{reason}"));
                }
            }
        }

        Err(SiftError::NoContent)
    }

    /// Run the strategy behind `stage` and gate its candidate
    fn propose(&self, stage: StageKind, doc: &Document) -> Result<Option<Proposal>> {
        let tree = doc.tree();
        let proposal = match stage {
            StageKind::SiteSpecific => self.site_extractors.iter().find_map(|extractor| {
                let extracted = extractor.extract(doc)?;
                if extracted.content.trim().is_empty() {
                    return None;
                }
                let gate = evaluate(Some(Candidate::text(&extracted.content)), stage);
                Some(Proposal {
                    text_content: extracted.content.clone(),
                    content: extracted.content,
                    node: None,
                    title: None,
                    site: Some(extracted.metadata),
                    gate,
                })
            }),
            StageKind::Semantic => {
                find_semantic_content(doc).map(|id| node_proposal(tree, id, None, stage))
            }
            StageKind::ReadabilityStyle => self
                .summarizer
                .summarize(doc)
                .filter(|summary| tree.get(summary.node).is_some() && tree.is_element(summary.node))
                .map(|summary| node_proposal(tree, summary.node, summary.title, stage)),
            StageKind::Heuristic => Some(heuristic_proposal(doc)?),
        };
        Ok(proposal)
    }

    fn finish(
        &self, doc: &Document, stage: StageKind, proposal: Proposal, fallbacks_used: Vec<String>, start: Instant,
    ) -> PipelineResult {
        PipelineResult {
            content: proposal.content,
            text_content: proposal.text_content,
            stage,
            quality_score: proposal.gate.score,
            quality_report: generate_report(&proposal.gate),
            fallbacks_used,
            elapsed: start.elapsed(),
            node: proposal.node,
            metadata: ResultMetadata {
                source: doc.source().map(str::to_string),
                title: proposal.title.or_else(|| doc.extract_title()),
                timestamp: OffsetDateTime::now_utc(),
                site: proposal.site,
            },
        }
    }
}

fn strategy_name(stage: StageKind) -> &'static str {
    match stage {
        StageKind::SiteSpecific => "site-extractors",
        StageKind::Semantic => "semantic-selectors",
        StageKind::ReadabilityStyle => "summarizer",
        StageKind::Heuristic => "scoring-engine",
    }
}

fn check_timeout(start: Instant, timeout: Duration) -> Result<()> {
    let elapsed = start.elapsed();
    if !timeout.is_zero() && elapsed > timeout {
        return Err(SiftError::Timeout {
            elapsed_ms: elapsed.as_millis() as u64,
            timeout_ms: timeout.as_millis() as u64,
        });
    }
    Ok(())
}

fn node_proposal(tree: &DomTree, id: NodeId, title: Option<String>, stage: StageKind) -> Proposal {
    Proposal {
        content: tree.outer_html(id),
        text_content: node_text(tree, id),
        node: Some(id),
        title,
        site: None,
        gate: evaluate(Some(Candidate::node(tree, id)), stage),
    }
}

/// Light-tree text, or text from shadow roots when the light tree is blank
fn node_text(tree: &DomTree, id: NodeId) -> String {
    let text = tree.normalized_text(id);
    if text.is_empty() { collapse_whitespace(&tree.deep_text(id)) } else { text }
}

/// Best scoring region, pruned, falling back to the unpruned region and then the body
fn heuristic_proposal(doc: &Document) -> Result<Proposal> {
    let tree = doc.tree();
    let body = doc.body();
    let target = find_best_candidate(tree, body).map(|c| c.node).unwrap_or(body);

    let pruned = prune(tree, target);
    if !pruned.normalized_text(pruned.root()).is_empty() {
        let proposal = node_proposal(&pruned, pruned.root(), None, StageKind::Heuristic);
        return Ok(Proposal { node: Some(target), ..proposal });
    }

    [target, body, tree.root()]
        .into_iter()
        .find(|id| !node_text(tree, *id).is_empty())
        .map(|id| node_proposal(tree, id, None, StageKind::Heuristic))
        .ok_or(SiftError::NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert!(config.enable_site_specific);
        assert!(config.enable_semantic);
        assert!(config.enable_readability);
        assert!(config.enable_heuristic);
        assert_eq!(config.minimum_quality_score, 0);
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert!(!config.debug);
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::builder()
            .stage(StageKind::Semantic, false)
            .minimum_quality_score(250)
            .timeout(Duration::ZERO)
            .build();
        assert!(!config.enable_semantic);
        assert_eq!(config.minimum_quality_score, 100);
        assert!(config.timeout.is_zero());
    }

    #[test]
    fn test_partial_config_merge() {
        let base = PipelineConfig::builder().debug(true).build();
        let partial = PartialPipelineConfig { enable_readability: Some(false), ..Default::default() };
        let merged = partial.merge_over(&base);
        assert!(!merged.enable_readability);
        assert!(merged.debug);
        assert_eq!(merged.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_partial_config_rejects_unknown_fields() {
        assert!(matches!(PartialPipelineConfig::from_json(r#"{"speed": 3}"#), Err(SiftError::ConfigError(_))));
    }

    #[test]
    fn test_timeout_check() {
        let start = Instant::now() - Duration::from_millis(20);
        assert!(matches!(
            check_timeout(start, Duration::from_millis(10)),
            Err(SiftError::Timeout { timeout_ms: 10, .. })
        ));
        assert!(check_timeout(start, Duration::ZERO).is_ok());
        assert!(check_timeout(start, Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_heuristic_falls_back_when_pruning_empties() {
        let html = r##"<html><body><nav class="menu"><a href="#">Home page link text here</a></nav></body></html>"##;
        let doc = Document::parse(html, None).unwrap();
        let proposal = heuristic_proposal(&doc).unwrap();
        assert!(proposal.text_content.contains("Home page link"));
        assert!(proposal.gate.passed);
    }

    #[test]
    fn test_heuristic_reads_shadow_only_text() {
        let html = r#"<html><body><x-card><template shadowrootmode="open"><p>Shadow only</p></template></x-card></body></html>"#;
        let doc = Document::parse(html, None).unwrap();
        let proposal = heuristic_proposal(&doc).unwrap();
        assert_eq!(proposal.text_content, "Shadow only");
    }
}
