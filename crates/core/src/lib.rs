pub mod dom_tree;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod parse;
pub mod pipeline;
pub mod preprocess;
pub mod quality;
pub mod scoring;
pub mod selector;
pub mod semantic;
pub mod site;
pub mod summarizer;

#[doc(hidden)]
pub use dom_tree::{DomNode, NodeData};
pub use dom_tree::{DomTree, NodeId};
pub use error::{Result, SiftError};
pub use metadata::DocumentMetadata;
pub use metrics::{MetricsSnapshot, PerformancePercentiles, PipelineMetric, SessionMetricsStore};
pub use parse::{Document, DocumentParser, HtmlParser};
pub use pipeline::{
    PartialPipelineConfig, Pipeline, PipelineConfig, PipelineConfigBuilder, PipelineResult, ResultMetadata,
};
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use quality::{Candidate, GatePolicy, QualityGateResult, QualityMetrics, StageKind, evaluate, generate_report};
#[doc(hidden)]
pub use scoring::{ScoreConfig, ScoreResult, base_tag_score};
pub use scoring::{ScoredCandidate, ScoringEngine, find_best_candidate, prune};
pub use selector::Selector;
pub use semantic::find_semantic_content;
pub use site::{ExtractionMetadata, ExtractionResult, ProfileExtractor, SiteExtractor, SiteProfile};
pub use summarizer::{ReadabilitySummarizer, Summarizer, SummarizerConfig, Summary};
