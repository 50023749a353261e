//! Site-specific extraction.
//!
//! A [`SiteExtractor`] knows the stable structure of one site and is tried
//! before any generic strategy. Extractors are gated on cheap preconditions
//! (the source URL and the presence of an anchor element) and return `None`
//! as soon as one fails, so an unrelated document costs almost nothing.
//!
//! [`ProfileExtractor`] implements the trait from a declarative
//! [`SiteProfile`]. Profiles are plain data and can be loaded from JSON:
//!
//! ```rust
//! use sift_core::site::{ProfileExtractor, SiteExtractor, SiteProfile};
//!
//! let profile = SiteProfile::from_json(r#"{
//!     "name": "forum",
//!     "url_patterns": ["^https://forum\\.example\\.com/t/"],
//!     "anchors": ["forum-topic"]
//! }"#).unwrap();
//! let extractor = ProfileExtractor::new(profile).unwrap();
//! assert_eq!(extractor.name(), "forum");
//! ```

mod extractor;
mod noise;
mod profile;

pub use extractor::ProfileExtractor;
pub use noise::{NoiseFilter, dedupe_adjacent};
pub use profile::SiteProfile;

use serde::Serialize;

use crate::Document;

/// How a site extractor produced its content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionMetadata {
    /// Name of the strategy (profile) that ran
    pub strategy: String,
    /// Deepest shadow root entered, 0 for light-tree extraction
    pub shadow_depth: usize,
    /// Whether any line was dropped as noise
    pub noise_filtered: bool,
    /// Extractor-specific confidence, 0 to 100
    pub quality_score: u32,
}

/// Text content produced by a site extractor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    /// Extracted text, one block per line
    pub content: String,
    pub metadata: ExtractionMetadata,
}

/// A strategy specialised for one site
pub trait SiteExtractor: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Extract content, or `None` when this extractor does not apply or
    /// cannot produce a confident result.
    fn extract(&self, doc: &Document) -> Option<ExtractionResult>;
}
