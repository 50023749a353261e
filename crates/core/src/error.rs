//! Error types for Sift operations.
//!
//! The pipeline only ever surfaces [`SiftError::NoContent`] and
//! [`SiftError::Timeout`] to its callers. Every other stage-local failure is
//! recovered by falling through to the next stage.
//!
//! # Example
//!
//! ```rust
//! use sift_core::{SiftError, Result};
//!
//! fn first_paragraph(html: &str) -> Result<String> {
//!     if html.trim().is_empty() {
//!         return Err(SiftError::NoContent);
//!     }
//!     // ... extraction logic
//!     # Ok(String::new())
//! }
//! ```

use thiserror::Error;

/// Main error type for extraction operations.
///
/// # Example
///
/// ```rust
/// use sift_core::{Document, Pipeline, SiftError};
///
/// let doc = Document::parse("<html><body></body></html>", None).unwrap();
/// match Pipeline::new().execute(&doc, Default::default()) {
///     Ok(result) => println!("{} won with {}", result.stage, result.quality_score),
///     Err(SiftError::Timeout { elapsed_ms, timeout_ms }) => {
///         println!("gave up after {elapsed_ms}ms (limit {timeout_ms}ms)");
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum SiftError {
    /// No content could be extracted from the document.
    ///
    /// Returned when the document is empty, or when every enabled stage
    /// came back without a usable candidate.
    #[error("No content could be extracted from the document")]
    NoContent,

    /// The global pipeline deadline was exceeded before a stage started.
    ///
    /// Fatal for the invocation; no partial result is produced.
    #[error("Extraction timed out after {elapsed_ms}ms (limit {timeout_ms}ms)")]
    Timeout { elapsed_ms: u64, timeout_ms: u64 },

    /// A specialized strategy's preconditions were not met.
    ///
    /// This is not a failure of the pipeline: the orchestrator treats it as a
    /// rejected gate and moves on.
    #[error("Strategy preconditions not met: {0}")]
    StrategyPrecondition(String),

    /// A selector string could not be parsed.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Invalid source URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration data (partial config, site profile) was malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for SiftError {
    fn from(err: serde_json::Error) -> Self {
        SiftError::ConfigError(err.to_string())
    }
}

/// Result type alias for SiftError.
pub type Result<T> = std::result::Result<T, SiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SiftError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_timeout_error() {
        let err = SiftError::Timeout { elapsed_ms: 5012, timeout_ms: 5000 };
        assert!(err.to_string().contains("5012"));
        assert!(err.to_string().contains("5000"));
    }

    #[test]
    fn test_config_error_from_json() {
        let err: SiftError = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err().into();
        assert!(matches!(err, SiftError::ConfigError(_)));
    }
}
