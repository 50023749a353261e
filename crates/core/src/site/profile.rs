use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Result, SiftError};

/// Declarative description of a site's stable structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Profile name, reported as the extraction strategy
    pub name: String,
    /// Regexes matched against the document's source identifier
    pub url_patterns: Vec<String>,
    /// Tag names of elements that hold the primary content
    pub anchors: Vec<String>,
    /// Tag names of elements that hold a secondary block such as comments
    pub secondary_anchors: Vec<String>,
    /// Heading placed above the secondary block
    pub secondary_heading: String,
    /// Selectors scanned inside anchors when shadow traversal yields nothing
    pub content_selectors: Vec<String>,
    /// Regexes for whole lines of interface chrome to drop
    pub noise_patterns: Vec<String>,
    /// How many nested shadow roots to enter
    pub max_shadow_depth: usize,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            url_patterns: Vec::new(),
            anchors: Vec::new(),
            secondary_anchors: Vec::new(),
            secondary_heading: "Comments".to_string(),
            content_selectors: vec!["p".to_string()],
            noise_patterns: Vec::new(),
            max_shadow_depth: 5,
        }
    }
}

/// Lines that are UI affordances, counters, timestamps or bylines rather than prose
const COMMON_NOISE: &[&str] = &[
    r"(?i)^(reply|share|report|save|follow|join|award|edit|hide|more replies|give award|sort by:?.*)$",
    r"(?i)^[\d.,]+[km]?\s*(points?|votes?|upvotes?|comments?|replies|members|online|shares?)$",
    r"(?i)^[\d.,]+[km]?$",
    r"(?i)^•?\s*(\d+|an?)\s*(seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|wks?|w|months?|mos?|years?|yrs?|y)\.?\s+ago$",
    r"(?i)^(posted|submitted|edited)\s+by\s+\S+.*$",
    r"(?i)^(u|r)/[\w-]+(\s*•?\s*.*\bago)?$",
    r"(?i)^(upvote|downvote|vote|sort|open|close|menu|back|skip to main content|log in|sign up|continue)$",
    r"(?i)^(level \d+|op|mod|promoted|sponsored)$",
    r"^•$",
];

impl SiteProfile {
    /// Parse a profile from JSON, filling missing fields with defaults
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::ConfigError`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a profile from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            SiftError::ConfigError(format!("Cannot open profile {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Reddit post pages rendered with `shreddit` web components
    pub fn reddit() -> Self {
        Self {
            name: "reddit".to_string(),
            url_patterns: vec![r"^https?://(www\.|old\.|new\.)?reddit\.com/r/[^/]+/comments/".to_string()],
            anchors: vec!["shreddit-post".to_string()],
            secondary_anchors: vec!["shreddit-comment-tree".to_string()],
            secondary_heading: "Comments".to_string(),
            content_selectors: vec![
                r#"[slot="text-body"]"#.to_string(),
                r#"div[id$="-post-rtjson-content"]"#.to_string(),
                ".md".to_string(),
                "p".to_string(),
            ],
            noise_patterns: COMMON_NOISE.iter().map(|p| p.to_string()).collect(),
            max_shadow_depth: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_fills_defaults() {
        let profile = SiteProfile::from_json(r#"{"name": "blog", "anchors": ["blog-post"]}"#).unwrap();
        assert_eq!(profile.name, "blog");
        assert_eq!(profile.anchors, vec!["blog-post"]);
        assert_eq!(profile.secondary_heading, "Comments");
        assert_eq!(profile.content_selectors, vec!["p"]);
        assert_eq!(profile.max_shadow_depth, 5);
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(matches!(SiteProfile::from_json("{ not json"), Err(SiftError::ConfigError(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let result = SiteProfile::from_file("/nonexistent/profile.json");
        assert!(matches!(result, Err(SiftError::ConfigError(msg)) if msg.contains("Cannot open profile")));
    }

    #[test]
    fn test_reddit_profile_roundtrips_through_json() {
        let profile = SiteProfile::reddit();
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(SiteProfile::from_json(&json).unwrap(), profile);
    }
}
