use regex::Regex;

use crate::{Result, SiftError};

/// Drops lines that match any of a set of noise patterns
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    patterns: Vec<Regex>,
}

impl NoiseFilter {
    /// Compile a filter from regex sources
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::ConfigError`] naming the first invalid pattern.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref())
                    .map_err(|e| SiftError::ConfigError(format!("invalid noise pattern {}: {}", p.as_ref(), e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_noise(&self, line: &str) -> bool {
        let line = line.trim();
        self.patterns.iter().any(|p| p.is_match(line))
    }

    /// Keep the lines that are not noise, in order
    pub fn filter(&self, lines: Vec<String>) -> Vec<String> {
        lines.into_iter().filter(|line| !self.is_noise(line)).collect()
    }
}

/// Collapse runs of identical consecutive lines into one.
///
/// Only neighbours are compared; a line repeated later in the text survives.
pub fn dedupe_adjacent(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if out.last() != Some(&line) {
            out.push(line);
        }
    }
    out
}

/// Confidence in text produced by a site extractor, 0 to 100.
///
/// `removed_ratio` is the share of original characters dropped as noise.
/// Too little or too much filtering, few words, and short average word
/// length each cost points.
pub(crate) fn content_quality(content: &str, removed_ratio: f64) -> u32 {
    let mut score: u32 = 100;

    if !(0.3..=0.8).contains(&removed_ratio) {
        score -= 20;
    }

    let words: Vec<&str> = content
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .collect();
    if words.len() < 50 {
        score -= 30;
    }

    let letters: usize = words.iter().map(|w| w.chars().filter(|c| c.is_alphanumeric()).count()).sum();
    if words.is_empty() || (letters as f64 / words.len() as f64) < 4.0 {
        score -= 20;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_drops_matching_lines() {
        let filter = NoiseFilter::new(&[r"(?i)^reply$", r"^\d+ points$"]).unwrap();
        let kept = filter.filter(lines(&["Actual prose.", "Reply", "42 points", "More prose."]));
        assert_eq!(kept, lines(&["Actual prose.", "More prose."]));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(NoiseFilter::new(&["(unclosed"]), Err(SiftError::ConfigError(_))));
    }

    #[test]
    fn test_dedupe_is_adjacent_only() {
        let deduped = dedupe_adjacent(lines(&["a", "a", "b", "a", "a", "a"]));
        assert_eq!(deduped, lines(&["a", "b", "a"]));
    }

    #[rstest]
    #[case(0.5, 60, 100)]
    #[case(0.1, 60, 80)]
    #[case(0.9, 60, 80)]
    #[case(0.5, 10, 70)]
    #[case(0.0, 10, 50)]
    fn test_content_quality(#[case] ratio: f64, #[case] words: usize, #[case] expected: u32) {
        let content = vec!["sentence"; words].join(" ");
        assert_eq!(content_quality(&content, ratio), expected);
    }

    #[test]
    fn test_content_quality_penalizes_fragments() {
        let content = vec!["a b"; 40].join(" ");
        assert_eq!(content_quality(&content, 0.5), 80);
    }
}
