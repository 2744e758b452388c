//! Fuzzy noise-phrase matching and confidence override.
//!
//! Operators supply plain-text phrases describing tool-generated noise
//! ("tags will be reordered", "no effective change"). Any record whose
//! summary is sufficiently similar to a phrase has its confidence forced
//! to noise before the split, so it can never reach risk evaluation.

use std::path::Path;

use crate::diagnostics::Diagnostics;
use crate::domain::{ChangeRecord, ConfidenceLevel, Result};
use crate::pipeline::Stage;

/// Default similarity ratio at which a phrase matches.
pub const DEFAULT_NOISE_THRESHOLD: f64 = 0.80;

/// User-supplied noise phrases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoisePatterns {
    patterns: Vec<String>,
}

impl NoisePatterns {
    /// Parse newline-delimited phrases. Blank lines and lines starting
    /// with `#` are skipped.
    pub fn parse(text: &str) -> Self {
        let patterns = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { patterns }
    }

    /// Load phrases from a file. An unreadable file propagates; the caller
    /// decides whether that is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn from_phrases<I: IntoIterator<Item = S>, S: Into<String>>(phrases: I) -> Self {
        Self {
            patterns: phrases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether `text` matches any phrase at or above `threshold`.
    ///
    /// Empty text or an empty phrase list is a normal non-match, not an
    /// error.
    pub fn matches(&self, text: &str, threshold: f64) -> bool {
        if text.is_empty() || self.patterns.is_empty() {
            return false;
        }
        self.patterns
            .iter()
            .any(|pattern| similarity_ratio(text, pattern) >= threshold)
    }

    /// Force confidence to noise on every record whose summary matches a
    /// phrase. Records are overridden in place, never deleted. Returns the
    /// number of overrides.
    pub fn apply(
        &self,
        records: &mut [ChangeRecord],
        threshold: f64,
        diags: &mut Diagnostics,
    ) -> usize {
        if self.patterns.is_empty() {
            return 0;
        }
        let mut overridden = 0;
        for record in records.iter_mut() {
            if self.matches(&record.summary, threshold) {
                record.confidence = ConfidenceLevel::Noise;
                diags.info(
                    Stage::NoiseFiltered,
                    format!(
                        "'{}' matched a noise pattern; confidence set to noise",
                        record.resource_name
                    ),
                );
                overridden += 1;
            }
        }
        overridden
    }
}

/// Case-insensitive normalized similarity between two strings.
///
/// LCS-style ratio `2 * lcs(a, b) / (|a| + |b|)` over lowercased
/// characters, in the range 0.0 to 1.0.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // DP table: dp[i][j] = length of LCS of a[0..i] and b[0..j]
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                dp[i][j] = dp[i - 1][j - 1] + 1;
            } else {
                dp[i][j] = dp[i][j - 1].max(dp[i - 1][j]);
            }
        }
    }

    let lcs = dp[a.len()][b.len()];
    (2.0 * lcs as f64) / ((a.len() + b.len()) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChangeAction;

    fn record(name: &str, summary: &str) -> ChangeRecord {
        ChangeRecord::new(name, "Storage/accounts", ChangeAction::Modify, summary)
            .with_confidence(ConfidenceLevel::High)
    }

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let patterns = NoisePatterns::parse("# header\n\ntags reordered\n  \nno-op update\n");
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn test_identical_strings_ratio_is_one() {
        assert_eq!(similarity_ratio("abc", "abc"), 1.0);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let patterns = NoisePatterns::from_phrases(["hello"]);
        assert!(patterns.matches("HELLO", 0.99));
    }

    #[test]
    fn test_empty_text_never_matches() {
        let patterns = NoisePatterns::from_phrases(["anything"]);
        assert!(!patterns.matches("", 0.1));
    }

    #[test]
    fn test_empty_patterns_never_match() {
        let patterns = NoisePatterns::default();
        assert!(!patterns.matches("some text", 0.0));
    }

    #[test]
    fn test_near_match_meets_default_threshold() {
        let patterns = NoisePatterns::from_phrases(["tags will be reordered"]);
        assert!(patterns.matches("Tags will be reordered.", DEFAULT_NOISE_THRESHOLD));
        assert!(!patterns.matches("Deletes the production database", DEFAULT_NOISE_THRESHOLD));
    }

    #[test]
    fn test_apply_overrides_matching_records_only() {
        let patterns = NoisePatterns::from_phrases(["no effective change"]);
        let mut records = vec![
            record("a", "No effective change"),
            record("b", "Deletes the vault"),
        ];
        let mut diags = Diagnostics::new();
        let overridden = patterns.apply(&mut records, DEFAULT_NOISE_THRESHOLD, &mut diags);
        assert_eq!(overridden, 1);
        assert_eq!(records[0].confidence, ConfidenceLevel::Noise);
        assert_eq!(records[1].confidence, ConfidenceLevel::High);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_apply_with_empty_patterns_is_identity() {
        let patterns = NoisePatterns::default();
        let mut records = vec![record("a", "anything at all")];
        let before = records.clone();
        let mut diags = Diagnostics::new();
        assert_eq!(patterns.apply(&mut records, DEFAULT_NOISE_THRESHOLD, &mut diags), 0);
        assert_eq!(records, before);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_load_missing_file_propagates() {
        let result = NoisePatterns::load(Path::new("/nonexistent/noise.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.txt");
        std::fs::write(&path, "# comment\nphrase one\nphrase two\n").unwrap();
        let patterns = NoisePatterns::load(&path).unwrap();
        assert_eq!(patterns.len(), 2);
    }
}
