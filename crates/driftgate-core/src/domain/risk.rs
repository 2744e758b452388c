//! Risk levels, buckets, and threshold configuration for the deployment gate.

use serde::{Deserialize, Serialize};

/// Risk level for a bucket assessment.
///
/// Derives `Ord` so that threshold comparison is index comparison:
/// Low < Medium < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Parse a wire-level risk string, falling back to `Low` for anything
    /// outside {low, medium, high}. Returns whether the value was recognized
    /// so callers can report the fallback.
    pub fn parse_lenient(raw: &str) -> (Self, bool) {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => (Self::Low, true),
            "medium" => (Self::Medium, true),
            "high" => (Self::High, true),
            _ => (Self::Low, false),
        }
    }

    /// Whether this level meets or exceeds `threshold`.
    ///
    /// Inclusive rule: risk equal to the threshold blocks deployment.
    pub fn exceeds(self, threshold: RiskLevel) -> bool {
        self >= threshold
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// One of the three independent safety dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBucket {
    Drift,
    Intent,
    Operations,
}

impl RiskBucket {
    /// Fixed evaluation and reporting order.
    pub const ORDER: [RiskBucket; 3] = [Self::Drift, Self::Intent, Self::Operations];

    /// Human-readable bucket title for rendering.
    pub fn title(self) -> &'static str {
        match self {
            Self::Drift => "Infrastructure Drift",
            Self::Intent => "PR Intent Alignment",
            Self::Operations => "Risky Operations",
        }
    }
}

impl std::fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drift => write!(f, "drift"),
            Self::Intent => write!(f, "intent"),
            Self::Operations => write!(f, "operations"),
        }
    }
}

/// Assessment of a single risk bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketAssessment {
    /// Normalized risk level.
    pub risk_level: RiskLevel,

    /// Specific concerns raised by the classifier (may be empty).
    pub concerns: Vec<String>,

    /// Reasoning behind the level.
    pub reasoning: String,
}

impl BucketAssessment {
    /// Low-risk placeholder used when the classifier supplied no assessment.
    pub fn placeholder(reasoning: &str) -> Self {
        Self {
            risk_level: RiskLevel::Low,
            concerns: Vec::new(),
            reasoning: reasoning.to_string(),
        }
    }
}

/// Full three-bucket risk assessment.
///
/// The intent bucket is absent when no PR intent context was supplied to the
/// classifier; it is never synthesized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub drift: BucketAssessment,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<BucketAssessment>,

    pub operations: BucketAssessment,
}

impl RiskAssessment {
    /// Assessment for the requested bucket, if evaluated.
    pub fn bucket(&self, bucket: RiskBucket) -> Option<&BucketAssessment> {
        match bucket {
            RiskBucket::Drift => Some(&self.drift),
            RiskBucket::Intent => self.intent.as_ref(),
            RiskBucket::Operations => Some(&self.operations),
        }
    }

    /// The bucket carrying the highest risk, ties broken by fixed order.
    pub fn highest_bucket(&self) -> RiskBucket {
        let mut highest = RiskBucket::Drift;
        let mut level = self.drift.risk_level;
        for bucket in RiskBucket::ORDER {
            if let Some(assessment) = self.bucket(bucket) {
                if assessment.risk_level > level {
                    highest = bucket;
                    level = assessment.risk_level;
                }
            }
        }
        highest
    }

    /// The highest risk level across evaluated buckets.
    pub fn highest_level(&self) -> RiskLevel {
        RiskBucket::ORDER
            .iter()
            .filter_map(|b| self.bucket(*b))
            .map(|a| a.risk_level)
            .max()
            .unwrap_or(RiskLevel::Low)
    }
}

/// Per-bucket risk threshold that blocks deployment.
///
/// A bucket fails when its risk level meets or exceeds its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub drift: RiskLevel,
    pub intent: RiskLevel,
    pub operations: RiskLevel,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            drift: RiskLevel::High,
            intent: RiskLevel::High,
            operations: RiskLevel::High,
        }
    }
}

impl ThresholdConfig {
    /// Same threshold for all three buckets.
    pub fn uniform(level: RiskLevel) -> Self {
        Self {
            drift: level,
            intent: level,
            operations: level,
        }
    }

    /// The threshold for a given bucket.
    pub fn threshold_for(&self, bucket: RiskBucket) -> RiskLevel {
        match bucket {
            RiskBucket::Drift => self.drift,
            RiskBucket::Intent => self.intent,
            RiskBucket::Operations => self.operations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn test_parse_lenient_known_values() {
        assert_eq!(RiskLevel::parse_lenient("low"), (RiskLevel::Low, true));
        assert_eq!(RiskLevel::parse_lenient("MEDIUM"), (RiskLevel::Medium, true));
        assert_eq!(RiskLevel::parse_lenient(" High "), (RiskLevel::High, true));
    }

    #[test]
    fn test_parse_lenient_unknown_defaults_low() {
        let (level, recognized) = RiskLevel::parse_lenient("critical");
        assert_eq!(level, RiskLevel::Low);
        assert!(!recognized);

        let (level, recognized) = RiskLevel::parse_lenient("");
        assert_eq!(level, RiskLevel::Low);
        assert!(!recognized);
    }

    #[test]
    fn test_exceeds_full_matrix() {
        let levels = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];
        for (ri, risk) in levels.iter().enumerate() {
            for (ti, threshold) in levels.iter().enumerate() {
                assert_eq!(
                    risk.exceeds(*threshold),
                    ri >= ti,
                    "risk={risk} threshold={threshold}"
                );
            }
        }
    }

    #[test]
    fn test_default_thresholds_are_high() {
        let config = ThresholdConfig::default();
        for bucket in RiskBucket::ORDER {
            assert_eq!(config.threshold_for(bucket), RiskLevel::High);
        }
    }

    #[test]
    fn test_highest_bucket_tie_breaks_in_fixed_order() {
        let assessment = RiskAssessment {
            drift: BucketAssessment::placeholder("a"),
            intent: Some(BucketAssessment::placeholder("b")),
            operations: BucketAssessment::placeholder("c"),
        };
        assert_eq!(assessment.highest_bucket(), RiskBucket::Drift);
    }

    #[test]
    fn test_highest_bucket_prefers_higher_level() {
        let mut assessment = RiskAssessment {
            drift: BucketAssessment::placeholder("a"),
            intent: None,
            operations: BucketAssessment::placeholder("c"),
        };
        assessment.operations.risk_level = RiskLevel::High;
        assert_eq!(assessment.highest_bucket(), RiskBucket::Operations);
        assert_eq!(assessment.highest_level(), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_serde() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            let json = serde_json::to_string(&level).unwrap();
            let back: RiskLevel = serde_json::from_str(&json).unwrap();
            assert_eq!(level, back);
        }
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"high\"");
    }
}
