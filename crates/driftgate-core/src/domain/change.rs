//! Classified change records and change sets.

use serde::{Deserialize, Serialize};

use super::risk::RiskAssessment;

/// Planned action for a resource, as reported by what-if output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeAction {
    Create,
    Modify,
    Delete,
    Deploy,
    NoChange,
    Ignore,
}

impl ChangeAction {
    /// Parse a wire-level action string, falling back to `Modify` for
    /// anything unrecognized. Returns whether the value was recognized.
    ///
    /// Modify is the audit-favoring fallback: an action we cannot interpret
    /// must not land in a no-op category.
    pub fn parse_lenient(raw: &str) -> (Self, bool) {
        match raw.trim().to_ascii_lowercase().as_str() {
            "create" => (Self::Create, true),
            "modify" => (Self::Modify, true),
            "delete" => (Self::Delete, true),
            "deploy" => (Self::Deploy, true),
            "nochange" | "no_change" => (Self::NoChange, true),
            "ignore" => (Self::Ignore, true),
            _ => (Self::Modify, false),
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "Create"),
            Self::Modify => write!(f, "Modify"),
            Self::Delete => write!(f, "Delete"),
            Self::Deploy => write!(f, "Deploy"),
            Self::NoChange => write!(f, "NoChange"),
            Self::Ignore => write!(f, "Ignore"),
        }
    }
}

/// Classifier's estimate of whether a change record is a genuine effect
/// versus tool-generated reporting noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Noise,
}

impl ConfidenceLevel {
    /// Parse a wire-level confidence string, falling back to `Medium`
    /// (included) for anything unrecognized or missing. Returns whether the
    /// value was recognized.
    pub fn parse_lenient(raw: &str) -> (Self, bool) {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => (Self::High, true),
            "medium" => (Self::Medium, true),
            "low" => (Self::Low, true),
            "noise" => (Self::Noise, true),
            _ => (Self::Medium, false),
        }
    }

    /// Whether records at this confidence are retained for risk evaluation.
    pub fn is_included(self) -> bool {
        matches!(self, Self::High | Self::Medium)
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::Noise => write!(f, "noise"),
        }
    }
}

/// One proposed resource action plus classifier commentary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Short resource name.
    pub resource_name: String,

    /// Resource type, abbreviated for readability.
    pub resource_type: String,

    /// Planned action.
    pub action: ChangeAction,

    /// Plain-language explanation of the change.
    pub summary: String,

    /// Whether this is a genuine effect or reporting noise.
    pub confidence: ConfidenceLevel,

    /// Classifier's rationale for the confidence level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_reason: Option<String>,

    /// Per-resource risk label, informational only. The gate consumes
    /// bucket assessments, never this field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,

    /// Rationale for the per-resource risk label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_reason: Option<String>,
}

impl ChangeRecord {
    pub fn new(
        resource_name: impl Into<String>,
        resource_type: impl Into<String>,
        action: ChangeAction,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            resource_type: resource_type.into(),
            action,
            summary: summary.into(),
            confidence: ConfidenceLevel::Medium,
            confidence_reason: None,
            risk_level: None,
            risk_reason: None,
        }
    }

    /// Set the confidence level.
    pub fn with_confidence(mut self, confidence: ConfidenceLevel) -> Self {
        self.confidence = confidence;
        self
    }
}

/// A classified set of change records plus set-level commentary.
///
/// Created once per classifier call. Records are never mutated after the
/// confidence split has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Classified change records, in classifier order.
    pub records: Vec<ChangeRecord>,

    /// Overall narrative for the whole set.
    pub overall_summary: String,

    /// Three-bucket risk assessment, when the classifier produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,
}

impl ChangeSet {
    pub fn new(records: Vec<ChangeRecord>, overall_summary: impl Into<String>) -> Self {
        Self {
            records,
            overall_summary: overall_summary.into(),
            risk: None,
        }
    }

    /// An empty set with no narrative. Used for the excluded side of a
    /// split, which is informational only.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            overall_summary: String::new(),
            risk: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
