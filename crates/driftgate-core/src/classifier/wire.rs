//! Permissive wire shapes for classifier responses, plus normalization
//! into domain types.
//!
//! The backend is unreliable: levels arrive as free-form strings, fields
//! go missing, extra fields appear. Wire structs accept all of that; the
//! normalization step applies the defensive defaults and reports each one
//! through the diagnostics channel.

use serde::Deserialize;
use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::domain::{
    BucketAssessment, ChangeAction, ChangeRecord, ChangeSet, ConfidenceLevel, EngineError,
    RiskAssessment, RiskLevel,
};
use crate::pipeline::Stage;

/// Top-level classifier response as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WireResponse {
    #[serde(default)]
    pub resources: Option<Vec<WireChange>>,

    #[serde(default)]
    pub overall_summary: Option<String>,

    #[serde(default)]
    pub risk_assessment: Option<WireRiskAssessment>,
}

/// One change record on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WireChange {
    #[serde(default)]
    pub resource_name: Option<String>,

    #[serde(default)]
    pub resource_type: Option<String>,

    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub confidence: Option<String>,

    #[serde(default)]
    pub confidence_reason: Option<String>,

    #[serde(default)]
    pub risk_level: Option<String>,

    #[serde(default)]
    pub risk_reason: Option<String>,
}

/// Bucketed risk assessment on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WireRiskAssessment {
    #[serde(default)]
    pub drift: Option<WireBucket>,

    #[serde(default)]
    pub intent: Option<WireBucket>,

    #[serde(default)]
    pub operations: Option<WireBucket>,
}

/// One bucket assessment on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WireBucket {
    #[serde(default)]
    pub risk_level: Option<String>,

    #[serde(default)]
    pub concerns: Vec<String>,

    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Convert an extracted JSON object into a normalized [`ChangeSet`].
///
/// Every defensive default applied is recorded against `stage` in
/// `diags`. Shape mismatches (e.g. `resources` is a string) are fatal for
/// the caller to handle.
pub fn normalize_response(
    value: Value,
    stage: Stage,
    diags: &mut Diagnostics,
) -> Result<ChangeSet, EngineError> {
    let wire: WireResponse = serde_json::from_value(value)?;

    let records = match wire.resources {
        Some(resources) => resources
            .into_iter()
            .enumerate()
            .map(|(idx, change)| normalize_change(change, idx, stage, diags))
            .collect(),
        None => {
            diags.warn(stage, "response missing 'resources'; using empty list");
            Vec::new()
        }
    };

    let overall_summary = match wire.overall_summary {
        Some(summary) => summary,
        None => {
            diags.warn(stage, "response missing 'overall_summary'");
            "No summary provided.".to_string()
        }
    };

    let risk = wire
        .risk_assessment
        .map(|assessment| normalize_assessment(assessment, stage, diags));

    Ok(ChangeSet {
        records,
        overall_summary,
        risk,
    })
}

fn normalize_change(
    change: WireChange,
    idx: usize,
    stage: Stage,
    diags: &mut Diagnostics,
) -> ChangeRecord {
    let resource_name = change
        .resource_name
        .unwrap_or_else(|| format!("resource-{idx}"));

    let action = match change.action.as_deref() {
        Some(raw) => {
            let (action, recognized) = ChangeAction::parse_lenient(raw);
            if !recognized {
                diags.warn(
                    stage,
                    format!("unrecognized action '{raw}' on '{resource_name}'; treating as Modify"),
                );
            }
            action
        }
        None => ChangeAction::NoChange,
    };

    let confidence = match change.confidence.as_deref() {
        Some(raw) => {
            let (confidence, recognized) = ConfidenceLevel::parse_lenient(raw);
            if !recognized {
                diags.warn(
                    stage,
                    format!(
                        "unrecognized confidence '{raw}' on '{resource_name}'; defaulting to medium"
                    ),
                );
            }
            confidence
        }
        // Missing confidence is the conservative, audit-favoring default:
        // keep the record in front of risk reasoning.
        None => ConfidenceLevel::Medium,
    };

    ChangeRecord {
        resource_name,
        resource_type: change.resource_type.unwrap_or_else(|| "Unknown".to_string()),
        action,
        summary: change
            .summary
            .unwrap_or_else(|| "No summary provided".to_string()),
        confidence,
        confidence_reason: change.confidence_reason,
        risk_level: change.risk_level.map(|l| l.to_ascii_lowercase()),
        risk_reason: change.risk_reason,
    }
}

fn normalize_assessment(
    assessment: WireRiskAssessment,
    stage: Stage,
    diags: &mut Diagnostics,
) -> RiskAssessment {
    RiskAssessment {
        drift: normalize_bucket(assessment.drift, "drift", stage, diags),
        intent: assessment
            .intent
            .map(|bucket| normalize_bucket(Some(bucket), "intent", stage, diags)),
        operations: normalize_bucket(assessment.operations, "operations", stage, diags),
    }
}

fn normalize_bucket(
    bucket: Option<WireBucket>,
    name: &str,
    stage: Stage,
    diags: &mut Diagnostics,
) -> BucketAssessment {
    let bucket = match bucket {
        Some(bucket) => bucket,
        None => {
            diags.warn(stage, format!("risk assessment missing '{name}' bucket"));
            return BucketAssessment::placeholder("No assessment provided");
        }
    };

    let risk_level = match bucket.risk_level.as_deref() {
        Some(raw) => {
            let (level, recognized) = RiskLevel::parse_lenient(raw);
            if !recognized {
                diags.warn(
                    stage,
                    format!("unrecognized risk level '{raw}' in '{name}' bucket; defaulting to low"),
                );
            }
            level
        }
        None => RiskLevel::Low,
    };

    BucketAssessment {
        risk_level,
        concerns: bucket.concerns,
        reasoning: bucket.reasoning.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalizes_full_response() {
        let mut diags = Diagnostics::new();
        let value = json!({
            "resources": [{
                "resource_name": "vault",
                "resource_type": "KeyVault/vaults",
                "action": "Modify",
                "summary": "Rotates access policy",
                "confidence": "high",
                "risk_level": "HIGH",
            }],
            "overall_summary": "One modification.",
            "risk_assessment": {
                "drift": {"risk_level": "medium", "concerns": ["policy drift"], "reasoning": "r"},
                "operations": {"risk_level": "low", "concerns": [], "reasoning": "r"},
            }
        });

        let set = normalize_response(value, Stage::Classified, &mut diags).unwrap();
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.records[0].confidence, ConfidenceLevel::High);
        assert_eq!(set.records[0].risk_level.as_deref(), Some("high"));
        let risk = set.risk.unwrap();
        assert_eq!(risk.drift.risk_level, RiskLevel::Medium);
        assert!(risk.intent.is_none());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_missing_resources_warns_and_defaults() {
        let mut diags = Diagnostics::new();
        let set =
            normalize_response(json!({"overall_summary": "s"}), Stage::Classified, &mut diags)
                .unwrap();
        assert!(set.records.is_empty());
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_unrecognized_confidence_defaults_medium_with_warning() {
        let mut diags = Diagnostics::new();
        let value = json!({
            "resources": [{"resource_name": "app", "action": "Create", "confidence": "certain"}],
            "overall_summary": "s",
        });
        let set = normalize_response(value, Stage::Classified, &mut diags).unwrap();
        assert_eq!(set.records[0].confidence, ConfidenceLevel::Medium);
        assert!(diags
            .warnings()
            .any(|d| d.message.contains("unrecognized confidence")));
    }

    #[test]
    fn test_unrecognized_bucket_level_defaults_low_with_warning() {
        let mut diags = Diagnostics::new();
        let value = json!({
            "resources": [],
            "overall_summary": "s",
            "risk_assessment": {
                "drift": {"risk_level": "catastrophic"},
                "operations": {"risk_level": "low"},
            }
        });
        let set = normalize_response(value, Stage::Classified, &mut diags).unwrap();
        assert_eq!(set.risk.unwrap().drift.risk_level, RiskLevel::Low);
        assert!(diags
            .warnings()
            .any(|d| d.message.contains("unrecognized risk level")));
    }

    #[test]
    fn test_intent_bucket_never_synthesized() {
        let mut diags = Diagnostics::new();
        let value = json!({
            "resources": [],
            "overall_summary": "s",
            "risk_assessment": {
                "drift": {"risk_level": "low"},
                "operations": {"risk_level": "low"},
            }
        });
        let set = normalize_response(value, Stage::Classified, &mut diags).unwrap();
        assert!(set.risk.unwrap().intent.is_none());
    }

    #[test]
    fn test_shape_mismatch_is_fatal() {
        let mut diags = Diagnostics::new();
        let result = normalize_response(
            json!({"resources": "not a list"}),
            Stage::Classified,
            &mut diags,
        );
        assert!(result.is_err());
    }
}
