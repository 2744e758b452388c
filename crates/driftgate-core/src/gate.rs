//! Risk-bucket threshold gate.
//!
//! Compares each bucket's level against its configured threshold with an
//! inclusive meets-or-exceeds rule: risk equal to the threshold blocks
//! deployment.

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::domain::{BucketAssessment, RiskAssessment, RiskBucket, ThresholdConfig};
use crate::pipeline::Stage;

/// Outcome of evaluating a risk assessment against thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    /// True iff no bucket failed.
    pub safe: bool,

    /// Failing bucket ids, in fixed order (drift, intent, operations).
    pub failed_buckets: Vec<RiskBucket>,

    /// The assessment the decision was made on. When the classifier
    /// supplied none, this holds low-risk placeholder drift/operations
    /// entries.
    pub assessment: RiskAssessment,
}

/// Evaluate bucket levels against thresholds.
///
/// Drift and operations are always evaluated; intent only when present —
/// an absent intent bucket is "not applicable", not a pass or fail. A
/// missing assessment is trivially safe: placeholder entries are
/// substituted and a warning recorded, never an error.
pub fn evaluate(
    assessment: Option<&RiskAssessment>,
    thresholds: &ThresholdConfig,
    diags: &mut Diagnostics,
) -> GateOutcome {
    let assessment = match assessment {
        Some(assessment) => assessment.clone(),
        None => {
            diags.warn(
                Stage::Evaluated,
                "no risk assessment provided; treating deployment as safe",
            );
            return GateOutcome {
                safe: true,
                failed_buckets: Vec::new(),
                assessment: RiskAssessment {
                    drift: BucketAssessment::placeholder("No risk assessment provided"),
                    intent: None,
                    operations: BucketAssessment::placeholder("No risk assessment provided"),
                },
            };
        }
    };

    let mut failed_buckets = Vec::new();
    for bucket in RiskBucket::ORDER {
        if let Some(entry) = assessment.bucket(bucket) {
            if entry.risk_level.exceeds(thresholds.threshold_for(bucket)) {
                failed_buckets.push(bucket);
            }
        }
    }

    GateOutcome {
        safe: failed_buckets.is_empty(),
        failed_buckets,
        assessment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskLevel;

    fn bucket(level: RiskLevel) -> BucketAssessment {
        BucketAssessment {
            risk_level: level,
            concerns: Vec::new(),
            reasoning: "test".to_string(),
        }
    }

    fn assessment(
        drift: RiskLevel,
        intent: Option<RiskLevel>,
        operations: RiskLevel,
    ) -> RiskAssessment {
        RiskAssessment {
            drift: bucket(drift),
            intent: intent.map(bucket),
            operations: bucket(operations),
        }
    }

    #[test]
    fn test_all_low_against_high_thresholds_is_safe() {
        let mut diags = Diagnostics::new();
        let outcome = evaluate(
            Some(&assessment(RiskLevel::Low, None, RiskLevel::Low)),
            &ThresholdConfig::default(),
            &mut diags,
        );
        assert!(outcome.safe);
        assert!(outcome.failed_buckets.is_empty());
    }

    #[test]
    fn test_high_drift_fails_alone() {
        let mut diags = Diagnostics::new();
        let outcome = evaluate(
            Some(&assessment(RiskLevel::High, None, RiskLevel::Low)),
            &ThresholdConfig::default(),
            &mut diags,
        );
        assert!(!outcome.safe);
        assert_eq!(outcome.failed_buckets, vec![RiskBucket::Drift]);
    }

    #[test]
    fn test_medium_thresholds_fail_all_three_in_fixed_order() {
        let mut diags = Diagnostics::new();
        let outcome = evaluate(
            Some(&assessment(
                RiskLevel::High,
                Some(RiskLevel::Medium),
                RiskLevel::Medium,
            )),
            &ThresholdConfig::uniform(RiskLevel::Medium),
            &mut diags,
        );
        assert_eq!(
            outcome.failed_buckets,
            vec![RiskBucket::Drift, RiskBucket::Intent, RiskBucket::Operations]
        );
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let mut diags = Diagnostics::new();
        let outcome = evaluate(
            Some(&assessment(RiskLevel::High, None, RiskLevel::Low)),
            &ThresholdConfig::default(),
            &mut diags,
        );
        // risk == threshold blocks
        assert!(outcome.failed_buckets.contains(&RiskBucket::Drift));
    }

    #[test]
    fn test_absent_intent_never_fails() {
        let mut diags = Diagnostics::new();
        let outcome = evaluate(
            Some(&assessment(RiskLevel::Low, None, RiskLevel::Low)),
            &ThresholdConfig::uniform(RiskLevel::Low),
            &mut diags,
        );
        assert!(!outcome.failed_buckets.contains(&RiskBucket::Intent));
    }

    #[test]
    fn test_missing_assessment_is_safe_with_placeholders_and_warning() {
        let mut diags = Diagnostics::new();
        let outcome = evaluate(None, &ThresholdConfig::default(), &mut diags);
        assert!(outcome.safe);
        assert!(outcome.failed_buckets.is_empty());
        assert_eq!(outcome.assessment.drift.risk_level, RiskLevel::Low);
        assert_eq!(outcome.assessment.operations.risk_level, RiskLevel::Low);
        assert!(outcome.assessment.intent.is_none());
        assert_eq!(diags.warnings().count(), 1);
    }
}
