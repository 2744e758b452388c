//! Evaluation pipeline: classify, noise-override, split, conditional
//! re-classify, gate, verdict.
//!
//! The stages form an explicit sequence so the re-classification fallback
//! is testable without a live backend:
//!
//! `Classified -> NoiseFiltered -> Split -> [Reclassified] -> Evaluated`
//!
//! Re-classification is a compensating retry: when the split excluded any
//! records, the first pass's risk reasoning may have been computed while
//! noise was still present, so the backend is re-invoked over the included
//! records only and its result replaces the first pass. A second-call
//! failure falls back to first-pass data and is never fatal.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classifier::{extract_first_json_object, wire, Classifier, ClassifyRequest};
use crate::diagnostics::Diagnostics;
use crate::domain::{
    ChangeRecord, ChangeSet, EngineError, Result, RiskBucket, ThresholdConfig, Verdict,
};
use crate::gate::{self, GateOutcome};
use crate::noise::{NoisePatterns, DEFAULT_NOISE_THRESHOLD};
use crate::obs;
use crate::split::split;

/// Pipeline stage identifiers, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classified,
    NoiseFiltered,
    Split,
    Reclassified,
    Evaluated,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classified => write!(f, "classified"),
            Self::NoiseFiltered => write!(f, "noise_filtered"),
            Self::Split => write!(f, "split"),
            Self::Reclassified => write!(f, "reclassified"),
            Self::Evaluated => write!(f, "evaluated"),
        }
    }
}

/// Engine configuration. No hidden defaults: everything the pipeline
/// needs is in here or in the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Per-bucket blocking thresholds.
    pub thresholds: ThresholdConfig,

    /// Similarity ratio at which a noise phrase matches.
    pub noise_threshold: f64,

    /// Deadline for each classifier call. Timeout on the initial call is
    /// fatal; timeout on the re-classification call falls back.
    pub call_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            call_timeout: Duration::from_secs(120),
        }
    }
}

/// Completed evaluation: the verdict plus everything needed to audit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Unique id for log correlation.
    pub evaluation_id: String,

    /// The deployment safety verdict.
    pub verdict: Verdict,

    /// Retained records the verdict was computed over.
    pub included: ChangeSet,

    /// Filtered-out records, informational side-channel only.
    pub excluded: ChangeSet,

    /// Whether the re-classification pass replaced the first-pass data.
    pub reclassified: bool,

    /// Non-fatal conditions observed along the way.
    pub diagnostics: Diagnostics,

    /// When the verdict was assembled.
    pub completed_at: DateTime<Utc>,
}

/// The evaluation engine.
///
/// Holds no state between evaluations; concurrent evaluations over
/// independent inputs are safe.
pub struct Engine {
    classifier: Arc<dyn Classifier>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(classifier: Arc<dyn Classifier>, options: EngineOptions) -> Self {
        Self {
            classifier,
            options,
        }
    }

    /// Run the full pipeline over one deployment's change text.
    ///
    /// # Errors
    ///
    /// Fatal only when the initial classification fails: call error,
    /// timeout, extraction failure, or a response that does not match the
    /// expected shape. No partial verdict is ever produced.
    pub async fn evaluate(
        &self,
        request: ClassifyRequest,
        noise: Option<&NoisePatterns>,
    ) -> Result<Evaluation> {
        let evaluation_id = Uuid::new_v4().to_string();
        let _span = obs::EvalSpan::enter(&evaluation_id);
        let mut diags = Diagnostics::new();

        // Classified: mandatory first pass.
        let response = tokio::time::timeout(
            self.options.call_timeout,
            self.classifier.classify(&request),
        )
        .await
        .map_err(|_| EngineError::ClassificationTimeout {
            timeout_secs: self.options.call_timeout.as_secs(),
        })??;

        let value = extract_first_json_object(&response)
            .map_err(EngineError::ResponseExtraction)?;
        let mut set = wire::normalize_response(value, Stage::Classified, &mut diags)?;
        obs::emit_stage(&evaluation_id, Stage::Classified);

        // NoiseFiltered: pass-through when no pattern source was supplied.
        if let Some(patterns) = noise {
            patterns.apply(&mut set.records, self.options.noise_threshold, &mut diags);
        }
        obs::emit_stage(&evaluation_id, Stage::NoiseFiltered);

        // Split.
        let parts = split(set);
        let mut included = parts.included;
        let excluded = parts.excluded;
        obs::emit_stage(&evaluation_id, Stage::Split);

        // Reclassified: only when something was filtered out. The first
        // pass's risk reasoning saw the noise, so it is recomputed over
        // the retained records alone.
        let mut reclassified = false;
        if !excluded.is_empty() && !included.is_empty() {
            let second_pass = self.reclassify(&request, &included.records).await;
            match second_pass {
                Ok(value) => {
                    let mut second_diags = Diagnostics::new();
                    match wire::normalize_response(value, Stage::Reclassified, &mut second_diags) {
                        Ok(fresh) => {
                            diags.extend(second_diags);
                            included = fresh;
                            reclassified = true;
                            obs::emit_stage(&evaluation_id, Stage::Reclassified);
                        }
                        Err(err) => {
                            obs::emit_reclassify_fallback(&evaluation_id, &err);
                            diags.warn(
                                Stage::Reclassified,
                                format!("re-classification returned a malformed response ({err}); keeping first-pass data"),
                            );
                        }
                    }
                }
                Err(err) => {
                    obs::emit_reclassify_fallback(&evaluation_id, &err);
                    diags.warn(
                        Stage::Reclassified,
                        format!("re-classification failed ({err}); keeping first-pass data"),
                    );
                }
            }
        } else if !excluded.is_empty() {
            // Everything was filtered out: the first-pass assessment was
            // computed over noise alone, so it is discarded rather than
            // recomputed over an empty payload.
            included.risk = None;
            diags.warn(
                Stage::Split,
                "all records were excluded as noise; discarding first-pass risk assessment",
            );
        }

        // Evaluated.
        let had_assessment = included.risk.is_some();
        let outcome = gate::evaluate(included.risk.as_ref(), &self.options.thresholds, &mut diags);
        obs::emit_stage(&evaluation_id, Stage::Evaluated);

        let verdict = assemble_verdict(&outcome, &self.options.thresholds, had_assessment);
        obs::emit_verdict(&evaluation_id, verdict.safe, verdict.failed_buckets.len());

        Ok(Evaluation {
            evaluation_id,
            verdict,
            included,
            excluded,
            reclassified,
            diagnostics: diags,
            completed_at: Utc::now(),
        })
    }

    /// Second classification pass over the retained records only.
    ///
    /// The payload is regenerated from the included records, not the
    /// original change text, so excluded noise cannot leak back in.
    async fn reclassify(
        &self,
        original: &ClassifyRequest,
        included: &[ChangeRecord],
    ) -> std::result::Result<serde_json::Value, EngineError> {
        let mut reduced = original.clone();
        reduced.change_text = render_change_list(included);

        let response = tokio::time::timeout(
            self.options.call_timeout,
            self.classifier.classify(&reduced),
        )
        .await
        .map_err(|_| EngineError::ClassificationTimeout {
            timeout_secs: self.options.call_timeout.as_secs(),
        })??;

        extract_first_json_object(&response).map_err(EngineError::ResponseExtraction)
    }
}

/// Render retained records as a plain change list for re-classification.
fn render_change_list(records: &[ChangeRecord]) -> String {
    let mut text = String::from("Confirmed changes:\n");
    for record in records {
        let _ = writeln!(
            text,
            "- {} ({}): {} - {}",
            record.resource_name, record.resource_type, record.action, record.summary
        );
    }
    text
}

/// Assemble the final verdict from a gate outcome. Created whole; the
/// excluded set never participates.
fn assemble_verdict(
    outcome: &GateOutcome,
    thresholds: &ThresholdConfig,
    had_assessment: bool,
) -> Verdict {
    let highest_risk_bucket = had_assessment.then(|| outcome.assessment.highest_bucket());
    let overall_risk_level = outcome.assessment.highest_level();

    let reasoning = if !had_assessment {
        "No risk assessment was provided; deployment treated as safe.".to_string()
    } else if outcome.safe {
        "All risk buckets are below their blocking thresholds.".to_string()
    } else {
        let mut text = String::from("Blocked:");
        for bucket in &outcome.failed_buckets {
            if let Some(entry) = outcome.assessment.bucket(*bucket) {
                let _ = write!(
                    text,
                    " {} risk {} meets threshold {};",
                    bucket,
                    entry.risk_level,
                    thresholds.threshold_for(*bucket)
                );
            }
        }
        text.trim_end_matches(';').to_string()
    };

    Verdict {
        safe: outcome.safe,
        overall_risk_level,
        highest_risk_bucket,
        reasoning,
        failed_buckets: outcome.failed_buckets.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BucketAssessment, ChangeAction, RiskAssessment, RiskLevel};

    fn outcome(failed: Vec<RiskBucket>, level: RiskLevel) -> GateOutcome {
        GateOutcome {
            safe: failed.is_empty(),
            failed_buckets: failed,
            assessment: RiskAssessment {
                drift: BucketAssessment {
                    risk_level: level,
                    concerns: Vec::new(),
                    reasoning: "r".to_string(),
                },
                intent: None,
                operations: BucketAssessment::placeholder("r"),
            },
        }
    }

    #[test]
    fn test_verdict_without_assessment_has_none_bucket() {
        let verdict = assemble_verdict(
            &outcome(Vec::new(), RiskLevel::Low),
            &ThresholdConfig::default(),
            false,
        );
        assert!(verdict.safe);
        assert_eq!(verdict.highest_risk_bucket, None);
        assert!(verdict.reasoning.contains("No risk assessment"));
    }

    #[test]
    fn test_blocked_verdict_names_failing_buckets() {
        let verdict = assemble_verdict(
            &outcome(vec![RiskBucket::Drift], RiskLevel::High),
            &ThresholdConfig::default(),
            true,
        );
        assert!(!verdict.safe);
        assert_eq!(verdict.highest_risk_bucket, Some(RiskBucket::Drift));
        assert_eq!(verdict.overall_risk_level, RiskLevel::High);
        assert!(verdict.reasoning.contains("drift risk high meets threshold high"));
    }

    #[test]
    fn test_render_change_list_includes_every_record() {
        let records = vec![
            ChangeRecord::new("app", "Web/sites", ChangeAction::Create, "New app"),
            ChangeRecord::new("db", "Sql/servers", ChangeAction::Delete, "Drops server"),
        ];
        let text = render_change_list(&records);
        assert!(text.contains("app (Web/sites): Create - New app"));
        assert!(text.contains("db (Sql/servers): Delete - Drops server"));
    }
}
