//! Structured observability hooks for the evaluation lifecycle.
//!
//! Stage transitions and verdicts are emitted at `info!` level with an
//! evaluation id, so one evaluation's events can be correlated in
//! aggregated logs. For JSON output see [`crate::telemetry::init_tracing`].

use tracing::info;

use crate::pipeline::Stage;

/// RAII guard that enters an evaluation-scoped tracing span.
pub struct EvalSpan {
    _span: tracing::span::EnteredSpan,
}

impl EvalSpan {
    /// Create and enter a span tagged with the evaluation id.
    pub fn enter(evaluation_id: &str) -> Self {
        let span = tracing::info_span!("driftgate.evaluation", evaluation_id = %evaluation_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a pipeline stage completed.
pub fn emit_stage(evaluation_id: &str, stage: Stage) {
    info!(event = "evaluation.stage", evaluation_id = %evaluation_id, stage = %stage);
}

/// Emit event: verdict assembled.
pub fn emit_verdict(evaluation_id: &str, safe: bool, failed_buckets: usize) {
    info!(
        event = "evaluation.verdict",
        evaluation_id = %evaluation_id,
        safe = safe,
        failed_buckets = failed_buckets,
    );
}

/// Emit event: re-classification call failed, first-pass data retained.
pub fn emit_reclassify_fallback(evaluation_id: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(
        event = "evaluation.reclassify_fallback",
        evaluation_id = %evaluation_id,
        error = %error,
    );
}
