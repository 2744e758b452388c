//! Non-fatal condition reporting, separate from the primary result.
//!
//! Defensive defaults (unrecognized levels, missing assessments,
//! re-classification fallback) are recorded here per evaluation so callers
//! can observe and test them without scraping logs. Every entry is also
//! mirrored to `tracing`.

use serde::{Deserialize, Serialize};

use crate::pipeline::Stage;

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    Info,
    Warning,
}

/// A single non-fatal condition observed during an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,

    /// Pipeline stage that observed the condition.
    pub stage: Stage,

    pub message: String,
}

/// Ordered collection of diagnostics for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and mirror it to the log.
    pub fn warn(&mut self, stage: Stage, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(stage = %stage, "{message}");
        self.entries.push(Diagnostic {
            severity: DiagnosticSeverity::Warning,
            stage,
            message,
        });
    }

    /// Record an informational note and mirror it to the log.
    pub fn info(&mut self, stage: Stage, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(stage = %stage, "{message}");
        self.entries.push(Diagnostic {
            severity: DiagnosticSeverity::Info,
            stage,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append all entries from another collection, preserving order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}
