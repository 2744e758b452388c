//! driftgate core library
//!
//! Confidence-gated, three-bucket risk evaluation for infrastructure
//! what-if output. Classified change records are filtered against
//! user-supplied noise phrases, partitioned by confidence, conditionally
//! re-classified, and gated against per-bucket risk thresholds to produce
//! a single deployment safety verdict.

pub mod classifier;
pub mod diagnostics;
pub mod domain;
pub mod gate;
pub mod noise;
pub mod obs;
pub mod pipeline;
pub mod split;
pub mod telemetry;

pub use classifier::{
    extract_first_json_object, AnthropicClassifier, AnthropicConfig, AzureOpenAiClassifier,
    AzureOpenAiConfig, Classifier, ClassifierError, ClassifyRequest, OllamaClassifier,
    OllamaConfig, PrIntent, DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_MODEL,
};
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics};
pub use domain::{
    BucketAssessment, ChangeAction, ChangeRecord, ChangeSet, ConfidenceLevel, EngineError,
    Result, RiskAssessment, RiskBucket, RiskLevel, ThresholdConfig, Verdict,
};
pub use gate::{evaluate as evaluate_gate, GateOutcome};
pub use noise::{similarity_ratio, NoisePatterns, DEFAULT_NOISE_THRESHOLD};
pub use pipeline::{Engine, EngineOptions, Evaluation, Stage};
pub use split::{split, SplitChangeSet};
pub use telemetry::init_tracing;

/// driftgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
