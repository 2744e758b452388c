//! Domain types for driftgate evaluations.

pub mod change;
pub mod error;
pub mod risk;
pub mod verdict;

pub use change::{ChangeAction, ChangeRecord, ChangeSet, ConfidenceLevel};
pub use error::{EngineError, Result};
pub use risk::{BucketAssessment, RiskAssessment, RiskBucket, RiskLevel, ThresholdConfig};
pub use verdict::Verdict;
