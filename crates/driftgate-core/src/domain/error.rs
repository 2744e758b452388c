//! Engine-level error taxonomy.

use crate::classifier::ClassifierError;

/// Errors that abort an evaluation.
///
/// Non-fatal conditions (unrecognized levels, re-classification failure,
/// missing assessments) never surface here; they go through the
/// diagnostics channel instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The mandatory initial classification call failed.
    #[error("classification failed: {0}")]
    Classification(#[from] ClassifierError),

    /// The mandatory initial classification call exceeded its deadline.
    #[error("classification timed out after {timeout_secs}s")]
    ClassificationTimeout { timeout_secs: u64 },

    /// No well-formed structured block could be extracted from the
    /// classifier response.
    #[error("could not extract a structured response: {0}")]
    ResponseExtraction(String),

    /// The extracted block did not match the expected response shape.
    #[error("malformed classifier response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// A named noise-pattern source could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::ClassificationTimeout { timeout_secs: 30 };
        assert!(err.to_string().contains("timed out after 30s"));

        let err = EngineError::ResponseExtraction("no opening brace".to_string());
        assert!(err.to_string().contains("structured response"));
    }
}
