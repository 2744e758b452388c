//! Classification backend seam.
//!
//! The engine talks to an opaque text-analysis backend through the
//! [`Classifier`] trait so the evaluation pipeline can be exercised with a
//! scripted substitute in tests. Production backends exist for the
//! Anthropic messages API, Azure OpenAI chat completions, and a local
//! Ollama daemon; all send the same prompt pair and return the same
//! JSON response contract.

pub mod anthropic;
pub mod azure_openai;
pub mod extract;
pub mod ollama;
mod prompt;
pub mod wire;

use async_trait::async_trait;

pub use anthropic::{AnthropicClassifier, AnthropicConfig};
pub use azure_openai::{AzureOpenAiClassifier, AzureOpenAiConfig};
pub use extract::extract_first_json_object;
pub use ollama::{OllamaClassifier, OllamaConfig, DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_MODEL};

/// Shared reqwest client construction for the hosted backends.
pub(crate) fn build_http_client() -> Result<reqwest::Client, ClassifierError> {
    reqwest::Client::builder()
        .user_agent(concat!("driftgate/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ClassifierError::Http(e.to_string()))
}

/// Errors from a classification backend.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("http error: {0}")]
    Http(String),

    #[error("backend returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("backend returned an empty response")]
    EmptyResponse,

    #[error("missing credential: {0}")]
    MissingCredential(String),
}

/// PR intent context for the intent risk bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrIntent {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PrIntent {
    /// Whether any intent context was actually supplied.
    pub fn is_present(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
            || self
                .description
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty())
    }
}

/// Request payload for one classification call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifyRequest {
    /// Primary change-description payload (what-if output or a rendered
    /// change list on re-classification).
    pub change_text: String,

    /// Source code diff that produced the changes, when available.
    pub diff: Option<String>,

    /// Template source files for extra context.
    pub source_context: Option<String>,

    /// Stated PR intent; its presence enables the intent bucket.
    pub intent: Option<PrIntent>,
}

impl ClassifyRequest {
    pub fn new(change_text: impl Into<String>) -> Self {
        Self {
            change_text: change_text.into(),
            ..Self::default()
        }
    }

    pub fn with_diff(mut self, diff: impl Into<String>) -> Self {
        self.diff = Some(diff.into());
        self
    }

    pub fn with_source_context(mut self, context: impl Into<String>) -> Self {
        self.source_context = Some(context.into());
        self
    }

    pub fn with_intent(mut self, intent: PrIntent) -> Self {
        self.intent = Some(intent);
        self
    }

    /// Whether intent context is present and non-empty.
    pub fn has_intent(&self) -> bool {
        self.intent.as_ref().is_some_and(|i| i.is_present())
    }
}

/// Opaque request/response text-analysis backend.
///
/// Returns raw response text; the caller extracts the structured block.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest) -> Result<String, ClassifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_presence() {
        assert!(!PrIntent::default().is_present());
        assert!(!PrIntent {
            title: Some("  ".to_string()),
            description: None,
        }
        .is_present());
        assert!(PrIntent {
            title: Some("Add storage account".to_string()),
            description: None,
        }
        .is_present());
    }

    #[test]
    fn test_request_has_intent() {
        let request = ClassifyRequest::new("whatif");
        assert!(!request.has_intent());

        let request = request.with_intent(PrIntent {
            title: None,
            description: Some("rotate keys".to_string()),
        });
        assert!(request.has_intent());
    }
}
