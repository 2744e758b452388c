//! Ollama local-model classification backend.
//!
//! Talks to a local Ollama daemon's generate API. Ollama takes a single
//! prompt string, so the system instruction and user message are joined
//! before sending. Needs no credential.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{prompt, Classifier, ClassifierError, ClassifyRequest};

/// Default local daemon address.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Default model when none is configured.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Ollama backend configuration.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Daemon base URL.
    pub host: String,

    /// Model name, pulled ahead of time with `ollama pull`.
    pub model: String,
}

impl OllamaConfig {
    pub fn new(host: &str, model: &str) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_MODEL)
    }
}

/// Ollama classification backend.
pub struct OllamaClassifier {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClassifier {
    pub fn new(config: OllamaConfig) -> Result<Self, ClassifierError> {
        Ok(Self {
            config,
            http_client: super::build_http_client()?,
        })
    }
}

#[async_trait]
impl Classifier for OllamaClassifier {
    async fn classify(&self, request: &ClassifyRequest) -> Result<String, ClassifierError> {
        let combined = format!(
            "{}\n\n{}",
            prompt::system_instruction(request),
            prompt::user_message(request)
        );
        let body = json!({
            "model": self.config.model,
            "prompt": combined,
            "stream": false,
            "options": {"temperature": 0},
        });

        debug!(host = %self.config.host, model = %self.config.model, "Sending classification request");

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.config.host))
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Http(e.to_string()))?;

        if parsed.response.trim().is_empty() {
            return Err(ClassifierError::EmptyResponse);
        }
        Ok(parsed.response)
    }
}
