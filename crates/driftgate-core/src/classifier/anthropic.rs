//! Anthropic messages-API classification backend.
//!
//! All backend parameters live in an explicit [`AnthropicConfig`] handed
//! to the client at construction; there are no module-level defaults.
//! Each call is a single attempt; deadline enforcement and retry
//! decisions belong to the caller.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{prompt, Classifier, ClassifierError, ClassifyRequest};

/// Anthropic backend configuration.
#[derive(Clone)]
pub struct AnthropicConfig {
    /// Messages endpoint URL.
    pub endpoint: String,

    /// Model identifier.
    pub model: String,

    /// API key sent as `x-api-key`.
    pub api_key: String,

    /// Maximum tokens in the completion.
    pub max_tokens: u32,
}

impl AnthropicConfig {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            max_tokens: 4096,
        }
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Anthropic classification backend.
pub struct AnthropicClassifier {
    config: AnthropicConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicClassifier {
    pub fn new(config: AnthropicConfig) -> Result<Self, ClassifierError> {
        if config.api_key.is_empty() {
            return Err(ClassifierError::MissingCredential("api key".to_string()));
        }
        Ok(Self {
            config,
            http_client: super::build_http_client()?,
        })
    }
}

#[async_trait]
impl Classifier for AnthropicClassifier {
    async fn classify(&self, request: &ClassifyRequest) -> Result<String, ClassifierError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": 0,
            "system": prompt::system_instruction(request),
            "messages": [{"role": "user", "content": prompt::user_message(request)}],
        });

        debug!(endpoint = %self.config.endpoint, model = %self.config.model, "Sending classification request");

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
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

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Http(e.to_string()))?;

        let text: String = parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(ClassifierError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_rejects_empty_api_key() {
        let config = AnthropicConfig::new("https://api.example.com/v1/messages", "m", "");
        assert!(matches!(
            AnthropicClassifier::new(config),
            Err(ClassifierError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = AnthropicConfig::new("https://api.example.com/v1/messages", "m", "sk-secret");
        let dump = format!("{config:?}");
        assert!(!dump.contains("sk-secret"));
        assert!(dump.contains("<redacted>"));
    }
}
