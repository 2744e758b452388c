//! Azure OpenAI chat-completions classification backend.
//!
//! Targets a deployment under an Azure OpenAI resource endpoint. The
//! prompt pair is split across system and user chat messages, so the
//! response contract stays identical to the other backends.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{prompt, Classifier, ClassifierError, ClassifyRequest};

const API_VERSION: &str = "2024-02-15-preview";

/// Azure OpenAI backend configuration.
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://myresource.openai.azure.com`.
    pub endpoint: String,

    /// Deployment name hosting the model.
    pub deployment: String,

    /// API key sent as `api-key`.
    pub api_key: String,
}

impl AzureOpenAiConfig {
    pub fn new(endpoint: &str, deployment: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment: deployment.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl std::fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Azure OpenAI classification backend.
#[derive(Debug)]
pub struct AzureOpenAiClassifier {
    config: AzureOpenAiConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

impl AzureOpenAiClassifier {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, ClassifierError> {
        let mut missing = Vec::new();
        if config.endpoint.is_empty() {
            missing.push("endpoint");
        }
        if config.deployment.is_empty() {
            missing.push("deployment");
        }
        if config.api_key.is_empty() {
            missing.push("api key");
        }
        if !missing.is_empty() {
            return Err(ClassifierError::MissingCredential(missing.join(", ")));
        }
        Ok(Self {
            config,
            http_client: super::build_http_client()?,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={API_VERSION}",
            self.config.endpoint, self.config.deployment
        )
    }
}

#[async_trait]
impl Classifier for AzureOpenAiClassifier {
    async fn classify(&self, request: &ClassifyRequest) -> Result<String, ClassifierError> {
        let body = json!({
            "temperature": 0,
            "messages": [
                {"role": "system", "content": prompt::system_instruction(request)},
                {"role": "user", "content": prompt::user_message(request)},
            ],
        });

        debug!(endpoint = %self.config.endpoint, deployment = %self.config.deployment, "Sending classification request");

        let response = self
            .http_client
            .post(self.completions_url())
            .header("api-key", &self.config.api_key)
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

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Http(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

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
    fn test_constructor_aggregates_missing_fields() {
        let err = AzureOpenAiClassifier::new(AzureOpenAiConfig::new("", "", "")).unwrap_err();
        match err {
            ClassifierError::MissingCredential(detail) => {
                assert!(detail.contains("endpoint"));
                assert!(detail.contains("deployment"));
                assert!(detail.contains("api key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_completions_url_shape() {
        let classifier = AzureOpenAiClassifier::new(AzureOpenAiConfig::new(
            "https://myresource.openai.azure.com/",
            "gpt-4o",
            "key",
        ))
        .unwrap();
        assert_eq!(
            classifier.completions_url(),
            "https://myresource.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = AzureOpenAiConfig::new("https://r.openai.azure.com", "d", "azkey-secret");
        let dump = format!("{config:?}");
        assert!(!dump.contains("azkey-secret"));
    }
}
