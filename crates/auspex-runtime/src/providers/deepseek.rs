//! DeepSeek provider.
//!
//! DeepSeek exposes an OpenAI-compatible chat-completions API under its
//! own endpoint, so the wire shapes mirror the OpenAI adapter. Kept as a
//! separate adapter anyway: the compatibility is DeepSeek's promise, not
//! ours, and the two endpoints have diverged on fields before.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use auspex_core::EvaluationQuestion;

use super::{
    factory::{validate_base_url, ProviderFactory},
    secrets::{ApiCredential, CredentialResolver},
    CompletionConfig, CompletionResponse, ProviderClient, ProviderError, TokenUsage,
};
use crate::config::ProviderSpec;
use crate::prompts;

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// DeepSeek provider speaking its OpenAI-compatible chat API.
pub struct DeepSeekProvider {
    credential: ApiCredential,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for DeepSeekProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DeepSeekProvider {
    /// Create a provider with the default endpoint.
    pub fn new(credential: ApiCredential) -> Self {
        Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    model: String,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    error: ChatErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    message: String,
}

#[async_trait]
impl ProviderClient for DeepSeekProvider {
    async fn evaluate(
        &self,
        question: &EvaluationQuestion,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatRequestMessage {
                    role: "system",
                    content: prompts::ORACLE_SYSTEM_PROMPT.to_string(),
                },
                ChatRequestMessage {
                    role: "user",
                    content: prompts::evaluation_prompt(question),
                },
            ],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.credential.expose())
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::Http(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = response
                .json::<ChatError>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|e| e.to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Decode("response carried no choices".to_string()))?;

        let usage = body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            usage,
            model: body.model,
        })
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        "deepseek"
    }
}

/// Factory for creating DeepSeek providers from a roster entry.
pub struct DeepSeekProviderFactory;

impl ProviderFactory for DeepSeekProviderFactory {
    fn provider_type(&self) -> &'static str {
        "deepseek"
    }

    fn create(
        &self,
        spec: &ProviderSpec,
        credentials: &dyn CredentialResolver,
    ) -> Result<Arc<dyn ProviderClient>, ProviderError> {
        validate_base_url(spec)?;
        let credential = credentials.resolve(&spec.name)?;

        let mut provider = DeepSeekProvider::new(credential);
        if let Some(url) = &spec.base_url {
            provider = provider.with_base_url(url.clone());
        }
        Ok(Arc::new(provider))
    }

    fn description(&self) -> &'static str {
        "DeepSeek chat provider (OpenAI-compatible wire format)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::secrets::{CredentialSource, StaticCredentials};

    #[test]
    fn test_provider_name_and_default_endpoint() {
        let provider =
            DeepSeekProvider::new(ApiCredential::new("sk-test", CredentialSource::Programmatic));
        assert_eq!(provider.name(), "deepseek");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_factory_create() {
        let resolver = StaticCredentials::new().with("deepseek", "sk-test");
        let spec = ProviderSpec::new("deepseek", "deepseek-chat");

        let client = DeepSeekProviderFactory.create(&spec, &resolver).unwrap();
        assert_eq!(client.name(), "deepseek");
    }

    #[test]
    fn test_factory_missing_credential() {
        let resolver = StaticCredentials::new();
        let spec = ProviderSpec::new("deepseek", "deepseek-chat");

        let err = DeepSeekProviderFactory.create(&spec, &resolver).unwrap_err();
        assert!(err.is_missing_credential());
    }

    #[test]
    fn test_error_body_decoding() {
        let body = r#"{"error": {"message": "Insufficient Balance", "type": "invalid_request_error"}}"#;
        let parsed: ChatError = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Insufficient Balance");
    }
}
