//! OpenAI chat-completions provider.

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

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI provider speaking the chat-completions API.
pub struct OpenAiProvider {
    credential: ApiCredential,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a provider with the default endpoint.
    pub fn new(credential: ApiCredential) -> Self {
        Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Set a custom base URL (proxies, regional endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Chat-completions request format.
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

/// Chat-completions response format.
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
impl ProviderClient for OpenAiProvider {
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

        // Credential exposed only here, at the point of use
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
        "openai"
    }
}

/// Factory for creating OpenAI providers from a roster entry.
pub struct OpenAiProviderFactory;

impl ProviderFactory for OpenAiProviderFactory {
    fn provider_type(&self) -> &'static str {
        "openai"
    }

    fn create(
        &self,
        spec: &ProviderSpec,
        credentials: &dyn CredentialResolver,
    ) -> Result<Arc<dyn ProviderClient>, ProviderError> {
        validate_base_url(spec)?;
        let credential = credentials.resolve(&spec.name)?;

        let mut provider = OpenAiProvider::new(credential);
        if let Some(url) = &spec.base_url {
            provider = provider.with_base_url(url.clone());
        }
        Ok(Arc::new(provider))
    }

    fn description(&self) -> &'static str {
        "OpenAI chat-completions provider"
    }
}
