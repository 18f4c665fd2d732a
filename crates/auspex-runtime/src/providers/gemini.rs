//! Google Gemini provider.
//!
//! Gemini's generateContent API differs from the chat-completions family
//! on every axis that matters here: the key travels as a query parameter,
//! the system instruction is a dedicated field, and the assistant text
//! comes back as candidate content parts.

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

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider speaking the generateContent API.
pub struct GeminiProvider {
    credential: ApiCredential,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiProvider {
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
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[async_trait]
impl ProviderClient for GeminiProvider {
    async fn evaluate(
        &self,
        question: &EvaluationQuestion,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(prompts::ORACLE_SYSTEM_PROMPT.to_string()),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompts::evaluation_prompt(question)),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, config.model
        );

        // Gemini authenticates via query parameter rather than a header
        let response = self
            .client
            .post(url)
            .query(&[("key", self.credential.expose())])
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
            return Err(ProviderError::RateLimited { retry_after: None });
        }

        if !status.is_success() {
            let message = response
                .json::<GeminiError>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|e| e.to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let content = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::Decode("response carried no candidates".to_string()))?;

        let usage = body
            .usage_metadata
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            usage,
            model: body.model_version.unwrap_or_else(|| config.model.clone()),
        })
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Factory for creating Gemini providers from a roster entry.
pub struct GeminiProviderFactory;

impl ProviderFactory for GeminiProviderFactory {
    fn provider_type(&self) -> &'static str {
        "gemini"
    }

    fn create(
        &self,
        spec: &ProviderSpec,
        credentials: &dyn CredentialResolver,
    ) -> Result<Arc<dyn ProviderClient>, ProviderError> {
        validate_base_url(spec)?;
        let credential = credentials.resolve(&spec.name)?;

        let mut provider = GeminiProvider::new(credential);
        if let Some(url) = &spec.base_url {
            provider = provider.with_base_url(url.clone());
        }
        Ok(Arc::new(provider))
    }

    fn description(&self) -> &'static str {
        "Google Gemini generateContent provider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::secrets::{CredentialSource, StaticCredentials};

    #[test]
    fn test_provider_name() {
        let provider =
            GeminiProvider::new(ApiCredential::new("key", CredentialSource::Programmatic));
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_factory_create() {
        let resolver = StaticCredentials::new().with("gemini", "key");
        let spec = ProviderSpec::new("gemini", "gemini-2.0-flash");

        let client = GeminiProviderFactory.create(&spec, &resolver).unwrap();
        assert_eq!(client.name(), "gemini");
    }

    #[test]
    fn test_factory_missing_credential() {
        let resolver = StaticCredentials::new();
        let spec = ProviderSpec::new("gemini", "gemini-2.0-flash");

        let err = GeminiProviderFactory.create(&spec, &resolver).unwrap_err();
        assert!(err.is_missing_credential());
    }

    #[test]
    fn test_response_decoding_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "{\"optionATrue\": "}, {"text": "true}"}]
                }
            }],
            "usageMetadata": {"promptTokenCount": 90, "candidatesTokenCount": 30},
            "modelVersion": "gemini-2.0-flash"
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .filter_map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "{\"optionATrue\": true}");
    }
}
