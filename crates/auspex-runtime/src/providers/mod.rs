//! LLM provider abstractions for auspex-runtime.
//!
//! This module defines the capability every oracle provider implements
//! ("evaluate this question, give me raw text back") plus the built-in
//! adapters for OpenAI, DeepSeek, and Gemini. Adapters are the ONLY place
//! the code differs per provider: each one owns the translation between
//! the generic question and its native chat/generation wire shapes.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling; keys
//! are resolved through an injected [`CredentialResolver`], never read
//! from ambient process state inside an adapter.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use auspex_core::EvaluationQuestion;

mod factory;
pub mod secrets;

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "deepseek")]
mod deepseek;

#[cfg(feature = "gemini")]
mod gemini;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use secrets::{ApiCredential, CredentialResolver, CredentialSource, EnvCredentials, StaticCredentials};

#[cfg(feature = "openai")]
pub use openai::{OpenAiProvider, OpenAiProviderFactory};

#[cfg(feature = "deepseek")]
pub use deepseek::{DeepSeekProvider, DeepSeekProviderFactory};

#[cfg(feature = "gemini")]
pub use gemini::{GeminiProvider, GeminiProviderFactory};

/// Errors from LLM providers.
///
/// Every variant means the same thing to the consensus engine: this
/// provider produced no verdict. The variants exist so the attempt trail
/// can name the underlying cause.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode provider response: {0}")]
    Decode(String),

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether this failure is a credential problem rather than a
    /// transport or API one.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, ProviderError::MissingCredential(_))
    }
}

/// Configuration for one completion request.
///
/// Defaults bias toward deterministic, terse answers: low temperature and
/// a tight output budget. Callers may override both per request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_tokens: 500,
            temperature: 0.1,
            timeout: Duration::from_secs(20),
        }
    }
}

impl CompletionConfig {
    /// Config for a specific model with default sampling parameters.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Response from one provider call.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Raw assistant text
    pub content: String,

    /// Token usage
    pub usage: TokenUsage,

    /// Model that answered
    pub model: String,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction: one oracle judgment per call.
///
/// Implementations make exactly one outbound network call per invocation
/// and never retry; resilience against transient failures belongs to the
/// caller re-issuing the evaluation.
#[async_trait]
pub trait ProviderClient: Send + Sync + std::fmt::Debug {
    /// Ask the provider to evaluate the question, returning its raw text.
    async fn evaluate(
        &self,
        question: &EvaluationQuestion,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Check if the provider is usable without making a billable call.
    async fn health_check(&self) -> bool;

    /// Provider name for the attempt trail and metrics.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_config_defaults() {
        let config = CompletionConfig::default();
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_for_model() {
        let config = CompletionConfig::for_model("deepseek-chat");
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.max_tokens, 500);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_missing_credential_predicate() {
        assert!(ProviderError::MissingCredential("x".into()).is_missing_credential());
        assert!(!ProviderError::Http("x".into()).is_missing_credential());
    }
}
