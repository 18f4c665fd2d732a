//! Provider factory pattern for dynamic adapter registration.
//!
//! New providers are added by registering a factory, not by extending an
//! enum or another branch of a switch; the consensus engine only ever sees
//! `Arc<dyn ProviderClient>`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut registry = ProviderRegistry::new();
//! registry.register(Arc::new(OpenAiProviderFactory));
//!
//! let client = registry.create(&spec, &resolver)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{CredentialResolver, ProviderClient, ProviderError};
use crate::config::ProviderSpec;

/// Factory for creating provider clients from a roster entry.
///
/// Each factory is responsible for:
/// 1. Validating its roster entry
/// 2. Resolving the credential through the injected resolver
/// 3. Creating client instances
pub trait ProviderFactory: Send + Sync {
    /// Unique identifier for this provider type.
    ///
    /// Examples: "openai", "deepseek", "gemini"
    fn provider_type(&self) -> &'static str;

    /// Create a client for the given roster entry.
    fn create(
        &self,
        spec: &ProviderSpec,
        credentials: &dyn CredentialResolver,
    ) -> Result<Arc<dyn ProviderClient>, ProviderError>;

    /// Validate a roster entry without creating a client.
    ///
    /// Use this for fast config validation during startup.
    fn validate(&self, spec: &ProviderSpec) -> Result<(), ProviderError> {
        validate_base_url(spec)
    }

    /// Human-readable description of this provider.
    fn description(&self) -> &'static str {
        "LLM provider"
    }
}

/// Shared roster-entry check: a custom endpoint must carry a scheme.
pub(crate) fn validate_base_url(spec: &ProviderSpec) -> Result<(), ProviderError> {
    if let Some(url) = &spec.base_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ProviderError::NotConfigured(
                "base_url must start with http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}

/// Registry of available provider factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory.
    ///
    /// A factory with the same type replaces the previous one.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    /// Create a client for a roster entry.
    pub fn create(
        &self,
        spec: &ProviderSpec,
        credentials: &dyn CredentialResolver,
    ) -> Result<Arc<dyn ProviderClient>, ProviderError> {
        self.factories
            .get(&spec.name)
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "unknown provider type: '{}'. Available: {:?}",
                    spec.name,
                    self.available_types()
                ))
            })?
            .create(spec, credentials)
    }

    /// Validate a roster entry against its factory.
    pub fn validate(&self, spec: &ProviderSpec) -> Result<(), ProviderError> {
        self.factories
            .get(&spec.name)
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!("unknown provider type: '{}'", spec.name))
            })?
            .validate(spec)
    }

    /// List available provider types.
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a provider type is registered.
    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    /// Create a registry with all built-in providers registered.
    #[allow(unused_mut)]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "openai")]
        registry.register(Arc::new(super::OpenAiProviderFactory));

        #[cfg(feature = "deepseek")]
        registry.register(Arc::new(super::DeepSeekProviderFactory));

        #[cfg(feature = "gemini")]
        registry.register(Arc::new(super::GeminiProviderFactory));

        registry
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{
        CompletionConfig, CompletionResponse, StaticCredentials, TokenUsage,
    };
    use async_trait::async_trait;
    use auspex_core::EvaluationQuestion;

    #[derive(Debug)]
    struct MockProvider {
        name: String,
    }

    #[async_trait]
    impl ProviderClient for MockProvider {
        async fn evaluate(
            &self,
            _question: &EvaluationQuestion,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                content: "{}".to_string(),
                usage: TokenUsage::default(),
                model: "mock".to_string(),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    struct MockProviderFactory;

    impl ProviderFactory for MockProviderFactory {
        fn provider_type(&self) -> &'static str {
            "mock"
        }

        fn create(
            &self,
            spec: &ProviderSpec,
            credentials: &dyn CredentialResolver,
        ) -> Result<Arc<dyn ProviderClient>, ProviderError> {
            credentials.resolve(&spec.name)?;
            Ok(Arc::new(MockProvider {
                name: spec.name.clone(),
            }))
        }

        fn description(&self) -> &'static str {
            "Mock provider for testing"
        }
    }

    #[test]
    fn test_registry_register_and_create() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockProviderFactory));

        assert!(registry.has_provider("mock"));
        assert!(!registry.has_provider("unknown"));

        let resolver = StaticCredentials::new().with("mock", "key");
        let spec = ProviderSpec::new("mock", "mock-model");
        let client = registry.create(&spec, &resolver);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().name(), "mock");
    }

    #[test]
    fn test_registry_unknown_provider() {
        let registry = ProviderRegistry::new();
        let resolver = StaticCredentials::new();
        let spec = ProviderSpec::new("unknown", "model");

        match registry.create(&spec, &resolver) {
            Err(ProviderError::NotConfigured(msg)) => {
                assert!(msg.contains("unknown provider type"));
            }
            _ => panic!("expected NotConfigured error"),
        }
    }

    #[test]
    fn test_registry_create_without_credential_fails() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockProviderFactory));

        let resolver = StaticCredentials::new();
        let spec = ProviderSpec::new("mock", "mock-model");
        let err = registry.create(&spec, &resolver).unwrap_err();
        assert!(err.is_missing_credential());
    }

    #[test]
    fn test_registry_available_types() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.available_types().is_empty());

        registry.register(Arc::new(MockProviderFactory));
        assert_eq!(registry.available_types(), vec!["mock"]);
    }

    #[test]
    fn test_validate_rejects_schemeless_base_url() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockProviderFactory));

        let mut spec = ProviderSpec::new("mock", "mock-model");
        spec.base_url = Some("not-a-url".to_string());
        assert!(registry.validate(&spec).is_err());

        spec.base_url = Some("https://example.com/v1".to_string());
        assert!(registry.validate(&spec).is_ok());
    }
}
