//! Credential handling for LLM providers.
//!
//! Two jobs live here:
//!
//! 1. [`ApiCredential`]: a secrecy-wrapped key that cannot leak through
//!    `Debug`/`Display` and is zeroed on drop.
//! 2. [`CredentialResolver`]: the injected capability that maps a
//!    provider name to its credential. The engine is constructed with a
//!    resolver instead of reading environment variables itself, so tests
//!    and gateways with inline credentials supply their own without
//!    touching process-wide state.
//!
//! ## Usage
//!
//! ```ignore
//! use auspex_runtime::providers::{CredentialResolver, EnvCredentials};
//!
//! let resolver = EnvCredentials;          // looks up OPENAI_API_KEY etc.
//! let cred = resolver.resolve("openai")?;
//! request.header("authorization", format!("Bearer {}", cred.expose()));
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
///
/// Useful for debugging configuration issues without exposing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from an environment variable
    Environment,
    /// Supplied inline by the caller (request body or config)
    Inline,
    /// Provided programmatically (tests, embedding hosts)
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Inline => write!(f, "inline"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
///
/// `Debug` and `Display` show `[REDACTED]`; the value is only reachable
/// through an explicit [`expose`](ApiCredential::expose) at the point of
/// use, typically while setting an HTTP header.
#[derive(Clone)]
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
}

impl ApiCredential {
    /// Wrap a credential value.
    pub fn new(value: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
        }
    }

    /// Expose the credential for use in an API call.
    ///
    /// Only call this where the value is actually needed; never store the
    /// exposed string.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Check if the credential is empty.
    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    /// Get the source of this credential.
    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED] from {}", self.source)
    }
}

/// Capability that resolves a provider name to its API credential.
///
/// Injected into the engine at construction. A failed resolution fails
/// only that provider's attempt; the evaluation carries on with the rest
/// of the roster.
pub trait CredentialResolver: Send + Sync {
    /// Resolve the credential for `provider`.
    fn resolve(&self, provider: &str) -> Result<ApiCredential, ProviderError>;

    /// Check availability without handing the credential out.
    fn is_available(&self, provider: &str) -> bool {
        self.resolve(provider).is_ok()
    }
}

/// Environment variable name for a provider's API key.
///
/// `openai` → `OPENAI_API_KEY`, `deepseek` → `DEEPSEEK_API_KEY`; dashes
/// become underscores.
pub fn env_var_for(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_uppercase().replace('-', "_"))
}

/// Resolver backed by `<PROVIDER_NAME>_API_KEY` environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialResolver for EnvCredentials {
    fn resolve(&self, provider: &str) -> Result<ApiCredential, ProviderError> {
        let var = env_var_for(provider);
        match std::env::var(&var) {
            Ok(value) if !value.trim().is_empty() => {
                Ok(ApiCredential::new(value, CredentialSource::Environment))
            }
            _ => Err(ProviderError::MissingCredential(format!(
                "set the {} environment variable",
                var
            ))),
        }
    }
}

/// Resolver backed by an in-memory map.
///
/// The deployment shape for gateways that receive inline per-provider
/// credentials, and the test double everywhere else.
#[derive(Default)]
pub struct StaticCredentials {
    keys: BTreeMap<String, ApiCredential>,
}

impl StaticCredentials {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential for a provider.
    pub fn with(mut self, provider: impl Into<String>, value: impl Into<String>) -> Self {
        self.keys.insert(
            provider.into(),
            ApiCredential::new(value, CredentialSource::Inline),
        );
        self
    }
}

impl CredentialResolver for StaticCredentials {
    fn resolve(&self, provider: &str) -> Result<ApiCredential, ProviderError> {
        match self.keys.get(provider) {
            Some(cred) if !cred.is_empty() => Ok(cred.clone()),
            _ => Err(ProviderError::MissingCredential(format!(
                "no credential registered for provider '{}'",
                provider
            ))),
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("providers", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_redacted_in_debug() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Programmatic);

        let debug = format!("{:?}", cred);
        assert!(!debug.contains(secret), "secret exposed in Debug!");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_credential_redacted_in_display() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Inline);

        let display = format!("{}", cred);
        assert!(!display.contains(secret), "secret exposed in Display!");
        assert!(display.contains("inline"));
    }

    #[test]
    fn test_credential_expose() {
        let cred = ApiCredential::new("sk-key", CredentialSource::Programmatic);
        assert_eq!(cred.expose(), "sk-key");
    }

    #[test]
    fn test_env_var_naming() {
        assert_eq!(env_var_for("openai"), "OPENAI_API_KEY");
        assert_eq!(env_var_for("deepseek"), "DEEPSEEK_API_KEY");
        assert_eq!(env_var_for("my-provider"), "MY_PROVIDER_API_KEY");
    }

    #[test]
    fn test_env_resolver_missing_var() {
        let err = EnvCredentials.resolve("nonexistent-provider-xyz").unwrap_err();
        assert!(err.is_missing_credential());
        assert!(err.to_string().contains("NONEXISTENT_PROVIDER_XYZ_API_KEY"));
    }

    #[test]
    fn test_env_resolver_reads_var() {
        std::env::set_var("TESTPROV_API_KEY", "env-key");
        let cred = EnvCredentials.resolve("testprov").unwrap();
        assert_eq!(cred.expose(), "env-key");
        assert_eq!(cred.source(), CredentialSource::Environment);
        std::env::remove_var("TESTPROV_API_KEY");
    }

    #[test]
    fn test_static_resolver() {
        let resolver = StaticCredentials::new().with("openai", "sk-test");

        assert!(resolver.is_available("openai"));
        assert!(!resolver.is_available("gemini"));
        assert_eq!(resolver.resolve("openai").unwrap().expose(), "sk-test");
        assert_eq!(
            resolver.resolve("openai").unwrap().source(),
            CredentialSource::Inline
        );
    }

    #[test]
    fn test_static_resolver_rejects_empty_value() {
        let resolver = StaticCredentials::new().with("openai", "");
        assert!(resolver.resolve("openai").unwrap_err().is_missing_credential());
    }

    #[test]
    fn test_static_resolver_debug_lists_names_only() {
        let resolver = StaticCredentials::new().with("openai", "sk-test");
        let debug = format!("{:?}", resolver);
        assert!(debug.contains("openai"));
        assert!(!debug.contains("sk-test"));
    }
}
