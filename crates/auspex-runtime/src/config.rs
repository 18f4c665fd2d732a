//! Runtime configuration for the consensus engine.
//!
//! Configuration is plain data loaded once (YAML file or defaults) and
//! treated as read-only afterward. Credentials never appear here; they go
//! through the injected [`CredentialResolver`](crate::providers::CredentialResolver).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use auspex_core::ConsensusPolicy;

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One entry in the provider roster.
///
/// `name` doubles as the adapter identifier in the
/// [`ProviderRegistry`](crate::providers::ProviderRegistry) and the key
/// the credential resolver is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Provider identifier ("openai", "deepseek", "gemini", ...)
    pub name: String,

    /// Model to request from this provider
    pub model: String,

    /// Custom API endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-provider temperature override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Per-provider output token override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ProviderSpec {
    /// A roster entry with no overrides.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            base_url: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Provider roster, in dispatch order
    #[serde(default = "default_roster")]
    pub providers: Vec<ProviderSpec>,

    /// Minimum self-reported confidence a verdict needs to vote
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,

    /// Vote threshold rule
    #[serde(default)]
    pub policy: ConsensusPolicy,

    /// Timeout applied independently to each provider call
    #[serde(default = "default_call_timeout", with = "humantime_duration")]
    pub call_timeout: Duration,

    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Default output token budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_roster() -> Vec<ProviderSpec> {
    vec![
        ProviderSpec::new("openai", "gpt-4o-mini"),
        ProviderSpec::new("deepseek", "deepseek-chat"),
        ProviderSpec::new("gemini", "gemini-2.0-flash"),
    ]
}

fn default_confidence_floor() -> f64 {
    0.7
}

fn default_call_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    500
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            providers: default_roster(),
            confidence_floor: default_confidence_floor(),
            policy: ConsensusPolicy::default(),
            call_timeout: default_call_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl RuntimeConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(ConfigError::Invalid(format!(
                "confidence_floor must be within [0, 1], got {}",
                self.confidence_floor
            )));
        }

        let mut seen = std::collections::BTreeSet::new();
        for spec in &self.providers {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate provider '{}' in roster",
                    spec.name
                )));
            }
        }

        Ok(())
    }
}

/// Serde adapter for human-readable durations ("20s", "1m 30s").
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*d).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(d)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
