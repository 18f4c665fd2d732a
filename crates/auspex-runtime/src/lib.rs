//! # auspex-runtime
//!
//! Multi-provider LLM dispatch and consensus orchestration for Auspex.
//!
//! This crate owns everything that touches the network: provider adapters
//! behind the [`ProviderClient`](providers::ProviderClient) capability,
//! credential resolution, concurrent fan-out with per-call timeouts, and
//! the gateway-facing wire contract. The consensus arithmetic itself is
//! `auspex-core` and stays deterministic and I/O-free.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use auspex_core::EvaluationQuestion;
//! use auspex_runtime::{ConsensusEngineBuilder, EnvCredentials, RuntimeConfig};
//!
//! let engine = ConsensusEngineBuilder::new()
//!     .credentials(Arc::new(EnvCredentials))
//!     .config(RuntimeConfig::default())
//!     .build()?;
//!
//! let question = EvaluationQuestion::new("Who wins?", "Red", "Blue")?;
//! let result = engine.evaluate(&question).await?;
//! ```
//!
//! ## Features
//!
//! Adapters are feature-gated so embedders only compile the HTTP stack
//! they use: `openai`, `deepseek`, `gemini`, or `all-providers`.

pub mod cache;
pub mod config;
pub mod engine;
pub mod prompts;
pub mod providers;
pub mod usage;
pub mod wire;

// Re-export main types at crate root
pub use cache::{CacheKey, ConsensusCache};
pub use config::{ConfigError, ProviderSpec, RuntimeConfig};
pub use engine::{
    AttemptOutcome, ConsensusEngine, ConsensusEngineBuilder, EngineError, EvaluationReport,
    FailureKind, ProviderAttempt, ProviderFailure,
};
pub use providers::{
    ApiCredential, CompletionConfig, CompletionResponse, CredentialResolver, CredentialSource,
    EnvCredentials, ProviderClient, ProviderError, ProviderFactory, ProviderRegistry,
    StaticCredentials, TokenUsage,
};
pub use usage::{EvaluationUsage, UsageTracker};
pub use wire::{DetailedResponse, ErrorBody, EvaluateRequest, EvaluateResponse, VoteCounts};
