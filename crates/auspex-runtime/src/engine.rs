//! The consensus engine: one question in, one audited verdict out.
//!
//! Pipeline per evaluation: dispatch → collect → filter → tally → reduce.
//! Every provider call is independent, so dispatch fans out concurrently
//! (one task per roster entry, each under its own timeout) and end-to-end
//! latency is bounded by the slowest single provider. A provider that
//! fails, times out, or returns garbage simply does not vote; only the
//! exhaustion of the whole roster surfaces as a request-level error.

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

use auspex_core::{
    parse_verdict, reduce, ConsensusResult, EvaluationQuestion, ParseError, ProviderVerdict,
};

use crate::config::{ProviderSpec, RuntimeConfig};
use crate::providers::{
    CompletionConfig, CredentialResolver, ProviderError, ProviderRegistry,
};
use crate::usage::{EvaluationUsage, UsageTracker};

/// Why a provider contributed no verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network, HTTP, API, or timeout failure
    Unavailable,
    /// No credential could be resolved
    MissingCredential,
    /// Response text contained no parseable JSON object
    MalformedResponse,
    /// JSON was parseable but a required field was missing or mistyped
    InvalidSchema,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Unavailable => write!(f, "unavailable"),
            FailureKind::MissingCredential => write!(f, "missing credential"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::InvalidSchema => write!(f, "invalid schema"),
        }
    }
}

/// One provider's failure, with its underlying cause.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProviderFailure {
    /// Provider that failed
    pub provider: String,
    /// Failure classification
    pub kind: FailureKind,
    /// Human-readable cause
    pub detail: String,
}

/// What happened to one roster entry during an evaluation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Accepted verdict that entered the consensus set
    Verdict { verdict: ProviderVerdict },
    /// Valid verdict dropped by the confidence floor
    Filtered { verdict: ProviderVerdict },
    /// No verdict produced
    Failed { failure: ProviderFailure },
}

/// Diagnostic record for one provider attempt.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProviderAttempt {
    /// Provider identifier
    pub provider: String,
    /// What happened
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Errors that surface to the caller as request failures.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no consensus possible: every provider failed or fell below the confidence floor ({filtered} filtered)")]
    NoConsensusPossible {
        failures: Vec<ProviderFailure>,
        filtered: usize,
    },

    #[error("missing credentials for every selected provider: {0}")]
    MissingCredential(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Full evaluation report: the result plus the per-provider audit trail.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EvaluationReport {
    /// The consensus verdict
    pub result: ConsensusResult,
    /// One entry per dispatched provider, in roster order
    pub attempts: Vec<ProviderAttempt>,
    /// Usage counters for this engine
    pub usage: EvaluationUsage,
}

/// The consensus engine.
///
/// Holds the adapter registry, the injected credential resolver, and the
/// runtime configuration. Clients are created per evaluation so a
/// credential problem costs one attempt, never the whole engine.
pub struct ConsensusEngine {
    registry: ProviderRegistry,
    credentials: Arc<dyn CredentialResolver>,
    config: RuntimeConfig,
    usage: UsageTracker,
}

impl ConsensusEngine {
    /// Create an engine.
    pub fn new(
        registry: ProviderRegistry,
        credentials: Arc<dyn CredentialResolver>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            registry,
            credentials,
            config,
            usage: UsageTracker::new(),
        }
    }

    /// Evaluate a question against the full configured roster.
    pub async fn evaluate(
        &self,
        question: &EvaluationQuestion,
    ) -> Result<ConsensusResult, EngineError> {
        self.evaluate_selected(question, None).await.map(|r| r.result)
    }

    /// Evaluate against a subset of the roster.
    ///
    /// Unknown names in the filter are skipped with a warning; this keeps
    /// callers working when a provider is removed from the deployment. A
    /// filter that matches nothing is an input error.
    pub async fn evaluate_selected(
        &self,
        question: &EvaluationQuestion,
        providers: Option<&[String]>,
    ) -> Result<EvaluationReport, EngineError> {
        question
            .validate()
            .map_err(|e| EngineError::InvalidInput(e.to_string()))?;

        let roster = self.select_roster(providers)?;
        let attempts = self.dispatch(question, &roster).await;

        let mut accepted: Vec<ProviderVerdict> = Vec::new();
        let mut failures: Vec<ProviderFailure> = Vec::new();
        let mut filtered = 0usize;

        for attempt in &attempts {
            match &attempt.outcome {
                AttemptOutcome::Verdict { verdict } => accepted.push(verdict.clone()),
                AttemptOutcome::Filtered { .. } => filtered += 1,
                AttemptOutcome::Failed { failure } => failures.push(failure.clone()),
            }
        }

        if accepted.is_empty() {
            if !failures.is_empty()
                && failures.iter().all(|f| f.kind == FailureKind::MissingCredential)
            {
                let detail = failures
                    .iter()
                    .map(|f| f.detail.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(EngineError::MissingCredential(detail));
            }
            return Err(EngineError::NoConsensusPossible { failures, filtered });
        }

        let result = reduce(&accepted, self.config.policy)
            .map_err(|_| EngineError::NoConsensusPossible { failures, filtered })?;

        Ok(EvaluationReport {
            result,
            attempts,
            usage: self.usage.snapshot(),
        })
    }

    /// Check every configured provider without making billable calls.
    pub async fn health_check(&self) -> Vec<(String, bool)> {
        let checks = self.config.providers.iter().map(|spec| async {
            let healthy = match self.registry.create(spec, self.credentials.as_ref()) {
                Ok(client) => client.health_check().await,
                Err(_) => false,
            };
            (spec.name.clone(), healthy)
        });

        futures::future::join_all(checks).await
    }

    /// Usage counters accumulated by this engine.
    pub fn usage(&self) -> EvaluationUsage {
        self.usage.snapshot()
    }

    /// Resolve the effective roster for one evaluation.
    fn select_roster(
        &self,
        providers: Option<&[String]>,
    ) -> Result<Vec<(usize, ProviderSpec)>, EngineError> {
        let roster: Vec<(usize, ProviderSpec)> = match providers {
            None => self.config.providers.iter().cloned().enumerate().collect(),
            Some(filter) => {
                for name in filter {
                    if !self.config.providers.iter().any(|s| &s.name == name) {
                        tracing::warn!(provider = %name, "unknown provider in filter, skipping");
                    }
                }
                self.config
                    .providers
                    .iter()
                    .cloned()
                    .enumerate()
                    .filter(|(_, spec)| filter.contains(&spec.name))
                    .collect()
            }
        };

        if roster.is_empty() {
            return Err(EngineError::InvalidInput(
                "no configured providers selected".to_string(),
            ));
        }

        Ok(roster)
    }

    /// Fan out to every roster entry, fan the attempts back in.
    ///
    /// Returns exactly one attempt per entry, in roster order, regardless
    /// of completion interleaving. The per-entry index is carried through
    /// the join so no outcome can be attributed to the wrong provider.
    async fn dispatch(
        &self,
        question: &EvaluationQuestion,
        roster: &[(usize, ProviderSpec)],
    ) -> Vec<ProviderAttempt> {
        let mut attempts: Vec<(usize, ProviderAttempt)> = Vec::with_capacity(roster.len());
        let mut tasks: JoinSet<(usize, ProviderAttempt)> = JoinSet::new();

        for (idx, spec) in roster {
            let client = match self.registry.create(spec, self.credentials.as_ref()) {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!(provider = %spec.name, error = %e, "provider unavailable before dispatch");
                    attempts.push((*idx, failed_attempt(&spec.name, &e)));
                    continue;
                }
            };

            let idx = *idx;
            let name = spec.name.clone();
            let question = question.clone();
            let cfg = self.completion_config(spec);
            let floor = self.config.confidence_floor;
            let usage = self.usage.clone();
            let timeout = cfg.timeout;

            tracing::debug!(provider = %name, model = %cfg.model, "dispatching provider call");

            tasks.spawn(async move {
                let outcome = match tokio::time::timeout(timeout, client.evaluate(&question, &cfg))
                    .await
                {
                    Err(_) => {
                        usage.record_failure();
                        let e = ProviderError::Timeout(timeout);
                        tracing::warn!(provider = %name, error = %e, "provider call timed out");
                        failed_attempt(&name, &e).outcome
                    }
                    Ok(Err(e)) => {
                        usage.record_failure();
                        tracing::warn!(provider = %name, error = %e, "provider call failed");
                        failed_attempt(&name, &e).outcome
                    }
                    Ok(Ok(completion)) => {
                        usage.record_completion(&completion.usage);
                        match parse_verdict(&name, &completion.content) {
                            Ok(verdict) if verdict.meets_floor(floor) => {
                                AttemptOutcome::Verdict { verdict }
                            }
                            Ok(verdict) => {
                                tracing::debug!(
                                    provider = %name,
                                    confidence = verdict.confidence,
                                    floor,
                                    "verdict below confidence floor"
                                );
                                AttemptOutcome::Filtered { verdict }
                            }
                            Err(e) => {
                                tracing::warn!(provider = %name, error = %e, "unusable provider response");
                                AttemptOutcome::Failed {
                                    failure: parse_failure(&name, &e),
                                }
                            }
                        }
                    }
                };

                (
                    idx,
                    ProviderAttempt {
                        provider: name,
                        outcome,
                    },
                )
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => attempts.push(pair),
                Err(e) => tracing::error!(error = %e, "provider task aborted"),
            }
        }

        attempts.sort_by_key(|(idx, _)| *idx);
        attempts.into_iter().map(|(_, attempt)| attempt).collect()
    }

    /// Per-provider completion config: spec overrides over engine defaults.
    fn completion_config(&self, spec: &ProviderSpec) -> CompletionConfig {
        CompletionConfig {
            model: spec.model.clone(),
            max_tokens: spec.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: spec.temperature.unwrap_or(self.config.temperature),
            timeout: self.config.call_timeout,
        }
    }
}

fn failed_attempt(provider: &str, error: &ProviderError) -> ProviderAttempt {
    let kind = if error.is_missing_credential() {
        FailureKind::MissingCredential
    } else {
        FailureKind::Unavailable
    };

    ProviderAttempt {
        provider: provider.to_string(),
        outcome: AttemptOutcome::Failed {
            failure: ProviderFailure {
                provider: provider.to_string(),
                kind,
                detail: error.to_string(),
            },
        },
    }
}

fn parse_failure(provider: &str, error: &ParseError) -> ProviderFailure {
    let kind = match error {
        ParseError::MalformedResponse(_) => FailureKind::MalformedResponse,
        ParseError::InvalidSchema { .. } => FailureKind::InvalidSchema,
    };

    ProviderFailure {
        provider: provider.to_string(),
        kind,
        detail: error.to_string(),
    }
}

/// Builder for [`ConsensusEngine`].
pub struct ConsensusEngineBuilder {
    registry: Option<ProviderRegistry>,
    credentials: Option<Arc<dyn CredentialResolver>>,
    config: RuntimeConfig,
}

impl ConsensusEngineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            registry: None,
            credentials: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the provider registry.
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the credential resolver.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialResolver>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine. The registry defaults to the built-in adapters.
    pub fn build(self) -> Result<ConsensusEngine, EngineError> {
        let registry = self.registry.unwrap_or_else(ProviderRegistry::with_defaults);
        let credentials = self.credentials.ok_or_else(|| {
            EngineError::InvalidInput("no credential resolver set".to_string())
        })?;

        Ok(ConsensusEngine::new(registry, credentials, self.config))
    }
}

impl Default for ConsensusEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
