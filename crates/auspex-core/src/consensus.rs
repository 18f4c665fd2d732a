//! Consensus reduction: accepted verdicts in, one result out.
//!
//! The reduction applies strict rules:
//! 1. An option is affirmed iff its vote count reaches the policy threshold
//! 2. Reported confidence is the arithmetic mean of ALL accepted verdicts,
//!    including abstentions
//! 3. An empty accepted set is an error, never a default verdict
//!
//! Both options failing the threshold ("no consensus either way") and both
//! reaching it (low threshold plus ambiguous verdicts) are legitimate,
//! reportable outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::ConsensusPolicy;
use crate::tally::VoteTally;
use crate::verdict::ProviderVerdict;

/// Errors from consensus reduction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("no accepted verdicts to reduce")]
    EmptyVerdictSet,
}

/// The oracle's final answer to one evaluation question.
///
/// Derived and immutable: created exactly once per evaluation request, not
/// persisted by the core. The reasoning trail quotes every accepted
/// verdict, abstainers included, to keep the decision auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Whether option A reached the vote threshold
    pub option_a_true: bool,
    /// Whether option B reached the vote threshold
    pub option_b_true: bool,
    /// Mean confidence of all accepted verdicts
    pub confidence: f64,
    /// Concatenated per-provider explanations
    pub reasoning: String,
    /// Providers that contributed an accepted verdict, in roster order
    pub providers: Vec<String>,
    /// Vote counts behind the decision
    pub votes: VoteTally,
    /// When the reduction happened
    pub evaluated_at: DateTime<Utc>,
}

/// Reduce a set of accepted verdicts to a [`ConsensusResult`].
///
/// The caller is responsible for confidence filtering; everything passed
/// here counts toward the mean and the reasoning trail. The reduction is a
/// pure fold over the set, so the outcome does not depend on completion
/// order as long as the slice order is fixed.
pub fn reduce(
    verdicts: &[ProviderVerdict],
    policy: ConsensusPolicy,
) -> Result<ConsensusResult, ConsensusError> {
    if verdicts.is_empty() {
        return Err(ConsensusError::EmptyVerdictSet);
    }

    let tally = VoteTally::from_verdicts(verdicts);
    let accepted = verdicts.len();

    let confidence =
        verdicts.iter().map(|v| v.confidence).sum::<f64>() / accepted as f64;

    let reasoning = verdicts
        .iter()
        .map(|v| format!("{}: {}", v.provider, v.reasoning))
        .collect::<Vec<_>>()
        .join("\n\n");

    let providers = verdicts.iter().map(|v| v.provider.clone()).collect();

    let option_a_true = policy.is_reached(tally.option_a, accepted);
    let option_b_true = policy.is_reached(tally.option_b, accepted);

    tracing::debug!(
        accepted,
        votes_a = tally.option_a,
        votes_b = tally.option_b,
        abstained = tally.abstained,
        %policy,
        "consensus reduced"
    );

    Ok(ConsensusResult {
        option_a_true,
        option_b_true,
        confidence,
        reasoning,
        providers,
        votes: tally,
        evaluated_at: Utc::now(),
    })
}
