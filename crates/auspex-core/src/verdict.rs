//! Verdict types: one provider's structured answer to the question.

use serde::{Deserialize, Serialize};

/// How a verdict counts during vote tallying.
///
/// A verdict that asserts exactly one option votes for it. Both-true and
/// both-false verdicts abstain: they still contribute to the confidence
/// mean and the reasoning trail, but an ambiguous judgment never tips the
/// result toward either option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    /// Votes for option A
    OptionA,
    /// Votes for option B
    OptionB,
    /// Casts no vote
    Abstain,
}

/// One provider's structured answer to the evaluation question.
///
/// Produced once per successful provider call and never mutated afterward.
/// Confidence is clamped into `[0, 1]` at construction regardless of the
/// upstream value; models occasionally emit 1.2 or -0.1.
///
/// # Example
///
/// ```
/// use auspex_core::{ProviderVerdict, VoteChoice};
///
/// let v = ProviderVerdict::new("openai", true, false, 0.85, "A is priced in.");
/// assert_eq!(v.vote(), VoteChoice::OptionA);
///
/// let clamped = ProviderVerdict::new("gemini", true, false, 1.4, "");
/// assert_eq!(clamped.confidence, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderVerdict {
    /// Identifier of the provider that produced this verdict
    pub provider: String,
    /// Whether the provider judged option A to be the true outcome
    pub option_a_true: bool,
    /// Whether the provider judged option B to be the true outcome
    pub option_b_true: bool,
    /// Self-reported confidence, clamped to [0, 1]
    pub confidence: f64,
    /// Free-text explanation from the provider
    pub reasoning: String,
}

impl ProviderVerdict {
    /// Create a verdict, clamping confidence into `[0, 1]`.
    pub fn new(
        provider: impl Into<String>,
        option_a_true: bool,
        option_b_true: bool,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            option_a_true,
            option_b_true,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
        }
    }

    /// Derive the vote this verdict casts.
    pub fn vote(&self) -> VoteChoice {
        match (self.option_a_true, self.option_b_true) {
            (true, false) => VoteChoice::OptionA,
            (false, true) => VoteChoice::OptionB,
            _ => VoteChoice::Abstain,
        }
    }

    /// Whether this verdict meets the given confidence floor.
    pub fn meets_floor(&self, floor: f64) -> bool {
        self.confidence >= floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_derivation() {
        let a = ProviderVerdict::new("p", true, false, 0.9, "");
        assert_eq!(a.vote(), VoteChoice::OptionA);

        let b = ProviderVerdict::new("p", false, true, 0.9, "");
        assert_eq!(b.vote(), VoteChoice::OptionB);

        let both = ProviderVerdict::new("p", true, true, 0.9, "");
        assert_eq!(both.vote(), VoteChoice::Abstain);

        let neither = ProviderVerdict::new("p", false, false, 0.9, "");
        assert_eq!(neither.vote(), VoteChoice::Abstain);
    }

    #[test]
    fn test_confidence_clamped_at_construction() {
        assert_eq!(ProviderVerdict::new("p", true, false, 1.5, "").confidence, 1.0);
        assert_eq!(ProviderVerdict::new("p", true, false, -0.3, "").confidence, 0.0);
        assert_eq!(ProviderVerdict::new("p", true, false, 0.42, "").confidence, 0.42);
    }

    #[test]
    fn test_meets_floor() {
        let v = ProviderVerdict::new("p", true, false, 0.7, "");
        assert!(v.meets_floor(0.7));
        assert!(!v.meets_floor(0.71));
    }
}
