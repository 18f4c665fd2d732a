//! Vote tallying over the accepted verdict set.

use serde::{Deserialize, Serialize};

use crate::verdict::{ProviderVerdict, VoteChoice};

/// Vote counts over the accepted verdicts of one evaluation.
///
/// Abstentions (ambiguous verdicts) are counted separately so the caller
/// can see that a provider answered without tipping the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    /// Votes cast for option A
    pub option_a: usize,
    /// Votes cast for option B
    pub option_b: usize,
    /// Accepted verdicts that cast no vote
    pub abstained: usize,
}

impl VoteTally {
    /// Tally the votes of a set of accepted verdicts.
    pub fn from_verdicts(verdicts: &[ProviderVerdict]) -> Self {
        let mut tally = Self::default();
        for v in verdicts {
            match v.vote() {
                VoteChoice::OptionA => tally.option_a += 1,
                VoteChoice::OptionB => tally.option_b += 1,
                VoteChoice::Abstain => tally.abstained += 1,
            }
        }
        tally
    }

    /// Total number of accepted verdicts behind this tally.
    pub fn total(&self) -> usize {
        self.option_a + self.option_b + self.abstained
    }
}
