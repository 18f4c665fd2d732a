//! Consensus threshold policies.
//!
//! Deployments disagree on what "enough votes" means: rosters of varying
//! size want a majority of whoever answered, while a fixed three-provider
//! roster often wants a flat two votes. Both are first-class here; neither
//! is hard-coded anywhere else.

use serde::{Deserialize, Serialize};

/// Rule deciding how many votes an option needs to reach consensus.
///
/// # Example
///
/// ```
/// use auspex_core::ConsensusPolicy;
///
/// let majority = ConsensusPolicy::Majority;
/// assert_eq!(majority.votes_needed(3), 2); // ceil(3 / 2)
/// assert_eq!(majority.votes_needed(4), 2);
///
/// let fixed: ConsensusPolicy = "atleast:2".parse().unwrap();
/// assert_eq!(fixed.votes_needed(5), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusPolicy {
    /// Ceiling of half the accepted verdicts
    #[default]
    Majority,

    /// A fixed absolute vote count
    AtLeast(usize),
}

impl ConsensusPolicy {
    /// Votes needed for consensus, given the number of accepted verdicts.
    pub fn votes_needed(&self, accepted: usize) -> usize {
        match self {
            ConsensusPolicy::Majority => accepted.div_ceil(2),
            ConsensusPolicy::AtLeast(n) => *n,
        }
    }

    /// Whether `votes` reaches the threshold for `accepted` verdicts.
    ///
    /// An empty accepted set never reaches consensus.
    pub fn is_reached(&self, votes: usize, accepted: usize) -> bool {
        accepted > 0 && votes >= self.votes_needed(accepted).max(1)
    }
}

impl std::fmt::Display for ConsensusPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusPolicy::Majority => write!(f, "majority"),
            ConsensusPolicy::AtLeast(n) => write!(f, "atleast:{}", n),
        }
    }
}

impl std::str::FromStr for ConsensusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "majority" => Ok(ConsensusPolicy::Majority),
            s if s.starts_with("atleast:") || s.starts_with("at_least:") => {
                let n: usize = s
                    .split(':')
                    .nth(1)
                    .ok_or("missing count after atleast:")?
                    .parse()
                    .map_err(|_| "invalid count for atleast")?;
                if n == 0 {
                    return Err("atleast count must be at least 1".to_string());
                }
                Ok(ConsensusPolicy::AtLeast(n))
            }
            _ => Err(format!(
                "unknown consensus policy: {}. Valid: majority, atleast:N",
                s
            )),
        }
    }
}
