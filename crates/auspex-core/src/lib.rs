//! # auspex-core
//!
//! Deterministic consensus engine for multi-provider oracle verdicts.
//!
//! This crate turns a set of independent provider verdicts on a binary
//! prediction-market question into a single consensus result. It contains
//! no I/O: fetching verdicts from actual LLM services lives in
//! `auspex-runtime`.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same verdict set always produces the same result
//! 2. **Order-independent**: The reduction does not depend on the order in
//!    which provider calls completed
//! 3. **Truthful**: A missing or ambiguous consensus is reported as-is,
//!    never papered over with a default verdict
//!
//! ## Example
//!
//! ```rust,ignore
//! use auspex_core::{parse_verdict, reduce, ConsensusPolicy};
//!
//! let verdict = parse_verdict("openai", raw_text)?;
//! let result = reduce(&[verdict], ConsensusPolicy::Majority)?;
//! println!("A: {} B: {}", result.option_a_true, result.option_b_true);
//! ```

pub mod consensus;
pub mod parser;
pub mod policy;
pub mod question;
pub mod tally;
pub mod verdict;

// Re-export main types at crate root
pub use consensus::{reduce, ConsensusError, ConsensusResult};
pub use parser::{extract_json, parse_verdict, ParseError};
pub use policy::ConsensusPolicy;
pub use question::{EvaluationQuestion, InputError};
pub use tally::VoteTally;
pub use verdict::{ProviderVerdict, VoteChoice};
