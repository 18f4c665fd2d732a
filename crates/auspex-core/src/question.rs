//! The evaluation question: one binary prediction-market query.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from question validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("question must not be blank")]
    BlankQuestion,

    #[error("option A must not be blank")]
    BlankOptionA,

    #[error("option B must not be blank")]
    BlankOptionB,
}

/// A binary prediction-market question with its two candidate outcomes.
///
/// Immutable input: created by the caller, consumed once per evaluation
/// run. Validation happens before any provider is contacted; a blank field
/// fails the whole request without a single network call.
///
/// # Example
///
/// ```
/// use auspex_core::EvaluationQuestion;
///
/// let q = EvaluationQuestion::new(
///     "Who wins the 2026 World Cup final?",
///     "Brazil",
///     "France",
/// ).unwrap();
/// assert_eq!(q.option_a, "Brazil");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationQuestion {
    /// The question being resolved
    pub question: String,
    /// First candidate outcome
    pub option_a: String,
    /// Second candidate outcome
    pub option_b: String,
}

impl EvaluationQuestion {
    /// Create a validated question.
    pub fn new(
        question: impl Into<String>,
        option_a: impl Into<String>,
        option_b: impl Into<String>,
    ) -> Result<Self, InputError> {
        let q = Self {
            question: question.into(),
            option_a: option_a.into(),
            option_b: option_b.into(),
        };
        q.validate()?;
        Ok(q)
    }

    /// Check that all three fields carry non-whitespace content.
    ///
    /// Deserialized questions (e.g. from a gateway request body) should be
    /// validated before dispatch; `serde` does not enforce this.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.question.trim().is_empty() {
            return Err(InputError::BlankQuestion);
        }
        if self.option_a.trim().is_empty() {
            return Err(InputError::BlankOptionA);
        }
        if self.option_b.trim().is_empty() {
            return Err(InputError::BlankOptionB);
        }
        Ok(())
    }
}
