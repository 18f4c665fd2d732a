//! Gateway-facing wire contract.
//!
//! The HTTP gateway in front of this library is an external collaborator;
//! these serde types are the shapes it exchanges with us. Field names are
//! camelCase on the wire even though the domain types are snake_case;
//! gateway clients predate this crate.

use serde::{Deserialize, Serialize};

use auspex_core::{ConsensusResult, EvaluationQuestion, InputError};

use crate::engine::{EngineError, EvaluationReport, ProviderAttempt};
use crate::usage::EvaluationUsage;

/// An evaluation request as received from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    /// The question to resolve
    pub question: String,
    /// First candidate outcome
    pub option_a: String,
    /// Second candidate outcome
    pub option_b: String,
    /// Optional roster subset, by provider identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<String>>,
}

impl EvaluateRequest {
    /// Validate and split into the engine's inputs.
    pub fn into_parts(self) -> Result<(EvaluationQuestion, Option<Vec<String>>), InputError> {
        let question = EvaluationQuestion::new(self.question, self.option_a, self.option_b)?;
        Ok((question, self.providers))
    }
}

/// Vote counts as the gateway reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounts {
    pub option_a: usize,
    pub option_b: usize,
}

/// Successful evaluation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub option_a_true: bool,
    pub option_b_true: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub votes: VoteCounts,
    pub providers: Vec<String>,
}

impl From<&ConsensusResult> for EvaluateResponse {
    fn from(result: &ConsensusResult) -> Self {
        Self {
            option_a_true: result.option_a_true,
            option_b_true: result.option_b_true,
            confidence: result.confidence,
            reasoning: result.reasoning.clone(),
            votes: VoteCounts {
                option_a: result.votes.option_a,
                option_b: result.votes.option_b,
            },
            providers: result.providers.clone(),
        }
    }
}

/// Extended diagnostic response: the verdict plus every attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedResponse {
    #[serde(flatten)]
    pub response: EvaluateResponse,
    pub attempts: Vec<ProviderAttempt>,
    pub usage: EvaluationUsage,
}

impl From<&EvaluationReport> for DetailedResponse {
    fn from(report: &EvaluationReport) -> Self {
        Self {
            response: EvaluateResponse::from(&report.result),
            attempts: report.attempts.clone(),
            usage: report.usage,
        }
    }
}

/// Request-level error as the gateway serializes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Failure kind: `NoConsensusPossible`, `MissingCredential`, `InvalidInput`
    pub kind: String,
    /// Human-readable detail
    pub detail: String,
}

impl From<&EngineError> for ErrorBody {
    fn from(error: &EngineError) -> Self {
        let kind = match error {
            EngineError::NoConsensusPossible { .. } => "NoConsensusPossible",
            EngineError::MissingCredential(_) => "MissingCredential",
            EngineError::InvalidInput(_) => "InvalidInput",
        };
        Self {
            kind: kind.to_string(),
            detail: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auspex_core::{reduce, ConsensusPolicy, ProviderVerdict};

    #[test]
    fn test_request_parses_camel_case() {
        let body = r#"{
            "question": "Who wins?",
            "optionA": "Red",
            "optionB": "Blue",
            "providers": ["openai", "gemini"]
        }"#;
        let request: EvaluateRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.option_a, "Red");

        let (question, providers) = request.into_parts().unwrap();
        assert_eq!(question.option_b, "Blue");
        assert_eq!(providers.as_deref().map(|p| p.len()), Some(2));
    }

    #[test]
    fn test_request_without_providers() {
        let body = r#"{"question": "Q?", "optionA": "A", "optionB": "B"}"#;
        let request: EvaluateRequest = serde_json::from_str(body).unwrap();
        assert!(request.providers.is_none());
    }

    #[test]
    fn test_blank_input_fails_validation() {
        let body = r#"{"question": "", "optionA": "A", "optionB": "B"}"#;
        let request: EvaluateRequest = serde_json::from_str(body).unwrap();
        assert!(request.into_parts().is_err());
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let verdicts = vec![
            ProviderVerdict::new("openai", true, false, 0.8, "A leads"),
            ProviderVerdict::new("gemini", true, false, 0.9, "agree"),
        ];
        let result = reduce(&verdicts, ConsensusPolicy::Majority).unwrap();
        let response = EvaluateResponse::from(&result);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["optionATrue"], true);
        assert_eq!(json["optionBTrue"], false);
        assert_eq!(json["votes"]["optionA"], 2);
        assert_eq!(json["providers"][0], "openai");
    }

    #[test]
    fn test_error_body_kinds() {
        let cases: Vec<(EngineError, &str)> = vec![
            (
                EngineError::NoConsensusPossible {
                    failures: vec![],
                    filtered: 2,
                },
                "NoConsensusPossible",
            ),
            (
                EngineError::MissingCredential("set OPENAI_API_KEY".to_string()),
                "MissingCredential",
            ),
            (
                EngineError::InvalidInput("question must not be blank".to_string()),
                "InvalidInput",
            ),
        ];

        for (error, kind) in cases {
            let body = ErrorBody::from(&error);
            assert_eq!(body.kind, kind);
            assert!(!body.detail.is_empty());
        }
    }
}
