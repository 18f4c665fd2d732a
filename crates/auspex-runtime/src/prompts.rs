//! Prompts for oracle evaluation.
//!
//! Every adapter sends the same two pieces of text: a system instruction
//! framing the model as a prediction-market oracle, and a user instruction
//! embedding the question with a machine-readable schema request. Only the
//! wire shapes around them differ per provider.

/// System instruction shared by all providers.
///
/// The JSON-only framing matters: free-form hedging is the main source of
/// unparseable responses.
pub const ORACLE_SYSTEM_PROMPT: &str = r#"You are an oracle for prediction markets.
You evaluate a binary question and decide which of two outcomes is true.
Respond with valid JSON only. No prose, no markdown fences, no commentary
before or after the JSON object."#;

/// Build the user instruction for one evaluation question.
///
/// Embeds the question, both options, and the response schema the parser
/// expects. Exactly one of `optionATrue`/`optionBTrue` should be true, but
/// the schema does not force it; ambiguous answers are handled downstream.
pub fn evaluation_prompt(question: &auspex_core::EvaluationQuestion) -> String {
    format!(
        r#"Question: {question}

Option A: {option_a}
Option B: {option_b}

Decide which option is the true outcome and respond with a JSON object of
exactly this shape:

{{
  "optionATrue": <boolean, true if option A is the true outcome>,
  "optionBTrue": <boolean, true if option B is the true outcome>,
  "confidence": <number between 0.0 and 1.0>,
  "reasoning": <string, one short paragraph explaining your judgment>
}}"#,
        question = question.question,
        option_a = question.option_a,
        option_b = question.option_b,
    )
}
