//! Verdict extraction from raw provider text.
//!
//! Providers are asked for JSON but routinely wrap it in prose or markdown
//! fences, so the parser locates the first balanced-brace JSON object in
//! the response before deserializing. Anything structurally wrong fails
//! loudly with a typed error; the one deliberate leniency is clamping
//! out-of-range confidence values instead of rejecting them.

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::verdict::ProviderVerdict;

/// Errors from verdict parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("field '{field}' is missing or has the wrong type")]
    InvalidSchema { field: &'static str },
}

/// Extract the first balanced-brace JSON object substring from `text`.
///
/// The scan respects JSON string literals and escapes, so braces inside a
/// `reasoning` string do not confuse it.
///
/// # Example
///
/// ```
/// use auspex_core::extract_json;
///
/// let text = "Sure! Here is my answer:\n```json\n{\"confidence\": 0.9}\n```";
/// assert_eq!(extract_json(text), Some("{\"confidence\": 0.9}"));
/// assert_eq!(extract_json("no json here"), None);
/// ```
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a provider's raw text into a [`ProviderVerdict`].
///
/// Validation is structural only: the four required fields must be present
/// with the right primitive types. Whether `optionATrue` and `optionBTrue`
/// are simultaneously true or false is resolved downstream during vote
/// tallying, not here.
pub fn parse_verdict(provider: &str, text: &str) -> Result<ProviderVerdict, ParseError> {
    let json = extract_json(text)
        .ok_or_else(|| ParseError::MalformedResponse("no JSON object in response".to_string()))?;

    let value: JsonValue = serde_json::from_str(json)
        .map_err(|e| ParseError::MalformedResponse(e.to_string()))?;

    let option_a_true = field(&value, &["optionATrue", "option_a_true"])
        .and_then(JsonValue::as_bool)
        .ok_or(ParseError::InvalidSchema { field: "optionATrue" })?;

    let option_b_true = field(&value, &["optionBTrue", "option_b_true"])
        .and_then(JsonValue::as_bool)
        .ok_or(ParseError::InvalidSchema { field: "optionBTrue" })?;

    let confidence = field(&value, &["confidence"])
        .and_then(JsonValue::as_f64)
        .ok_or(ParseError::InvalidSchema { field: "confidence" })?;

    let reasoning = field(&value, &["reasoning"])
        .and_then(JsonValue::as_str)
        .ok_or(ParseError::InvalidSchema { field: "reasoning" })?;

    // ProviderVerdict::new clamps out-of-range confidence
    Ok(ProviderVerdict::new(
        provider,
        option_a_true,
        option_b_true,
        confidence,
        reasoning,
    ))
}

/// Look a field up under its schema name or snake_case alias.
fn field<'a>(value: &'a JsonValue, names: &[&str]) -> Option<&'a JsonValue> {
    names.iter().find_map(|n| value.get(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::VoteChoice;
    use proptest::prelude::*;

    const CLEAN: &str =
        r#"{"optionATrue": true, "optionBTrue": false, "confidence": 0.85, "reasoning": "A leads the polls."}"#;

    #[test]
    fn test_parse_clean_json() {
        let v = parse_verdict("openai", CLEAN).unwrap();
        assert_eq!(v.provider, "openai");
        assert_eq!(v.vote(), VoteChoice::OptionA);
        assert_eq!(v.confidence, 0.85);
        assert_eq!(v.reasoning, "A leads the polls.");
    }

    #[test]
    fn test_parse_json_wrapped_in_prose_and_fences() {
        let text = format!("Certainly! My evaluation:\n```json\n{}\n```\nLet me know.", CLEAN);
        let v = parse_verdict("gemini", &text).unwrap();
        assert!(v.option_a_true);
        assert!(!v.option_b_true);
    }

    #[test]
    fn test_extract_json_survives_braces_in_strings() {
        let text = r#"{"optionATrue": false, "optionBTrue": true, "confidence": 0.8, "reasoning": "the {spread} narrowed"}"#;
        assert_eq!(extract_json(text), Some(text));

        let v = parse_verdict("deepseek", text).unwrap();
        assert_eq!(v.reasoning, "the {spread} narrowed");
    }

    #[test]
    fn test_no_json_is_malformed() {
        let err = parse_verdict("p", "I cannot answer that.").unwrap_err();
        assert!(matches!(err, ParseError::MalformedResponse(_)));
    }

    #[test]
    fn test_unparseable_json_is_malformed() {
        let err = parse_verdict("p", r#"{"optionATrue": tru"#).unwrap_err();
        assert!(matches!(err, ParseError::MalformedResponse(_)));
    }

    #[test]
    fn test_unterminated_object_is_malformed() {
        // Balanced scan never closes, so extraction itself fails.
        let err = parse_verdict("p", r#"text {"optionATrue": true, "reasoning": "..."#).unwrap_err();
        assert!(matches!(err, ParseError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let text = r#"{"optionATrue": true, "optionBTrue": false, "reasoning": "no confidence"}"#;
        assert_eq!(
            parse_verdict("p", text).unwrap_err(),
            ParseError::InvalidSchema { field: "confidence" }
        );
    }

    #[test]
    fn test_wrong_type_names_the_field() {
        let text = r#"{"optionATrue": "yes", "optionBTrue": false, "confidence": 0.9, "reasoning": ""}"#;
        assert_eq!(
            parse_verdict("p", text).unwrap_err(),
            ParseError::InvalidSchema { field: "optionATrue" }
        );

        let text = r#"{"optionATrue": true, "optionBTrue": false, "confidence": "high", "reasoning": ""}"#;
        assert_eq!(
            parse_verdict("p", text).unwrap_err(),
            ParseError::InvalidSchema { field: "confidence" }
        );
    }

    #[test]
    fn test_snake_case_aliases_accepted() {
        let text = r#"{"option_a_true": true, "option_b_true": false, "confidence": 0.75, "reasoning": "ok"}"#;
        let v = parse_verdict("p", text).unwrap();
        assert_eq!(v.vote(), VoteChoice::OptionA);
    }

    #[test]
    fn test_out_of_range_confidence_clamped_not_rejected() {
        let high = r#"{"optionATrue": true, "optionBTrue": false, "confidence": 1.5, "reasoning": ""}"#;
        assert_eq!(parse_verdict("p", high).unwrap().confidence, 1.0);

        let low = r#"{"optionATrue": true, "optionBTrue": false, "confidence": -0.3, "reasoning": ""}"#;
        assert_eq!(parse_verdict("p", low).unwrap().confidence, 0.0);
    }

    proptest! {
        #[test]
        fn prop_parsed_confidence_always_in_unit_range(c in -100.0f64..100.0) {
            let text = format!(
                r#"{{"optionATrue": true, "optionBTrue": false, "confidence": {}, "reasoning": "x"}}"#,
                c
            );
            let v = parse_verdict("p", &text).unwrap();
            prop_assert!((0.0..=1.0).contains(&v.confidence));
        }

        #[test]
        fn prop_extract_json_returns_balanced_object(prefix in "[^{}]{0,40}", reasoning in "[a-z {}]{0,30}") {
            let json = format!(r#"{{"reasoning": "{}"}}"#, reasoning);
            let text = format!("{}{}", prefix, json);
            let extracted = extract_json(&text);
            prop_assert_eq!(extracted, Some(json.as_str()));
        }
    }
}
