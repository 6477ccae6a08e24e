//! Inbound frame decoding.
//!
//! Text frames are parsed as JSON when possible. Anything that does not
//! parse is carried through untouched as raw text; a parse failure is an
//! expected outcome, not an error.

use serde::Deserialize;
use serde_json::Value;

use crate::constants::MAX_JSON_DEPTH;

/// Result of decoding one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMessage {
    /// The frame was valid JSON.
    Structured(Value),
    /// The frame was not JSON; the original text, unchanged.
    Raw(String),
}

impl DecodedMessage {
    /// Returns `true` for the [`Structured`](Self::Structured) variant.
    pub fn is_structured(&self) -> bool {
        matches!(self, DecodedMessage::Structured(_))
    }

    /// Converts into the JSON value carried in an `echo` envelope.
    ///
    /// Raw text becomes a JSON string with identical contents.
    pub fn into_value(self) -> Value {
        match self {
            DecodedMessage::Structured(value) => value,
            DecodedMessage::Raw(text) => Value::String(text),
        }
    }
}

/// Decodes an inbound text frame.
///
/// Nesting up to [`MAX_JSON_DEPTH`] is accepted; deeper documents, and
/// strings that are not valid UTF-8 once unescaped (lone surrogates),
/// come back as [`Raw`](DecodedMessage::Raw).
pub fn decode(raw: &str) -> DecodedMessage {
    if nesting_depth(raw) > MAX_JSON_DEPTH {
        return DecodedMessage::Raw(raw.to_owned());
    }
    match parse_unbounded(raw) {
        Ok(value) => DecodedMessage::Structured(value),
        Err(_) => DecodedMessage::Raw(raw.to_owned()),
    }
}

/// Parses without serde_json's built-in 128-level limit; the caller
/// bounds depth with [`nesting_depth`].
fn parse_unbounded(raw: &str) -> Result<Value, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_str(raw);
    de.disable_recursion_limit();
    let value = Value::deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

/// Deepest bracket nesting outside string literals.
fn nesting_depth(raw: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for b in raw.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_object() {
        assert_eq!(decode(r#"{"a":1}"#), DecodedMessage::Structured(json!({"a": 1})));
    }

    #[test]
    fn decodes_array_and_primitives() {
        assert_eq!(decode("[1, 2, 3]"), DecodedMessage::Structured(json!([1, 2, 3])));
        assert_eq!(decode("42"), DecodedMessage::Structured(json!(42)));
        assert_eq!(decode("true"), DecodedMessage::Structured(json!(true)));
        assert_eq!(decode("null"), DecodedMessage::Structured(Value::Null));
        assert_eq!(decode("\"quoted\""), DecodedMessage::Structured(json!("quoted")));
    }

    #[test]
    fn plain_text_falls_back_to_raw() {
        assert_eq!(decode("hello"), DecodedMessage::Raw("hello".into()));
    }

    #[test]
    fn malformed_json_falls_back_to_raw() {
        let decoded = decode("{bad json");
        assert!(!decoded.is_structured());
        assert_eq!(decoded, DecodedMessage::Raw("{bad json".into()));
    }

    #[test]
    fn raw_preserves_whitespace_exactly() {
        let input = "  spaced out \n";
        assert_eq!(decode(input), DecodedMessage::Raw(input.into()));
    }

    #[test]
    fn empty_frame_is_raw() {
        assert_eq!(decode(""), DecodedMessage::Raw(String::new()));
    }

    #[test]
    fn structured_ignores_formatting() {
        let compact = decode(r#"{"a":1,"b":[true,null]}"#);
        let spaced = decode("{ \"a\" : 1,\n  \"b\" : [ true , null ] }");
        assert_eq!(compact, spaced);
    }

    #[test]
    fn decode_is_deterministic() {
        for input in ["hello", "{\"k\":\"v\"}", "[", "3.5"] {
            assert_eq!(decode(input), decode(input));
        }
    }

    fn nested_array(depth: usize) -> String {
        format!("{}{}", "[".repeat(depth), "]".repeat(depth))
    }

    #[test]
    fn deeply_nested_json_is_structured() {
        let decoded = decode(&nested_array(200));
        assert!(decoded.is_structured());

        let mut value = decoded.into_value();
        let mut levels = 1;
        while let Value::Array(mut items) = value {
            match items.pop() {
                Some(inner) => {
                    levels += 1;
                    value = inner;
                }
                None => break,
            }
        }
        assert_eq!(levels, 200);
    }

    #[test]
    fn nesting_at_the_limit_is_structured() {
        assert!(decode(&nested_array(MAX_JSON_DEPTH)).is_structured());
    }

    #[test]
    fn nesting_past_the_limit_is_raw() {
        let input = nested_array(MAX_JSON_DEPTH + 1);
        assert_eq!(decode(&input), DecodedMessage::Raw(input));
    }

    #[test]
    fn brackets_inside_strings_do_not_count() {
        let input = format!(r#"{{"s":"{}\"{}"}}"#, "[".repeat(1000), "{".repeat(1000));
        assert!(decode(&input).is_structured());
        assert_eq!(nesting_depth(&input), 1);
    }

    #[test]
    fn trailing_garbage_is_raw() {
        assert_eq!(decode("[1] x"), DecodedMessage::Raw("[1] x".into()));
    }

    #[test]
    fn lone_surrogate_is_raw() {
        let input = r#""\ud800""#;
        assert_eq!(decode(input), DecodedMessage::Raw(input.into()));
    }

    #[test]
    fn into_value_wraps_raw_as_string() {
        assert_eq!(decode("hi there").into_value(), json!("hi there"));
        assert_eq!(decode("[1]").into_value(), json!([1]));
    }
}
