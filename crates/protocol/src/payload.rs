//! Client-side outbound payloads.

use serde_json::Value;

/// A payload the client sends as one text frame.
///
/// Callers choose the variant explicitly; structured values are
/// serialized as compact JSON when the frame is built.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundPayload {
    Text(String),
    Structured(Value),
}

impl OutboundPayload {
    /// Builds a payload from user input.
    ///
    /// Returns `None` for empty or whitespace-only input. The input is
    /// trimmed; if it is delimited by `{}` or `[]` and parses as JSON it
    /// becomes [`Structured`](Self::Structured), otherwise the trimmed
    /// text is sent as-is.
    pub fn from_input(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if looks_like_json(trimmed)
            && let Ok(value) = serde_json::from_str::<Value>(trimmed)
        {
            return Some(OutboundPayload::Structured(value));
        }

        Some(OutboundPayload::Text(trimmed.to_owned()))
    }

    /// Renders the exact text transmitted on the wire.
    pub fn into_frame(self) -> String {
        match self {
            OutboundPayload::Text(text) => text,
            OutboundPayload::Structured(value) => value.to_string(),
        }
    }
}

fn looks_like_json(s: &str) -> bool {
    (s.starts_with('{') && s.ends_with('}')) || (s.starts_with('[') && s.ends_with(']'))
}
