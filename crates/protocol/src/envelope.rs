use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::{MessageType, WELCOME_MESSAGE};

/// Envelope for every server-originated message.
///
/// Fields serialize in wire order: `type`, `data`, `message`, `timestamp`.
/// Absent optional fields are omitted rather than sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    /// Echoed value. `Some(Value::Null)` is a present `null`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// ISO-8601 UTC timestamp taken when the envelope is built.
    pub timestamp: String,
}

impl Envelope {
    /// Creates the `welcome` envelope sent when a session opens.
    pub fn welcome() -> Self {
        Self {
            msg_type: MessageType::Welcome,
            data: None,
            message: Some(WELCOME_MESSAGE.to_owned()),
            timestamp: timestamp_now(),
        }
    }

    /// Creates an `echo` envelope carrying `data`.
    pub fn echo(data: Value) -> Self {
        Self {
            msg_type: MessageType::Echo,
            data: Some(data),
            message: None,
            timestamp: timestamp_now(),
        }
    }

    /// Serializes the envelope into a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Current UTC time as ISO-8601 with millisecond precision,
/// e.g. `2024-05-01T12:00:00.000Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Maps a present field to `Some`, including an explicit `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn welcome_wire_shape() {
        let env = Envelope::welcome();
        let v: Value = serde_json::from_str(&env.to_json().unwrap()).unwrap();
        assert_eq!(v["type"], "welcome");
        assert_eq!(v["message"], "Connected to WebSocket server");
        assert!(v["timestamp"].is_string());
        assert!(v.get("data").is_none());
    }

    #[test]
    fn echo_wire_shape() {
        let env = Envelope::echo(json!({"a": 1}));
        let json = env.to_json().unwrap();
        assert!(json.starts_with(r#"{"type":"echo","data":{"a":1},"timestamp":""#));
        assert!(!json.contains("message"));
    }

    #[test]
    fn echo_of_null_keeps_data_field() {
        let env = Envelope::echo(Value::Null);
        let json = env.to_json().unwrap();
        assert!(json.contains(r#""data":null"#));

        let parsed: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.data, Some(Value::Null));
    }

    #[test]
    fn missing_data_parses_as_none() {
        let parsed: Envelope = serde_json::from_str(
            r#"{"type":"welcome","message":"hi","timestamp":"2024-01-01T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.data, None);
        assert_eq!(parsed.message.as_deref(), Some("hi"));
    }

    #[test]
    fn timestamp_is_iso8601_utc_millis() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'), "{ts}");
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000Z".len(), "{ts}");
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
