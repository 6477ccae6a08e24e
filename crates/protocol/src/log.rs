//! Client session log entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{DecodedMessage, decode};
use crate::envelope::timestamp_now;

/// Which side produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// One line in a client session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub direction: Direction,
    pub content: String,
    pub timestamp: String,
    /// Envelope type or lifecycle notice kind, when known.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
}

impl LogEntry {
    /// Records the exact text of a transmitted frame.
    pub fn sent(content: impl Into<String>) -> Self {
        Self {
            direction: Direction::Sent,
            content: content.into(),
            timestamp: timestamp_now(),
            entry_type: None,
        }
    }

    /// Records a locally generated notice (connected, disconnected, error).
    pub fn notice(content: impl Into<String>, kind: &str) -> Self {
        Self {
            direction: Direction::Received,
            content: content.into(),
            timestamp: timestamp_now(),
            entry_type: Some(kind.to_owned()),
        }
    }

    /// Records an inbound text frame.
    ///
    /// JSON frames are pretty-printed and their `type` field, if it is a
    /// string, becomes the entry type. Other frames are kept verbatim.
    pub fn received_frame(text: &str) -> Self {
        let (content, entry_type) = match decode(text) {
            DecodedMessage::Structured(value) => {
                let entry_type = value
                    .get("type")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                let pretty =
                    serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_owned());
                (pretty, entry_type)
            }
            DecodedMessage::Raw(raw) => (raw, None),
        };

        Self {
            direction: Direction::Received,
            content,
            timestamp: timestamp_now(),
            entry_type,
        }
    }
}
