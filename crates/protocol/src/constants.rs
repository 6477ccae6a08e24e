use serde::{Deserialize, Serialize};

/// HTTP path that accepts the WebSocket upgrade.
pub const WS_PATH: &str = "/ws";

/// Maximum inbound message size in bytes (16 MB).
pub const WS_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Deepest array/object nesting decoded as structured JSON. Deeper
/// frames are echoed as raw text.
pub const MAX_JSON_DEPTH: usize = 256;

/// Default number of queued outbound bytes at which a session reports
/// backpressure (1 MB).
pub const DEFAULT_BACKPRESSURE_THRESHOLD: usize = 1024 * 1024;

/// Text carried by the `welcome` envelope.
pub const WELCOME_MESSAGE: &str = "Connected to WebSocket server";

/// Client log notice recorded when a session opens.
pub const CONNECTED_NOTICE: &str = "Connected to WebSocket server";

/// Client log notice recorded when a session ends.
pub const DISCONNECTED_NOTICE: &str = "Disconnected from WebSocket server";

/// Envelope type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Sent once when a session opens.
    #[serde(rename = "welcome")]
    Welcome,
    /// Sent once per inbound message.
    #[serde(rename = "echo")]
    Echo,
}

impl MessageType {
    /// Returns the wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Welcome => "welcome",
            MessageType::Echo => "echo",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
