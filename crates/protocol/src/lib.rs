//! Wire protocol for the wsecho WebSocket echo service.
//!
//! Shared by the server (envelope construction, inbound decoding) and the
//! client (outbound normalization, session log).

pub mod codec;
pub mod constants;
pub mod envelope;
pub mod log;
pub mod payload;

// Re-export primary types for convenience.
pub use codec::{DecodedMessage, decode};
pub use constants::MessageType;
pub use envelope::{Envelope, timestamp_now};
pub use log::{Direction, LogEntry};
pub use payload::OutboundPayload;
