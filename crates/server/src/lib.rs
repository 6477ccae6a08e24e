//! WebSocket echo server.
//!
//! Serves a small HTTP API and upgrades `GET /ws` to a WebSocket session.
//! Each session is driven by a read pump and a write pump; lifecycle
//! events are dispatched to a [`SessionHandler`]. The stock
//! [`EchoHandler`] greets new sessions and echoes every text frame back
//! wrapped in an envelope.

mod api;
mod connection;
mod echo;
mod handler;
mod registry;
mod server;
mod session;
mod state;

pub use echo::EchoHandler;
pub use handler::{HandlerFuture, InboundFrame, SessionHandler};
pub use registry::ConnectionRegistry;
pub use server::{EchoServer, ServerConfig};
pub use session::{SendError, Session, SessionId};
pub use state::SessionState;

/// Errors produced by the echo server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server already running")]
    AlreadyRunning,
}
