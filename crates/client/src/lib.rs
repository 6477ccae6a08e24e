//! Client session controller for the wsecho echo service.
//!
//! Opens one WebSocket session at a time, sends user input, and keeps an
//! append-only log of every frame sent and received.

pub(crate) mod pumps;
pub mod session;

pub use session::{ClientError, ClientSession, websocket_url};
