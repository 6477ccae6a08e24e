//! Handler trait for session lifecycle events.
//!
//! The server owns transport concerns (upgrade, pumps, close frames);
//! implementors decide what a session does when it opens, receives a
//! frame, comes under backpressure, or closes.

use std::future::Future;
use std::pin::Pin;

use crate::session::Session;

/// A boxed future returned by handler methods.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Payload of one inbound data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// Trait for handling session events.
///
/// For a given session the server awaits each call to completion before
/// dispatching the next one, so calls never overlap. Calls for different
/// sessions run concurrently.
pub trait SessionHandler: Send + Sync + 'static {
    /// Called once after the session enters `Open`.
    fn on_open(&self, session: Session) -> HandlerFuture<'_>;

    /// Called for every text or binary frame received while `Open`.
    fn on_message(&self, session: Session, frame: InboundFrame) -> HandlerFuture<'_>;

    /// Called once after the session reaches `Closed`.
    fn on_close(&self, session: Session) -> HandlerFuture<'_> {
        let _ = session;
        Box::pin(async {})
    }

    /// Called when queued outbound bytes cross the backpressure threshold.
    fn on_backpressure(&self, session: Session, buffered: usize) -> HandlerFuture<'_> {
        Box::pin(async move {
            tracing::warn!(session = %session.id(), buffered, "WebSocket backpressure");
        })
    }
}
