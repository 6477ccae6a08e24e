//! The echo protocol.

use std::sync::Arc;

use tracing::{debug, info, warn};
use wsecho_protocol::{Envelope, codec};

use crate::handler::{HandlerFuture, InboundFrame, SessionHandler};
use crate::registry::ConnectionRegistry;
use crate::session::Session;

/// Greets each session and echoes every text frame back in an `echo`
/// envelope.
///
/// JSON frames are echoed as the parsed value (re-serialized), anything
/// else as the original string. Binary frames are ignored.
pub struct EchoHandler {
    registry: Arc<ConnectionRegistry>,
    welcome: bool,
}

impl EchoHandler {
    /// Creates a handler that tracks sessions in `registry`.
    ///
    /// When `welcome` is set, a `welcome` envelope is sent on open.
    pub fn new(registry: Arc<ConnectionRegistry>, welcome: bool) -> Self {
        Self { registry, welcome }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}

impl SessionHandler for EchoHandler {
    fn on_open(&self, session: Session) -> HandlerFuture<'_> {
        Box::pin(async move {
            self.registry.register(session.id());
            info!(
                session = %session.id(),
                open = self.registry.count(),
                "WebSocket connection opened"
            );

            if self.welcome
                && let Err(e) = session.send(&Envelope::welcome())
            {
                debug!(session = %session.id(), "welcome not sent: {e}");
            }
        })
    }

    fn on_message(&self, session: Session, frame: InboundFrame) -> HandlerFuture<'_> {
        Box::pin(async move {
            let text = match frame {
                InboundFrame::Text(text) => text,
                InboundFrame::Binary(data) => {
                    warn!(session = %session.id(), len = data.len(), "binary frame ignored");
                    return;
                }
            };

            debug!(session = %session.id(), "received message: {text}");

            let decoded = codec::decode(&text);
            let reply = Envelope::echo(decoded.into_value());
            if let Err(e) = session.send(&reply) {
                debug!(session = %session.id(), "echo not sent: {e}");
            }
        })
    }

    fn on_close(&self, session: Session) -> HandlerFuture<'_> {
        Box::pin(async move {
            self.registry.unregister(&session.id());
            info!(
                session = %session.id(),
                open = self.registry.count(),
                "WebSocket connection closed"
            );
        })
    }
}
