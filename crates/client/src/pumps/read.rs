//! WebSocket read pump: records incoming frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use wsecho_protocol::constants::DISCONNECTED_NOTICE;
use wsecho_protocol::{Envelope, LogEntry};

use crate::session::Shared;

/// Reads frames until the connection ends or is cancelled.
///
/// Every text frame is appended to the log; frames that parse as an
/// [`Envelope`] are also published to subscribers. On exit the session is
/// marked closed and a `disconnected` notice is logged.
pub(crate) async fn read_pump<S>(
    mut read: S,
    shared: Arc<Shared>,
    open: Arc<AtomicBool>,
    write_tx: mpsc::UnboundedSender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            msg = read.next() => {
                match msg {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        handle_text_message(&shared, text.as_str());
                    }
                    Some(Ok(tungstenite::Message::Ping(data))) => {
                        trace!("received ping, sending pong");
                        let _ = write_tx.send(tungstenite::Message::Pong(data));
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        debug!(?frame, "received close frame");
                        break;
                    }
                    Some(Ok(_)) => {} // binary and pong frames are ignored
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        shared.push(LogEntry::notice(
                            format!("WebSocket error occurred: {e}"),
                            "error",
                        ));
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    open.store(false, Ordering::Release);
    cancel.cancel();
    shared.push(LogEntry::notice(DISCONNECTED_NOTICE, "disconnected"));
}

/// Handles a text frame from the WebSocket.
pub(crate) fn handle_text_message(shared: &Shared, text: &str) {
    shared.push(LogEntry::received_frame(text));

    match serde_json::from_str::<Envelope>(text) {
        Ok(envelope) => {
            trace!(msg_type = %envelope.msg_type, "received envelope");
            shared.publish(envelope);
        }
        Err(e) => trace!("frame is not an envelope: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use wsecho_protocol::{Direction, MessageType};

    #[test]
    fn envelope_logged_and_published() {
        let shared = Shared::new();
        let mut events = shared.subscribe();

        handle_text_message(
            &shared,
            r#"{"type":"echo","data":[1,2],"timestamp":"2024-01-01T00:00:00.000Z"}"#,
        );

        let log = shared.entries();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].direction, Direction::Received);
        assert_eq!(log[0].entry_type.as_deref(), Some("echo"));

        let env = events.try_recv().unwrap();
        assert_eq!(env.msg_type, MessageType::Echo);
        assert_eq!(env.data, Some(serde_json::json!([1, 2])));
    }

    #[test]
    fn raw_text_logged_not_published() {
        let shared = Shared::new();
        let mut events = shared.subscribe();

        handle_text_message(&shared, "plain words");

        assert_eq!(shared.entries()[0].content, "plain words");
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn read_pump_logs_disconnect_on_stream_end() {
        let shared = Arc::new(Shared::new());
        let open = Arc::new(AtomicBool::new(true));
        let (write_tx, _write_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let frames = stream::iter(vec![Ok(tungstenite::Message::Text(
            r#"{"type":"welcome","message":"hi","timestamp":"t"}"#.into(),
        ))]);

        read_pump(frames, Arc::clone(&shared), Arc::clone(&open), write_tx, cancel.clone()).await;

        assert!(!open.load(Ordering::Acquire));
        assert!(cancel.is_cancelled());
        let log = shared.entries();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].entry_type.as_deref(), Some("welcome"));
        assert_eq!(log[1].entry_type.as_deref(), Some("disconnected"));
        assert_eq!(log[1].content, DISCONNECTED_NOTICE);
    }

    #[tokio::test]
    async fn read_pump_answers_ping() {
        let shared = Arc::new(Shared::new());
        let open = Arc::new(AtomicBool::new(true));
        let (write_tx, mut write_rx) = mpsc::unbounded_channel();

        let frames = stream::iter(vec![Ok(tungstenite::Message::Ping(vec![7u8].into()))]);
        read_pump(frames, shared, open, write_tx, CancellationToken::new()).await;

        assert!(matches!(
            write_rx.try_recv(),
            Ok(tungstenite::Message::Pong(data)) if data[..] == [7u8]
        ));
    }

    #[tokio::test]
    async fn read_pump_logs_transport_error() {
        let shared = Arc::new(Shared::new());
        let open = Arc::new(AtomicBool::new(true));
        let (write_tx, _write_rx) = mpsc::unbounded_channel();

        let frames = stream::iter(vec![Err(tungstenite::Error::ConnectionClosed)]);
        read_pump(frames, Arc::clone(&shared), open, write_tx, CancellationToken::new()).await;

        let log = shared.entries();
        assert_eq!(log[0].entry_type.as_deref(), Some("error"));
        assert!(log[0].content.starts_with("WebSocket error occurred"));
        assert_eq!(log[1].entry_type.as_deref(), Some("disconnected"));
    }
}
