//! Client session controller.
//!
//! Owns at most one live connection to the echo server and keeps an
//! ordered log of everything sent and received on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wsecho_protocol::constants::{CONNECTED_NOTICE, WS_MAX_MESSAGE_SIZE, WS_PATH};
use wsecho_protocol::{Envelope, LogEntry, OutboundPayload};

/// Capacity of the envelope broadcast channel.
const EVENT_CAPACITY: usize = 64;

/// Errors from the client session.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),
}

/// State shared between the controller and its pumps.
pub(crate) struct Shared {
    log: std::sync::Mutex<Vec<LogEntry>>,
    events: broadcast::Sender<Envelope>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            log: std::sync::Mutex::new(Vec::new()),
            events,
        }
    }

    fn lock_log(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, entry: LogEntry) {
        self.lock_log().push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<LogEntry> {
        self.lock_log().clone()
    }

    pub(crate) fn clear(&self) {
        self.lock_log().clear();
    }

    pub(crate) fn publish(&self, envelope: Envelope) {
        // No subscribers is not an error.
        let _ = self.events.send(envelope);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.events.subscribe()
    }
}

/// A live connection and its pump tasks.
struct Connection {
    write_tx: mpsc::UnboundedSender<tungstenite::Message>,
    open: Arc<AtomicBool>,
    cancel: CancellationToken,
    read_handle: JoinHandle<()>,
    write_handle: JoinHandle<()>,
}

impl Connection {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.cancel.is_cancelled()
    }

    /// Closes the connection and waits for both pumps to finish.
    async fn shutdown(&mut self) {
        self.open.store(false, Ordering::Release);
        self.cancel.cancel();
        if let Err(e) = (&mut self.write_handle).await {
            warn!("write pump ended abnormally: {e}");
        }
        if let Err(e) = (&mut self.read_handle).await {
            warn!("read pump ended abnormally: {e}");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Drives one client connection at a time against a WebSocket endpoint.
///
/// Frames are only sent while connected; every sent frame, every received
/// frame and every lifecycle change is appended to the session log.
pub struct ClientSession {
    url: String,
    shared: Arc<Shared>,
    conn: Mutex<Option<Connection>>,
}

impl ClientSession {
    /// Creates a disconnected session targeting `url` (a `ws://` or
    /// `wss://` endpoint, see [`websocket_url`]).
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            shared: Arc::new(Shared::new()),
            conn: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Opens a connection, replacing any existing one.
    ///
    /// On failure an `error` entry is logged and the session stays
    /// disconnected.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let mut conn = self.conn.lock().await;
        if let Some(mut old) = conn.take() {
            debug!("replacing existing connection");
            old.shutdown().await;
        }

        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);

        let ws_stream = match tokio_tungstenite::connect_async_with_config(
            self.url.as_str(),
            Some(ws_config),
            false,
        )
        .await
        {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                warn!(url = %self.url, "connect failed: {e}");
                self.shared.push(LogEntry::notice(
                    format!("WebSocket error occurred: {e}"),
                    "error",
                ));
                return Err(e.into());
            }
        };

        info!(url = %self.url, "connected");
        self.shared
            .push(LogEntry::notice(CONNECTED_NOTICE, "connected"));

        let (write, read) = ws_stream.split();
        let (write_tx, write_rx) = mpsc::unbounded_channel::<tungstenite::Message>();
        let open = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let shared = Arc::clone(&self.shared);
            let open = Arc::clone(&open);
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::read::read_pump(
                read, shared, open, write_tx, cancel,
            ))
        };

        *conn = Some(Connection {
            write_tx,
            open,
            cancel,
            read_handle,
            write_handle,
        });
        Ok(())
    }

    /// Closes the connection if there is one. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        let old = self.conn.lock().await.take();
        if let Some(mut old) = old {
            info!(url = %self.url, "disconnecting");
            old.shutdown().await;
        }
    }

    /// Returns `true` while a connection is open.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.as_ref().is_some_and(Connection::is_open)
    }

    /// Sends user input.
    ///
    /// Blank input is refused; input that looks like a JSON object or
    /// array is normalized to compact JSON. Returns whether a frame was
    /// sent.
    pub async fn send(&self, input: &str) -> bool {
        match OutboundPayload::from_input(input) {
            Some(payload) => self.send_payload(payload).await,
            None => false,
        }
    }

    /// Sends a payload as one text frame if connected.
    ///
    /// Returns `false` without logging anything when there is no open
    /// connection. A connection whose writer has already gone away gets an
    /// `error` entry instead of a `sent` one.
    pub async fn send_payload(&self, payload: OutboundPayload) -> bool {
        let conn = self.conn.lock().await;
        let Some(conn) = conn.as_ref().filter(|c| c.is_open()) else {
            debug!("send refused: not connected");
            return false;
        };

        let frame = payload.into_frame();
        // Held across the send so the entry lands before any reply.
        let mut log = self.shared.lock_log();
        if let Err(e) = conn
            .write_tx
            .send(tungstenite::Message::Text(frame.clone().into()))
        {
            warn!("send failed: {e}");
            log.push(LogEntry::notice(
                format!("Error sending message: {e}"),
                "error",
            ));
            return false;
        }
        log.push(LogEntry::sent(frame));
        true
    }

    /// Returns a snapshot of the session log.
    pub fn log(&self) -> Vec<LogEntry> {
        self.shared.entries()
    }

    pub fn clear_log(&self) {
        self.shared.clear();
    }

    /// Subscribes to envelopes received from the server.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.shared.subscribe()
    }
}

/// Derives the WebSocket endpoint from a base address.
///
/// `http` maps to `ws` and `https` to `wss`; an address without a scheme
/// is treated as `ws`. The fixed path is appended.
pub fn websocket_url(base: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    let (scheme, rest) = match base.split_once("://") {
        Some(("https", rest)) | Some(("wss", rest)) => ("wss", rest),
        Some((_, rest)) => ("ws", rest),
        None => ("ws", base),
    };
    format!("{scheme}://{rest}{WS_PATH}")
}
