//! Session handle shared between the pumps and the handler.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wsecho_protocol::Envelope;

use crate::state::SessionState;

/// Unique identity of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Error returned when a frame cannot be queued for a session.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("send failed: session closed")]
    Closed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    /// Bytes queued but not yet written to the socket.
    buffered: AtomicUsize,
    over_threshold: AtomicBool,
    backpressure_pending: AtomicBool,
    threshold: usize,
}

/// Handle to one session.
///
/// Cloneable and cheap. Sends are queued on an unbounded channel drained
/// by the write pump, so a send never blocks and is never dropped while
/// the session is open. Queued bytes are tracked; crossing the
/// backpressure threshold raises a one-shot signal that re-arms once the
/// queue drains below it.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    tx: mpsc::UnboundedSender<String>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl Session {
    /// Creates a session in the `Opening` state along with the receiving
    /// end of its outbound queue.
    pub(crate) fn new(
        backpressure_threshold: usize,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            id: SessionId::new(),
            tx,
            shared: Arc::new(Shared {
                state: AtomicU8::new(SessionState::Opening as u8),
                buffered: AtomicUsize::new(0),
                over_threshold: AtomicBool::new(false),
                backpressure_pending: AtomicBool::new(false),
                threshold: backpressure_threshold,
            }),
            cancel,
        };
        (session, rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Queues an envelope as a JSON text frame.
    ///
    /// Fails with [`SendError::Closed`] unless the session is `Open`.
    pub fn send(&self, envelope: &Envelope) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }
        let json = envelope.to_json()?;
        self.send_text(json)
    }

    /// Queues a raw text frame.
    pub fn send_text(&self, text: String) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }

        let len = text.len();
        let buffered = self.shared.buffered.fetch_add(len, Ordering::AcqRel) + len;

        // Flag before the frame is visible to the write pump, so a flush
        // can only ever clear it afterwards.
        if buffered >= self.shared.threshold
            && !self.shared.over_threshold.swap(true, Ordering::AcqRel)
        {
            self.shared.backpressure_pending.store(true, Ordering::Release);
        }

        if self.tx.send(text).is_err() {
            self.shared.buffered.fetch_sub(len, Ordering::AcqRel);
            return Err(SendError::Closed);
        }
        Ok(())
    }

    /// Bytes queued for this session that the socket has not taken yet.
    pub fn buffered_amount(&self) -> usize {
        self.shared.buffered.load(Ordering::Acquire)
    }

    /// Requests a server-initiated close. The pumps finish asynchronously.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Moves to `next` if the transition is valid from the current state.
    pub(crate) fn transition(&self, next: SessionState) -> bool {
        let mut current = self.shared.state.load(Ordering::Acquire);
        loop {
            if !SessionState::from_u8(current).can_transition_to(next) {
                return false;
            }
            match self.shared.state.compare_exchange(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Called by the write pump after a frame of `len` bytes is written.
    pub(crate) fn mark_flushed(&self, len: usize) {
        let remaining = self
            .shared
            .buffered
            .fetch_sub(len, Ordering::AcqRel)
            .saturating_sub(len);
        if remaining < self.shared.threshold {
            self.shared.over_threshold.store(false, Ordering::Release);
        }
    }

    /// Returns the queued byte count if backpressure was signalled since
    /// the last call.
    pub(crate) fn take_backpressure(&self) -> Option<usize> {
        self.shared
            .backpressure_pending
            .swap(false, Ordering::AcqRel)
            .then(|| self.buffered_amount())
    }
}
