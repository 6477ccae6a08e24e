//! Session driver: read/write pumps and lifecycle dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::handler::{InboundFrame, SessionHandler};
use crate::session::Session;
use crate::state::SessionState;

/// Drives one upgraded socket from open to close.
///
/// Runs the read pump inline and the write pump as a background task.
/// The session token is a child of `server_cancel`, so shutting the
/// server down closes every session.
pub(crate) async fn run_session<S, H>(
    socket: S,
    handler: Arc<H>,
    server_cancel: &CancellationToken,
    backpressure_threshold: usize,
) where
    S: Stream<Item = Result<Message, axum::Error>>
        + Sink<Message, Error = axum::Error>
        + Send
        + 'static,
    H: SessionHandler,
{
    let (session, rx) = Session::new(backpressure_threshold, server_cancel.child_token());
    let (ws_sink, ws_stream) = socket.split();

    let peer_closed = Arc::new(AtomicBool::new(false));
    let write_handle = tokio::spawn(write_pump(
        ws_sink,
        rx,
        session.clone(),
        Arc::clone(&peer_closed),
    ));

    session.transition(SessionState::Open);
    handler.on_open(session.clone()).await;
    signal_backpressure(&handler, &session).await;

    if read_pump(ws_stream, &session, &handler).await {
        peer_closed.store(true, Ordering::Release);
    }

    // No sends are accepted from here on; frames already queued are
    // flushed by the write pump before it sends the close frame.
    session.transition(SessionState::Closing);
    session.close();
    if let Err(e) = write_handle.await {
        debug!(session = %session.id(), "write pump join error: {e}");
    }
    session.transition(SessionState::Closed);
    handler.on_close(session).await;
}

/// Write pump: drains the outbound queue into the socket.
///
/// A close frame is sent on the way out unless the peer already closed,
/// in which case the transport has answered its close frame.
async fn write_pump<S>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<String>,
    session: Session,
    peer_closed: Arc<AtomicBool>,
) where
    S: Sink<Message, Error = axum::Error> + Send + Unpin,
{
    let cancel: CancellationToken = session.cancel_token().clone();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            frame = rx.recv() => {
                match frame {
                    Some(text) => {
                        if !write_frame(&mut sink, &session, text).await {
                            // Socket is gone; stop the read pump too.
                            session.close();
                            return;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    while let Ok(text) = rx.try_recv() {
        if !write_frame(&mut sink, &session, text).await {
            return;
        }
    }

    if !peer_closed.load(Ordering::Acquire)
        && let Err(e) = sink.send(Message::Close(None)).await
    {
        debug!(session = %session.id(), "close frame not sent: {e}");
    }
    let _ = sink.close().await;
}

async fn write_frame<S>(sink: &mut S, session: &Session, text: String) -> bool
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let len = text.len();
    let result = sink.send(Message::Text(text.into())).await;
    session.mark_flushed(len);
    match result {
        Ok(()) => true,
        Err(e) => {
            debug!(session = %session.id(), "write pump send error: {e}");
            false
        }
    }
}

/// Read pump: reads frames and dispatches them to the handler in order.
///
/// Returns `true` if the loop ended on a close frame from the peer.
async fn read_pump<S, H>(mut stream: S, session: &Session, handler: &Arc<H>) -> bool
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
    H: SessionHandler,
{
    let cancel = session.cancel_token().clone();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(session = %session.id(), "session cancelled");
                return false;
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let frame = InboundFrame::Text(text.as_str().to_owned());
                        dispatch(handler, session, frame).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        dispatch(handler, session, InboundFrame::Binary(data.to_vec())).await;
                    }
                    // Pings are answered by the transport.
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        debug!(session = %session.id(), ?frame, "received close frame");
                        return true;
                    }
                    Some(Err(e)) => {
                        debug!(session = %session.id(), "read pump error: {e}");
                        return false;
                    }
                    None => return false,
                }
            }
        }
    }
}

async fn dispatch<H: SessionHandler>(handler: &Arc<H>, session: &Session, frame: InboundFrame) {
    handler.on_message(session.clone(), frame).await;
    signal_backpressure(handler, session).await;
}

async fn signal_backpressure<H: SessionHandler>(handler: &Arc<H>, session: &Session) {
    if let Some(buffered) = session.take_backpressure() {
        handler.on_backpressure(session.clone(), buffered).await;
    }
}
