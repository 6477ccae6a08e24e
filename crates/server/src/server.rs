//! HTTP transport.
//!
//! Listens on a TCP address, upgrades `GET /ws` to a WebSocket session
//! and serves the REST API on every other route.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use wsecho_protocol::constants::{DEFAULT_BACKPRESSURE_THRESHOLD, WS_MAX_MESSAGE_SIZE, WS_PATH};

use crate::ServerError;
use crate::api;
use crate::connection;
use crate::handler::SessionHandler;
use crate::registry::ConnectionRegistry;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (port 0 = OS-assigned).
    pub listen: SocketAddr,
    /// Queued outbound bytes at which a session reports backpressure.
    pub backpressure_threshold: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: ([127, 0, 0, 1], 3000).into(),
            backpressure_threshold: DEFAULT_BACKPRESSURE_THRESHOLD,
        }
    }
}

/// Router state shared by every request.
struct AppState<H> {
    handler: Arc<H>,
    registry: Arc<ConnectionRegistry>,
    cancel: CancellationToken,
    backpressure_threshold: usize,
}

impl<H> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            registry: Arc::clone(&self.registry),
            cancel: self.cancel.clone(),
            backpressure_threshold: self.backpressure_threshold,
        }
    }
}

impl<H> FromRef<AppState<H>> for Arc<ConnectionRegistry> {
    fn from_ref(state: &AppState<H>) -> Self {
        Arc::clone(&state.registry)
    }
}

/// The WebSocket echo server.
///
/// The registry is owned by the caller and shared with the handler; the
/// server only reads it to answer `/api/connections`.
pub struct EchoServer<H: SessionHandler> {
    config: ServerConfig,
    handler: Arc<H>,
    registry: Arc<ConnectionRegistry>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
    running: AtomicBool,
}

impl<H: SessionHandler> EchoServer<H> {
    /// Creates a new server with the given handler and registry.
    pub fn new(config: ServerConfig, registry: Arc<ConnectionRegistry>, handler: H) -> Arc<Self> {
        Arc::new(Self {
            config,
            handler: Arc::new(handler),
            registry,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    /// Gracefully shuts down the server and closes every session.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Builds the HTTP router.
    pub fn router(&self) -> Router {
        let state = AppState {
            handler: Arc::clone(&self.handler),
            registry: Arc::clone(&self.registry),
            cancel: self.cancel.clone(),
            backpressure_threshold: self.config.backpressure_threshold,
        };

        Router::new()
            .route(WS_PATH, get(ws_handler::<H>))
            .route("/api/hello", get(api::hello_get).put(api::hello_put))
            .route("/api/hello/{name}", get(api::hello_name))
            .route("/api/connections", get(api::connections))
            .fallback(api::not_found)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Runs the server until [`shutdown`](Self::shutdown) is called.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(ServerError::AlreadyRunning);
        }

        let listener = TcpListener::bind(self.config.listen).await?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("server listening on {local_addr}");

        let cancel = self.cancel.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        tracing::info!("server shut down");
        Ok(())
    }
}

/// `GET /ws`: upgrades to a WebSocket session.
///
/// A request that cannot be upgraded gets an explicit `400`.
async fn ws_handler<H: SessionHandler>(
    State(state): State<AppState<H>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!("WebSocket upgrade rejected: {rejection}");
            return (StatusCode::BAD_REQUEST, "WebSocket upgrade failed").into_response();
        }
    };

    ws.max_message_size(WS_MAX_MESSAGE_SIZE)
        .on_failed_upgrade(|e| tracing::warn!("WebSocket upgrade failed: {e}"))
        .on_upgrade(move |socket| async move {
            connection::run_session(
                socket,
                state.handler,
                &state.cancel,
                state.backpressure_threshold,
            )
            .await;
        })
}
