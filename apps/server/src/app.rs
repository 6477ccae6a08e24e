//! Application orchestrator: wires the registry, handler and server.

use std::sync::Arc;

use wsecho_server::{ConnectionRegistry, EchoHandler, EchoServer};

use crate::config::Config;

/// Runs the server until a shutdown signal arrives or the server fails.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let registry = Arc::new(ConnectionRegistry::new());
    let handler = EchoHandler::new(Arc::clone(&registry), config.welcome);
    let server = EchoServer::new(config.server, registry, handler);

    let server_run = Arc::clone(&server);
    let mut serve = tokio::spawn(async move { server_run.run().await });

    tokio::select! {
        result = &mut serve => {
            // The server stopped on its own; surface why.
            result??;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, shutting down");
        }
        _ = terminate() => {
            tracing::info!("SIGTERM received, shutting down");
        }
    }

    server.shutdown();
    serve.await??;

    tracing::info!(
        open_sessions = server.registry().count(),
        "server stopped"
    );
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sig) => {
            sig.recv().await;
        }
        Err(e) => {
            tracing::warn!("cannot listen for SIGTERM: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
