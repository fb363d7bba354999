//! Session layer: inbound protocol decoding, the per-connection state
//! machine, and the WebSocket transport in front of them.

pub mod config;
pub mod connection;
pub mod protocol;
pub mod session;
mod ws;

pub use config::{ServerConfig, ServerContext};
pub use session::{Session, SessionMode};

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

/// Binds the listener and serves sessions until shutdown.
pub async fn run(config: ServerConfig) -> Result<()> {
    let bind_addr = config.bind_addr;
    let ctx = Arc::new(ServerContext::new(config));
    let app = ws::router(ctx);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "listening for sessions");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
