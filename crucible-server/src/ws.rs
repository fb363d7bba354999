//! WebSocket transport: thin adapter between axum sockets and the
//! session state machine.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::config::ServerContext;
use crate::connection::Connection;
use crate::session::{Session, SessionMode};

pub fn router(ctx: Arc<ServerContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(single_shot_handler))
        .route("/session", get(session_handler))
        .with_state(ctx)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn single_shot_handler(
    State(ctx): State<Arc<ServerContext>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        Session::new(WsConnection(socket), ctx, SessionMode::SingleShot).run()
    })
}

async fn session_handler(
    State(ctx): State<Arc<ServerContext>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        Session::new(WsConnection(socket), ctx, SessionMode::Interactive).run()
    })
}

/// Text frames carry the protocol; binary frames and control messages are
/// skipped.
struct WsConnection(WebSocket);

#[async_trait]
impl Connection for WsConnection {
    async fn recv(&mut self) -> Option<String> {
        loop {
            match self.0.recv().await? {
                Ok(Message::Text(frame)) => return Some(frame),
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }

    async fn send(&mut self, frame: String) -> anyhow::Result<()> {
        self.0.send(Message::Text(frame)).await.map_err(Into::into)
    }
}
