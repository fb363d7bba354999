//! Transport abstraction: one bidirectional stream of text frames.

use async_trait::async_trait;

/// A connection that carries already-decoded text frames in both
/// directions. The WebSocket transport implements this; tests drive the
/// session state machine through in-memory implementations.
#[async_trait]
pub trait Connection: Send {
    /// Next inbound frame, or `None` once the peer has disconnected.
    async fn recv(&mut self) -> Option<String>;

    /// Sends one outbound frame. An error means the connection is no
    /// longer usable; callers treat it as a disconnect.
    async fn send(&mut self, frame: String) -> anyhow::Result<()>;
}
