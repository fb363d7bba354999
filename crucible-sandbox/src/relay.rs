//! Concurrent line-oriented draining of a child's output streams.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crucible_common::OutputEvent;

#[derive(Debug, Clone, Copy)]
enum Source {
    Stdout,
    Stderr,
}

/// Drains stdout and stderr concurrently, forwarding every non-empty line
/// through `events` tagged as `output` or `error` respectively.
///
/// The two readers terminate independently at end-of-stream; the relay
/// completes only once both have finished. Line order is preserved within
/// each stream; no ordering is guaranteed across the two.
pub async fn relay<O, E>(stdout: Option<O>, stderr: Option<E>, events: mpsc::Sender<OutputEvent>)
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    tokio::join!(
        forward(stdout, events.clone(), Source::Stdout),
        forward(stderr, events, Source::Stderr),
    );
}

async fn forward<R: AsyncRead + Unpin>(
    stream: Option<R>,
    events: mpsc::Sender<OutputEvent>,
    source: Source,
) {
    let Some(stream) = stream else { return };
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                // Lines that are not valid UTF-8 are dropped, not fatal.
                let Ok(text) = std::str::from_utf8(&buf) else {
                    continue;
                };
                let line = text.trim();
                if line.is_empty() {
                    continue;
                }
                let event = match source {
                    Source::Stdout => OutputEvent::Output(line.to_string()),
                    Source::Stderr => OutputEvent::Error(line.to_string()),
                };
                if events.send(event).await.is_err() {
                    // Receiver gone; keep consuming nothing further.
                    break;
                }
            }
            Err(e) => {
                debug!(?source, error = %e, "child stream read failed");
                break;
            }
        }
    }
}
