//! Error taxonomy for the execution engine.

use thiserror::Error;

/// Failures raised while preparing or supervising one execution.
///
/// A non-zero container exit is not an error: it is reported through the
/// ordinary completion status, with diagnostics already streamed as
/// `error` events.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Language id absent from the profile registry. Recoverable; raised
    /// before any workspace or container exists.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Workspace directory creation or source write failed.
    #[error("failed to prepare workspace: {0}")]
    Workspace(#[source] std::io::Error),

    /// The container runtime process could not be spawned.
    #[error("failed to launch container runtime '{runtime}': {source}")]
    Launch {
        runtime: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the container process failed.
    #[error("failed to reap container process: {0}")]
    Reap(#[source] std::io::Error),
}
