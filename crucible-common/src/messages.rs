//! Canonical request and outbound event types.

use serde_json::json;

/// One decoded client request. Exactly one kind is active per request:
/// either a source file to materialize and run, or a raw shell command
/// executed directly in a fresh container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionRequest {
    File {
        /// Client-supplied name, used for display and logging only.
        filename: String,
        /// Must resolve in the execution profile registry.
        language: String,
        /// Submitted source text. May be empty.
        content: String,
        /// Optional host directory to bind-mount into the container.
        working_dir: Option<String>,
    },
    Command {
        /// Shell command run verbatim inside the container.
        command: String,
        working_dir: Option<String>,
    },
}

impl ExecutionRequest {
    /// Host directory the client asked to have mounted, if any.
    pub fn working_dir(&self) -> Option<&str> {
        match self {
            ExecutionRequest::File { working_dir, .. }
            | ExecutionRequest::Command { working_dir, .. } => working_dir.as_deref(),
        }
    }

    /// Short description for log lines.
    pub fn label(&self) -> &str {
        match self {
            ExecutionRequest::File { filename, .. } => filename,
            ExecutionRequest::Command { command, .. } => command,
        }
    }
}

/// One outbound frame: a line from the child's stdout or stderr, or the
/// final completion status with the container's exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Output(String),
    Error(String),
    Status { exit_code: i32 },
}

impl OutputEvent {
    /// Encodes the event as one JSON text frame.
    pub fn to_frame(&self) -> String {
        match self {
            OutputEvent::Output(data) => json!({ "type": "output", "data": data }),
            OutputEvent::Error(data) => json!({ "type": "error", "data": data }),
            OutputEvent::Status { exit_code } => {
                json!({ "status": "complete", "exit_code": exit_code })
            }
        }
        .to_string()
    }
}
