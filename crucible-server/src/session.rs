//! Per-connection session state machine.
//!
//! Sequences one connection's lifecycle: accept, decode, dispatch,
//! stream, report, clean up, and either loop for the next request or
//! close. Every failure funnels through a single point that emits one
//! `error` event, and workspace cleanup runs on every terminal path.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crucible_common::{ExecutionRequest, OutputEvent};
use crucible_sandbox::relay::relay;
use crucible_sandbox::{profiles, ExecutionProfile, SandboxError, Workspace};

use crate::config::ServerContext;
use crate::connection::Connection;
use crate::protocol::{self, ProtocolError};

/// How many requests a connection may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// One request, then the connection closes (legacy and single-JSON
    /// framings).
    SingleShot,
    /// Requests keep arriving as standalone JSON frames until the peer
    /// disconnects.
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Connected,
    AwaitingRequest,
    Executing,
    Streaming,
    Reporting,
    Error,
    Closed,
}

/// Any failure that terminates one request. Converted into a single
/// `error` event at the session boundary.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

pub struct Session<C: Connection> {
    id: Uuid,
    mode: SessionMode,
    state: SessionState,
    conn: C,
    ctx: Arc<ServerContext>,
}

impl<C: Connection> Session<C> {
    pub fn new(conn: C, ctx: Arc<ServerContext>, mode: SessionMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            state: SessionState::Connected,
            conn,
            ctx,
        }
    }

    /// Drives the session until the peer disconnects or, in single-shot
    /// mode, the first request finishes.
    pub async fn run(mut self) {
        info!(session = %self.id, mode = ?self.mode, "session opened");
        loop {
            self.set_state(SessionState::AwaitingRequest);
            let Some(frame) = self.conn.recv().await else {
                break; // peer disconnected
            };
            if let Err(err) = self.serve_request(frame).await {
                self.set_state(SessionState::Error);
                warn!(session = %self.id, error = %err, "request failed");
                // Best-effort: the connection may already be unusable.
                let _ = self
                    .conn
                    .send(OutputEvent::Error(err.to_string()).to_frame())
                    .await;
            }
            if self.mode == SessionMode::SingleShot {
                break;
            }
        }
        self.set_state(SessionState::Closed);
        info!(session = %self.id, "session closed");
    }

    fn set_state(&mut self, next: SessionState) {
        debug!(session = %self.id, from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    async fn serve_request(&mut self, first_frame: String) -> Result<(), RequestError> {
        let request = match self.mode {
            SessionMode::Interactive => {
                protocol::decode_session_frame(&first_frame, &self.ctx.config.default_language)?
            }
            SessionMode::SingleShot => {
                protocol::decode_single_shot(&first_frame, &mut self.conn).await?
            }
        };

        // Resolve the profile before anything touches the filesystem, so
        // an unknown language produces no workspace and no container.
        let language = match &request {
            ExecutionRequest::File { language, .. } => language.as_str(),
            ExecutionRequest::Command { .. } => self.ctx.config.default_language.as_str(),
        };
        let profile = profiles::lookup(language)
            .ok_or_else(|| SandboxError::UnsupportedLanguage(language.to_string()))?;
        info!(session = %self.id, language, request = request.label(), "dispatching request");
        self.set_state(SessionState::Executing);

        // Raw commands bypass the workspace manager entirely.
        let workspace = match &request {
            ExecutionRequest::File { .. } => {
                Some(Workspace::create(&self.ctx.config.scratch_root).await?)
            }
            ExecutionRequest::Command { .. } => None,
        };

        let outcome = self.execute(&request, profile, workspace.as_ref()).await;
        // Cleanup runs on every exit path, success and failure alike.
        if let Some(workspace) = workspace {
            workspace.destroy();
        }
        outcome
    }

    async fn execute(
        &mut self,
        request: &ExecutionRequest,
        profile: &ExecutionProfile,
        workspace: Option<&Workspace>,
    ) -> Result<(), RequestError> {
        if let (ExecutionRequest::File { content, .. }, Some(workspace)) = (request, workspace) {
            workspace.write_source(profile, content).await?;
        }

        let mut child =
            self.ctx
                .supervisor
                .launch(request, profile, workspace.map(Workspace::path))?;

        self.set_state(SessionState::Streaming);
        let (events_tx, mut events_rx) = mpsc::channel(128);
        let readers = tokio::spawn(relay(child.stdout.take(), child.stderr.take(), events_tx));

        let mut peer_gone = false;
        while let Some(event) = events_rx.recv().await {
            if peer_gone {
                // Keep draining so the child never blocks on a full pipe.
                continue;
            }
            if self.conn.send(event.to_frame()).await.is_err() {
                debug!(session = %self.id, "peer disconnected mid-stream");
                peer_gone = true;
            }
        }
        let _ = readers.await;

        // The child is always reaped, after streaming and never before.
        self.set_state(SessionState::Reporting);
        let status = child.wait().await.map_err(SandboxError::Reap)?;
        let exit_code = status.code().unwrap_or(-1);
        info!(session = %self.id, exit_code, "execution finished");
        if !peer_gone {
            let _ = self
                .conn
                .send(OutputEvent::Status { exit_code }.to_frame())
                .await;
        }
        Ok(())
    }
}
