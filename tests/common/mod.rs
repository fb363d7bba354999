//! Shared helpers: scripted connections, a stub container runtime, and
//! preconfigured server contexts.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;

use crucible_server::connection::Connection;
use crucible_server::{ServerConfig, ServerContext, Session, SessionMode};

pub fn setup_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// In-memory frame connection: a fixed script of inbound frames, with
/// outbound frames captured on a channel. `recv` returns `None` once the
/// script is exhausted, modelling the peer disconnecting.
pub struct ScriptedConnection {
    inbound: VecDeque<String>,
    outbound: mpsc::UnboundedSender<String>,
}

pub fn scripted(frames: &[&str]) -> (ScriptedConnection, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let conn = ScriptedConnection {
        inbound: frames.iter().map(|s| s.to_string()).collect(),
        outbound: tx,
    };
    (conn, rx)
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn recv(&mut self) -> Option<String> {
        self.inbound.pop_front()
    }

    async fn send(&mut self, frame: String) -> anyhow::Result<()> {
        self.outbound
            .send(frame)
            .map_err(|_| anyhow::anyhow!("capture channel closed"))
    }
}

/// Writes a stand-in container runtime: a script that ignores every
/// container flag and executes the trailing `sh -c` payload directly on
/// the host, so the session flow is exercised without Docker.
pub fn write_stub_runtime(dir: &Path) -> PathBuf {
    let path = dir.join("stub-runtime");
    std::fs::write(&path, "#!/bin/sh\nfor last; do :; done\nexec sh -c \"$last\"\n").unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    use std::os::unix::fs::PermissionsExt;
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// A server context wired to the stub runtime and a private scratch root.
pub struct TestEnv {
    pub ctx: Arc<ServerContext>,
    pub scratch: TempDir,
    _runtime_dir: TempDir,
}

impl TestEnv {
    pub fn with_stub_runtime() -> Self {
        setup_test_logging();
        let scratch = tempfile::tempdir().unwrap();
        let runtime_dir = tempfile::tempdir().unwrap();
        let stub = write_stub_runtime(runtime_dir.path());
        let config = ServerConfig {
            scratch_root: scratch.path().to_path_buf(),
            runtime_bin: stub.to_string_lossy().into_owned(),
            ..ServerConfig::default()
        };
        Self {
            ctx: Arc::new(ServerContext::new(config)),
            scratch,
            _runtime_dir: runtime_dir,
        }
    }

    /// Uses the real container runtime from the default configuration.
    pub fn with_docker() -> Self {
        setup_test_logging();
        let scratch = tempfile::tempdir().unwrap();
        let runtime_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            scratch_root: scratch.path().to_path_buf(),
            ..ServerConfig::default()
        };
        Self {
            ctx: Arc::new(ServerContext::new(config)),
            scratch,
            _runtime_dir: runtime_dir,
        }
    }

    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }

    /// Runs a whole session over the scripted frames and returns every
    /// outbound frame parsed as JSON.
    pub async fn run_session(&self, mode: SessionMode, frames: &[&str]) -> Vec<Value> {
        let (conn, mut rx) = scripted(frames);
        Session::new(conn, self.ctx.clone(), mode).run().await;
        let mut events = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            events.push(serde_json::from_str(&frame).unwrap());
        }
        events
    }
}

/// True when the frame is `{"status": "complete", ...}` with the given
/// exit-code predicate.
pub fn is_status(event: &Value, pred: impl Fn(i64) -> bool) -> bool {
    event["status"] == "complete" && event["exit_code"].as_i64().is_some_and(&pred)
}
