//! Server configuration and shared per-process state.

use std::net::SocketAddr;
use std::path::PathBuf;

use crucible_sandbox::{Supervisor, DEFAULT_LANGUAGE};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: SocketAddr,
    /// Root directory under which per-request workspaces are created.
    pub scratch_root: PathBuf,
    /// Container runtime executable.
    pub runtime_bin: String,
    /// Profile used for raw-command requests and session-mode file
    /// requests that omit a language.
    pub default_language: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".parse().unwrap(),
            scratch_root: std::env::temp_dir(),
            runtime_bin: "docker".to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// State shared by every session. Sessions are otherwise fully
/// independent; this is the only cross-connection data and it is
/// read-only after startup.
pub struct ServerContext {
    pub config: ServerConfig,
    pub supervisor: Supervisor,
}

impl ServerContext {
    pub fn new(config: ServerConfig) -> Self {
        let supervisor = Supervisor::new(config.runtime_bin.clone());
        Self { config, supervisor }
    }
}
