use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crucible_server::ServerConfig;

#[derive(Parser)]
#[command(name = "crucible-server")]
#[command(about = "Containerized code execution over WebSocket sessions")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8000")]
    bind_addr: SocketAddr,

    /// Directory holding per-request workspaces (defaults to the system
    /// temp directory)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Container runtime executable
    #[arg(long, default_value = "docker")]
    container_bin: String,

    /// Language profile used for raw command requests
    #[arg(long, default_value = crucible_sandbox::DEFAULT_LANGUAGE)]
    default_language: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "crucible_server={log_level},crucible_sandbox={log_level}"
                ))
            }),
        )
        .init();

    let config = ServerConfig {
        bind_addr: args.bind_addr,
        scratch_root: args.scratch_dir.unwrap_or_else(std::env::temp_dir),
        runtime_bin: args.container_bin,
        default_language: args.default_language,
    };

    crucible_server::run(config).await
}
