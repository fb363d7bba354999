//! Container process supervision.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crucible_common::ExecutionRequest;

use crate::error::SandboxError;
use crate::profiles::ExecutionProfile;

/// Fixed resource ceilings applied to every container.
const MEMORY_LIMIT: &str = "--memory=2g";
const CPU_LIMIT: &str = "--cpus=2";

/// Mount point of the request workspace inside the container.
pub const WORKSPACE_MOUNT: &str = "/workspace";
/// Mount point of the client-specified working directory.
pub const WORKDIR_MOUNT: &str = "/workdir";

/// Builds container invocations and owns the child process until it is
/// reaped. The runtime is an opaque executable (`docker` by default)
/// driven purely through its command line.
pub struct Supervisor {
    runtime_bin: String,
}

impl Supervisor {
    pub fn new(runtime_bin: impl Into<String>) -> Self {
        Self {
            runtime_bin: runtime_bin.into(),
        }
    }

    /// Argument vector for one container invocation:
    ///
    /// ```text
    /// run --rm <runtime-flags> -v <workspace>:/workspace
    ///     [-v <workingDir>:/workdir --workdir=/workdir]
    ///     --memory=2g --cpus=2 <image> sh -c <script>
    /// ```
    ///
    /// File requests run the profile's command from the mounted workspace;
    /// raw-command requests run the client command verbatim.
    pub fn invocation(
        &self,
        request: &ExecutionRequest,
        profile: &ExecutionProfile,
        workspace: Option<&Path>,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec!["run".into(), "--rm".into()];
        args.extend(profile.runtime_flags.split_whitespace().map(String::from));
        if let Some(workspace) = workspace {
            args.push("-v".into());
            args.push(format!("{}:{WORKSPACE_MOUNT}", workspace.display()));
        }
        if let Some(dir) = request.working_dir() {
            args.push("-v".into());
            args.push(format!("{dir}:{WORKDIR_MOUNT}"));
            args.push(format!("--workdir={WORKDIR_MOUNT}"));
        }
        args.push(MEMORY_LIMIT.into());
        args.push(CPU_LIMIT.into());
        args.push(profile.image.into());
        args.push("sh".into());
        args.push("-c".into());
        args.push(match request {
            ExecutionRequest::File { .. } => {
                format!("cd {WORKSPACE_MOUNT} && {}", profile.run_command)
            }
            ExecutionRequest::Command { command, .. } => command.clone(),
        });
        args
    }

    /// Spawns the container process with stdout and stderr captured as
    /// independent piped streams. The caller must `wait()` the child after
    /// streaming completes; it is never reaped here.
    pub fn launch(
        &self,
        request: &ExecutionRequest,
        profile: &ExecutionProfile,
        workspace: Option<&Path>,
    ) -> Result<Child, SandboxError> {
        let args = self.invocation(request, profile, workspace);
        debug!(runtime = %self.runtime_bin, ?args, "container invocation");
        info!(image = profile.image, request = request.label(), "launching container");
        Command::new(&self.runtime_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SandboxError::Launch {
                runtime: self.runtime_bin.clone(),
                source,
            })
    }
}
