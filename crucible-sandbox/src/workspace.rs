//! Ephemeral per-request workspace directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::SandboxError;
use crate::profiles::ExecutionProfile;

/// Fixed stem of the source file written into every workspace. The
/// client-supplied filename never touches the filesystem.
pub const SOURCE_STEM: &str = "main";

/// One request's scratch directory, bind-mounted into the container.
///
/// The directory name embeds a fresh random suffix, so concurrent sessions
/// can never collide. Removal happens exactly once: explicitly through
/// [`Workspace::destroy`] on every exit path of the owning request, with a
/// drop-based backstop should the owner be torn down early.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Allocates a uniquely named directory under `scratch_root`.
    pub async fn create(scratch_root: &Path) -> Result<Self, SandboxError> {
        tokio::fs::create_dir_all(scratch_root)
            .await
            .map_err(SandboxError::Workspace)?;
        let dir = tempfile::Builder::new()
            .prefix("project_")
            .tempdir_in(scratch_root)
            .map_err(SandboxError::Workspace)?;
        debug!(path = %dir.path().display(), "created workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the submitted source as the canonical `main<ext>` file for
    /// the profile, returning the path written.
    pub async fn write_source(
        &self,
        profile: &ExecutionProfile,
        content: &str,
    ) -> Result<PathBuf, SandboxError> {
        let path = self
            .dir
            .path()
            .join(format!("{SOURCE_STEM}{}", profile.extension));
        tokio::fs::write(&path, content)
            .await
            .map_err(SandboxError::Workspace)?;
        debug!(path = %path.display(), bytes = content.len(), "wrote source file");
        Ok(path)
    }

    /// Recursively removes the directory. Best-effort: failures are logged
    /// and never escalated, so cleanup can not block session progress.
    pub fn destroy(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "removed workspace"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove workspace"),
        }
    }
}
