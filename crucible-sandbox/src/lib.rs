//! Execution engine: language profiles, ephemeral workspaces, container
//! supervision and output relaying.

pub mod error;
pub mod profiles;
pub mod relay;
pub mod supervisor;
pub mod workspace;

pub use error::SandboxError;
pub use profiles::{ExecutionProfile, DEFAULT_LANGUAGE};
pub use supervisor::Supervisor;
pub use workspace::Workspace;
