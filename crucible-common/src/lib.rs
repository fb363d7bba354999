//! Wire-level types shared between the execution engine and the session layer.

pub mod messages;

pub use messages::{ExecutionRequest, OutputEvent};
