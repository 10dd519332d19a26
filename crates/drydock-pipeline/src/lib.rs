//! drydock pipeline execution
//!
//! The asynchronous build execution engine:
//! - runs external toolchain commands and captures their output
//! - materializes an isolated per-build workspace (clone + patches)
//! - drives the stage sequence from `running` to a terminal outcome
//! - pauses on a denied push and finishes via credential resume
//! - discovers remote branches for the configuration UI

pub mod branches;
pub mod pipeline;
pub mod resume;
pub mod runner;
pub mod tools;
pub mod workspace;

// Re-export key types
pub use branches::discover_branches;
pub use pipeline::{BuildPipeline, REGISTRY_DENIED_SIGNATURE};
pub use resume::resume_push;
pub use runner::{run_command, CommandOutput};
pub use tools::ExternalTools;
pub use workspace::Workspace;
