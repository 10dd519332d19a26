//! drydock core library
//!
//! Domain model and shared state for the drydock build orchestrator:
//! project configurations, build records, the concurrently-polled
//! status registry, the JSON project store, and the packaged-artifact
//! store.

pub mod artifacts;
pub mod domain;
pub mod registry;
pub mod store;
pub mod telemetry;

pub use artifacts::{ArtifactInfo, ArtifactStore};
pub use domain::{
    BuildId, BuildKind, BuildRecord, BuildStatus, DrydockError, FilePatch, ProjectConfig, Result,
};
pub use registry::StatusRegistry;
pub use store::{JsonProjectStore, MemoryProjectStore, ProjectStore};
pub use telemetry::init_tracing;

/// drydock version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
