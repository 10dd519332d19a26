//! Domain-level error taxonomy for drydock.

/// Errors produced by the orchestrator's own machinery.
///
/// A toolchain command exiting non-zero is deliberately NOT an error
/// here — that is a legitimate build outcome reported through the
/// status registry as `fail`. These variants cover orchestration
/// faults: missing configuration, git/filesystem trouble, a process
/// that could not even be launched.
#[derive(Debug, thiserror::Error)]
pub enum DrydockError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("registry login failed: {0}")]
    RegistryAuth(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for drydock domain operations.
pub type Result<T> = std::result::Result<T, DrydockError>;
