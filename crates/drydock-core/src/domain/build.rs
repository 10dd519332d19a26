//! Build identifiers and status records.

use serde::{Deserialize, Serialize};

/// Opaque unique token naming one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildId(pub String);

impl BuildId {
    /// Generate a new random build identifier.
    pub fn new() -> Self {
        BuildId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a build as seen by polling clients.
///
/// Transitions are monotone: `Running` moves to exactly one of the
/// other states, and only `AuthRequired` permits a further move
/// (to `Success` or `Fail`, via the credential-resume handler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    /// Pipeline is executing; logs are still growing.
    Running,

    /// Pipeline completed with a clean push or packaging step.
    Success,

    /// A toolchain or push command reported a non-zero/denied result.
    Fail,

    /// An orchestration fault (missing config, clone failure,
    /// unexpected exception) — distinct from a legitimate build failure.
    Error,

    /// Push was denied by the registry; awaiting credentials.
    AuthRequired,

    /// Sentinel for identifiers the registry has never seen.
    Unknown,
}

impl BuildStatus {
    /// Whether no further automatic transition can occur.
    ///
    /// `AuthRequired` is NOT terminal: an external resume operation
    /// can still move it to `Success` or `Fail`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BuildStatus::Success | BuildStatus::Fail | BuildStatus::Error
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Running => "running",
            BuildStatus::Success => "success",
            BuildStatus::Fail => "fail",
            BuildStatus::Error => "error",
            BuildStatus::AuthRequired => "auth_required",
            BuildStatus::Unknown => "unknown",
        }
    }
}

/// Latest state of one build: status tag, accumulated log text, and —
/// only while paused in `AuthRequired` — the image reference needed to
/// resume the push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    pub status: BuildStatus,

    /// Append-only, newline-delimited log text. Non-decreasing in
    /// length for the lifetime of one build.
    pub logs: String,

    /// Resume context carried by the `auth_required` state.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub docker_image: Option<String>,
}

impl BuildRecord {
    /// A running record with the logs accumulated so far.
    pub fn running(logs: impl Into<String>) -> Self {
        BuildRecord {
            status: BuildStatus::Running,
            logs: logs.into(),
            docker_image: None,
        }
    }

    /// A terminal record (`Success`, `Fail`, or `Error`).
    pub fn finished(status: BuildStatus, logs: impl Into<String>) -> Self {
        BuildRecord {
            status,
            logs: logs.into(),
            docker_image: None,
        }
    }

    /// The paused record carrying its resume context.
    pub fn auth_required(logs: impl Into<String>, docker_image: impl Into<String>) -> Self {
        BuildRecord {
            status: BuildStatus::AuthRequired,
            logs: logs.into(),
            docker_image: Some(docker_image.into()),
        }
    }

    /// Sentinel returned for identifiers the registry has never seen.
    pub fn unknown() -> Self {
        BuildRecord {
            status: BuildStatus::Unknown,
            logs: "Build ID not found.".to_string(),
            docker_image: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_id_unique() {
        let a = BuildId::new();
        let b = BuildId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_status_terminality() {
        assert!(BuildStatus::Success.is_terminal());
        assert!(BuildStatus::Fail.is_terminal());
        assert!(BuildStatus::Error.is_terminal());
        assert!(!BuildStatus::Running.is_terminal());
        assert!(!BuildStatus::AuthRequired.is_terminal());
        assert!(!BuildStatus::Unknown.is_terminal());
    }

    #[test]
    fn test_status_wire_tags() {
        let json = serde_json::to_string(&BuildStatus::AuthRequired).unwrap();
        assert_eq!(json, "\"auth_required\"");
        let status: BuildStatus = serde_json::from_str("\"fail\"").unwrap();
        assert_eq!(status, BuildStatus::Fail);
    }

    #[test]
    fn test_auth_required_carries_image() {
        let record = BuildRecord::auth_required("logs so far", "reg/app:1");
        assert_eq!(record.status, BuildStatus::AuthRequired);
        assert_eq!(record.docker_image.as_deref(), Some("reg/app:1"));

        // Image field is omitted from JSON everywhere else.
        let running = BuildRecord::running("x");
        let json = serde_json::to_string(&running).unwrap();
        assert!(!json.contains("docker_image"));
    }

    #[test]
    fn test_unknown_sentinel() {
        let record = BuildRecord::unknown();
        assert_eq!(record.status, BuildStatus::Unknown);
        assert_eq!(record.logs, "Build ID not found.");
    }
}
