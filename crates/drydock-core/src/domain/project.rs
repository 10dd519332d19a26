//! Project configuration wire format.
//!
//! Configurations are stored as a single flat JSON object keyed by
//! project name and rewritten wholesale on every write. Absent string
//! fields deserialize to empty strings rather than errors; whether a
//! field is actually required depends on the declared build type and
//! is only checked when a build runs.

use serde::{Deserialize, Serialize};

/// Build toolchain variants the pipeline dispatches on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuildKind {
    /// JVM backend: `mvn clean package` against a project descriptor,
    /// then a container image build and push.
    Maven,

    /// JS frontend: `npm install` + `npm run build`, then a container
    /// image build and push.
    Npm,

    /// Mobile package: `gradle assembleRelease`, producing an APK that
    /// is copied into the artifact store. No container phase.
    Gradle,
}

impl BuildKind {
    /// Stable lowercase tag, matching the stored `build_type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildKind::Maven => "maven",
            BuildKind::Npm => "npm",
            BuildKind::Gradle => "gradle",
        }
    }
}

/// One source modification applied after clone, before build.
///
/// The target file is replaced wholesale with `content` prefixed by a
/// single newline; there is no merging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilePatch {
    /// Path relative to the workspace root.
    pub path: String,

    /// Replacement text for the whole file.
    pub content: String,
}

/// A named project's build configuration.
///
/// Read once at build start; never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Source repository URL.
    #[serde(default)]
    pub repo_url: String,

    /// Branch to clone.
    #[serde(default)]
    pub branch: String,

    /// Toolchain to dispatch on.
    pub build_type: BuildKind,

    /// Target image reference for container build types.
    #[serde(default)]
    pub docker_image: String,

    /// Project descriptor path for the Maven build type.
    #[serde(default)]
    pub backend_pom_path: String,

    /// Frontend asset path for the npm build type.
    #[serde(default)]
    pub frontend_path: String,

    /// Image build-context path, relative to the workspace root.
    #[serde(default)]
    pub dockerfile_path: String,

    /// Build-project path for the mobile build type.
    #[serde(default)]
    pub app_path: String,

    /// Ordered file modifications applied before the build stage.
    #[serde(default)]
    pub patches: Vec<FilePatch>,
}
