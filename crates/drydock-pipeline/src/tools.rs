//! The external toolchain programs the pipeline shells out to.

/// Resolvable names of the five toolchain programs.
///
/// Defaults are the bare executable names, resolved through `PATH`.
/// Every pipeline stage builds its command line against this table,
/// which is also the substitution point for tests (and for wrapper
/// scripts such as a project-local `gradlew`).
#[derive(Debug, Clone)]
pub struct ExternalTools {
    pub git: String,
    pub mvn: String,
    pub npm: String,
    pub gradle: String,
    pub docker: String,
}

impl Default for ExternalTools {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            mvn: "mvn".to_string(),
            npm: "npm".to_string(),
            gradle: "gradle".to_string(),
            docker: "docker".to_string(),
        }
    }
}
