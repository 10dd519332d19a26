//! Build pipeline execution engine.
//!
//! Drives one build from `running` through its toolchain-specific
//! stages to a terminal outcome (or the `auth_required` pause),
//! writing every transition into the shared status registry. Each
//! build is an independent spawned task; callers receive the build
//! identifier immediately and observe completion only by polling.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use drydock_core::artifacts::ArtifactStore;
use drydock_core::domain::{BuildId, BuildKind, BuildRecord, BuildStatus, DrydockError, Result};
use drydock_core::registry::StatusRegistry;
use drydock_core::store::ProjectStore;

use crate::runner::run_command;
use crate::tools::ExternalTools;
use crate::workspace::Workspace;

/// The registry's access-denied signature on a rejected push.
pub const REGISTRY_DENIED_SIGNATURE: &str = "denied: requested access to the resource is denied";

/// Where the release-assembly task leaves its package, relative to the
/// configured build-project path.
const PACKAGE_OUTPUT_DIR: &str = "app/build/outputs/apk/release";

/// Package file extension the mobile build type produces.
const PACKAGE_EXTENSION: &str = "apk";

/// Client-visible build log: every appended line also refreshes the
/// registry's `running` record, so pollers always see growing logs
/// under a `running` status until the one terminal/paused write.
struct BuildLog<'a> {
    registry: &'a StatusRegistry,
    build_id: &'a BuildId,
    text: String,
}

impl<'a> BuildLog<'a> {
    fn new(registry: &'a StatusRegistry, build_id: &'a BuildId) -> Self {
        Self {
            registry,
            build_id,
            text: "Starting build...\n".to_string(),
        }
    }

    fn append(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
        self.registry
            .update(self.build_id, BuildRecord::running(self.text.clone()));
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// Owns the stage sequence and the collaborators every build needs.
pub struct BuildPipeline {
    registry: Arc<StatusRegistry>,
    projects: Arc<dyn ProjectStore>,
    artifacts: Arc<ArtifactStore>,
    tools: ExternalTools,
}

impl BuildPipeline {
    pub fn new(
        registry: Arc<StatusRegistry>,
        projects: Arc<dyn ProjectStore>,
        artifacts: Arc<ArtifactStore>,
        tools: ExternalTools,
    ) -> Self {
        Self {
            registry,
            projects,
            artifacts,
            tools,
        }
    }

    pub fn registry(&self) -> &Arc<StatusRegistry> {
        &self.registry
    }

    /// Register an initial `running` record and launch the pipeline as
    /// an independent task, returning the new identifier immediately.
    ///
    /// Fire-and-forget: no handle is kept, completion is observed only
    /// through the registry, and every call spawns its own unbounded
    /// task. There is no pool, no queue and no way to abort an
    /// in-flight build.
    pub fn start(self: &Arc<Self>, project_name: &str) -> BuildId {
        let build_id = BuildId::new();
        self.registry
            .register(&build_id, BuildRecord::running("Starting build...\n"));

        let pipeline = Arc::clone(self);
        let name = project_name.to_string();
        let id = build_id.clone();
        tokio::spawn(async move {
            pipeline.execute(&name, &id).await;
        });

        build_id
    }

    /// Run the pipeline for `build_id` to a terminal or paused status.
    ///
    /// Every fault (missing configuration, clone failure, filesystem
    /// trouble, a tool that cannot be launched) is caught here and
    /// converted to an `error` record. Nothing propagates out of the
    /// owning task, so a build can never be left `running` after its
    /// task returns.
    pub async fn execute(&self, project_name: &str, build_id: &BuildId) {
        let mut log = BuildLog::new(&self.registry, build_id);

        let record = match self.run_stages(project_name, build_id, &mut log).await {
            Ok(record) => record,
            Err(e) => {
                warn!(build = %build_id, error = %e, "pipeline fault");
                BuildRecord::finished(BuildStatus::Error, format!("{}{}\n", log.text(), e))
            }
        };

        info!(build = %build_id, status = record.status.as_str(), "build finished");
        self.registry.update(build_id, record);
        // The workspace TempDir dropped with run_stages' scope, so the
        // working directory is gone on every path including the
        // auth_required stop. A resumed push addresses the container
        // engine's local image cache, not the workspace.
    }

    async fn run_stages(
        &self,
        project_name: &str,
        build_id: &BuildId,
        log: &mut BuildLog<'_>,
    ) -> Result<BuildRecord> {
        // Acquire: a missing project is an orchestration error before
        // any workspace or external command exists.
        let config = self
            .projects
            .get(project_name)
            .await?
            .ok_or_else(|| DrydockError::ProjectNotFound(project_name.to_string()))?;

        // Clone
        let workspace = Workspace::create()?;
        log.append(format!(
            "Cloning repository: {} (branch: {})",
            config.repo_url, config.branch
        ));
        workspace
            .clone_branch(&self.tools, &config.repo_url, &config.branch)
            .await?;

        // Patch: best-effort, in list order. A failing modification is
        // logged and swallowed; the build stage still runs.
        for patch in &config.patches {
            log.append(format!("Modifying file: {}", patch.path));
            match workspace.apply_patch(patch) {
                Ok(()) => log.append(format!("Successfully modified {}", patch.path)),
                Err(e) => log.append(format!("Failed to modify file: {}", e)),
            }
        }

        // Build: dispatch on the configured toolchain. The mobile type
        // terminates here; it has no container phase.
        let build_output = match config.build_type {
            BuildKind::Maven => {
                log.append("Running Maven build...");
                run_command(
                    &self.tools.mvn,
                    &["-f", &config.backend_pom_path, "clean", "package"],
                    Some(workspace.path()),
                    None,
                )
                .await?
            }
            BuildKind::Npm => {
                log.append("Installing NPM dependencies...");
                // Install exit code is not consulted; only the build
                // script below gates progress.
                run_command(
                    &self.tools.npm,
                    &["install"],
                    Some(&workspace.path().join(&config.frontend_path)),
                    None,
                )
                .await?;
                log.append("Running NPM build...");
                run_command(
                    &self.tools.npm,
                    &["run", "build", "--prefix", &config.frontend_path],
                    Some(workspace.path()),
                    None,
                )
                .await?
            }
            BuildKind::Gradle => {
                log.append("Running release assembly...");
                let app_dir = workspace.path().join(&config.app_path);
                let output =
                    run_command(&self.tools.gradle, &["assembleRelease"], Some(&app_dir), None)
                        .await?;
                log.append(output.combined());
                if !output.success() {
                    return Ok(BuildRecord::finished(BuildStatus::Fail, log.text()));
                }
                self.collect_package(project_name, build_id, &app_dir, log)?;
                return Ok(BuildRecord::finished(BuildStatus::Success, log.text()));
            }
        };

        log.append(build_output.combined());
        if !build_output.success() {
            return Ok(BuildRecord::finished(BuildStatus::Fail, log.text()));
        }

        // Package: image build and self-tag run unconditionally; their
        // exit codes are logged but only the push gates the outcome.
        let context_dir = workspace.path().join(&config.dockerfile_path);
        log.append(format!(
            "Building Docker image: {} from {}",
            config.docker_image, config.dockerfile_path
        ));
        let image_build = run_command(
            &self.tools.docker,
            &["build", "-t", &config.docker_image, "."],
            Some(&context_dir),
            None,
        )
        .await?;
        log.append(image_build.combined());

        log.append("Tagging Docker image...");
        let tag = run_command(
            &self.tools.docker,
            &["tag", &config.docker_image, &config.docker_image],
            Some(workspace.path()),
            None,
        )
        .await?;
        log.append(tag.combined());

        log.append("Pushing Docker image...");
        let push = run_command(
            &self.tools.docker,
            &["push", &config.docker_image],
            Some(workspace.path()),
            None,
        )
        .await?;
        log.append(push.combined());

        // Push-result evaluation: a denied push is a recoverable
        // pause carrying the image name, not a failure.
        if push.stderr.contains(REGISTRY_DENIED_SIGNATURE) {
            let logs = format!(
                "{}Registry access denied. Provide a username and token to finish the push.\n",
                log.text()
            );
            return Ok(BuildRecord::auth_required(logs, config.docker_image.clone()));
        }
        if !push.success() {
            return Ok(BuildRecord::finished(BuildStatus::Fail, log.text()));
        }
        Ok(BuildRecord::finished(BuildStatus::Success, log.text()))
    }

    /// Copy the assembled package into the artifact store. A missing
    /// package after a successful assembly run is logged, not failed.
    fn collect_package(
        &self,
        project_name: &str,
        build_id: &BuildId,
        app_dir: &Path,
        log: &mut BuildLog<'_>,
    ) -> Result<()> {
        let output_dir = app_dir.join(PACKAGE_OUTPUT_DIR);
        let package = std::fs::read_dir(&output_dir)
            .ok()
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .find(|path| {
                path.extension()
                    .map_or(false, |ext| ext == PACKAGE_EXTENSION)
            });

        match package {
            Some(path) => {
                let stored = self.artifacts.save(project_name, build_id, &path)?;
                log.append(format!("Stored package: {}", stored.display()));
            }
            None => {
                log.append(format!(
                    "No .{} package found under {}",
                    PACKAGE_EXTENSION,
                    output_dir.display()
                ));
            }
        }
        Ok(())
    }
}
