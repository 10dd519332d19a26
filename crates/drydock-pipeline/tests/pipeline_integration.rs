//! Integration tests for the build pipeline with in-memory stores and
//! stub toolchain scripts.

use std::path::Path;
use std::process::Command as StdCommand;
use std::sync::Arc;

use drydock_core::artifacts::ArtifactStore;
use drydock_core::domain::{BuildId, BuildKind, BuildStatus, FilePatch, ProjectConfig};
use drydock_core::registry::StatusRegistry;
use drydock_core::store::{MemoryProjectStore, ProjectStore};
use drydock_pipeline::{resume_push, BuildPipeline, ExternalTools};

fn run_git(repo_dir: &Path, args: &[&str]) {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn make_git_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init", "-b", "main"]);
    run_git(dir.path(), &["config", "user.name", "test-user"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    std::fs::write(dir.path().join("README.md"), "fixture\n").unwrap();
    run_git(dir.path(), &["add", "."]);
    run_git(dir.path(), &["commit", "-m", "initial"]);
    dir
}

/// Write an executable stub script standing in for a toolchain program.
fn write_stub(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_str().unwrap().to_string()
}

fn exit_ok(dir: &Path, name: &str) -> String {
    write_stub(dir, name, "exit 0")
}

/// Stub whose every invocation appends a line to `marker`.
fn recording_stub(dir: &Path, name: &str, marker: &Path) -> String {
    write_stub(
        dir,
        name,
        &format!("echo \"$@\" >> \"{}\"\nexit 0", marker.display()),
    )
}

fn npm_config(repo_url: &str) -> ProjectConfig {
    ProjectConfig {
        repo_url: repo_url.to_string(),
        branch: "main".to_string(),
        build_type: BuildKind::Npm,
        docker_image: "reg/app:1".to_string(),
        backend_pom_path: String::new(),
        frontend_path: String::new(),
        dockerfile_path: String::new(),
        app_path: String::new(),
        patches: Vec::new(),
    }
}

struct Harness {
    pipeline: Arc<BuildPipeline>,
    registry: Arc<StatusRegistry>,
    artifacts: Arc<ArtifactStore>,
    // Held for their Drop cleanup.
    _stub_dir: tempfile::TempDir,
    _artifact_dir: tempfile::TempDir,
}

async fn make_harness(
    config: Option<(&str, ProjectConfig)>,
    tools: impl FnOnce(&Path) -> ExternalTools,
) -> Harness {
    let stub_dir = tempfile::tempdir().unwrap();
    let artifact_dir = tempfile::tempdir().unwrap();

    let registry = Arc::new(StatusRegistry::new());
    let projects = Arc::new(MemoryProjectStore::new());
    if let Some((name, config)) = config {
        projects.upsert(name, config).await.unwrap();
    }
    let artifacts = Arc::new(ArtifactStore::new(artifact_dir.path().join("packages")).unwrap());

    let tools = tools(stub_dir.path());
    let pipeline = Arc::new(BuildPipeline::new(
        Arc::clone(&registry),
        projects,
        Arc::clone(&artifacts),
        tools,
    ));

    Harness {
        pipeline,
        registry,
        artifacts,
        _stub_dir: stub_dir,
        _artifact_dir: artifact_dir,
    }
}

#[tokio::test]
async fn test_npm_pipeline_success_end_to_end() {
    let repo = make_git_repo();
    let harness = make_harness(
        Some(("webshop", npm_config(repo.path().to_str().unwrap()))),
        |stubs| ExternalTools {
            npm: exit_ok(stubs, "npm"),
            docker: exit_ok(stubs, "docker"),
            ..ExternalTools::default()
        },
    )
    .await;

    let id = BuildId::new();
    harness.pipeline.execute("webshop", &id).await;

    let record = harness.registry.get(&id);
    assert_eq!(record.status, BuildStatus::Success);
    assert!(record.logs.contains("Cloning repository:"));
    assert!(record.logs.contains("Running NPM build..."));
    assert!(record.logs.contains("Pushing Docker image..."));
}

#[tokio::test]
async fn test_missing_project_goes_straight_to_error() {
    let marker = tempfile::tempdir().unwrap();
    let marker_file = marker.path().join("invocations");
    let marker_path = marker_file.clone();

    let harness = make_harness(None, move |stubs| ExternalTools {
        git: recording_stub(stubs, "git", &marker_path),
        npm: recording_stub(stubs, "npm", &marker_path),
        mvn: recording_stub(stubs, "mvn", &marker_path),
        gradle: recording_stub(stubs, "gradle", &marker_path),
        docker: recording_stub(stubs, "docker", &marker_path),
    })
    .await;

    let id = BuildId::new();
    harness.pipeline.execute("ghost", &id).await;

    let record = harness.registry.get(&id);
    assert_eq!(record.status, BuildStatus::Error);
    assert!(record.logs.contains("project not found"));
    // No workspace was created and no external command ran.
    assert!(!marker_file.exists());
}

#[tokio::test]
async fn test_clone_failure_is_error() {
    let missing = tempfile::tempdir().unwrap();
    let bogus = missing.path().join("no-such-repo");
    let harness = make_harness(
        Some(("webshop", npm_config(bogus.to_str().unwrap()))),
        |stubs| ExternalTools {
            npm: exit_ok(stubs, "npm"),
            docker: exit_ok(stubs, "docker"),
            ..ExternalTools::default()
        },
    )
    .await;

    let id = BuildId::new();
    harness.pipeline.execute("webshop", &id).await;

    let record = harness.registry.get(&id);
    assert_eq!(record.status, BuildStatus::Error);
    assert!(record.logs.contains("git error"));
}

#[tokio::test]
async fn test_patch_failure_is_best_effort() {
    let repo = make_git_repo();
    let mut config = npm_config(repo.path().to_str().unwrap());
    config.patches = vec![
        FilePatch {
            path: "missing/deep/conf.yml".to_string(),
            content: "unreachable".to_string(),
        },
        FilePatch {
            path: "README.md".to_string(),
            content: "patched".to_string(),
        },
    ];

    let harness = make_harness(Some(("webshop", config)), |stubs| ExternalTools {
        npm: exit_ok(stubs, "npm"),
        docker: exit_ok(stubs, "docker"),
        ..ExternalTools::default()
    })
    .await;

    let id = BuildId::new();
    harness.pipeline.execute("webshop", &id).await;

    let record = harness.registry.get(&id);
    assert_eq!(record.status, BuildStatus::Success);
    assert!(record.logs.contains("Failed to modify file"));
    assert!(record.logs.contains("Successfully modified README.md"));
    assert!(record.logs.contains("Running NPM build..."));
}

#[tokio::test]
async fn test_maven_toolchain_failure_is_fail() {
    let repo = make_git_repo();
    let mut config = npm_config(repo.path().to_str().unwrap());
    config.build_type = BuildKind::Maven;
    config.backend_pom_path = "pom.xml".to_string();

    let harness = make_harness(Some(("backend", config)), |stubs| ExternalTools {
        mvn: write_stub(stubs, "mvn", "echo \"BUILD FAILURE\"\nexit 1"),
        docker: exit_ok(stubs, "docker"),
        ..ExternalTools::default()
    })
    .await;

    let id = BuildId::new();
    harness.pipeline.execute("backend", &id).await;

    let record = harness.registry.get(&id);
    assert_eq!(record.status, BuildStatus::Fail);
    assert!(record.logs.contains("BUILD FAILURE"));
    // The container phase was never reached.
    assert!(!record.logs.contains("Pushing Docker image..."));
}

#[tokio::test]
async fn test_push_denied_pauses_with_image_then_resume() {
    let repo = make_git_repo();
    let harness = make_harness(
        Some(("webshop", npm_config(repo.path().to_str().unwrap()))),
        |stubs| ExternalTools {
            npm: exit_ok(stubs, "npm"),
            docker: write_stub(
                stubs,
                "docker",
                concat!(
                    "if [ \"$1\" = \"push\" ]; then\n",
                    "  echo \"denied: requested access to the resource is denied\" >&2\n",
                    "  exit 1\n",
                    "fi\n",
                    "exit 0",
                ),
            ),
            ..ExternalTools::default()
        },
    )
    .await;

    let id = BuildId::new();
    harness.pipeline.execute("webshop", &id).await;

    let paused = harness.registry.get(&id);
    assert_eq!(paused.status, BuildStatus::AuthRequired);
    assert_eq!(paused.docker_image.as_deref(), Some("reg/app:1"));
    assert!(paused.logs.contains("Registry access denied"));

    // A failing login leaves the build paused.
    let stub_dir = tempfile::tempdir().unwrap();
    let login_fail = ExternalTools {
        docker: write_stub(
            stub_dir.path(),
            "docker",
            concat!(
                "if [ \"$1\" = \"login\" ]; then\n",
                "  cat > /dev/null\n",
                "  echo \"login rejected\" >&2\n",
                "  exit 1\n",
                "fi\n",
                "exit 0",
            ),
        ),
        ..ExternalTools::default()
    };
    let err = resume_push(
        &harness.registry,
        &login_fail,
        &id,
        "builder",
        "bad-token",
        "reg/app:1",
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("registry login failed"));
    assert_eq!(harness.registry.get(&id).status, BuildStatus::AuthRequired);

    // A successful login and push finish the build.
    let login_ok = ExternalTools {
        docker: write_stub(
            stub_dir.path(),
            "docker-ok",
            concat!(
                "if [ \"$1\" = \"login\" ]; then\n",
                "  cat > /dev/null\n",
                "fi\n",
                "echo \"pushed\"\n",
                "exit 0",
            ),
        ),
        ..ExternalTools::default()
    };
    resume_push(
        &harness.registry,
        &login_ok,
        &id,
        "builder",
        "good-token",
        "reg/app:1",
    )
    .await
    .unwrap();

    let finished = harness.registry.get(&id);
    assert_eq!(finished.status, BuildStatus::Success);
    // Logs kept growing across the pause.
    assert!(finished.logs.starts_with(&paused.logs));
    assert!(finished.logs.contains("pushed"));
}

#[tokio::test]
async fn test_mobile_build_stores_artifact_without_container_phase() {
    let repo = make_git_repo();
    let marker = tempfile::tempdir().unwrap();
    let marker_file = marker.path().join("docker-invocations");
    let marker_path = marker_file.clone();

    let mut config = npm_config(repo.path().to_str().unwrap());
    config.build_type = BuildKind::Gradle;
    config.app_path = String::new();

    let harness = make_harness(Some(("shop", config)), move |stubs| ExternalTools {
        gradle: write_stub(
            stubs,
            "gradle",
            concat!(
                "mkdir -p app/build/outputs/apk/release\n",
                "echo apk-bytes > app/build/outputs/apk/release/app-release.apk\n",
                "exit 0",
            ),
        ),
        docker: recording_stub(stubs, "docker", &marker_path),
        ..ExternalTools::default()
    })
    .await;

    let id = BuildId::new();
    harness.pipeline.execute("shop", &id).await;

    let record = harness.registry.get(&id);
    assert_eq!(record.status, BuildStatus::Success);
    assert!(record.logs.contains("Stored package:"));

    let listed = harness.artifacts.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, format!("shop_{}.apk", id));

    // Mobile builds never touch the container engine.
    assert!(!marker_file.exists());
}

#[tokio::test]
async fn test_missing_package_after_assembly_is_logged_not_failed() {
    let repo = make_git_repo();
    let mut config = npm_config(repo.path().to_str().unwrap());
    config.build_type = BuildKind::Gradle;

    let harness = make_harness(Some(("shop", config)), |stubs| ExternalTools {
        gradle: exit_ok(stubs, "gradle"),
        ..ExternalTools::default()
    })
    .await;

    let id = BuildId::new();
    harness.pipeline.execute("shop", &id).await;

    let record = harness.registry.get(&id);
    assert_eq!(record.status, BuildStatus::Success);
    assert!(record.logs.contains("No .apk package found"));
    assert!(harness.artifacts.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_fire_and_forget_start_with_monotone_logs() {
    let repo = make_git_repo();
    let harness = make_harness(
        Some(("webshop", npm_config(repo.path().to_str().unwrap()))),
        |stubs| ExternalTools {
            npm: exit_ok(stubs, "npm"),
            docker: exit_ok(stubs, "docker"),
            ..ExternalTools::default()
        },
    )
    .await;

    let id = harness.pipeline.start("webshop");

    // The identifier is usable immediately.
    let first = harness.registry.get(&id);
    assert_ne!(first.status, BuildStatus::Unknown);

    let mut last_len = 0usize;
    let record = loop {
        let record = harness.registry.get(&id);
        assert!(
            record.logs.len() >= last_len,
            "logs must never shrink while polling"
        );
        last_len = record.logs.len();
        if record.status != BuildStatus::Running {
            break record;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    };

    assert_eq!(record.status, BuildStatus::Success);
}
