//! drydock - build pipeline orchestrator CLI
//!
//! The `drydock` command drives the build engine in-process.
//!
//! ## Commands
//!
//! - `project`: create/overwrite, show and list project configurations
//! - `build`: start a build, poll its status, stream logs; on a denied
//!   push, prompt for registry credentials and resume
//! - `branches`: list the remote branches of a repository
//! - `artifacts`: list, fetch and delete stored packages

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use drydock_core::{
    init_tracing, ArtifactStore, BuildKind, BuildStatus, FilePatch, JsonProjectStore,
    ProjectConfig, ProjectStore, StatusRegistry,
};
use drydock_pipeline::{discover_branches, resume_push, BuildPipeline, ExternalTools};

#[derive(Parser)]
#[command(name = "drydock")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build pipeline orchestrator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Project configuration file
    #[arg(long, global = true, default_value = "projects.json")]
    projects_file: PathBuf,

    /// Directory for produced packages
    #[arg(long, global = true, default_value = "packages")]
    artifacts_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage project configurations
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Start a build and poll it to completion
    Build {
        /// Project name
        project: String,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "500")]
        poll_ms: u64,
    },

    /// List remote branches of a repository
    Branches {
        /// Repository URL
        repo_url: String,
    },

    /// Manage produced packages
    Artifacts {
        #[command(subcommand)]
        action: ArtifactAction,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Create or overwrite a project configuration
    Set {
        /// Project name
        name: String,

        /// Source repository URL
        #[arg(long)]
        repo_url: String,

        /// Branch to build
        #[arg(long, default_value = "main")]
        branch: String,

        /// Build type: maven, npm or gradle
        #[arg(long)]
        build_type: String,

        /// Target image reference (maven/npm)
        #[arg(long, default_value = "")]
        docker_image: String,

        /// Project descriptor path (maven)
        #[arg(long, default_value = "")]
        backend_pom_path: String,

        /// Frontend asset path (npm)
        #[arg(long, default_value = "")]
        frontend_path: String,

        /// Image build-context path (maven/npm)
        #[arg(long, default_value = "")]
        dockerfile_path: String,

        /// Build-project path (gradle)
        #[arg(long, default_value = "")]
        app_path: String,

        /// JSON file with an array of {path, content} patches
        #[arg(long)]
        patches_file: Option<PathBuf>,
    },

    /// Print one configuration as JSON
    Show {
        /// Project name
        name: String,
    },

    /// List configured project names
    List,
}

#[derive(Subcommand)]
enum ArtifactAction {
    /// List stored packages
    List,

    /// Copy a stored package to a destination path
    Get {
        /// Package file name
        name: String,

        /// Destination path
        dest: PathBuf,
    },

    /// Delete a stored package
    Delete {
        /// Package file name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let projects: Arc<dyn ProjectStore> = Arc::new(JsonProjectStore::new(&cli.projects_file));
    let artifacts = Arc::new(
        ArtifactStore::new(&cli.artifacts_dir).context("Failed to open artifact directory")?,
    );

    match cli.command {
        Commands::Project { action } => match action {
            ProjectAction::Set {
                name,
                repo_url,
                branch,
                build_type,
                docker_image,
                backend_pom_path,
                frontend_path,
                dockerfile_path,
                app_path,
                patches_file,
            } => {
                let build_type = parse_build_type(&build_type)?;
                let patches = match patches_file {
                    Some(path) => read_patches(&path)?,
                    None => Vec::new(),
                };
                let config = ProjectConfig {
                    repo_url,
                    branch,
                    build_type,
                    docker_image,
                    backend_pom_path,
                    frontend_path,
                    dockerfile_path,
                    app_path,
                    patches,
                };
                projects
                    .upsert(&name, config)
                    .await
                    .context("Failed to write project configuration")?;
                println!("Saved project '{}'", name);
                Ok(())
            }
            ProjectAction::Show { name } => cmd_project_show(projects, &name).await,
            ProjectAction::List => cmd_project_list(projects).await,
        },
        Commands::Build { project, poll_ms } => {
            cmd_build(projects, artifacts, &project, poll_ms).await
        }
        Commands::Branches { repo_url } => cmd_branches(&repo_url).await,
        Commands::Artifacts { action } => match action {
            ArtifactAction::List => cmd_artifacts_list(&artifacts),
            ArtifactAction::Get { name, dest } => cmd_artifacts_get(&artifacts, &name, &dest),
            ArtifactAction::Delete { name } => cmd_artifacts_delete(&artifacts, &name),
        },
    }
}

fn parse_build_type(tag: &str) -> Result<BuildKind> {
    match tag.to_lowercase().as_str() {
        "maven" => Ok(BuildKind::Maven),
        "npm" => Ok(BuildKind::Npm),
        "gradle" => Ok(BuildKind::Gradle),
        _ => anyhow::bail!("Unknown build type: {} (expected maven, npm or gradle)", tag),
    }
}

fn read_patches(path: &PathBuf) -> Result<Vec<FilePatch>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read patches file {:?}", path))?;
    serde_json::from_str(&text).context("Patches file must be a JSON array of {path, content}")
}

async fn cmd_project_show(projects: Arc<dyn ProjectStore>, name: &str) -> Result<()> {
    let config = projects
        .get(name)
        .await?
        .with_context(|| format!("Project '{}' not found", name))?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn cmd_project_list(projects: Arc<dyn ProjectStore>) -> Result<()> {
    let all = projects.load().await?;
    let mut names: Vec<&String> = all.keys().collect();
    names.sort();
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

async fn cmd_branches(repo_url: &str) -> Result<()> {
    let branches = discover_branches(&ExternalTools::default(), repo_url)
        .await
        .context("Branch discovery failed")?;
    for branch in branches {
        println!("{}", branch);
    }
    Ok(())
}

/// Start a build, stream its log growth until a terminal or paused
/// status, and — on a denied push — prompt for credentials and resume.
async fn cmd_build(
    projects: Arc<dyn ProjectStore>,
    artifacts: Arc<ArtifactStore>,
    project: &str,
    poll_ms: u64,
) -> Result<()> {
    let registry = Arc::new(StatusRegistry::new());
    let tools = ExternalTools::default();
    let pipeline = Arc::new(BuildPipeline::new(
        Arc::clone(&registry),
        projects,
        artifacts,
        tools.clone(),
    ));

    let build_id = pipeline.start(project);
    println!("Build ID: {}", build_id);

    let mut printed = 0usize;
    let mut record = loop {
        let record = registry.get(&build_id);
        if record.logs.len() > printed {
            print!("{}", &record.logs[printed..]);
            std::io::stdout().flush().ok();
            printed = record.logs.len();
        }
        if record.status != BuildStatus::Running {
            break record;
        }
        tokio::time::sleep(Duration::from_millis(poll_ms)).await;
    };

    if record.status == BuildStatus::AuthRequired {
        let image = record.docker_image.clone().unwrap_or_default();
        eprintln!("Push of {} was denied by the registry.", image);
        let username = prompt("Registry username: ")?;
        let token = prompt("Registry token: ")?;
        resume_push(
            &registry,
            &tools,
            &build_id,
            username.trim(),
            token.trim(),
            &image,
        )
        .await
        .context("Credential resume failed")?;

        record = registry.get(&build_id);
        if record.logs.len() > printed {
            print!("{}", &record.logs[printed..]);
            std::io::stdout().flush().ok();
        }
    }

    println!("Status: {}", record.status.as_str());
    if record.status != BuildStatus::Success {
        anyhow::bail!("Build finished with status '{}'", record.status.as_str());
    }
    Ok(())
}

/// Read one line from stdin after printing `message` to stderr.
fn prompt(message: &str) -> Result<String> {
    eprint!("{}", message);
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line)
}

fn cmd_artifacts_list(artifacts: &ArtifactStore) -> Result<()> {
    for info in artifacts.list()? {
        println!("{}\t{} bytes\t{}", info.name, info.size_bytes, info.created);
    }
    Ok(())
}

fn cmd_artifacts_get(artifacts: &ArtifactStore, name: &str, dest: &PathBuf) -> Result<()> {
    let source = artifacts
        .resolve(name)
        .with_context(|| format!("Package '{}' not found", name))?;
    std::fs::copy(&source, dest)
        .with_context(|| format!("Failed to copy package to {:?}", dest))?;
    println!("Copied {} -> {:?}", name, dest);
    Ok(())
}

fn cmd_artifacts_delete(artifacts: &ArtifactStore, name: &str) -> Result<()> {
    artifacts
        .delete(name)
        .with_context(|| format!("Package '{}' not found", name))?;
    println!("Deleted {}", name);
    Ok(())
}
