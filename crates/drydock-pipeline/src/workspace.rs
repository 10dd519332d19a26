//! Per-build isolated workspace.
//!
//! Each build gets a fresh temporary directory holding a single-branch
//! clone of its source. The directory is removed when the `Workspace`
//! drops — that is, when the synchronous portion of the pipeline
//! returns, on every outcome including faults and the `auth_required`
//! stop.

use std::path::Path;

use drydock_core::domain::{DrydockError, FilePatch, Result};

use crate::runner::run_command;
use crate::tools::ExternalTools;

/// Isolated working directory for one build.
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    /// Create a fresh empty workspace directory.
    pub fn create() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Clone one branch of `repo_url` into the workspace root.
    pub async fn clone_branch(
        &self,
        tools: &ExternalTools,
        repo_url: &str,
        branch: &str,
    ) -> Result<()> {
        let output = run_command(
            &tools.git,
            &[
                "clone",
                "--branch",
                branch,
                "--single-branch",
                repo_url,
                ".",
            ],
            Some(self.path()),
            None,
        )
        .await?;
        if !output.success() {
            return Err(DrydockError::Git(format!(
                "clone of {} (branch {}) failed: {}",
                repo_url,
                branch,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    /// Overwrite one file wholesale with the patch content prefixed by
    /// a single newline. No merging.
    pub fn apply_patch(&self, patch: &FilePatch) -> Result<()> {
        let target = self.path().join(&patch.path);
        std::fs::write(&target, format!("\n{}", patch.content))?;
        Ok(())
    }
}
