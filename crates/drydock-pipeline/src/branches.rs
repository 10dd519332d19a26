//! Remote branch discovery.

use drydock_core::domain::{DrydockError, Result};

use crate::runner::run_command;
use crate::tools::ExternalTools;

/// List the remote branch names of `repo_url`.
///
/// Uses a disposable clone-without-checkout in a scratch directory
/// (removed on return), enumerates `refs/remotes/origin`, strips the
/// `origin/` prefix and drops the symbolic `HEAD` reference.
pub async fn discover_branches(tools: &ExternalTools, repo_url: &str) -> Result<Vec<String>> {
    let scratch = tempfile::tempdir()?;

    let clone = run_command(
        &tools.git,
        &["clone", "--no-checkout", repo_url, "."],
        Some(scratch.path()),
        None,
    )
    .await?;
    if !clone.success() {
        return Err(DrydockError::Git(format!(
            "clone of {} failed: {}",
            repo_url,
            clone.stderr.trim()
        )));
    }

    let refs = run_command(
        &tools.git,
        &["for-each-ref", "refs/remotes/origin", "--format=%(refname:short)"],
        Some(scratch.path()),
        None,
    )
    .await?;
    if !refs.success() {
        return Err(DrydockError::Git(format!(
            "listing remote refs failed: {}",
            refs.stderr.trim()
        )));
    }

    Ok(refs
        .stdout
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.contains("HEAD"))
        .map(|name| name.trim_start_matches("origin/").to_string())
        .collect())
}
