//! Credential resume for a push the registry denied.
//!
//! A build paused in `auth_required` is finished by a second,
//! independent operation: a scoped registry login followed by one
//! retry of the push. The handler never re-derives pipeline context —
//! it operates purely on the image name captured when the pause was
//! entered (the image must still be present in the container engine's
//! local cache; the build workspace is long gone).

use tracing::info;

use drydock_core::domain::{BuildId, BuildRecord, BuildStatus, DrydockError, Result};
use drydock_core::registry::StatusRegistry;

use crate::runner::run_command;
use crate::tools::ExternalTools;

/// Log in to the registry and retry the push once.
///
/// The token travels on the login process's standard input — never as
/// an argument, never into the logs. A failed login returns an error
/// without touching the registry, leaving the build in `auth_required`
/// so the caller may retry with different credentials. After a
/// successful login the push's exit code decides `success` or `fail`,
/// written to the registry for `build_id`.
pub async fn resume_push(
    registry: &StatusRegistry,
    tools: &ExternalTools,
    build_id: &BuildId,
    username: &str,
    token: &str,
    image: &str,
) -> Result<()> {
    let login = run_command(
        &tools.docker,
        &["login", "--username", username, "--password-stdin"],
        None,
        Some(token),
    )
    .await?;
    if !login.success() {
        return Err(DrydockError::RegistryAuth(login.stderr.trim().to_string()));
    }

    let push = run_command(&tools.docker, &["push", image], None, None).await?;
    let status = if push.success() {
        BuildStatus::Success
    } else {
        BuildStatus::Fail
    };
    info!(build = %build_id, status = status.as_str(), "resumed push finished");

    // Append the push output to the logs accumulated before the pause.
    let prior = registry.get(build_id);
    let logs = format!("{}{}\n{}\n", prior.logs, push.stdout, push.stderr);
    registry.update(build_id, BuildRecord::finished(status, logs));
    Ok(())
}
