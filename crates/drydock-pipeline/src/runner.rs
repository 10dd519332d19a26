//! External command execution.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use drydock_core::domain::{DrydockError, Result};

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code (-1 when the process was killed by a signal).
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Both streams joined the way build logs record them.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Execute one command to completion, capturing exit code, stdout and
/// stderr. `stdin` text, when given, is written to the child's
/// standard input before waiting.
///
/// A non-zero exit code is a normal result the caller inspects, never
/// an `Err`; failing to launch the process at all is the distinct
/// [`DrydockError::Spawn`]. No timeout is imposed — callers that need
/// bounded latency own that policy.
pub async fn run_command(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    stdin: Option<&str>,
) -> Result<CommandOutput> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|e| DrydockError::Spawn {
        program: program.to_string(),
        source: e,
    })?;

    if let Some(text) = stdin {
        // Write then drop the handle so the child sees EOF.
        if let Some(mut handle) = child.stdin.take() {
            handle.write_all(text.as_bytes()).await?;
        }
    }

    let output = child.wait_with_output().await?;
    Ok(CommandOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
