use crate::error::CollaboratorError;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

/// Execute a command with a hard timeout and return its output.
///
/// The child is killed when the timeout elapses.
pub async fn execute_with_timeout(
    cmd: &str,
    args: &[String],
    timeout: Duration,
) -> Result<Output, CollaboratorError> {
    let display = display_command(cmd, args);
    log::debug!("Running: {}", display);

    let child = tokio::process::Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CollaboratorError::Spawn {
            command: display.clone(),
            reason: e.to_string(),
        })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(CollaboratorError::Spawn {
            command: display,
            reason: e.to_string(),
        }),
        Err(_) => Err(CollaboratorError::Timeout {
            command: display,
            secs: timeout.as_secs(),
        }),
    }
}

/// Execute a command and parse its stdout as JSON.
///
/// Empty stdout is an empty list. A non-zero exit or unparsable output is an error.
pub async fn execute_json(
    cmd: &str,
    args: &[String],
    timeout: Duration,
) -> Result<serde_json::Value, CollaboratorError> {
    let output = execute_with_timeout(cmd, args, timeout).await?;
    let display = display_command(cmd, args);

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CollaboratorError::CommandFailed {
            command: display,
            status: output.status.code().unwrap_or(-1),
            stderr: truncate(stderr.trim(), 200),
        });
    }

    parse_json_output(&display, &String::from_utf8_lossy(&output.stdout))
}

/// Parse CLI JSON output; blank output means "nothing listed".
pub fn parse_json_output(command: &str, stdout: &str) -> Result<serde_json::Value, CollaboratorError> {
    if stdout.trim().is_empty() {
        return Ok(serde_json::Value::Array(Vec::new()));
    }
    serde_json::from_str(stdout).map_err(|e| CollaboratorError::InvalidOutput {
        command: command.to_string(),
        reason: e.to_string(),
    })
}

/// Check if a command is available in PATH
pub fn is_command_available(cmd: &str) -> bool {
    Command::new(cmd)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

fn display_command(cmd: &str, args: &[String]) -> String {
    let mut parts = vec![cmd.to_string()];
    parts.extend(args.iter().cloned());
    parts.join(" ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut)
    }
}
