//! Child-process execution with a hard timeout.

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{SonarGateError, SonarGateResult};

/// Captured output of a completed tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error (where measurement tools put diagnostics).
    pub stderr: String,
}

/// Spawn `cmd` with `args`, wait up to `timeout_dur`, and return its
/// captured output. A non-zero exit status is an error carrying the
/// captured stderr; a timeout kills nothing explicitly (the child is
/// dropped with the future) but is reported distinctly from a spawn
/// failure so callers can distinguish the two in logs.
pub async fn run(cmd: &str, args: &[String], timeout_dur: Duration) -> SonarGateResult<ToolOutput> {
    let child = Command::new(cmd)
        .args(args)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| SonarGateError::measurement(format!("failed to spawn {cmd}: {e}")))?;

    let output = match timeout(timeout_dur, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(SonarGateError::measurement(format!(
                "{cmd} exited abnormally: {e}"
            )));
        }
        Err(_) => {
            return Err(SonarGateError::measurement(format!(
                "{cmd} timed out after {timeout_dur:?}"
            )));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(SonarGateError::measurement(format!(
            "{cmd} exited with {}: {stderr}",
            output.status
        )));
    }

    Ok(ToolOutput { stdout, stderr })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let out = run(
            "sh",
            &["-c".to_string(), "echo out; echo err 1>&2".to_string()],
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn nonzero_exit_is_error() {
        let err = run(
            "sh",
            &["-c".to_string(), "exit 3".to_string()],
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SonarGateError::Measurement { .. }));
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let err = run(
            "sh",
            &["-c".to_string(), "sleep 2".to_string()],
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn spawn_failure_is_measurement_error() {
        let err = run(
            "sonargate-nonexistent-binary-xyz",
            &[],
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SonarGateError::Measurement { .. }));
    }
}
