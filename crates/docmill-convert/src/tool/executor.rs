//! Child-process execution for external conversion tools.
//!
//! Runs a binary with captured output, a hard wall-clock timeout, and
//! kill-on-drop so abandoned conversions reap their children.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, error};

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::config::convert::ConvertConfig;
use docmill_core::error::ErrorKind;

/// Longest stderr slice embedded in an error message.
const STDERR_SNIPPET: usize = 400;

/// Captured result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolRun {
    /// Process exit code, when the process exited normally.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolRun {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Leading slice of stderr, bounded for error messages.
    pub fn stderr_snippet(&self) -> String {
        self.stderr.chars().take(STDERR_SNIPPET).collect()
    }
}

/// Executor for external conversion binaries.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    timeout: Duration,
}

impl ToolExecutor {
    /// Build an executor from configuration.
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.tool_timeout_seconds),
        }
    }

    /// Build an executor with an explicit timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run a tool and require a zero exit status.
    pub async fn run(&self, bin: &str, args: &[String]) -> AppResult<ToolRun> {
        let run = self.run_unchecked(bin, args).await?;
        if !run.success() {
            let code = run.code.unwrap_or(-1);
            error!(bin, code, stderr = %run.stderr_snippet(), "Tool failed");
            return Err(AppError::external_tool(format!(
                "{bin} exited with status {code}: {}",
                run.stderr_snippet()
            )));
        }
        Ok(run)
    }

    /// Run a tool, returning captured output even on a non-zero exit.
    ///
    /// Errors only on spawn failure or timeout. Callers that classify
    /// stderr themselves (qpdf password handling) use this directly.
    pub async fn run_unchecked(&self, bin: &str, args: &[String]) -> AppResult<ToolRun> {
        debug!(bin, ?args, "Running tool");

        let mut cmd = Command::new(bin);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::external_tool(format!("Command not found: {bin}")));
            }
            Ok(Err(e)) => {
                return Err(AppError::with_source(
                    ErrorKind::ExternalTool,
                    format!("Failed to run {bin}"),
                    e,
                ));
            }
            Err(_) => {
                error!(bin, timeout_s = self.timeout.as_secs(), "Tool timed out");
                return Err(AppError::timeout(format!(
                    "{bin} timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        Ok(ToolRun {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Require that a tool actually produced a non-empty output file.
    pub async fn expect_output(&self, bin: &str, path: &Path) -> AppResult<u64> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.len() > 0 => Ok(meta.len()),
            Ok(_) => Err(AppError::external_tool(format!(
                "{bin} produced an empty output file"
            ))),
            Err(_) => Err(AppError::external_tool(format!(
                "{bin} did not produce the expected output file"
            ))),
        }
    }
}
