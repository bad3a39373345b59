//! External command execution for controller and bridge steps.
//!
//! The orchestrator only sees the [`CommandExecutor`] trait; production
//! uses [`ProcessExecutor`], tests substitute a recording fake.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

/// A fully substituted command ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to start: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("exited with {}: {diagnostic}", status.map_or_else(|| "signal".to_string(), |c| format!("status {c}")))]
    Failed {
        status: Option<i32>,
        diagnostic: String,
    },

    #[error("timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

impl ExecError {
    /// The tool's own diagnostic text, falling back to the error description.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Failed { diagnostic, .. } if !diagnostic.is_empty() => diagnostic.clone(),
            other => other.to_string(),
        }
    }
}

// async_trait keeps CommandExecutor object-safe for Arc<dyn CommandExecutor>.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command`, returning its stdout on a zero exit status.
    async fn execute(&self, command: &CommandLine, timeout: Duration)
        -> Result<String, ExecError>;
}

/// Runs commands as child processes via `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(
        &self,
        command: &CommandLine,
        timeout: Duration,
    ) -> Result<String, ExecError> {
        let child = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ExecError::Spawn)?;

        // Dropping the wait future on timeout kills the child.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecError::TimedOut(timeout))?
            .map_err(ExecError::Spawn)?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(ExecError::Failed {
            status: output.status.code(),
            diagnostic: if stderr.is_empty() { stdout } else { stderr },
        })
    }
}
