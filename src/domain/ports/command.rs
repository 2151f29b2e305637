//! Port for running host commands.
//!
//! Every external tool the deployer touches (systemctl, nginx, apt-get,
//! certbot) goes through this trait so tests can script outcomes without
//! spawning processes.

use async_trait::async_trait;
use thiserror::Error;

/// Captured result of a finished host command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Process exit code, or -1 when terminated by a signal.
    pub status: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutcome {
    /// Build a successful outcome with the given stdout.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Build a failed outcome with the given exit code and stderr.
    #[must_use]
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }

    /// Best available one-line failure description for error messages.
    #[must_use]
    pub fn failure_summary(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.lines().last().unwrap_or(stderr).to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.lines().last().unwrap_or(stdout).to_string();
        }
        format!("exit code {}", self.status)
    }
}

/// Errors from the command runner itself, as opposed to commands that
/// ran and exited nonzero.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to collect output of '{program}': {source}")]
    WaitFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Empty command line")]
    EmptyCommand,
}

/// Runs commands on the host, capturing their output.
///
/// `run` executes as the invoking user; `run_privileged` executes with
/// elevated rights (sudo when the process is not already root).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command as the invoking user.
    async fn run(&self, argv: &[&str]) -> Result<CommandOutcome, CommandError>;

    /// Run a command with elevated privileges.
    async fn run_privileged(&self, argv: &[&str]) -> Result<CommandOutcome, CommandError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        assert!(CommandOutcome::ok("fine").success());
        assert!(!CommandOutcome::failed(1, "boom").success());
    }

    #[test]
    fn test_failure_summary_prefers_stderr() {
        let outcome = CommandOutcome {
            status: 2,
            stdout: "partial output".to_string(),
            stderr: "first line\nactual cause".to_string(),
        };
        assert_eq!(outcome.failure_summary(), "actual cause");
    }

    #[test]
    fn test_failure_summary_falls_back_to_exit_code() {
        let outcome = CommandOutcome::failed(127, "");
        assert_eq!(outcome.failure_summary(), "exit code 127");
    }
}
