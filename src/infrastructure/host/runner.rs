//! Live command runner backed by tokio processes.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::ports::command::{CommandError, CommandOutcome, CommandRunner};

/// Executes host commands as real processes.
///
/// Privileged commands run through `sudo -n` when the process is not
/// already root. `-n` never prompts; it relies on the credential cache
/// primed by `LiveHost::begin_privileged`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveRunner;

impl LiveRunner {
    pub fn new() -> Self {
        Self
    }

    fn running_as_root() -> bool {
        nix::unistd::geteuid().is_root()
    }

    async fn spawn(argv: &[&str]) -> Result<CommandOutcome, CommandError> {
        let (program, args) = argv.split_first().ok_or(CommandError::EmptyCommand)?;

        debug!(command = %argv.join(" "), "Running host command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    CommandError::SpawnFailed {
                        program: (*program).to_string(),
                        source,
                    }
                }
                _ => CommandError::WaitFailed {
                    program: (*program).to_string(),
                    source,
                },
            })?;

        Ok(CommandOutcome {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl CommandRunner for LiveRunner {
    async fn run(&self, argv: &[&str]) -> Result<CommandOutcome, CommandError> {
        Self::spawn(argv).await
    }

    async fn run_privileged(&self, argv: &[&str]) -> Result<CommandOutcome, CommandError> {
        if Self::running_as_root() {
            return Self::spawn(argv).await;
        }

        let mut elevated = Vec::with_capacity(argv.len() + 2);
        elevated.push("sudo");
        elevated.push("-n");
        elevated.extend_from_slice(argv);
        Self::spawn(&elevated).await
    }
}
