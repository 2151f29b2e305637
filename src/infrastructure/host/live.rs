//! Live host adapter: real filesystem, real sudo, real HTTP.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use tracing::{debug, warn};

use crate::domain::models::artifact::RenderedArtifact;
use crate::domain::models::config::VerifyConfig;
use crate::domain::ports::command::CommandRunner;
use crate::domain::ports::host::{HostContext, HostError, HostIdentity};

/// `HostContext` implementation for the machine the tool runs on.
///
/// Artifact installs follow the stage-then-move pattern: content is
/// written to a user-owned temp file, then moved into place and given
/// its final mode and owner under the privileged session. Writing
/// directly into system directories would need the whole process to
/// run as root.
pub struct LiveHost {
    runner: Arc<dyn CommandRunner>,
    http: ReqwestClient,
}

impl LiveHost {
    /// Build a live host using the given runner for all shell-outs.
    pub fn new(runner: Arc<dyn CommandRunner>, verify: &VerifyConfig) -> Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(verify.probe_timeout_secs))
            .build()
            .context("Failed to build HTTP probe client")?;

        Ok(Self { runner, http })
    }

    fn running_as_root() -> bool {
        nix::unistd::geteuid().is_root()
    }

    async fn query(&self, argv: &[&str], what: &str) -> Result<String, HostError> {
        let outcome = self
            .runner
            .run(argv)
            .await
            .map_err(|e| HostError::Identity(format!("{what}: {e}")))?;
        if !outcome.success() {
            return Err(HostError::Identity(format!(
                "{what}: {}",
                outcome.failure_summary()
            )));
        }
        Ok(outcome.stdout.trim().to_string())
    }
}

#[async_trait]
impl HostContext for LiveHost {
    async fn path_exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn dir_exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn resolve_identity(&self) -> Result<HostIdentity, HostError> {
        let user = self.query(&["whoami"], "resolve user").await?;
        let group = self.query(&["id", "-gn"], "resolve group").await?;
        Ok(HostIdentity::new(user, group))
    }

    async fn resolve_address(&self) -> String {
        match self.runner.run(&["hostname", "-I"]).await {
            Ok(outcome) if outcome.success() => outcome
                .stdout
                .split_whitespace()
                .next()
                .map_or_else(|| "127.0.0.1".to_string(), ToString::to_string),
            _ => {
                warn!("Could not resolve a host address, falling back to loopback");
                "127.0.0.1".to_string()
            }
        }
    }

    async fn begin_privileged(&self) -> Result<(), HostError> {
        if Self::running_as_root() {
            return Ok(());
        }

        // Prime the sudo credential cache; later commands use `sudo -n`.
        let outcome = self
            .runner
            .run(&["sudo", "-v"])
            .await
            .map_err(|e| HostError::PrivilegeUnavailable(e.to_string()))?;
        if !outcome.success() {
            return Err(HostError::PrivilegeUnavailable(outcome.failure_summary()));
        }
        debug!("Privileged session opened");
        Ok(())
    }

    async fn end_privileged(&self) {
        if Self::running_as_root() {
            return;
        }

        if self.runner.run(&["sudo", "-k"]).await.is_err() {
            warn!("Failed to drop sudo credential cache");
        } else {
            debug!("Privileged session closed");
        }
    }

    async fn install_file(&self, artifact: &RenderedArtifact) -> Result<(), HostError> {
        let dest = artifact.destination.display().to_string();
        let install_err = |reason: String| HostError::FileInstall {
            path: dest.clone(),
            reason,
        };

        // Stage in a user-writable location first.
        let mut staged = tempfile::NamedTempFile::new()
            .map_err(|e| install_err(format!("staging file: {e}")))?;
        staged
            .write_all(artifact.content.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|e| install_err(format!("staging file: {e}")))?;
        let staged = staged.into_temp_path();
        let staged_path = staged.display().to_string();

        let mode = format!("{:o}", artifact.mode);
        let owner = format!("{0}:{0}", artifact.owner);
        let steps: [&[&str]; 3] = [
            &["mv", &staged_path, &dest],
            &["chmod", &mode, &dest],
            &["chown", &owner, &dest],
        ];

        for argv in steps {
            let outcome = self
                .runner
                .run_privileged(argv)
                .await
                .map_err(|e| install_err(e.to_string()))?;
            if !outcome.success() {
                return Err(install_err(outcome.failure_summary()));
            }
        }

        Ok(())
    }

    async fn ensure_symlink(&self, target: &Path, link: &Path) -> Result<(), HostError> {
        if self.path_exists(link).await {
            return Ok(());
        }

        let target_str = target.display().to_string();
        let link_str = link.display().to_string();
        let outcome = self
            .runner
            .run_privileged(&["ln", "-s", &target_str, &link_str])
            .await
            .map_err(|e| HostError::Symlink {
                link: link_str.clone(),
                reason: e.to_string(),
            })?;
        if !outcome.success() {
            return Err(HostError::Symlink {
                link: link_str,
                reason: outcome.failure_summary(),
            });
        }
        Ok(())
    }

    async fn http_probe(&self, url: &str) -> Result<u16, HostError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HostError::Probe(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}
