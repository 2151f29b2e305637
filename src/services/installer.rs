//! Installation of rendered artifacts into host config directories.

use std::sync::Arc;

use tracing::info;

use crate::domain::errors::{DeployError, DeployResult};
use crate::domain::models::artifact::RenderedArtifact;
use crate::domain::ports::host::{HostContext, HostError};

/// Writes rendered artifacts to their destinations under a single
/// privileged session.
pub struct FileInstaller {
    host: Arc<dyn HostContext>,
}

impl FileInstaller {
    pub fn new(host: Arc<dyn HostContext>) -> Self {
        Self { host }
    }

    /// Install every artifact in order, failing fast on the first write
    /// error. Privileges are acquired once and released on every exit
    /// path. Artifacts written before a failure stay in place.
    pub async fn install(&self, artifacts: &[RenderedArtifact]) -> DeployResult<()> {
        self.host.begin_privileged().await?;
        let result = self.write_all(artifacts).await;
        self.host.end_privileged().await;
        result
    }

    async fn write_all(&self, artifacts: &[RenderedArtifact]) -> DeployResult<()> {
        for artifact in artifacts {
            info!(
                kind = %artifact.kind,
                path = %artifact.destination.display(),
                "Installing artifact"
            );
            self.host
                .install_file(artifact)
                .await
                .map_err(|e| install_error(artifact, e))?;
        }
        Ok(())
    }
}

fn install_error(artifact: &RenderedArtifact, source: HostError) -> DeployError {
    let reason = match source {
        HostError::FileInstall { reason, .. } => reason,
        other => other.to_string(),
    };
    DeployError::Install {
        kind: artifact.kind.to_string(),
        path: artifact.destination.display().to_string(),
        reason,
    }
}
