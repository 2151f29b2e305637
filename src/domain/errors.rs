//! Domain errors for the Gantry deployment system.

use thiserror::Error;

use crate::domain::ports::host::HostError;

/// Deployment-level errors, one variant per failure category.
///
/// The orchestrator records which step an error surfaced in; the error
/// itself only carries the category and the underlying cause.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Invalid deployment spec: {0}")]
    InvalidSpec(String),

    #[error("Required dependency missing: {0}")]
    MissingDependency(String),

    #[error("Conflicting routes: frontend and API both mount {prefix}")]
    ConflictingRoute { prefix: String },

    #[error("Failed to install {kind} at {path}: {reason}")]
    Install { kind: String, path: String, reason: String },

    #[error("Activation step '{action}' failed: {reason}")]
    Activation { action: String, reason: String },

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

pub type DeployResult<T> = Result<T, DeployError>;

impl DeployError {
    /// True when a deploy failure may have left artifacts or service
    /// state behind on the host.
    #[must_use]
    pub const fn leaves_partial_state(&self) -> bool {
        matches!(
            self,
            Self::Install { .. } | Self::Activation { .. } | Self::Verification(_)
        )
    }
}
