//! Port for host state: filesystem, identity, privileges, reachability.
//!
//! Every mutation of the live host flows through this trait. A deploy run
//! against a fake implementation must leave the real machine untouched.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::artifact::RenderedArtifact;

/// User and group a deployed service runs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostIdentity {
    /// Login name of the deploying user.
    pub user: String,
    /// Primary group of the deploying user.
    pub group: String,
}

impl HostIdentity {
    /// Build an identity from already-resolved user and group names.
    #[must_use]
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }
}

/// Errors surfaced by host context implementations.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Privilege escalation unavailable: {0}")]
    PrivilegeUnavailable(String),

    #[error("Failed to resolve host identity: {0}")]
    Identity(String),

    #[error("Failed to write {path}: {reason}")]
    FileInstall { path: String, reason: String },

    #[error("Failed to link {link}: {reason}")]
    Symlink { link: String, reason: String },

    #[error("HTTP probe failed: {0}")]
    Probe(String),
}

/// Capability surface over the machine being deployed to.
///
/// Read operations (`path_exists`, `resolve_identity`, `resolve_address`)
/// never mutate the host. Mutating operations (`install_file`,
/// `ensure_symlink`) require an open privileged session.
#[async_trait]
pub trait HostContext: Send + Sync {
    /// Whether a path exists on the host.
    async fn path_exists(&self, path: &Path) -> bool;

    /// Whether a path exists and is a directory.
    async fn dir_exists(&self, path: &Path) -> bool;

    /// Resolve the user/group the service unit should run as.
    async fn resolve_identity(&self) -> Result<HostIdentity, HostError>;

    /// Resolve the host's primary address for access URLs. Falls back to
    /// the loopback address when no external address is configured.
    async fn resolve_address(&self) -> String;

    /// Open a privileged session. Must be paired with `end_privileged`
    /// on every exit path.
    async fn begin_privileged(&self) -> Result<(), HostError>;

    /// Close the current privileged session. Best effort, never fails.
    async fn end_privileged(&self);

    /// Write an artifact to its destination with the required mode and
    /// owner. Overwrites any existing file.
    async fn install_file(&self, artifact: &RenderedArtifact) -> Result<(), HostError>;

    /// Create a symlink at `link` pointing to `target` unless it already
    /// exists.
    async fn ensure_symlink(&self, target: &Path, link: &Path) -> Result<(), HostError>;

    /// Issue an HTTP GET and return the response status code.
    async fn http_probe(&self, url: &str) -> Result<u16, HostError>;
}
