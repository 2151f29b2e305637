//! Rendered deployment artifacts.
//!
//! Artifacts are produced by the renderer as plain text plus placement
//! metadata, and consumed exactly once by the installer.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What a rendered artifact configures on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Process-manager unit definition
    ProcessUnit,
    /// Reverse-proxy server route
    ProxyRoute,
    /// Static frontend location snippet
    FrontendRoute,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProcessUnit => "process unit",
            Self::ProxyRoute => "proxy route",
            Self::FrontendRoute => "frontend route",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file the installer will place on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedArtifact {
    /// What this artifact configures
    pub kind: ArtifactKind,
    /// Absolute destination path on the host
    pub destination: PathBuf,
    /// Full file content
    pub content: String,
    /// Octal file mode to set after the write
    pub mode: u32,
    /// Owner of the installed file
    pub owner: String,
}

impl RenderedArtifact {
    /// Build an artifact with the host-config conventions: mode 644,
    /// owned by root.
    pub fn new(kind: ArtifactKind, destination: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            kind,
            destination: destination.into(),
            content: content.into(),
            mode: 0o644,
            owner: "root".to_string(),
        }
    }

    /// Short description used in install errors and progress output.
    pub fn describe(&self) -> String {
        format!("{} at {}", self.kind, self.destination.display())
    }
}
