//! System dependency model.
//!
//! The fixed set of host tools a deploy needs, with how to probe for
//! each and which apt package provides it. Queried once per run, never
//! persisted.

use serde::{Deserialize, Serialize};

/// One host tool the deployment relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDependency {
    /// Display name
    pub name: String,
    /// Probe command; exit status zero means present
    pub probe: Vec<String>,
    /// Package that provides the tool
    pub package: String,
    /// Whether a deploy can proceed without it
    pub required: bool,
}

impl SystemDependency {
    fn new(name: &str, probe: &[&str], package: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            probe: probe.iter().map(ToString::to_string).collect(),
            package: package.to_string(),
            required,
        }
    }
}

/// The dependency set for one deployment.
///
/// The process manager and reverse proxy are always required. The
/// certificate tool and its proxy plugin only become required when the
/// deploy asks for a domain (`needs_tls`); without one they are probed
/// but missing installs are merely reported.
pub fn host_dependencies(needs_tls: bool) -> Vec<SystemDependency> {
    vec![
        SystemDependency::new("systemd", &["systemctl", "--version"], "systemd", true),
        SystemDependency::new("nginx", &["nginx", "-v"], "nginx", true),
        SystemDependency::new("certbot", &["certbot", "--version"], "certbot", needs_tls),
        SystemDependency::new(
            "certbot nginx plugin",
            &["dpkg", "-s", "python3-certbot-nginx"],
            "python3-certbot-nginx",
            needs_tls,
        ),
    ]
}
