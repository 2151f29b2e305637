//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

use std::sync::Arc;

use gantry::domain::models::{Config, DeploymentSpec, Framework};
use gantry::infrastructure::host::{FakeHost, ScriptedRunner};
use gantry::services::DeployOrchestrator;

/// The full deployment pipeline wired to in-memory host doubles.
///
/// Keeps handles on the scripted runner and fake host so tests can
/// seed behavior before a run and inspect recorded effects after.
pub struct Harness {
    pub runner: Arc<ScriptedRunner>,
    pub host: Arc<FakeHost>,
    pub orchestrator: DeployOrchestrator,
}

#[allow(dead_code)]
impl Harness {
    /// Harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Harness with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let runner = Arc::new(ScriptedRunner::new());
        let host = Arc::new(FakeHost::new());
        let orchestrator = DeployOrchestrator::new(config, runner.clone(), host.clone());
        Self {
            runner,
            host,
            orchestrator,
        }
    }

    /// Register every filesystem path the spec expects to find on the host.
    pub fn seed_paths(&self, spec: &DeploymentSpec) {
        self.host.add_dir(&spec.project_path);
        self.host.add_dir(spec.venv_path());
        if let Some(env_file) = spec.env_file_path() {
            self.host.add_file(env_file);
        }
        if let Some(ref frontend) = spec.frontend_path {
            self.host.add_dir(frontend);
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Baseline API-only spec: FastAPI app on a bare port, no domain, no frontend.
#[allow(dead_code)]
pub fn fastapi_spec() -> DeploymentSpec {
    DeploymentSpec::new(
        "/srv/agent-api",
        "agent-api",
        Framework::Fastapi,
        8000,
        "venv",
    )
}

/// Flask variant of the baseline spec.
#[allow(dead_code)]
pub fn flask_spec() -> DeploymentSpec {
    DeploymentSpec::new("/srv/board", "board", Framework::Flask, 8100, ".venv")
}

/// Spec with a public domain, the shape that takes the TLS path.
#[allow(dead_code)]
pub fn domain_spec() -> DeploymentSpec {
    fastapi_spec().with_domain("agent.example.com")
}

/// Spec serving a static frontend next to the API.
#[allow(dead_code)]
pub fn frontend_spec() -> DeploymentSpec {
    domain_spec().with_frontend("/srv/agent-api/dist")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_specs_validate() {
        assert!(fastapi_spec().validate().is_ok());
        assert!(flask_spec().validate().is_ok());
        assert!(domain_spec().validate().is_ok());
        assert!(frontend_spec().validate().is_ok());
    }

    #[test]
    fn harness_starts_clean() {
        let harness = Harness::new();
        assert!(harness.runner.calls().is_empty());
        assert!(harness.host.installs().is_empty());
    }
}
