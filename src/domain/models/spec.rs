//! Deployment spec domain model.
//!
//! A `DeploymentSpec` is the validated, immutable set of user-declared
//! parameters for one deploy run. The orchestrator owns it and passes it
//! by reference; nothing mutates it after construction.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DeployError, DeployResult};

/// Python web framework the service is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    /// WSGI app served by gunicorn, entry point `app:app`.
    Flask,
    /// ASGI app served by uvicorn, entry point `main:app`.
    Fastapi,
    /// WSGI project served by gunicorn via `<project>.wsgi:application`.
    Django,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flask => "flask",
            Self::Fastapi => "fastapi",
            Self::Django => "django",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flask" => Some(Self::Flask),
            "fastapi" => Some(Self::Fastapi),
            "django" => Some(Self::Django),
            _ => None,
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All user-declared parameters for one deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// Root directory of the Python project on the host
    pub project_path: PathBuf,
    /// Unit name for the service (also names the proxy route files)
    pub service_name: String,
    /// Web framework the project uses
    pub framework: Framework,
    /// TCP port the application process binds
    pub port: u16,
    /// Virtual environment directory name inside the project
    pub venv_name: String,
    /// Worker process count
    pub workers: u32,
    /// Worker timeout in seconds; also bounds post-activation verification
    pub timeout_secs: u64,
    /// Domain name for the proxy route and TLS issuance
    pub domain: Option<String>,
    /// Whether the unit waits for the database before starting
    pub enable_db: bool,
    /// Environment file, relative to the project path
    pub env_file: Option<PathBuf>,
    /// Built static frontend directory to serve
    pub frontend_path: Option<PathBuf>,
    /// URL prefix the frontend is mounted under
    pub frontend_url_prefix: String,
    /// URL prefix proxied to the application
    pub api_url_prefix: String,
    /// Verbose progress output
    pub verbose: bool,
}

impl DeploymentSpec {
    /// Create a spec from the required parameters, with defaults for the
    /// rest (2 workers, 120 second timeout, API under `/api`).
    pub fn new(
        project_path: impl Into<PathBuf>,
        service_name: impl Into<String>,
        framework: Framework,
        port: u16,
        venv_name: impl Into<String>,
    ) -> Self {
        Self {
            project_path: project_path.into(),
            service_name: service_name.into(),
            framework,
            port,
            venv_name: venv_name.into(),
            workers: 2,
            timeout_secs: 120,
            domain: None,
            enable_db: false,
            env_file: None,
            frontend_path: None,
            frontend_url_prefix: "/".to_string(),
            api_url_prefix: "/api".to_string(),
            verbose: false,
        }
    }

    /// Set worker count.
    pub fn with_workers(mut self, workers: u32) -> Self {
        self.workers = workers;
        self
    }

    /// Set worker timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the domain the proxy route binds to.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Require the database to be reachable before the service starts.
    pub fn with_database(mut self) -> Self {
        self.enable_db = true;
        self
    }

    /// Set the environment file path, relative to the project.
    pub fn with_env_file(mut self, env_file: impl Into<PathBuf>) -> Self {
        self.env_file = Some(env_file.into());
        self
    }

    /// Serve a static frontend from the given build directory.
    pub fn with_frontend(mut self, frontend_path: impl Into<PathBuf>) -> Self {
        self.frontend_path = Some(frontend_path.into());
        self
    }

    /// Set the frontend URL prefix.
    pub fn with_frontend_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.frontend_url_prefix = prefix.into();
        self
    }

    /// Set the API URL prefix.
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_url_prefix = prefix.into();
        self
    }

    /// Enable verbose progress output.
    pub fn with_verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Absolute path of the virtual environment directory.
    pub fn venv_path(&self) -> PathBuf {
        self.project_path.join(&self.venv_name)
    }

    /// Absolute path of the environment file, when one is configured.
    /// An absolute `env_file` is used as-is; a relative one is resolved
    /// against the project path.
    pub fn env_file_path(&self) -> Option<PathBuf> {
        self.env_file.as_ref().map(|f| self.project_path.join(f))
    }

    /// Name of the process-manager unit, with suffix.
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.service_name)
    }

    /// Last component of the project path; names the Django WSGI module.
    pub fn project_name(&self) -> String {
        self.project_path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
    }

    /// API prefix without a trailing slash (`/` stays `/`).
    pub fn normalized_api_prefix(&self) -> &str {
        normalize_prefix(&self.api_url_prefix)
    }

    /// Frontend prefix without a trailing slash (`/` stays `/`).
    pub fn normalized_frontend_prefix(&self) -> &str {
        normalize_prefix(&self.frontend_url_prefix)
    }

    /// Check the spec's own invariants. Path existence is a host concern
    /// checked separately by the orchestrator.
    pub fn validate(&self) -> DeployResult<()> {
        if self.service_name.is_empty() {
            return Err(DeployError::InvalidSpec("service name is empty".to_string()));
        }
        if !self
            .service_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DeployError::InvalidSpec(format!(
                "service name '{}' may only contain alphanumerics, '-' and '_'",
                self.service_name
            )));
        }
        if self.port < 1024 {
            return Err(DeployError::InvalidSpec(format!(
                "port {} is reserved; use a port in 1024-65535",
                self.port
            )));
        }
        if self.workers == 0 {
            return Err(DeployError::InvalidSpec("worker count must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(DeployError::InvalidSpec("timeout must be at least 1 second".to_string()));
        }
        if self.venv_name.is_empty() {
            return Err(DeployError::InvalidSpec("venv name is empty".to_string()));
        }
        validate_prefix("api-url-prefix", &self.api_url_prefix)?;
        validate_prefix("frontend-url-prefix", &self.frontend_url_prefix)?;
        if let Some(domain) = &self.domain {
            if domain.is_empty() || domain.contains(|c: char| c.is_whitespace() || c == '/') {
                return Err(DeployError::InvalidSpec(format!("invalid domain '{domain}'")));
            }
        }
        Ok(())
    }
}

fn validate_prefix(flag: &str, prefix: &str) -> DeployResult<()> {
    if !prefix.starts_with('/') {
        return Err(DeployError::InvalidSpec(format!(
            "{flag} '{prefix}' must start with '/'"
        )));
    }
    Ok(())
}

fn normalize_prefix(prefix: &str) -> &str {
    if prefix.len() > 1 {
        prefix.trim_end_matches('/')
    } else {
        prefix
    }
}
