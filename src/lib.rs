//! Gantry - single-host deployer for Python web applications
//!
//! Gantry takes a Flask, FastAPI or Django project that already lives on
//! the machine and turns it into a supervised service: it renders a
//! process-manager unit and a reverse-proxy route, installs them under
//! scoped privileges, activates the service, optionally issues a TLS
//! certificate for a domain, and verifies the result actually serves
//! traffic.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Deployment models, error taxonomy, and
//!   the ports the pipeline depends on
//! - **Service Layer** (`services`): Dependency checking, artifact
//!   rendering, installation, activation, and the step orchestrator
//! - **Infrastructure Layer** (`infrastructure`): Live host adapters,
//!   in-memory fakes, and configuration loading
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use gantry::domain::models::{Config, DeploymentSpec, Framework};
//! use gantry::infrastructure::host::{LiveHost, LiveRunner};
//! use gantry::services::DeployOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let runner = Arc::new(LiveRunner::new());
//!     let host = Arc::new(LiveHost::new(runner.clone(), &config.verify)?);
//!     let orchestrator = DeployOrchestrator::new(config, runner, host);
//!
//!     let spec = DeploymentSpec::new("/srv/app", "app", Framework::Fastapi, 8000, "venv");
//!     let report = orchestrator.run(&spec).await;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AccessInfo, Config, DeployOutcome, DeployReport, DeployStep, DeploymentSpec, Framework,
    RenderedArtifact,
};
pub use domain::ports::{CommandOutcome, CommandRunner, HostContext, HostIdentity};
pub use domain::{DeployError, DeployResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::DeployOrchestrator;
