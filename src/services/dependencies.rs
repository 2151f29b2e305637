//! Host dependency checking and installation.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::errors::{DeployError, DeployResult};
use crate::domain::models::dependency::SystemDependency;
use crate::domain::ports::command::CommandRunner;
use crate::domain::ports::host::HostContext;

/// Probe result for one dependency, as shown by the check command.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    /// The dependency that was probed
    pub dependency: SystemDependency,
    /// Whether its probe succeeded
    pub present: bool,
}

/// Checks for required host tools and optionally installs missing ones
/// through apt.
pub struct DependencyChecker {
    runner: Arc<dyn CommandRunner>,
    host: Arc<dyn HostContext>,
}

impl DependencyChecker {
    pub fn new(runner: Arc<dyn CommandRunner>, host: Arc<dyn HostContext>) -> Self {
        Self { runner, host }
    }

    /// Probe every dependency without mutating anything.
    pub async fn survey(&self, dependencies: &[SystemDependency]) -> Vec<DependencyStatus> {
        let mut statuses = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let present = self.probe(dependency).await;
            statuses.push(DependencyStatus {
                dependency: dependency.clone(),
                present,
            });
        }
        statuses
    }

    /// Ensure the given dependencies are usable.
    ///
    /// Absent dependencies are installed when `auto_install` is set, then
    /// re-probed. A required dependency that is still absent fails the
    /// run; optional ones are only logged.
    pub async fn ensure(
        &self,
        dependencies: &[SystemDependency],
        auto_install: bool,
    ) -> DeployResult<()> {
        let mut missing = Vec::new();
        for dependency in dependencies {
            if self.probe(dependency).await {
                debug!(dependency = %dependency.name, "Dependency present");
            } else {
                missing.push(dependency);
            }
        }

        if missing.is_empty() {
            info!("All host dependencies present");
            return Ok(());
        }

        if auto_install {
            let packages: Vec<&str> = missing.iter().map(|d| d.package.as_str()).collect();
            info!(packages = ?packages, "Installing missing packages");

            self.host.begin_privileged().await?;
            self.install_packages(&packages).await;
            self.host.end_privileged().await;

            let mut still_missing = Vec::new();
            for dependency in missing {
                if self.probe(dependency).await {
                    info!(dependency = %dependency.name, "Dependency installed");
                } else {
                    still_missing.push(dependency);
                }
            }
            missing = still_missing;
        }

        for dependency in missing {
            if dependency.required {
                return Err(DeployError::MissingDependency(dependency.name.clone()));
            }
            warn!(
                dependency = %dependency.name,
                package = %dependency.package,
                "Optional dependency missing"
            );
        }
        Ok(())
    }

    async fn probe(&self, dependency: &SystemDependency) -> bool {
        let argv: Vec<&str> = dependency.probe.iter().map(String::as_str).collect();
        match self.runner.run(&argv).await {
            Ok(outcome) => outcome.success(),
            // A probe that cannot even spawn means the tool is absent.
            Err(_) => false,
        }
    }

    /// Run the package manager; failures are logged and left for the
    /// re-probe to judge.
    async fn install_packages(&self, packages: &[&str]) {
        match self.runner.run_privileged(&["apt-get", "update"]).await {
            Ok(outcome) if !outcome.success() => {
                warn!(reason = %outcome.failure_summary(), "Package index update failed");
            }
            Err(e) => warn!(error = %e, "Package index update failed"),
            Ok(_) => {}
        }

        let mut argv = vec!["apt-get", "install", "-y"];
        argv.extend_from_slice(packages);
        match self.runner.run_privileged(&argv).await {
            Ok(outcome) if !outcome.success() => {
                warn!(reason = %outcome.failure_summary(), "Package install failed");
            }
            Err(e) => warn!(error = %e, "Package install failed"),
            Ok(_) => {}
        }
    }
}
