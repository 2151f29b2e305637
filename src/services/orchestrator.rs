//! Deploy run orchestration.
//!
//! Owns the step state machine: Validating, CheckingDependencies,
//! Rendering, Installing, Activating, Verifying. Steps run strictly in
//! order; the first failure stops the run and every later step is
//! recorded as skipped. The orchestrator never panics on a failed
//! deploy, it reports.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::{DeployError, DeployResult};
use crate::domain::models::artifact::RenderedArtifact;
use crate::domain::models::config::Config;
use crate::domain::models::dependency::host_dependencies;
use crate::domain::models::report::{
    AccessInfo, DeployOutcome, DeployReport, DeployStep, StepRecord,
};
use crate::domain::models::spec::DeploymentSpec;
use crate::domain::ports::command::CommandRunner;
use crate::domain::ports::host::HostContext;
use crate::services::activator::ServiceActivator;
use crate::services::dependencies::DependencyChecker;
use crate::services::installer::FileInstaller;
use crate::services::renderer::ArtifactRenderer;

/// State accumulated across steps within one run.
#[derive(Default)]
struct RunContext {
    artifacts: Vec<RenderedArtifact>,
    access: Option<AccessInfo>,
}

/// Drives one deployment from spec to report.
pub struct DeployOrchestrator {
    config: Config,
    host: Arc<dyn HostContext>,
    checker: DependencyChecker,
    installer: FileInstaller,
    activator: ServiceActivator,
}

impl DeployOrchestrator {
    pub fn new(
        config: Config,
        runner: Arc<dyn CommandRunner>,
        host: Arc<dyn HostContext>,
    ) -> Self {
        let checker = DependencyChecker::new(Arc::clone(&runner), Arc::clone(&host));
        let installer = FileInstaller::new(Arc::clone(&host));
        let activator = ServiceActivator::new(
            Arc::clone(&runner),
            Arc::clone(&host),
            config.layout.clone(),
            config.verify.clone(),
        );
        Self {
            config,
            host,
            checker,
            installer,
            activator,
        }
    }

    /// Run the full deployment for a spec.
    ///
    /// Always returns a report; failures live inside its outcome. The
    /// `partial_state` flag is set when the failing step may have left
    /// files or service state behind on the host.
    pub async fn run(&self, spec: &DeploymentSpec) -> DeployReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(service = %spec.service_name, %run_id, "Starting deploy run");

        let mut ctx = RunContext::default();
        let mut steps: Vec<StepRecord> = DeployStep::all().into_iter().map(StepRecord::new).collect();
        let mut failure: Option<(DeployStep, DeployError)> = None;

        for record in &mut steps {
            if failure.is_some() {
                record.skip();
                continue;
            }
            record.start();
            debug!(step = %record.step, "Running step");
            match self.execute_step(record.step, spec, &mut ctx).await {
                Ok(detail) => record.finish(true, detail),
                Err(error) => {
                    warn!(step = %record.step, %error, "Deploy step failed");
                    record.finish(false, Some(error.to_string()));
                    failure = Some((record.step, error));
                }
            }
        }

        let outcome = match failure {
            Some((step, error)) => DeployOutcome::Failed {
                step,
                partial_state: error.leaves_partial_state(),
                error: error.to_string(),
            },
            None => match ctx.access {
                Some(access) => DeployOutcome::Succeeded { access },
                // Unreachable as long as Activating ran, but a report
                // must never panic its way out of a deploy.
                None => DeployOutcome::Failed {
                    step: DeployStep::Activating,
                    error: "activation produced no access info".to_string(),
                    partial_state: true,
                },
            },
        };

        let report = DeployReport {
            run_id,
            service_name: spec.service_name.clone(),
            started_at,
            finished_at: Utc::now(),
            steps,
            outcome,
        };
        info!(
            service = %spec.service_name,
            %run_id,
            success = report.is_success(),
            "Deploy run finished"
        );
        report
    }

    async fn execute_step(
        &self,
        step: DeployStep,
        spec: &DeploymentSpec,
        ctx: &mut RunContext,
    ) -> DeployResult<Option<String>> {
        match step {
            DeployStep::Validating => {
                spec.validate()?;
                self.validate_paths(spec).await?;
                Ok(None)
            }
            DeployStep::CheckingDependencies => {
                let dependencies = host_dependencies(spec.domain.is_some());
                self.checker
                    .ensure(&dependencies, self.config.dependencies.auto_install)
                    .await?;
                Ok(Some(format!("{} tools present", dependencies.len())))
            }
            DeployStep::Rendering => {
                let identity = self.host.resolve_identity().await?;
                let renderer = ArtifactRenderer::new(identity, self.config.layout.clone());
                ctx.artifacts = renderer.render(spec)?;
                Ok(Some(format!("{} artifacts", ctx.artifacts.len())))
            }
            DeployStep::Installing => {
                self.installer.install(&ctx.artifacts).await?;
                Ok(Some(format!("{} files installed", ctx.artifacts.len())))
            }
            DeployStep::Activating => {
                let access = self.activator.activate(spec).await?;
                let detail = access.base_url.clone();
                ctx.access = Some(access);
                Ok(Some(detail))
            }
            DeployStep::Verifying => {
                self.activator.verify(spec).await?;
                Ok(Some("service active and reachable".to_string()))
            }
        }
    }

    /// Path preconditions the spec's own `validate` cannot see.
    async fn validate_paths(&self, spec: &DeploymentSpec) -> DeployResult<()> {
        if !self.host.dir_exists(&spec.project_path).await {
            return Err(DeployError::InvalidSpec(format!(
                "project path '{}' does not exist",
                spec.project_path.display()
            )));
        }
        let venv = spec.venv_path();
        if !self.host.dir_exists(&venv).await {
            return Err(DeployError::InvalidSpec(format!(
                "virtual environment not found at '{}'",
                venv.display()
            )));
        }
        if let Some(env_file) = spec.env_file_path() {
            if !self.host.path_exists(&env_file).await {
                return Err(DeployError::InvalidSpec(format!(
                    "env file '{}' does not exist",
                    env_file.display()
                )));
            }
        }
        if let Some(frontend) = &spec.frontend_path {
            if !self.host.dir_exists(frontend).await {
                return Err(DeployError::InvalidSpec(format!(
                    "frontend path '{}' does not exist",
                    frontend.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::report::StepStatus;
    use crate::domain::models::spec::Framework;
    use crate::infrastructure::host::fake::{FakeHost, ScriptedRunner};

    fn spec() -> DeploymentSpec {
        DeploymentSpec::new("/srv/agent-api", "agent-api", Framework::Fastapi, 8000, "venv")
    }

    fn orchestrator(runner: Arc<ScriptedRunner>, host: Arc<FakeHost>) -> DeployOrchestrator {
        DeployOrchestrator::new(Config::default(), runner, host)
    }

    fn seed_project(host: &FakeHost) {
        host.add_dir("/srv/agent-api");
        host.add_dir("/srv/agent-api/venv");
    }

    #[tokio::test]
    async fn test_all_steps_succeed_in_order() {
        let runner = Arc::new(ScriptedRunner::new());
        let host = Arc::new(FakeHost::new());
        seed_project(&host);

        let report = orchestrator(runner, host.clone()).run(&spec()).await;

        assert!(report.is_success());
        assert_eq!(report.steps.len(), 6);
        for record in &report.steps {
            assert_eq!(record.status, StepStatus::Succeeded, "step {}", record.step);
        }
        assert_eq!(report.access().unwrap().base_url, "http://10.0.0.5:8000");
        assert!(host.privilege_balanced());
    }

    #[tokio::test]
    async fn test_invalid_spec_skips_everything_after_validation() {
        let runner = Arc::new(ScriptedRunner::new());
        let host = Arc::new(FakeHost::new());
        seed_project(&host);
        let bad = DeploymentSpec::new("/srv/agent-api", "agent-api", Framework::Flask, 80, "venv");

        let report = orchestrator(runner.clone(), host.clone()).run(&bad).await;

        assert_eq!(report.failed_step(), Some(DeployStep::Validating));
        assert_eq!(report.steps[0].status, StepStatus::Failed);
        for record in &report.steps[1..] {
            assert_eq!(record.status, StepStatus::Skipped);
        }
        match &report.outcome {
            DeployOutcome::Failed { partial_state, .. } => assert!(!partial_state),
            DeployOutcome::Succeeded { .. } => panic!("must fail"),
        }
        assert!(runner.calls().is_empty(), "no commands before validation passes");
        assert!(host.installs().is_empty());
    }

    #[tokio::test]
    async fn test_missing_venv_fails_validation() {
        let runner = Arc::new(ScriptedRunner::new());
        let host = Arc::new(FakeHost::new());
        host.add_dir("/srv/agent-api");

        let report = orchestrator(runner, host).run(&spec()).await;

        assert_eq!(report.failed_step(), Some(DeployStep::Validating));
        let message = report.steps[0].message.as_deref().unwrap();
        assert!(message.contains("/srv/agent-api/venv"));
    }
}
