//! Implementation of the `gantry deploy` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::cli::output::progress::{
    create_hidden_spinner, create_spinner_with_message, ProgressBarExt,
};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::report::{DeployOutcome, DeployReport};
use crate::domain::models::spec::{DeploymentSpec, Framework};
use crate::domain::ports::command::CommandRunner;
use crate::domain::ports::host::HostContext;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::host::live::LiveHost;
use crate::infrastructure::host::runner::LiveRunner;
use crate::services::orchestrator::DeployOrchestrator;

/// Deployment parameters shared by the deploy and render commands.
#[derive(Args, Debug, Clone)]
pub struct SpecArgs {
    /// Root directory of the Python project on the host
    #[arg(long)]
    pub project_path: PathBuf,

    /// Name for the service unit and proxy route
    #[arg(long)]
    pub service_name: String,

    /// Web framework the project uses
    #[arg(long, value_parser = parse_framework)]
    pub framework: Framework,

    /// TCP port the application process binds
    #[arg(long)]
    pub port: u16,

    /// Virtual environment directory name inside the project
    #[arg(long)]
    pub venv_name: String,

    /// Worker process count
    #[arg(long, default_value_t = 2)]
    pub workers: u32,

    /// Worker timeout in seconds; also bounds post-activation verification
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Domain name for the proxy route and certificate issuance
    #[arg(long)]
    pub domain: Option<String>,

    /// Wait for the database service before starting the application
    #[arg(long)]
    pub enable_db: bool,

    /// Environment file, relative to the project path
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Built static frontend directory to serve alongside the API
    #[arg(long)]
    pub frontend_path: Option<PathBuf>,

    /// URL prefix the frontend is mounted under
    #[arg(long, default_value = "/")]
    pub frontend_url_prefix: String,

    /// URL prefix proxied to the application
    #[arg(long, default_value = "/api")]
    pub api_url_prefix: String,
}

impl SpecArgs {
    /// Build the domain spec from the parsed flags.
    pub fn to_spec(&self) -> DeploymentSpec {
        let mut spec = DeploymentSpec::new(
            &self.project_path,
            &self.service_name,
            self.framework,
            self.port,
            &self.venv_name,
        )
        .with_workers(self.workers)
        .with_timeout(self.timeout)
        .with_frontend_prefix(&self.frontend_url_prefix)
        .with_api_prefix(&self.api_url_prefix);

        if let Some(domain) = &self.domain {
            spec = spec.with_domain(domain);
        }
        if self.enable_db {
            spec = spec.with_database();
        }
        if let Some(env_file) = &self.env_file {
            spec = spec.with_env_file(env_file);
        }
        if let Some(frontend) = &self.frontend_path {
            spec = spec.with_frontend(frontend);
        }
        spec
    }
}

/// Framework names accepted on the command line.
fn parse_framework(s: &str) -> Result<Framework, String> {
    Framework::from_str(s)
        .ok_or_else(|| format!("unknown framework '{s}' (expected flask, fastapi or django)"))
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Verbose progress output
    #[arg(long, short)]
    pub verbose: bool,
}

impl DeployArgs {
    pub fn to_spec(&self) -> DeploymentSpec {
        let spec = self.spec.to_spec();
        if self.verbose {
            spec.with_verbose()
        } else {
            spec
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct DeployOutput {
    pub report: DeployReport,
}

impl CommandOutput for DeployOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![TableFormatter::new().format_steps(&self.report.steps)];

        match &self.report.outcome {
            DeployOutcome::Succeeded { access } => {
                lines.push("\nDeployment succeeded.".to_string());
                match (&access.api_url, &access.frontend_url) {
                    (Some(api), Some(frontend)) => {
                        lines.push(format!("  Frontend: {frontend}"));
                        lines.push(format!("  API:      {api}"));
                    }
                    _ => lines.push(format!("  Access URL: {}", access.base_url)),
                }
                lines.push("\nManage the service:".to_string());
                lines.push(format!("  sudo systemctl status {}", self.report.service_name));
                lines.push(format!("  sudo journalctl -u {} -f", self.report.service_name));
            }
            DeployOutcome::Failed {
                step,
                error,
                partial_state,
            } => {
                lines.push(format!("\nDeployment failed at {step}: {error}"));
                if *partial_state {
                    lines.push(
                        "Artifacts from completed steps were left in place; inspect them before retrying."
                            .to_string(),
                    );
                }
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.report).unwrap_or_default()
    }
}

pub async fn execute(args: DeployArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let spec = args.to_spec();

    let runner: Arc<dyn CommandRunner> = Arc::new(LiveRunner::new());
    let host: Arc<dyn HostContext> =
        Arc::new(LiveHost::new(Arc::clone(&runner), &config.verify)?);
    let orchestrator = DeployOrchestrator::new(config, runner, host);

    let spinner = if json_mode {
        create_hidden_spinner()
    } else {
        create_spinner_with_message(format!("Deploying {}...", spec.service_name))
    };

    let report = orchestrator.run(&spec).await;

    match &report.outcome {
        DeployOutcome::Succeeded { access } => {
            spinner.finish_success(format!("Deployed {} at {}", spec.service_name, access.base_url));
        }
        DeployOutcome::Failed { step, .. } => {
            spinner.finish_error(format!("Deploy failed while {}", step.display_name().to_lowercase()));
        }
    }

    let output_data = DeployOutput { report };
    output(&output_data, json_mode);

    if let DeployOutcome::Failed { step, error, .. } = &output_data.report.outcome {
        bail!("deploy failed at {step}: {error}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::domain::models::report::{AccessInfo, DeployStep, StepRecord};

    fn args() -> SpecArgs {
        SpecArgs {
            project_path: PathBuf::from("/srv/agent-api"),
            service_name: "agent-api".to_string(),
            framework: Framework::Fastapi,
            port: 8000,
            venv_name: "venv".to_string(),
            workers: 2,
            timeout: 120,
            domain: None,
            enable_db: false,
            env_file: None,
            frontend_path: None,
            frontend_url_prefix: "/".to_string(),
            api_url_prefix: "/api".to_string(),
        }
    }

    fn report(outcome: DeployOutcome) -> DeployReport {
        let mut record = StepRecord::new(DeployStep::Validating);
        record.start();
        record.finish(true, None);
        DeployReport {
            run_id: Uuid::new_v4(),
            service_name: "agent-api".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            steps: vec![record],
            outcome,
        }
    }

    #[test]
    fn test_spec_args_map_to_domain_spec() {
        let mut args = args();
        args.domain = Some("agent.example.com".to_string());
        args.enable_db = true;
        args.frontend_path = Some(PathBuf::from("/srv/agent-api/dist"));

        let spec = args.to_spec();

        assert_eq!(spec.service_name, "agent-api");
        assert_eq!(spec.port, 8000);
        assert_eq!(spec.domain.as_deref(), Some("agent.example.com"));
        assert!(spec.enable_db);
        assert_eq!(spec.frontend_path, Some(PathBuf::from("/srv/agent-api/dist")));
        assert!(!spec.verbose);
    }

    #[test]
    fn test_framework_parsing_rejects_unknown() {
        assert!(parse_framework("fastapi").is_ok());
        assert!(parse_framework("rails").is_err());
    }

    #[test]
    fn test_human_output_for_success_lists_urls() {
        let output_data = DeployOutput {
            report: report(DeployOutcome::Succeeded {
                access: AccessInfo::new("https://agent.example.com")
                    .with_routes("https://agent.example.com/api", "https://agent.example.com/"),
            }),
        };

        let text = output_data.to_human();
        assert!(text.contains("Deployment succeeded."));
        assert!(text.contains("API:      https://agent.example.com/api"));
        assert!(text.contains("systemctl status agent-api"));
    }

    #[test]
    fn test_human_output_for_failure_names_step() {
        let output_data = DeployOutput {
            report: report(DeployOutcome::Failed {
                step: DeployStep::Installing,
                error: "permission denied".to_string(),
                partial_state: true,
            }),
        };

        let text = output_data.to_human();
        assert!(text.contains("failed at installing"));
        assert!(text.contains("left in place"));
    }

    #[test]
    fn test_json_output_carries_outcome_status() {
        let output_data = DeployOutput {
            report: report(DeployOutcome::Succeeded {
                access: AccessInfo::new("http://10.0.0.5:8000"),
            }),
        };

        let value = output_data.to_json();
        assert_eq!(value["outcome"]["status"], "succeeded");
        assert_eq!(value["outcome"]["access"]["base_url"], "http://10.0.0.5:8000");
    }
}
