//! Implementation of the `gantry check` command.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::cli::output::progress::{
    create_hidden_spinner, create_spinner_with_message, ProgressBarExt,
};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::dependency::host_dependencies;
use crate::domain::ports::command::CommandRunner;
use crate::domain::ports::host::HostContext;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::host::live::LiveHost;
use crate::infrastructure::host::runner::LiveRunner;
use crate::services::dependencies::{DependencyChecker, DependencyStatus};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Install missing packages through apt before reporting
    #[arg(long)]
    pub install: bool,

    /// Treat the certificate tooling as required, as a domain deploy would
    #[arg(long)]
    pub tls: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct CheckOutput {
    pub statuses: Vec<DependencyStatus>,
    pub all_required_present: bool,
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![TableFormatter::new().format_dependencies(&self.statuses)];
        if self.all_required_present {
            lines.push("\nAll required host tools are present.".to_string());
        } else {
            lines.push(
                "\nRequired host tools are missing. Re-run with --install or install them manually."
                    .to_string(),
            );
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: CheckArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let runner: Arc<dyn CommandRunner> = Arc::new(LiveRunner::new());
    let host: Arc<dyn HostContext> =
        Arc::new(LiveHost::new(Arc::clone(&runner), &config.verify)?);
    let checker = DependencyChecker::new(runner, host);

    let dependencies = host_dependencies(args.tls);

    if args.install {
        let spinner = if json_mode {
            create_hidden_spinner()
        } else {
            create_spinner_with_message("Installing missing packages...")
        };
        match checker.ensure(&dependencies, true).await {
            Ok(()) => spinner.finish_success("Host tools ready"),
            // The survey below shows exactly what is still missing.
            Err(e) => spinner.finish_warning(format!("Install incomplete: {e}")),
        }
    }

    let statuses = checker.survey(&dependencies).await;
    let all_required_present = statuses
        .iter()
        .all(|s| s.present || !s.dependency.required);

    let output_data = CheckOutput {
        statuses,
        all_required_present,
    };
    output(&output_data, json_mode);

    if !output_data.all_required_present {
        bail!("required host tools are missing");
    }
    Ok(())
}
