//! Implementation of the `gantry render` command.
//!
//! Renders the unit and proxy-route artifacts to stdout without touching
//! the host, for inspection before a real deploy.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::commands::deploy::SpecArgs;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::artifact::RenderedArtifact;
use crate::domain::ports::command::CommandRunner;
use crate::domain::ports::host::HostContext;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::host::live::LiveHost;
use crate::infrastructure::host::runner::LiveRunner;
use crate::services::renderer::ArtifactRenderer;

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub spec: SpecArgs,
}

#[derive(Debug, serde::Serialize)]
pub struct RenderOutput {
    pub artifacts: Vec<RenderedArtifact>,
}

impl CommandOutput for RenderOutput {
    fn to_human(&self) -> String {
        self.artifacts
            .iter()
            .map(|artifact| {
                format!(
                    "# ----- {}: {} -----\n{}",
                    artifact.kind,
                    artifact.destination.display(),
                    artifact.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.artifacts).unwrap_or_default()
    }
}

pub async fn execute(args: RenderArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let spec = args.spec.to_spec();
    spec.validate()?;

    // Identity resolution is the only host access; rendering never writes.
    let runner: Arc<dyn CommandRunner> = Arc::new(LiveRunner::new());
    let host: Arc<dyn HostContext> =
        Arc::new(LiveHost::new(Arc::clone(&runner), &config.verify)?);
    let identity = host.resolve_identity().await?;

    let renderer = ArtifactRenderer::new(identity, config.layout.clone());
    let artifacts = renderer.render(&spec)?;

    output(&RenderOutput { artifacts }, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::artifact::ArtifactKind;

    #[test]
    fn test_human_output_separates_artifacts() {
        let output_data = RenderOutput {
            artifacts: vec![
                RenderedArtifact::new(
                    ArtifactKind::ProcessUnit,
                    "/etc/systemd/system/agent-api.service",
                    "[Unit]\nDescription=agent-api\n",
                ),
                RenderedArtifact::new(
                    ArtifactKind::ProxyRoute,
                    "/etc/nginx/sites-available/agent-api",
                    "server {\n}\n",
                ),
            ],
        };

        let text = output_data.to_human();
        assert!(text.contains("# ----- process unit: /etc/systemd/system/agent-api.service -----"));
        assert!(text.contains("# ----- proxy route: /etc/nginx/sites-available/agent-api -----"));
        assert!(text.contains("[Unit]"));
    }

    #[test]
    fn test_json_output_is_the_artifact_array() {
        let output_data = RenderOutput {
            artifacts: vec![RenderedArtifact::new(
                ArtifactKind::ProcessUnit,
                "/etc/systemd/system/agent-api.service",
                "[Unit]\n",
            )],
        };

        let value = output_data.to_json();
        assert!(value.is_array());
        assert_eq!(value[0]["kind"], "process_unit");
    }
}
