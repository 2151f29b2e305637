//! Activation of installed deployments.
//!
//! Registers the unit with the process manager, wires the proxy route,
//! requests a certificate when a domain is configured, and verifies the
//! service actually serves traffic afterwards.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::errors::{DeployError, DeployResult};
use crate::domain::models::config::{LayoutConfig, VerifyConfig};
use crate::domain::models::report::AccessInfo;
use crate::domain::models::spec::DeploymentSpec;
use crate::domain::ports::command::CommandRunner;
use crate::domain::ports::host::HostContext;

/// Starts the deployed service and makes it reachable through the proxy.
pub struct ServiceActivator {
    runner: Arc<dyn CommandRunner>,
    host: Arc<dyn HostContext>,
    layout: LayoutConfig,
    verify: VerifyConfig,
}

impl ServiceActivator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        host: Arc<dyn HostContext>,
        layout: LayoutConfig,
        verify: VerifyConfig,
    ) -> Self {
        Self {
            runner,
            host,
            layout,
            verify,
        }
    }

    /// Activate the service: reload the unit index, enable and restart
    /// the unit, validate and reload the proxy, and issue a certificate
    /// when a domain is configured.
    ///
    /// Every systemctl/nginx action gets exactly one automatic retry;
    /// certificate issuance does not. The whole sequence runs inside one
    /// privileged session, released on every exit path.
    pub async fn activate(&self, spec: &DeploymentSpec) -> DeployResult<AccessInfo> {
        self.host.begin_privileged().await?;
        let result = self.activate_inner(spec).await;
        self.host.end_privileged().await;
        result
    }

    async fn activate_inner(&self, spec: &DeploymentSpec) -> DeployResult<AccessInfo> {
        info!(service = %spec.service_name, "Registering and starting service");
        self.run_retrying("reload unit index", &["systemctl", "daemon-reload"])
            .await?;
        self.run_retrying(
            "enable service",
            &["systemctl", "enable", &spec.service_name],
        )
        .await?;
        self.run_retrying(
            "restart service",
            &["systemctl", "restart", &spec.service_name],
        )
        .await?;

        self.enable_proxy_route(spec).await?;
        self.run_retrying("validate proxy config", &["nginx", "-t"]).await?;
        self.run_retrying("reload proxy", &["systemctl", "reload", "nginx"])
            .await?;

        if let Some(domain) = &spec.domain {
            self.issue_certificate(domain).await?;
            self.run_retrying("reload proxy", &["systemctl", "reload", "nginx"])
                .await?;
        }

        Ok(self.resolve_access(spec).await)
    }

    /// Confirm the unit is active and the proxy answers on the API route.
    ///
    /// Polls until both checks pass or the spec's timeout budget elapses.
    /// Any HTTP status below 500 counts as the proxy responding; 5xx means
    /// the route is not reaching the backend yet.
    pub async fn verify(&self, spec: &DeploymentSpec) -> DeployResult<()> {
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(spec.timeout_secs);
        let interval = Duration::from_millis(self.verify.poll_interval_ms);
        let probe_url = local_probe_url(spec);

        loop {
            match self.check_health(spec, &probe_url).await {
                Ok(()) => {
                    info!(service = %spec.service_name, "Service is active and reachable");
                    return Ok(());
                }
                Err(reason) => {
                    if tokio::time::Instant::now() + interval > deadline {
                        return Err(DeployError::Verification(format!(
                            "service not healthy within {}s: {reason}",
                            spec.timeout_secs
                        )));
                    }
                    debug!(service = %spec.service_name, %reason, "Not healthy yet, polling again");
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }

    async fn check_health(&self, spec: &DeploymentSpec, probe_url: &str) -> Result<(), String> {
        let outcome = self
            .runner
            .run(&["systemctl", "is-active", &spec.service_name])
            .await
            .map_err(|e| e.to_string())?;
        if !outcome.success() {
            let state = outcome.stdout.trim();
            return Err(if state.is_empty() {
                "unit is not active".to_string()
            } else {
                format!("unit is {state}")
            });
        }

        match self.host.http_probe(probe_url).await {
            Ok(status) if status < 500 => Ok(()),
            Ok(status) => Err(format!("proxy returned HTTP {status}")),
            Err(e) => Err(format!("probe failed: {e}")),
        }
    }

    /// Symlink the site into the enabled directory, as the proxy only
    /// serves enabled sites. Idempotent when the link already exists.
    async fn enable_proxy_route(&self, spec: &DeploymentSpec) -> DeployResult<()> {
        let site = self.layout.site_path(&spec.service_name);
        let enabled = self.layout.enabled_site_path(&spec.service_name);
        self.host
            .ensure_symlink(&site, &enabled)
            .await
            .map_err(|e| DeployError::Activation {
                action: "enable proxy site".to_string(),
                reason: e.to_string(),
            })
    }

    async fn issue_certificate(&self, domain: &str) -> DeployResult<()> {
        info!(domain, "Requesting certificate");
        let email = format!("admin@{domain}");
        let argv = [
            "certbot",
            "--nginx",
            "-d",
            domain,
            "--non-interactive",
            "--agree-tos",
            "--email",
            &email,
        ];
        // Single attempt: repeated issuance counts against the
        // certificate authority's rate limits.
        match self.attempt(&argv).await {
            None => Ok(()),
            Some(reason) => Err(DeployError::Activation {
                action: "issue certificate".to_string(),
                reason,
            }),
        }
    }

    /// Run one activation command, retrying exactly once on failure.
    async fn run_retrying(&self, action: &str, argv: &[&str]) -> DeployResult<()> {
        if let Some(reason) = self.attempt(argv).await {
            warn!(action, %reason, "Activation command failed, retrying once");
            if let Some(reason) = self.attempt(argv).await {
                return Err(DeployError::Activation {
                    action: action.to_string(),
                    reason,
                });
            }
            debug!(action, "Retry succeeded");
        }
        Ok(())
    }

    /// One command attempt. `None` on success, the failure text otherwise.
    async fn attempt(&self, argv: &[&str]) -> Option<String> {
        match self.runner.run_privileged(argv).await {
            Ok(outcome) if outcome.success() => None,
            Ok(outcome) => Some(outcome.failure_summary()),
            Err(e) => Some(e.to_string()),
        }
    }

    /// Resolve where the deployment is reachable.
    ///
    /// With a domain the scheme follows whether the certificate tool's
    /// live directory exists; without one the host address and the
    /// application port are used directly.
    async fn resolve_access(&self, spec: &DeploymentSpec) -> AccessInfo {
        let base_url = if let Some(domain) = &spec.domain {
            if self.host.path_exists(&self.layout.certificate_dir(domain)).await {
                format!("https://{domain}")
            } else {
                warn!(domain, "No certificate material found, staying on plain HTTP");
                format!("http://{domain}")
            }
        } else {
            let address = self.host.resolve_address().await;
            format!("http://{address}:{}", spec.port)
        };

        let api = spec.normalized_api_prefix();
        if spec.frontend_path.is_some() && api != "/" {
            let api_url = format!("{base_url}{api}");
            let frontend_url = format!("{base_url}{}", spec.normalized_frontend_prefix());
            AccessInfo::new(base_url).with_routes(api_url, frontend_url)
        } else {
            AccessInfo::new(base_url)
        }
    }
}

/// Loopback URL of the API route, as served by the proxy on port 80.
fn local_probe_url(spec: &DeploymentSpec) -> String {
    let api = spec.normalized_api_prefix();
    if api == "/" {
        "http://127.0.0.1/".to_string()
    } else {
        format!("http://127.0.0.1{api}/")
    }
}
