//! Rendering of process-unit and proxy-route artifacts.
//!
//! Rendering is a pure function of the spec plus the identity and layout
//! captured at construction. No I/O happens here; installation is the
//! [`FileInstaller`](crate::services::installer::FileInstaller)'s job.

use crate::domain::errors::{DeployError, DeployResult};
use crate::domain::models::artifact::{ArtifactKind, RenderedArtifact};
use crate::domain::models::config::LayoutConfig;
use crate::domain::models::spec::{DeploymentSpec, Framework};
use crate::domain::ports::host::HostIdentity;

/// Renders the deployment artifacts for a spec.
pub struct ArtifactRenderer {
    identity: HostIdentity,
    layout: LayoutConfig,
}

impl ArtifactRenderer {
    pub fn new(identity: HostIdentity, layout: LayoutConfig) -> Self {
        Self { identity, layout }
    }

    /// Produce the ordered artifact sequence for a spec: process unit,
    /// proxy route, then the frontend route when one is configured.
    pub fn render(&self, spec: &DeploymentSpec) -> DeployResult<Vec<RenderedArtifact>> {
        let api = spec.normalized_api_prefix();
        let frontend = spec.normalized_frontend_prefix();
        if api == frontend {
            return Err(DeployError::ConflictingRoute {
                prefix: api.to_string(),
            });
        }

        let mut artifacts = vec![self.render_unit(spec), self.render_proxy_route(spec)];
        if let Some(path) = &spec.frontend_path {
            artifacts.push(self.render_frontend_route(spec, path));
        }
        Ok(artifacts)
    }

    fn render_unit(&self, spec: &DeploymentSpec) -> RenderedArtifact {
        let venv = spec.venv_path();
        let after = if spec.enable_db {
            "network.target postgresql.service"
        } else {
            "network.target"
        };

        let mut unit = format!(
            "[Unit]
Description={service} service
After={after}

[Service]
User={user}
Group={group}
WorkingDirectory={project}
",
            service = spec.service_name,
            user = self.identity.user,
            group = self.identity.group,
            project = spec.project_path.display(),
        );
        if spec.enable_db {
            unit.push_str("ExecStartPre=/usr/bin/pg_isready -t 30\n");
        }
        unit.push_str(&format!("ExecStart={}\n", exec_start(spec)));
        unit.push_str("Restart=always\nRestartSec=5\n");
        unit.push_str(&format!(
            "Environment=PATH={}/bin:/usr/local/bin:/usr/bin:/bin\n",
            venv.display()
        ));
        if let Some(env_path) = spec.env_file_path() {
            unit.push_str(&format!("EnvironmentFile={}\n", env_path.display()));
        }
        unit.push_str("\n[Install]\nWantedBy=multi-user.target\n");

        RenderedArtifact::new(
            ArtifactKind::ProcessUnit,
            self.layout.unit_path(&spec.service_name),
            unit,
        )
    }

    fn render_proxy_route(&self, spec: &DeploymentSpec) -> RenderedArtifact {
        let server_name = spec.domain.as_deref().unwrap_or("_");
        let api = spec.normalized_api_prefix();
        // At the root prefix the upstream sees the request URI unchanged;
        // elsewhere the prefix is forwarded as part of the upstream path.
        let (location, pass_path) = if api == "/" {
            ("/".to_string(), String::new())
        } else {
            (format!("{api}/"), format!("{api}/"))
        };

        let mut route = format!(
            "server {{
    listen 80;
    server_name {server_name};

    # API endpoints
    location {location} {{
        proxy_pass http://127.0.0.1:{port}{pass_path};
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
    }}
",
            port = spec.port,
        );
        if spec.frontend_path.is_some() {
            route.push_str(&format!(
                "\n    include {};\n",
                self.layout.frontend_snippet_path(&spec.service_name).display()
            ));
        }
        route.push_str("}\n");

        RenderedArtifact::new(
            ArtifactKind::ProxyRoute,
            self.layout.site_path(&spec.service_name),
            route,
        )
    }

    fn render_frontend_route(&self, spec: &DeploymentSpec, path: &std::path::Path) -> RenderedArtifact {
        let prefix = spec.normalized_frontend_prefix();
        let index = if prefix == "/" {
            "/index.html".to_string()
        } else {
            format!("{prefix}/index.html")
        };

        let content = format!(
            "# Frontend static files
location {prefix} {{
    alias {path}/;
    try_files $uri $uri/ {index};
    expires 1d;
    add_header Cache-Control \"public\";
}}
",
            path = path.display(),
        );

        RenderedArtifact::new(
            ArtifactKind::FrontendRoute,
            self.layout.frontend_snippet_path(&spec.service_name),
            content,
        )
    }
}

/// Launch command for the unit, specific to the framework.
fn exec_start(spec: &DeploymentSpec) -> String {
    let venv = spec.venv_path();
    let venv = venv.display();
    match spec.framework {
        Framework::Fastapi => format!(
            "{venv}/bin/uvicorn main:app --host 0.0.0.0 --port {} --workers {} --timeout-keep-alive {}",
            spec.port, spec.workers, spec.timeout_secs
        ),
        Framework::Flask => format!(
            "{venv}/bin/gunicorn -w {} -b 0.0.0.0:{} -t {} app:app",
            spec.workers, spec.port, spec.timeout_secs
        ),
        Framework::Django => format!(
            "{venv}/bin/gunicorn -w {} -b 0.0.0.0:{} -t {} {}.wsgi:application",
            spec.workers, spec.port, spec.timeout_secs,
            spec.project_name()
        ),
    }
}
