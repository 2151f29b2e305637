//! Full-document rendering tests.
//!
//! The unit tests assert on fragments; these pin the complete artifact
//! text so any formatting or ordering drift shows up as a diff.

use std::path::PathBuf;

use gantry::domain::models::{ArtifactKind, DeploymentSpec, Framework, LayoutConfig};
use gantry::domain::ports::HostIdentity;
use gantry::services::ArtifactRenderer;

fn renderer() -> ArtifactRenderer {
    ArtifactRenderer::new(HostIdentity::new("deploy", "deploy"), LayoutConfig::default())
}

fn base_spec() -> DeploymentSpec {
    DeploymentSpec::new(
        "/srv/agent-api",
        "agent-api",
        Framework::Fastapi,
        8000,
        "venv",
    )
}

#[test]
fn test_unit_file_full_text() {
    let artifacts = renderer().render(&base_spec()).unwrap();

    let expected = "\
[Unit]
Description=agent-api service
After=network.target

[Service]
User=deploy
Group=deploy
WorkingDirectory=/srv/agent-api
ExecStart=/srv/agent-api/venv/bin/uvicorn main:app --host 0.0.0.0 --port 8000 --workers 2 --timeout-keep-alive 120
Restart=always
RestartSec=5
Environment=PATH=/srv/agent-api/venv/bin:/usr/local/bin:/usr/bin:/bin

[Install]
WantedBy=multi-user.target
";
    assert_eq!(artifacts[0].content, expected);
}

#[test]
fn test_unit_file_full_text_with_database_and_env() {
    let spec = base_spec().with_database().with_env_file(".env");
    let artifacts = renderer().render(&spec).unwrap();

    let expected = "\
[Unit]
Description=agent-api service
After=network.target postgresql.service

[Service]
User=deploy
Group=deploy
WorkingDirectory=/srv/agent-api
ExecStartPre=/usr/bin/pg_isready -t 30
ExecStart=/srv/agent-api/venv/bin/uvicorn main:app --host 0.0.0.0 --port 8000 --workers 2 --timeout-keep-alive 120
Restart=always
RestartSec=5
Environment=PATH=/srv/agent-api/venv/bin:/usr/local/bin:/usr/bin:/bin
EnvironmentFile=/srv/agent-api/.env

[Install]
WantedBy=multi-user.target
";
    assert_eq!(artifacts[0].content, expected);
}

#[test]
fn test_proxy_route_full_text() {
    let artifacts = renderer().render(&base_spec()).unwrap();

    let expected = "\
server {
    listen 80;
    server_name _;

    # API endpoints
    location /api/ {
        proxy_pass http://127.0.0.1:8000/api/;
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
    }
}
";
    assert_eq!(artifacts[1].content, expected);
}

#[test]
fn test_frontend_snippet_full_text() {
    let spec = base_spec().with_frontend("/srv/agent-api/dist");
    let artifacts = renderer().render(&spec).unwrap();

    let expected = "\
# Frontend static files
location / {
    alias /srv/agent-api/dist/;
    try_files $uri $uri/ /index.html;
    expires 1d;
    add_header Cache-Control \"public\";
}
";
    assert_eq!(artifacts[2].content, expected);
}

#[test]
fn test_artifact_destinations_and_ownership() {
    let spec = base_spec().with_frontend("/srv/agent-api/dist");
    let artifacts = renderer().render(&spec).unwrap();

    let summary: Vec<(ArtifactKind, PathBuf)> = artifacts
        .iter()
        .map(|a| (a.kind, a.destination.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                ArtifactKind::ProcessUnit,
                PathBuf::from("/etc/systemd/system/agent-api.service")
            ),
            (
                ArtifactKind::ProxyRoute,
                PathBuf::from("/etc/nginx/sites-available/agent-api")
            ),
            (
                ArtifactKind::FrontendRoute,
                PathBuf::from("/etc/nginx/snippets/agent-api-frontend.conf")
            ),
        ]
    );
    for artifact in &artifacts {
        assert_eq!(artifact.mode, 0o644);
        assert_eq!(artifact.owner, "root");
    }
}

#[test]
fn test_identical_specs_render_identically_across_instances() {
    let spec = base_spec()
        .with_domain("agent.example.com")
        .with_frontend("/srv/agent-api/dist")
        .with_database()
        .with_workers(4);

    let first = renderer().render(&spec).unwrap();
    let second = renderer().render(&spec).unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.destination, b.destination);
        assert_eq!(a.content, b.content);
    }
}
