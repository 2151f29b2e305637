//! Benchmarks for artifact rendering.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gantry::domain::models::{DeploymentSpec, Framework, LayoutConfig};
use gantry::domain::ports::HostIdentity;
use gantry::services::ArtifactRenderer;

fn renderer() -> ArtifactRenderer {
    ArtifactRenderer::new(HostIdentity::new("deploy", "deploy"), LayoutConfig::default())
}

fn api_spec() -> DeploymentSpec {
    DeploymentSpec::new(
        "/srv/agent-api",
        "agent-api",
        Framework::Fastapi,
        8000,
        "venv",
    )
}

fn full_spec() -> DeploymentSpec {
    api_spec()
        .with_domain("agent.example.com")
        .with_database()
        .with_env_file(".env")
        .with_frontend("/srv/agent-api/dist")
}

fn bench_render_api_only(c: &mut Criterion) {
    let renderer = renderer();
    let spec = api_spec();

    c.bench_function("render_api_only", |b| {
        b.iter(|| black_box(renderer.render(black_box(&spec)).unwrap().len()))
    });
}

fn bench_render_full_artifact_set(c: &mut Criterion) {
    let renderer = renderer();
    let spec = full_spec();

    c.bench_function("render_full_artifact_set", |b| {
        b.iter(|| black_box(renderer.render(black_box(&spec)).unwrap().len()))
    });
}

fn bench_render_by_framework(c: &mut Criterion) {
    let renderer = renderer();
    let mut group = c.benchmark_group("render_by_framework");

    for framework in [Framework::Flask, Framework::Fastapi, Framework::Django] {
        let spec = DeploymentSpec::new("/srv/app", "app", framework, 8000, "venv");
        group.bench_function(framework.as_str(), |b| {
            b.iter(|| black_box(renderer.render(black_box(&spec)).unwrap().len()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render_api_only,
    bench_render_full_artifact_set,
    bench_render_by_framework
);
criterion_main!(benches);
