pub mod activator;
pub mod dependencies;
pub mod installer;
pub mod orchestrator;
pub mod renderer;

pub use activator::ServiceActivator;
pub use dependencies::{DependencyChecker, DependencyStatus};
pub use installer::FileInstaller;
pub use orchestrator::DeployOrchestrator;
pub use renderer::ArtifactRenderer;
