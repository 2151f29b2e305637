pub mod artifact;
pub mod config;
pub mod dependency;
pub mod report;
pub mod spec;

pub use artifact::{ArtifactKind, RenderedArtifact};
pub use config::{Config, DependencyConfig, LayoutConfig, LoggingConfig, VerifyConfig};
pub use dependency::{host_dependencies, SystemDependency};
pub use report::{AccessInfo, DeployOutcome, DeployReport, DeployStep, StepRecord, StepStatus};
pub use spec::{DeploymentSpec, Framework};
