//! Deploy run reporting model.
//!
//! A `DeployReport` is the orchestrator's sole output: an ordered, timed
//! record of every step plus the terminal outcome. It serializes as the
//! `--json` payload of the deploy command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Steps of the deployment state machine, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStep {
    /// Spec invariants and path preconditions
    Validating,
    /// Host tool presence (and optional install)
    CheckingDependencies,
    /// Artifact text generation
    Rendering,
    /// Privileged file placement
    Installing,
    /// Unit registration, proxy reload, certificate issuance
    Activating,
    /// Service health and route reachability
    Verifying,
}

impl DeployStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::CheckingDependencies => "checking_dependencies",
            Self::Rendering => "rendering",
            Self::Installing => "installing",
            Self::Activating => "activating",
            Self::Verifying => "verifying",
        }
    }

    /// Human-readable label for progress output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Validating => "Validating spec",
            Self::CheckingDependencies => "Checking dependencies",
            Self::Rendering => "Rendering artifacts",
            Self::Installing => "Installing artifacts",
            Self::Activating => "Activating services",
            Self::Verifying => "Verifying deployment",
        }
    }

    /// All steps in the order the orchestrator runs them.
    pub const fn all() -> [Self; 6] {
        [
            Self::Validating,
            Self::CheckingDependencies,
            Self::Rendering,
            Self::Installing,
            Self::Activating,
            Self::Verifying,
        ]
    }
}

impl std::fmt::Display for DeployStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Timed record of one orchestrator step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Which step this records
    pub step: DeployStep,
    /// Current status
    pub status: StepStatus,
    /// When the step began
    pub started_at: Option<DateTime<Utc>>,
    /// When the step finished
    pub finished_at: Option<DateTime<Utc>>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: Option<i64>,
    /// Detail or failure message
    pub message: Option<String>,
}

impl StepRecord {
    /// Create a pending record for a step.
    pub fn new(step: DeployStep) -> Self {
        Self {
            step,
            status: StepStatus::Pending,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            message: None,
        }
    }

    /// Mark the step as running now.
    pub fn start(&mut self) {
        self.started_at = Some(Utc::now());
        self.status = StepStatus::Running;
    }

    /// Mark the step finished, with an optional detail message.
    pub fn finish(&mut self, success: bool, message: Option<String>) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.status = if success { StepStatus::Succeeded } else { StepStatus::Failed };
        self.message = message;
        if let Some(started) = self.started_at {
            self.duration_ms = Some((now - started).num_milliseconds());
        }
    }

    /// Mark a step that never ran because an earlier one failed.
    pub fn skip(&mut self) {
        self.status = StepStatus::Skipped;
    }
}

/// Where the deployed application can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessInfo {
    /// Primary URL for the deployment
    pub base_url: String,
    /// API root, when a frontend shares the host
    pub api_url: Option<String>,
    /// Frontend root, when one is configured
    pub frontend_url: Option<String>,
}

impl AccessInfo {
    /// Access info with only a primary URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_url: None,
            frontend_url: None,
        }
    }

    /// Add split API/frontend URLs to the summary.
    pub fn with_routes(mut self, api_url: impl Into<String>, frontend_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self.frontend_url = Some(frontend_url.into());
        self
    }

    /// Whether the primary URL is served over TLS.
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Terminal result of a deploy run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeployOutcome {
    /// Every step completed; the service is reachable.
    Succeeded {
        /// Resolved access URLs
        access: AccessInfo,
    },
    /// A step failed and the run stopped there.
    Failed {
        /// The step that failed
        step: DeployStep,
        /// Error text from the failing component
        error: String,
        /// Whether artifacts or service state may remain on the host
        partial_state: bool,
    },
}

/// Complete record of one deploy run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployReport {
    /// Unique id for this run
    pub run_id: Uuid,
    /// Service the run deployed
    pub service_name: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Every step in order, with timing and status
    pub steps: Vec<StepRecord>,
    /// Terminal outcome
    pub outcome: DeployOutcome,
}

impl DeployReport {
    /// Whether the run reached the terminal success state.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DeployOutcome::Succeeded { .. })
    }

    /// The failing step, when the run did not succeed.
    pub fn failed_step(&self) -> Option<DeployStep> {
        match &self.outcome {
            DeployOutcome::Failed { step, .. } => Some(*step),
            DeployOutcome::Succeeded { .. } => None,
        }
    }

    /// Access info, when the run succeeded.
    pub fn access(&self) -> Option<&AccessInfo> {
        match &self.outcome {
            DeployOutcome::Succeeded { access } => Some(access),
            DeployOutcome::Failed { .. } => None,
        }
    }
}
