//! Stage and run outcome enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a stage failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StageFailure {
    /// The stage exceeded its declared timeout.
    Timeout {
        /// The declared timeout in milliseconds.
        timeout_ms: u64,
    },
    /// The stage's work reported an error.
    Work {
        /// Description of what went wrong.
        message: String,
    },
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { timeout_ms } => write!(f, "timed out after {timeout_ms}ms"),
            Self::Work { message } => write!(f, "{message}"),
        }
    }
}

/// Terminal outcome of a single stage execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage completed its work.
    Succeeded,
    /// The stage failed.
    Failed(StageFailure),
    /// Cancellation was requested before the stage completed.
    Cancelled,
}

impl StageOutcome {
    /// Returns true if the stage completed its work.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if the stage failed (timeouts included).
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed(failure) => write!(f, "failed: {failure}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal outcome of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every stage succeeded.
    Succeeded,
    /// At least one stage failed.
    Failed,
    /// The run was cancelled before all stages finished.
    Cancelled,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Lifecycle state of an in-flight run.
///
/// `Pending` exists only for the instant between registration and the
/// first stage dispatch. A run that reaches a terminal outcome leaves the
/// tracker; its outcome lives on as a
/// [`RunRecord`](crate::runs::RunRecord).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Registered but not yet dispatching stages.
    Pending,
    /// Dispatching stages.
    Running,
}
