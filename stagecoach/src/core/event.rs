//! Lifecycle events emitted by the engine.

use super::pipeline::{PipelineId, RunId};
use super::status::{RunOutcome, StageOutcome};
use serde::{Deserialize, Serialize};

/// An event describing a run or stage lifecycle transition.
///
/// Events are delivered to the configured [`EventSink`](crate::events::EventSink)
/// in the order the transitions happen within one run. For a sequential run
/// that order is the stored stage order; for a parallel run stage events
/// interleave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A run began dispatching stages.
    RunStarted {
        /// The pipeline being run.
        pipeline_id: PipelineId,
        /// The run's identifier.
        run_id: RunId,
        /// Whether stages are dispatched concurrently.
        parallel: bool,
    },
    /// A run reached a terminal outcome.
    RunFinished {
        /// The pipeline that was run.
        pipeline_id: PipelineId,
        /// The run's identifier.
        run_id: RunId,
        /// The terminal outcome.
        outcome: RunOutcome,
    },
    /// A stage was dispatched.
    StageStarted {
        /// The run the stage belongs to.
        run_id: RunId,
        /// The stage name.
        stage: String,
    },
    /// A stage reached a terminal outcome.
    StageFinished {
        /// The run the stage belongs to.
        run_id: RunId,
        /// The stage name.
        stage: String,
        /// The terminal outcome.
        outcome: StageOutcome,
    },
}

impl EngineEvent {
    /// Returns the event kind as a dotted string (e.g. `"stage.started"`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run.started",
            Self::RunFinished { .. } => "run.finished",
            Self::StageStarted { .. } => "stage.started",
            Self::StageFinished { .. } => "stage.finished",
        }
    }

    /// Returns the stage name for stage-level events.
    #[must_use]
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            Self::StageStarted { stage, .. } | Self::StageFinished { stage, .. } => Some(stage),
            Self::RunStarted { .. } | Self::RunFinished { .. } => None,
        }
    }

    /// Returns the run this event belongs to.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::RunFinished { run_id, .. }
            | Self::StageStarted { run_id, .. }
            | Self::StageFinished { run_id, .. } => *run_id,
        }
    }
}
