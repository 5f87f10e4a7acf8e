//! Core data model: stages, pipelines, identifiers, outcomes, and events.

mod event;
mod pipeline;
mod stage;
mod status;

pub use event::EngineEvent;
pub use pipeline::{Pipeline, PipelineConfig, PipelineId, RunId};
pub use stage::{Stage, StageKind};
pub use status::{RunOutcome, RunState, StageFailure, StageOutcome};
