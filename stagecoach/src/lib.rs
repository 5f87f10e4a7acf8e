//! # Stagecoach
//!
//! An in-memory CI/CD pipeline registry and execution engine.
//!
//! Stagecoach stores pipeline configurations (named Run/Build/Deploy stages
//! plus a scheduling mode) and drives fire-and-forget runs of them:
//!
//! - **Pipeline registry**: concurrency-safe create/get/replace/delete of
//!   pipeline configurations with fresh identifiers
//! - **Run tracking**: at most one in-flight run per pipeline; retriggering
//!   cancels the previous run before the new one starts
//! - **Stage execution**: simulated bounded work per stage, with per-stage
//!   timeouts and cooperative cancellation
//! - **Scheduling modes**: strictly sequential (abort on first failure) or
//!   fully parallel (independent failures)
//!
//! Stage execution is deliberately simulated - no commands run, no images
//! build, no clusters are called. HTTP routing, authentication, and
//! persistence are left to callers.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stagecoach::prelude::*;
//!
//! let engine = PipelineEngine::new(EngineConfig::default());
//!
//! let id = engine.create_pipeline(PipelineConfig {
//!     name: "ci".into(),
//!     git_repository: "https://github.com/example/repo".into(),
//!     parallel: false,
//!     stages: vec![
//!         Stage::Run {
//!             name: "unit tests".into(),
//!             command: "cargo test".into(),
//!             timeout_ms: 60_000,
//!         },
//!     ],
//! })?;
//!
//! let run_id = engine.trigger_pipeline(id)?;
//! let outcome = engine.wait_for_run(run_id).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod events;
pub mod executor;
pub mod observability;
pub mod registry;
pub mod runner;
pub mod runs;
pub mod testing;


/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::EngineConfig;
    pub use crate::core::{
        EngineEvent, Pipeline, PipelineConfig, PipelineId, RunId, RunOutcome,
        RunState, Stage, StageFailure, StageKind, StageOutcome,
    };
    pub use crate::engine::PipelineEngine;
    pub use crate::errors::{EngineError, ValidationError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::executor::{SimulatedWorkload, StageExecutor, Workload};
    pub use crate::registry::PipelineRegistry;
    pub use crate::runner::PipelineRunner;
    pub use crate::runs::{RunHandle, RunRecord, RunTracker};
}
