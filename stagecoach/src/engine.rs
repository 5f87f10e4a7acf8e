//! Facade tying the registry, run tracker, and runner together.

use crate::config::EngineConfig;
use crate::core::{Pipeline, PipelineConfig, PipelineId, RunId, RunOutcome, RunState};
use crate::errors::{EngineError, ValidationError};
use crate::events::{EventSink, LoggingEventSink};
use crate::executor::{SimulatedWorkload, StageExecutor, Workload};
use crate::registry::PipelineRegistry;
use crate::runner::PipelineRunner;
use crate::runs::{RunRecord, RunTracker};
use std::sync::Arc;

/// The pipeline execution engine.
///
/// This is the surface an HTTP or CLI layer talks to: pipeline CRUD plus
/// fire-and-forget triggering. Everything is in-memory and scoped to one
/// process.
pub struct PipelineEngine {
    registry: Arc<PipelineRegistry>,
    tracker: Arc<RunTracker>,
    runner: PipelineRunner,
}

impl PipelineEngine {
    /// Creates an engine with simulated workloads and tracing-backed
    /// event logging.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_parts(
            Arc::new(SimulatedWorkload::new(config.stage_work())),
            Arc::new(LoggingEventSink::new()),
        )
    }

    /// Creates an engine with a custom workload and event sink.
    ///
    /// Tests inject scripted workloads and recording sinks here.
    #[must_use]
    pub fn with_parts(workload: Arc<dyn Workload>, sink: Arc<dyn EventSink>) -> Self {
        let registry = Arc::new(PipelineRegistry::new());
        let tracker = Arc::new(RunTracker::new());
        let executor = Arc::new(StageExecutor::new(workload));
        let runner = PipelineRunner::new(
            Arc::clone(&registry),
            Arc::clone(&tracker),
            executor,
            sink,
        );
        Self {
            registry,
            tracker,
            runner,
        }
    }

    /// Validates and stores a new pipeline, returning its identifier.
    pub fn create_pipeline(&self, config: PipelineConfig) -> Result<PipelineId, ValidationError> {
        self.registry.create(config)
    }

    /// Returns a read-only snapshot of a pipeline.
    pub fn get_pipeline(&self, id: PipelineId) -> Result<Arc<Pipeline>, EngineError> {
        self.registry.get(id)
    }

    /// Replaces a pipeline's configuration wholesale.
    ///
    /// A run already in flight keeps executing against its previous
    /// snapshot.
    pub fn replace_pipeline(
        &self,
        id: PipelineId,
        config: PipelineConfig,
    ) -> Result<(), EngineError> {
        self.registry.replace(id, config)
    }

    /// Deletes a pipeline, cancelling any in-flight run as a side effect.
    ///
    /// The registry entry is removed first, so a concurrent trigger cannot
    /// start a fresh run against a pipeline that is being deleted; the
    /// in-flight run is then cancelled through the tracker's own entry
    /// point. Neither component's lock is held across the other's call.
    pub fn delete_pipeline(&self, id: PipelineId) -> Result<(), EngineError> {
        self.registry.delete(id)?;
        self.tracker.cancel(id);
        Ok(())
    }

    /// Returns whether a pipeline is registered under `id`.
    #[must_use]
    pub fn pipeline_exists(&self, id: PipelineId) -> bool {
        self.registry.exists(id)
    }

    /// Begins a new run for the pipeline.
    ///
    /// Fire-and-forget: acceptance means the run has begun asynchronously.
    /// A run already in flight for the same pipeline is cancelled first.
    /// Stage failures are never reported here - they are contained in the
    /// run and observable via [`run_outcome`](Self::run_outcome) and the
    /// event sink.
    pub fn trigger_pipeline(&self, id: PipelineId) -> Result<RunId, EngineError> {
        self.runner.trigger(id)
    }

    /// Returns the lifecycle state of the in-flight run for `id`, if any.
    #[must_use]
    pub fn run_state(&self, id: PipelineId) -> Option<RunState> {
        self.tracker.state(id)
    }

    /// Returns the terminal outcome of a finished run.
    #[must_use]
    pub fn run_outcome(&self, run_id: RunId) -> Option<RunOutcome> {
        self.tracker.outcome(run_id)
    }

    /// Returns the full record of a finished run.
    #[must_use]
    pub fn run_record(&self, run_id: RunId) -> Option<RunRecord> {
        self.tracker.record(run_id)
    }

    /// Waits until `run_id` reaches a terminal outcome.
    pub async fn wait_for_run(&self, run_id: RunId) -> RunOutcome {
        self.tracker.wait(run_id).await
    }
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for PipelineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineEngine")
            .field("pipelines", &self.registry.len())
            .field("active_runs", &self.tracker.active_count())
            .finish_non_exhaustive()
    }
}
