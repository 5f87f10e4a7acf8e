//! Schedules and drives pipeline runs.

use crate::core::{EngineEvent, Pipeline, PipelineId, RunId, RunOutcome, StageOutcome};
use crate::errors::EngineError;
use crate::events::EventSink;
use crate::executor::StageExecutor;
use crate::registry::PipelineRegistry;
use crate::runs::{RunHandle, RunTracker};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates runs: looks up pipelines, supersedes in-flight runs, and
/// dispatches stage executions according to the pipeline's scheduling mode.
pub struct PipelineRunner {
    registry: Arc<PipelineRegistry>,
    tracker: Arc<RunTracker>,
    executor: Arc<StageExecutor>,
    sink: Arc<dyn EventSink>,
}

impl PipelineRunner {
    /// Creates a runner over the given components.
    #[must_use]
    pub fn new(
        registry: Arc<PipelineRegistry>,
        tracker: Arc<RunTracker>,
        executor: Arc<StageExecutor>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            registry,
            tracker,
            executor,
            sink,
        }
    }

    /// Begins a new run for the pipeline registered under `id`.
    ///
    /// Acceptance is fire-and-forget: the returned [`RunId`] identifies a
    /// run that executes on a background task, and the caller does not
    /// block on its completion. Any run already in flight for the same
    /// pipeline has its cancellation requested before the new run is
    /// registered; the old run's tasks may still be unwinding when the new
    /// run's first stage begins.
    pub fn trigger(&self, id: PipelineId) -> Result<RunId, EngineError> {
        let pipeline = self.registry.get(id)?;
        let (handle, superseded) = self.tracker.start(id);
        if superseded {
            info!(pipeline_id = %id, "in-flight run cancelled by retrigger");
        }

        // A delete that raced between the lookup and the registration has
        // already done its cancel pass; make sure this run doesn't outlive
        // a pipeline that is no longer registered.
        if !self.registry.exists(id) {
            handle.token.cancel("pipeline deleted");
        }

        let run_id = handle.run_id;
        let tracker = Arc::clone(&self.tracker);
        let executor = Arc::clone(&self.executor);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            drive_run(&pipeline, &handle, &tracker, &executor, &sink).await;
        });

        Ok(run_id)
    }
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner").finish_non_exhaustive()
    }
}

/// Drives one run from first dispatch to its terminal outcome.
async fn drive_run(
    pipeline: &Pipeline,
    handle: &RunHandle,
    tracker: &RunTracker,
    executor: &Arc<StageExecutor>,
    sink: &Arc<dyn EventSink>,
) {
    tracker.mark_running(handle);
    sink.emit(&EngineEvent::RunStarted {
        pipeline_id: handle.pipeline_id,
        run_id: handle.run_id,
        parallel: pipeline.config.parallel,
    });

    let outcome = if pipeline.config.parallel {
        run_parallel(pipeline, handle, executor, sink).await
    } else {
        run_sequential(pipeline, handle, executor, sink).await
    };

    sink.emit(&EngineEvent::RunFinished {
        pipeline_id: handle.pipeline_id,
        run_id: handle.run_id,
        outcome,
    });
    tracker.finish(handle, outcome);
}

/// Executes stages one at a time, in stored order.
///
/// The first `Failed` outcome stops dispatch and fails the run; completed
/// stages are never rolled back or retried. A `Cancelled` outcome stops
/// dispatch and cancels the run.
async fn run_sequential(
    pipeline: &Pipeline,
    handle: &RunHandle,
    executor: &Arc<StageExecutor>,
    sink: &Arc<dyn EventSink>,
) -> RunOutcome {
    for stage in &pipeline.config.stages {
        if handle.token.is_cancelled() {
            return RunOutcome::Cancelled;
        }

        sink.emit(&EngineEvent::StageStarted {
            run_id: handle.run_id,
            stage: stage.name().to_string(),
        });
        let outcome = executor.execute(stage, &handle.token).await;
        sink.emit(&EngineEvent::StageFinished {
            run_id: handle.run_id,
            stage: stage.name().to_string(),
            outcome: outcome.clone(),
        });

        match outcome {
            StageOutcome::Succeeded => {}
            StageOutcome::Failed(_) => return RunOutcome::Failed,
            StageOutcome::Cancelled => return RunOutcome::Cancelled,
        }
    }
    RunOutcome::Succeeded
}

/// Dispatches every stage concurrently at trigger time.
///
/// Stages are independent: one failure does not cancel siblings, which run
/// to their own terminal outcomes. Cancelling the run cancels all siblings
/// together through the shared token.
async fn run_parallel(
    pipeline: &Pipeline,
    handle: &RunHandle,
    executor: &Arc<StageExecutor>,
    sink: &Arc<dyn EventSink>,
) -> RunOutcome {
    let mut tasks = Vec::with_capacity(pipeline.config.stages.len());
    for stage in pipeline.config.stages.iter().cloned() {
        let token = Arc::clone(&handle.token);
        let executor = Arc::clone(executor);
        let sink = Arc::clone(sink);
        let run_id = handle.run_id;
        tasks.push(tokio::spawn(async move {
            sink.emit(&EngineEvent::StageStarted {
                run_id,
                stage: stage.name().to_string(),
            });
            let outcome = executor.execute(&stage, &token).await;
            sink.emit(&EngineEvent::StageFinished {
                run_id,
                stage: stage.name().to_string(),
                outcome: outcome.clone(),
            });
            outcome
        }));
    }

    let mut any_failed = false;
    for result in join_all(tasks).await {
        match result {
            Ok(StageOutcome::Failed(_)) => any_failed = true,
            Ok(_) => {}
            Err(join_error) => {
                warn!(error = %join_error, "stage task join error");
                any_failed = true;
            }
        }
    }

    if handle.token.is_cancelled() {
        RunOutcome::Cancelled
    } else if any_failed {
        RunOutcome::Failed
    } else {
        RunOutcome::Succeeded
    }
}
