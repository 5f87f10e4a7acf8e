//! Tracks the in-flight run of each pipeline.

use crate::cancellation::CancellationToken;
use crate::core::{PipelineId, RunId, RunOutcome, RunState};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Handle to a registered run: its identity plus its cancellation token.
#[derive(Debug, Clone)]
pub struct RunHandle {
    /// The run's unique identifier.
    pub run_id: RunId,
    /// The pipeline the run belongs to.
    pub pipeline_id: PipelineId,
    /// Token the run's tasks watch for cancellation.
    pub token: Arc<CancellationToken>,
}

/// Bookkeeping for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRecord {
    /// The terminal outcome.
    pub outcome: RunOutcome,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug)]
struct ActiveRun {
    run_id: RunId,
    token: Arc<CancellationToken>,
    state: RunState,
}

/// Tracks at most one in-flight run per pipeline identifier.
///
/// `start` is the synchronization point between successive runs of the
/// same pipeline: the check for an existing run, the cancellation request
/// on it, and the registration of the new run all happen under one lock,
/// so two concurrent triggers can never both observe "no existing run".
///
/// The handoff is best-effort: `start` requests cancellation on the
/// previous run's token but does not wait for its tasks to drain. The
/// superseded run unwinds cooperatively, and its late `finish` call is a
/// stale no-op.
#[derive(Debug, Default)]
pub struct RunTracker {
    active: Mutex<HashMap<PipelineId, ActiveRun>>,
    finished: Mutex<HashMap<RunId, RunRecord>>,
    run_finished: Notify,
}

impl RunTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new run for `pipeline_id`.
    ///
    /// If a run is already registered, cancellation is requested on it
    /// before the new run takes its slot. Returns the new run's handle and
    /// whether a previous run was cancelled.
    pub fn start(&self, pipeline_id: PipelineId) -> (RunHandle, bool) {
        let mut active = self.active.lock();

        let previous_cancelled = match active.get(&pipeline_id) {
            Some(previous) => {
                debug!(
                    pipeline_id = %pipeline_id,
                    superseded_run = %previous.run_id,
                    "cancelling in-flight run before new trigger"
                );
                previous.token.cancel("superseded by a new trigger");
                true
            }
            None => false,
        };

        let run_id = RunId::generate();
        let token = Arc::new(CancellationToken::new());
        active.insert(
            pipeline_id,
            ActiveRun {
                run_id,
                token: Arc::clone(&token),
                state: RunState::Pending,
            },
        );

        (
            RunHandle {
                run_id,
                pipeline_id,
                token,
            },
            previous_cancelled,
        )
    }

    /// Marks the run as dispatching stages. Stale handles are ignored.
    pub fn mark_running(&self, handle: &RunHandle) {
        let mut active = self.active.lock();
        if let Some(run) = active.get_mut(&handle.pipeline_id) {
            if run.run_id == handle.run_id {
                run.state = RunState::Running;
            }
        }
    }

    /// Records the run's terminal outcome and releases its slot.
    ///
    /// The slot is only released if `handle` still matches the registered
    /// run: a late `finish` from a superseded run must not erase the
    /// bookkeeping of the run that superseded it. The outcome itself is
    /// always recorded.
    pub fn finish(&self, handle: &RunHandle, outcome: RunOutcome) {
        {
            let mut active = self.active.lock();
            let matches = active
                .get(&handle.pipeline_id)
                .is_some_and(|run| run.run_id == handle.run_id);
            if matches {
                active.remove(&handle.pipeline_id);
            }
        }

        self.finished.lock().insert(
            handle.run_id,
            RunRecord {
                outcome,
                finished_at: Utc::now(),
            },
        );
        self.run_finished.notify_waiters();
    }

    /// Requests cancellation of the in-flight run for `pipeline_id`.
    ///
    /// Idempotent: returns false when nothing is running, and re-cancelling
    /// an already-cancelled run is a safe no-op.
    pub fn cancel(&self, pipeline_id: PipelineId) -> bool {
        let active = self.active.lock();
        match active.get(&pipeline_id) {
            Some(run) => {
                run.token.cancel("pipeline cancelled");
                true
            }
            None => false,
        }
    }

    /// Returns the state of the registered run for `pipeline_id`, if any.
    #[must_use]
    pub fn state(&self, pipeline_id: PipelineId) -> Option<RunState> {
        self.active.lock().get(&pipeline_id).map(|run| run.state)
    }

    /// Returns the recorded outcome of a finished run.
    #[must_use]
    pub fn outcome(&self, run_id: RunId) -> Option<RunOutcome> {
        self.record(run_id).map(|record| record.outcome)
    }

    /// Returns the full record of a finished run.
    #[must_use]
    pub fn record(&self, run_id: RunId) -> Option<RunRecord> {
        self.finished.lock().get(&run_id).copied()
    }

    /// Waits until `run_id` has a recorded terminal outcome.
    pub async fn wait(&self, run_id: RunId) -> RunOutcome {
        loop {
            let notified = self.run_finished.notified();
            if let Some(outcome) = self.outcome(run_id) {
                return outcome;
            }
            notified.await;
        }
    }

    /// Returns the number of in-flight runs across all pipelines.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_start_registers_pending_run() {
        let tracker = RunTracker::new();
        let pipeline_id = PipelineId::generate();

        let (handle, previous_cancelled) = tracker.start(pipeline_id);

        assert!(!previous_cancelled);
        assert!(!handle.token.is_cancelled());
        assert_eq!(tracker.state(pipeline_id), Some(RunState::Pending));
        assert_eq!(tracker.active_count(), 1);
    }

    #[test]
    fn test_start_cancels_previous_run() {
        let tracker = RunTracker::new();
        let pipeline_id = PipelineId::generate();

        let (first, _) = tracker.start(pipeline_id);
        let (second, previous_cancelled) = tracker.start(pipeline_id);

        assert!(previous_cancelled);
        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
        // Only one registration per pipeline
        assert_eq!(tracker.active_count(), 1);
    }

    #[test]
    fn test_mark_running() {
        let tracker = RunTracker::new();
        let pipeline_id = PipelineId::generate();

        let (handle, _) = tracker.start(pipeline_id);
        tracker.mark_running(&handle);

        assert_eq!(tracker.state(pipeline_id), Some(RunState::Running));
    }

    #[test]
    fn test_finish_releases_slot_and_records_outcome() {
        let tracker = RunTracker::new();
        let pipeline_id = PipelineId::generate();

        let (handle, _) = tracker.start(pipeline_id);
        tracker.finish(&handle, RunOutcome::Succeeded);

        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.outcome(handle.run_id), Some(RunOutcome::Succeeded));
    }

    #[test]
    fn test_stale_finish_is_a_no_op_for_the_slot() {
        let tracker = RunTracker::new();
        let pipeline_id = PipelineId::generate();

        let (superseded, _) = tracker.start(pipeline_id);
        let (current, _) = tracker.start(pipeline_id);

        // The superseded run's delayed completion must not erase the
        // registration of the run that superseded it.
        tracker.finish(&superseded, RunOutcome::Cancelled);
        assert_eq!(tracker.state(pipeline_id), Some(RunState::Pending));
        assert_eq!(
            tracker.outcome(superseded.run_id),
            Some(RunOutcome::Cancelled)
        );

        tracker.finish(&current, RunOutcome::Succeeded);
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let tracker = RunTracker::new();
        let pipeline_id = PipelineId::generate();

        assert!(!tracker.cancel(pipeline_id));

        let (handle, _) = tracker.start(pipeline_id);
        assert!(tracker.cancel(pipeline_id));
        assert!(tracker.cancel(pipeline_id));
        assert!(handle.token.is_cancelled());

        tracker.finish(&handle, RunOutcome::Cancelled);
        assert!(!tracker.cancel(pipeline_id));
    }

    #[tokio::test]
    async fn test_wait_returns_recorded_outcome() {
        let tracker = Arc::new(RunTracker::new());
        let pipeline_id = PipelineId::generate();
        let (handle, _) = tracker.start(pipeline_id);

        let waiter = {
            let tracker = Arc::clone(&tracker);
            let run_id = handle.run_id;
            tokio::spawn(async move { tracker.wait(run_id).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        tracker.finish(&handle, RunOutcome::Failed);

        assert_eq!(waiter.await.unwrap(), RunOutcome::Failed);
    }
}
