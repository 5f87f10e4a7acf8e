//! Runs one stage to a terminal outcome.

use crate::cancellation::CancellationToken;
use crate::core::{Stage, StageFailure, StageOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Performs the actual work of a stage.
///
/// The engine never does real work - no commands, image builds, or cluster
/// calls - so the default implementation simulates a bounded, interruptible
/// delay. Tests substitute scripted implementations to force failures or
/// long-running stages.
#[async_trait]
pub trait Workload: Send + Sync {
    /// Performs the work for `stage`, returning an error on failure.
    ///
    /// Implementations must be cancellation-safe: the future is dropped
    /// when the stage is cancelled or times out.
    async fn perform(&self, stage: &Stage) -> Result<(), StageFailure>;
}

/// Simulated workload: each stage is a time-bounded delay plus a log line
/// describing what the stage pretends to do.
#[derive(Debug, Clone)]
pub struct SimulatedWorkload {
    work: Duration,
}

impl SimulatedWorkload {
    /// Creates a workload where every stage takes `work` to complete.
    #[must_use]
    pub fn new(work: Duration) -> Self {
        Self { work }
    }
}

impl Default for SimulatedWorkload {
    fn default() -> Self {
        Self::new(Duration::from_millis(25))
    }
}

#[async_trait]
impl Workload for SimulatedWorkload {
    async fn perform(&self, stage: &Stage) -> Result<(), StageFailure> {
        match stage {
            Stage::Run { command, .. } => {
                info!(command = %command, "running command");
            }
            Stage::Build {
                image_repository,
                tag,
                ..
            } => {
                info!(
                    image_repository = %image_repository,
                    tag = %tag,
                    "building image and pushing"
                );
            }
            Stage::Deploy { cluster, .. } => {
                info!(cluster = %cluster, "applying manifest to cluster");
            }
        }
        tokio::time::sleep(self.work).await;
        Ok(())
    }
}

/// Runs a single stage, honoring its declared timeout and the run's
/// cancellation token.
pub struct StageExecutor {
    workload: Arc<dyn Workload>,
}

impl StageExecutor {
    /// Creates an executor backed by the given workload.
    #[must_use]
    pub fn new(workload: Arc<dyn Workload>) -> Self {
        Self { workload }
    }

    /// Creates an executor with simulated work of the given duration.
    #[must_use]
    pub fn simulated(work: Duration) -> Self {
        Self::new(Arc::new(SimulatedWorkload::new(work)))
    }

    /// Executes `stage` to a terminal outcome.
    ///
    /// Cancellation wins over in-flight work: once `token` fires, the
    /// stage reports `Cancelled` even if its work would have finished.
    /// `Run` stages race their work against the declared timeout, and
    /// expiry is reported as `Failed(Timeout)` - a self-cancellation,
    /// distinct from an externally requested one.
    pub async fn execute(&self, stage: &Stage, token: &CancellationToken) -> StageOutcome {
        if token.is_cancelled() {
            return StageOutcome::Cancelled;
        }

        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => StageOutcome::Cancelled,
            result = self.bounded_work(stage) => match result {
                Ok(()) => StageOutcome::Succeeded,
                Err(failure) => StageOutcome::Failed(failure),
            },
        };

        match &outcome {
            StageOutcome::Succeeded => {
                info!(stage = stage.name(), kind = %stage.kind(), "stage completed");
            }
            StageOutcome::Failed(failure) => {
                warn!(stage = stage.name(), failure = %failure, "stage failed");
            }
            StageOutcome::Cancelled => {
                info!(stage = stage.name(), "stage cancelled");
            }
        }
        outcome
    }

    async fn bounded_work(&self, stage: &Stage) -> Result<(), StageFailure> {
        if let Stage::Run { timeout_ms, .. } = stage {
            let limit = Duration::from_millis(*timeout_ms);
            match tokio::time::timeout(limit, self.workload.perform(stage)).await {
                Ok(result) => result,
                Err(_) => Err(StageFailure::Timeout {
                    timeout_ms: *timeout_ms,
                }),
            }
        } else {
            self.workload.perform(stage).await
        }
    }
}

impl std::fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageExecutor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedWorkload;
    use pretty_assertions::assert_eq;

    fn run_stage(name: &str, timeout_ms: u64) -> Stage {
        Stage::Run {
            name: name.to_string(),
            command: "make test".to_string(),
            timeout_ms,
        }
    }

    fn deploy_stage(name: &str) -> Stage {
        Stage::Deploy {
            name: name.to_string(),
            cluster: "staging".to_string(),
            manifest: "apiVersion: v1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_execute_succeeds() {
        let executor = StageExecutor::simulated(Duration::from_millis(5));
        let token = CancellationToken::new();

        let outcome = executor.execute(&deploy_stage("deploy"), &token).await;
        assert_eq!(outcome, StageOutcome::Succeeded);
    }

    #[tokio::test]
    async fn test_execute_reports_scripted_failure() {
        let workload =
            Arc::new(ScriptedWorkload::new().with_failure("unit tests", "exit status 1"));
        let executor = StageExecutor::new(workload);
        let token = CancellationToken::new();

        let outcome = executor.execute(&run_stage("unit tests", 1_000), &token).await;
        assert_eq!(
            outcome,
            StageOutcome::Failed(StageFailure::Work {
                message: "exit status 1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_run_stage_times_out() {
        let workload =
            Arc::new(ScriptedWorkload::new().with_delay("slow", Duration::from_secs(10)));
        let executor = StageExecutor::new(workload);
        let token = CancellationToken::new();

        let outcome = executor.execute(&run_stage("slow", 20), &token).await;
        assert_eq!(
            outcome,
            StageOutcome::Failed(StageFailure::Timeout { timeout_ms: 20 })
        );
    }

    #[tokio::test]
    async fn test_timeout_does_not_apply_to_other_stage_kinds() {
        let workload =
            Arc::new(ScriptedWorkload::new().with_delay("deploy", Duration::from_millis(30)));
        let executor = StageExecutor::new(workload);
        let token = CancellationToken::new();

        let outcome = executor.execute(&deploy_stage("deploy"), &token).await;
        assert_eq!(outcome, StageOutcome::Succeeded);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_work() {
        let workload =
            Arc::new(ScriptedWorkload::new().with_delay("slow", Duration::from_secs(10)));
        let executor = Arc::new(StageExecutor::new(workload));
        let token = Arc::new(CancellationToken::new());

        let task = {
            let executor = Arc::clone(&executor);
            let token = Arc::clone(&token);
            tokio::spawn(async move { executor.execute(&run_stage("slow", 60_000), &token).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel("superseded");

        assert_eq!(task.await.unwrap(), StageOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_already_cancelled_token_skips_work() {
        let workload = Arc::new(ScriptedWorkload::new());
        let executor = StageExecutor::new(Arc::clone(&workload) as Arc<dyn Workload>);
        let token = CancellationToken::new();
        token.cancel("pre-cancelled");

        let outcome = executor.execute(&deploy_stage("deploy"), &token).await;
        assert_eq!(outcome, StageOutcome::Cancelled);
        assert!(workload.performed().is_empty());
    }
}
