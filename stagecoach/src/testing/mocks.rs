//! Scripted workloads and recording sinks.

use crate::core::{EngineEvent, RunOutcome, Stage, StageFailure, StageOutcome};
use crate::events::EventSink;
use crate::executor::Workload;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// An event sink that records every event in emission order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingEventSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events in order.
    #[must_use]
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().clone()
    }

    /// Returns the names of stages that were dispatched, in order.
    #[must_use]
    pub fn started_stages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::StageStarted { stage, .. } => Some(stage.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns `(stage, outcome)` pairs for finished stages, in order.
    #[must_use]
    pub fn finished_stages(&self) -> Vec<(String, StageOutcome)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::StageFinished { stage, outcome, .. } => {
                    Some((stage.clone(), outcome.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Returns terminal run outcomes in emission order.
    #[must_use]
    pub fn run_outcomes(&self) -> Vec<RunOutcome> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::RunFinished { outcome, .. } => Some(*outcome),
                _ => None,
            })
            .collect()
    }

    /// Discards all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &EngineEvent) {
        self.events.lock().push(event.clone());
    }
}

#[derive(Debug, Clone)]
enum Behavior {
    Delay(Duration),
    Fail(String),
}

/// A workload with scripted per-stage-name behavior.
///
/// Unscripted stages succeed immediately. Scripted stages either sleep for
/// a configured duration before succeeding, or fail with a configured
/// message. Every invocation is recorded so tests can assert which stages
/// were actually dispatched.
#[derive(Debug, Default)]
pub struct ScriptedWorkload {
    behaviors: HashMap<String, Behavior>,
    performed: Mutex<Vec<String>>,
}

impl ScriptedWorkload {
    /// Creates a workload where every stage succeeds immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `stage` to sleep for `delay` before succeeding.
    #[must_use]
    pub fn with_delay(mut self, stage: impl Into<String>, delay: Duration) -> Self {
        self.behaviors.insert(stage.into(), Behavior::Delay(delay));
        self
    }

    /// Scripts `stage` to fail with `message`.
    #[must_use]
    pub fn with_failure(mut self, stage: impl Into<String>, message: impl Into<String>) -> Self {
        self.behaviors
            .insert(stage.into(), Behavior::Fail(message.into()));
        self
    }

    /// Returns the names of stages whose work began, in invocation order.
    #[must_use]
    pub fn performed(&self) -> Vec<String> {
        self.performed.lock().clone()
    }
}

#[async_trait]
impl Workload for ScriptedWorkload {
    async fn perform(&self, stage: &Stage) -> Result<(), StageFailure> {
        self.performed.lock().push(stage.name().to_string());

        match self.behaviors.get(stage.name()) {
            Some(Behavior::Delay(delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            Some(Behavior::Fail(message)) => Err(StageFailure::Work {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}
