//! Event sink trait and implementations.

use crate::core::EngineEvent;
use tracing::{info, warn};

/// Sink for engine lifecycle events.
///
/// The engine emits one event per run and stage lifecycle transition
/// ("run started", "stage finished", ...). Sinks are the engine's only
/// observability surface besides its terminal outcomes.
///
/// Implementations must not block for long and must not panic: `emit` is
/// called from the middle of run drive loops.
pub trait EventSink: Send + Sync {
    /// Delivers one event.
    fn emit(&self, event: &EngineEvent);
}

/// A sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &EngineEvent) {
        // Intentionally empty - discards all events
    }
}

/// A sink that forwards events to the tracing subscriber as structured
/// JSON payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink;

impl LoggingEventSink {
    /// Creates a new logging sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: &EngineEvent) {
        match serde_json::to_value(event) {
            Ok(payload) => {
                info!(target: "stagecoach::events", payload = %payload, "{}", event.kind());
            }
            Err(error) => {
                warn!(target: "stagecoach::events", error = %error, "failed to serialize event");
            }
        }
    }
}
