//! Event sinks for run and stage lifecycle events.

mod sink;

pub use sink::{EventSink, LoggingEventSink, NoOpEventSink};
