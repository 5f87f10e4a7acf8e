//! Test doubles for engine tests.
//!
//! These are exported so downstream callers can drive the engine in their
//! own tests without real delays.

mod mocks;

pub use mocks::{RecordingEventSink, ScriptedWorkload};
