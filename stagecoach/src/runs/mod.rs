//! Run tracking: at most one in-flight run per pipeline.

mod tracker;

pub use tracker::{RunHandle, RunRecord, RunTracker};
