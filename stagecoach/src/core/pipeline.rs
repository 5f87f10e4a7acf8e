//! Pipeline configurations and identifiers.

use super::stage::Stage;
use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a stored pipeline.
///
/// Assigned by the registry on creation and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineId(Uuid);

impl PipelineId {
    /// Generates a fresh, collision-free identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PipelineId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for one run of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh run identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pipeline configuration as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Human-readable pipeline name.
    pub name: String,
    /// The source repository the pipeline nominally operates on. Opaque;
    /// never parsed.
    pub git_repository: String,
    /// Whether stages run concurrently instead of in stored order.
    #[serde(default)]
    pub parallel: bool,
    /// The stages, in execution order when `parallel` is false.
    pub stages: Vec<Stage>,
}

impl PipelineConfig {
    /// Validates the configuration.
    ///
    /// Stage names must be non-empty and unique within the pipeline
    /// (case-sensitive exact match). Stage payloads are not validated.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for stage in &self.stages {
            let name = stage.name();
            if name.is_empty() {
                return Err(ValidationError::EmptyStageName);
            }
            if !seen.insert(name) {
                return Err(ValidationError::DuplicateStageName {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A stored pipeline: a validated configuration plus its assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    /// The registry-assigned identifier.
    pub id: PipelineId,
    /// The validated configuration.
    pub config: PipelineConfig,
}
