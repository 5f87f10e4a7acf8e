//! Error types for the engine.
//!
//! The taxonomy is deliberately small: configuration problems surface
//! synchronously as [`ValidationError`], unknown identifiers as
//! [`EngineError::NotFound`]. Stage failures never appear here - they are
//! contained at the run boundary and observable only through a run's
//! terminal outcome and events.

use crate::core::PipelineId;
use thiserror::Error;

/// The top-level error type for engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No pipeline is registered under the given identifier.
    #[error("pipeline not found: {id}")]
    NotFound {
        /// The unknown identifier.
        id: PipelineId,
    },

    /// The submitted configuration failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Error raised when a submitted pipeline configuration is invalid.
///
/// Validation runs before any storage mutation, so a rejected create or
/// replace leaves the registry untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Two stages in the same pipeline share a name.
    #[error("duplicate stage name '{name}': stage names must be unique within a pipeline")]
    DuplicateStageName {
        /// The offending stage name.
        name: String,
    },

    /// A stage has an empty name.
    #[error("stage name must not be empty")]
    EmptyStageName,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_not_found_display() {
        let id = PipelineId::generate();
        let err = EngineError::NotFound { id };
        assert_eq!(err.to_string(), format!("pipeline not found: {id}"));
    }

    #[test]
    fn test_validation_error_names_the_stage() {
        let err = ValidationError::DuplicateStageName {
            name: "build".to_string(),
        };
        assert!(err.to_string().contains("'build'"));
    }

    #[test]
    fn test_validation_converts_to_engine_error() {
        let err: EngineError = ValidationError::EmptyStageName.into();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::EmptyStageName)
        );
    }
}
