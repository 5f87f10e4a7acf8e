//! Stage definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One named unit of work within a pipeline.
///
/// The set of stage kinds is closed: a stage either runs a command, builds
/// a container image, or deploys a manifest to a cluster. All payload
/// strings are opaque to the engine - Dockerfiles and manifests are stored
/// and logged, never parsed or validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Stage {
    /// Runs a shell command with a declared timeout.
    Run {
        /// The stage name, unique within its pipeline.
        name: String,
        /// The command to run.
        command: String,
        /// Timeout for the command, in milliseconds. Expiry is reported as
        /// a `Timeout` stage failure.
        timeout_ms: u64,
    },
    /// Builds a container image and pushes it to an image repository.
    Build {
        /// The stage name, unique within its pipeline.
        name: String,
        /// Dockerfile contents. Stored verbatim, not validated.
        dockerfile: String,
        /// The image repository to push to.
        image_repository: String,
        /// The image tag.
        tag: String,
    },
    /// Applies a manifest to a target cluster.
    Deploy {
        /// The stage name, unique within its pipeline.
        name: String,
        /// Opaque descriptor of the target cluster.
        cluster: String,
        /// Manifest contents. Stored verbatim, not validated.
        manifest: String,
    },
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Run { name, .. } | Self::Build { name, .. } | Self::Deploy { name, .. } => name,
        }
    }

    /// Returns the kind of work this stage performs.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Run { .. } => StageKind::Run,
            Self::Build { .. } => StageKind::Build,
            Self::Deploy { .. } => StageKind::Deploy,
        }
    }

    /// Returns the declared timeout, if this stage kind carries one.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Self::Run { timeout_ms, .. } => Some(Duration::from_millis(*timeout_ms)),
            Self::Build { .. } | Self::Deploy { .. } => None,
        }
    }
}

/// The kind of work a stage performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Runs a command.
    Run,
    /// Builds and pushes an image.
    Build,
    /// Deploys a manifest.
    Deploy,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "run"),
            Self::Build => write!(f, "build"),
            Self::Deploy => write!(f, "deploy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run_stage() -> Stage {
        Stage::Run {
            name: "unit tests".to_string(),
            command: "cargo test".to_string(),
            timeout_ms: 500,
        }
    }

    #[test]
    fn test_stage_name() {
        assert_eq!(run_stage().name(), "unit tests");

        let build = Stage::Build {
            name: "build image".to_string(),
            dockerfile: "FROM alpine:latest".to_string(),
            image_repository: "registry.example.com/app".to_string(),
            tag: "latest".to_string(),
        };
        assert_eq!(build.name(), "build image");
    }

    #[test]
    fn test_stage_kind() {
        assert_eq!(run_stage().kind(), StageKind::Run);
        assert_eq!(StageKind::Build.to_string(), "build");
        assert_eq!(StageKind::Deploy.to_string(), "deploy");
    }

    #[test]
    fn test_stage_timeout() {
        assert_eq!(run_stage().timeout(), Some(Duration::from_millis(500)));

        let deploy = Stage::Deploy {
            name: "deploy".to_string(),
            cluster: "prod".to_string(),
            manifest: "apiVersion: v1".to_string(),
        };
        assert_eq!(deploy.timeout(), None);
    }

    #[test]
    fn test_stage_serde_tagged() {
        let json = serde_json::to_value(run_stage()).unwrap();
        assert_eq!(json["type"], "Run");
        assert_eq!(json["command"], "cargo test");

        let parsed: Stage = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, run_stage());
    }
}
