//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding the simulated stage work duration.
pub const STAGE_WORK_MS_VAR: &str = "STAGECOACH_STAGE_WORK_MS";

/// Tunables for the engine's simulated execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long each stage's simulated work takes, in milliseconds.
    #[serde(default = "default_stage_work_ms")]
    pub stage_work_ms: u64,
}

const fn default_stage_work_ms() -> u64 {
    25
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stage_work_ms: default_stage_work_ms(),
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from the environment, falling back to
    /// defaults for unset or unparseable variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = std::env::var(STAGE_WORK_MS_VAR)
            .ok()
            .and_then(|raw| raw.parse().ok())
        {
            config.stage_work_ms = ms;
        }
        config
    }

    /// Sets the simulated stage work duration.
    #[must_use]
    pub fn with_stage_work(mut self, work: Duration) -> Self {
        self.stage_work_ms = u64::try_from(work.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns the simulated stage work duration.
    #[must_use]
    pub fn stage_work(&self) -> Duration {
        Duration::from_millis(self.stage_work_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.stage_work(), Duration::from_millis(25));
    }

    #[test]
    fn test_with_stage_work() {
        let config = EngineConfig::new().with_stage_work(Duration::from_millis(5));
        assert_eq!(config.stage_work_ms, 5);
    }

    #[test]
    fn test_deserialize_uses_default() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
