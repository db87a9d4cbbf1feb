//! Configuration for the capture orchestrator.

use capmux_proto::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Orchestrator tuning knobs.
///
/// Convergence waiting is a poll over worker state cells; the interval only
/// governs orchestration latency, not data paths, so a few hundred
/// milliseconds is adequate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Interval between convergence polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl OrchestratorConfig {
    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("config parse error: {e}")))
    }

    /// The poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_from_yaml() {
        let config: OrchestratorConfig = serde_yaml::from_str("poll_interval_ms: 50").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(50));

        // Empty mapping falls back to defaults
        let config: OrchestratorConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.poll_interval_ms, 250);
    }

    #[test]
    fn test_from_file_rejects_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "poll_interval_ms: [not, a, number]").unwrap();

        let err = OrchestratorConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }
}
