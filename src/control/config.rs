//! Configuration loading for the demo.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::worker::WorkerSettings;

/// Runtime configuration, loadable from a TOML file. Every field has a
/// default matching the reference cadence, so a partial file is fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppConfig {
    /// Worker command-poll cadence in milliseconds.
    pub worker_poll_interval_ms: u64,
    /// Foreground telemetry-poll cadence in milliseconds.
    pub poller_interval_ms: u64,
    /// How long `stop()` waits for the worker before giving up on it.
    pub stop_timeout_ms: u64,
    /// Frequency pushed to the worker right after start.
    pub initial_frequency: f64,
    /// Verbosity pushed to the worker right after start.
    pub initial_verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            worker_poll_interval_ms: 200,
            poller_interval_ms: 500,
            stop_timeout_ms: 5000,
            initial_frequency: 1.0,
            initial_verbose: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        Self::from_toml_str(&content)
    }

    fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            poll_interval: Duration::from_millis(self.worker_poll_interval_ms),
            ..WorkerSettings::default()
        }
    }

    pub fn poller_interval(&self) -> Duration {
        Duration::from_millis(self.poller_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}
