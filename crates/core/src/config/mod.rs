//! Configuration module for assetpulse
//!
//! This module provides configuration structures and loading mechanisms for the
//! telemetry batcher and its sink. Configuration can be loaded from TOML files
//! and/or environment variables.

mod defaults;
mod loading;

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use defaults::DEFAULT_DATASET_ID;

use defaults::*;

/// Sink providers accepted by [`Config::validate`]
pub const VALID_SINK_PROVIDERS: [&str; 3] = ["edge", "log", "none"];

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.assetpulse/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".assetpulse").join("config.toml"))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Asset view batching configuration
    #[serde(default)]
    pub batcher: BatcherConfig,

    /// Telemetry sink configuration
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Asset view batching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatcherConfig {
    /// Quiet period before accumulated views are flushed, in milliseconds (default: 5000)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Intersection ratio at which an asset counts as viewed (default: 0.5)
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,

    /// Whether the host supports visibility observation (default: true)
    ///
    /// When false, observer registration is a silent no-op.
    #[serde(default = "default_observe_visibility")]
    pub observe_visibility: bool,

    /// Dataset identifier attached to every content event
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,
}

impl BatcherConfig {
    /// Get the debounce window
    pub fn debounce_duration(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            visibility_threshold: default_visibility_threshold(),
            observe_visibility: default_observe_visibility(),
            dataset_id: default_dataset_id(),
        }
    }
}

/// Telemetry sink configuration
///
/// # Providers
/// - `log` (default): write each event as a tracing record
/// - `edge`: POST each event as JSON to `endpoint`
/// - `none`: no sink; sends are warned about and dropped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Provider type: "log" (default), "edge", "none"
    #[serde(default = "default_sink_provider")]
    pub provider: String,

    /// Collection endpoint for the edge provider
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds for the edge provider
    #[serde(default = "default_sink_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            provider: default_sink_provider(),
            endpoint: None,
            timeout_secs: default_sink_timeout_secs(),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let threshold = self.batcher.visibility_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "batcher.visibility_threshold must be between 0.0 and 1.0, got {threshold}"
            )));
        }

        if self.batcher.dataset_id.trim().is_empty() {
            return Err(Error::config(
                "batcher.dataset_id must not be empty".to_string(),
            ));
        }

        if !VALID_SINK_PROVIDERS.contains(&self.sink.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid sink provider '{}'. Must be one of: {:?}",
                self.sink.provider, VALID_SINK_PROVIDERS
            )));
        }

        if self.sink.provider == "edge" {
            match self.sink.endpoint.as_deref() {
                Some(endpoint) if !endpoint.trim().is_empty() => {}
                _ => {
                    return Err(Error::config(
                        "sink.endpoint is required for the edge provider".to_string(),
                    ))
                }
            }
        }

        if self.sink.timeout_secs == 0 {
            return Err(Error::config(
                "sink.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
