//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `ASSETPULSE_` and use double underscores
    /// for nested values. For example:
    /// - `ASSETPULSE_SINK__PROVIDER=edge`
    /// - `ASSETPULSE_BATCHER__DEBOUNCE_MS=1000`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // The config crate doesn't apply serde defaults for missing sections
        let builder =
            set_config_default(builder, "batcher.debounce_ms", default_debounce_ms() as i64)?;
        let builder = set_config_default(
            builder,
            "batcher.visibility_threshold",
            default_visibility_threshold(),
        )?;
        let builder = set_config_default(
            builder,
            "batcher.observe_visibility",
            default_observe_visibility(),
        )?;
        let builder = set_config_default(builder, "batcher.dataset_id", default_dataset_id())?;
        let builder = set_config_default(builder, "sink.provider", default_sink_provider())?;
        let mut builder = set_config_default(
            builder,
            "sink.timeout_secs",
            default_sink_timeout_secs() as i64,
        )?;

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        // Add environment variables with ASSETPULSE_ prefix
        builder = builder.add_source(
            Environment::with_prefix("ASSETPULSE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.assetpulse/config.toml or custom --config path)
    /// 3. Environment variables (ASSETPULSE_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
