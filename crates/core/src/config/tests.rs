//! Tests for configuration module

use super::*;
use crate::error::{Error, Result};
use std::io::Write;
use tempfile::NamedTempFile;

fn create_temp_config_file(content: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .map_err(|e| Error::config(format!("Failed to create temp file: {e}")))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::config(format!("Failed to write temp file: {e}")))?;
    file.flush()
        .map_err(|e| Error::config(format!("Failed to flush temp file: {e}")))?;
    Ok(file)
}

fn with_env_var<F, T>(key: &str, value: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    std::env::set_var(key, value);
    let result = f();
    std::env::remove_var(key);
    result
}

#[test]
fn test_from_toml_str_valid() {
    let toml = r#"
        [batcher]
        debounce_ms = 250
        visibility_threshold = 0.75

        [sink]
        provider = "edge"
        endpoint = "https://edge.example.test/collect"
    "#;

    let config = Config::from_toml_str(toml).expect("Failed to parse valid TOML");
    assert_eq!(config.batcher.debounce_ms, 250);
    assert_eq!(config.batcher.visibility_threshold, 0.75);
    assert_eq!(config.sink.provider, "edge");
    assert_eq!(
        config.sink.endpoint.as_deref(),
        Some("https://edge.example.test/collect")
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_str_minimal() {
    let config = Config::from_toml_str("").expect("Failed to parse empty TOML");

    // Check defaults are applied
    assert_eq!(config.batcher.debounce_ms, 5000);
    assert_eq!(config.batcher.visibility_threshold, 0.5);
    assert!(config.batcher.observe_visibility);
    assert_eq!(config.batcher.dataset_id, DEFAULT_DATASET_ID);
    assert_eq!(config.sink.provider, "log");
    assert_eq!(config.sink.endpoint, None);
}

#[test]
fn test_from_toml_str_invalid_syntax() {
    let toml = r#"
        [sink
        provider = "edge"
    "#;

    let result = Config::from_toml_str(toml);
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to parse TOML"));
}

#[test]
fn test_from_file_missing_uses_defaults() {
    let config = Config::from_file(std::path::Path::new("/nonexistent/assetpulse.toml"))
        .expect("Missing file should fall back to defaults");
    assert_eq!(config.batcher.visibility_threshold, 0.5);
    assert_eq!(config.batcher.dataset_id, DEFAULT_DATASET_ID);
}

#[test]
fn test_from_file_reads_sections() {
    let file = create_temp_config_file(
        r#"
        [batcher]
        observe_visibility = false
        dataset_id = "custom-dataset"

        [sink]
        provider = "none"
        "#,
    )
    .expect("Failed to create temp config");

    let config = Config::from_file(file.path()).expect("Failed to load config");
    assert!(!config.batcher.observe_visibility);
    assert_eq!(config.batcher.dataset_id, "custom-dataset");
    assert_eq!(config.sink.provider, "none");
}

#[test]
fn test_env_var_overrides_file() {
    let file = create_temp_config_file(
        r#"
        [batcher]
        debounce_ms = 100
        "#,
    )
    .expect("Failed to create temp config");

    let config = with_env_var("ASSETPULSE_BATCHER__DEBOUNCE_MS", "42", || {
        Config::from_file(file.path())
    })
    .expect("Failed to load config");

    assert_eq!(config.batcher.debounce_ms, 42);
    assert_eq!(
        config.batcher.debounce_duration(),
        std::time::Duration::from_millis(42)
    );
}

#[test]
fn test_env_var_overrides_sink_section() {
    let file = create_temp_config_file(
        r#"
        [sink]
        provider = "log"
        timeout_secs = 5
        "#,
    )
    .expect("Failed to create temp config");

    let config = with_env_var("ASSETPULSE_SINK__TIMEOUT_SECS", "30", || {
        Config::from_file(file.path())
    })
    .expect("Failed to load config");

    assert_eq!(config.sink.timeout_secs, 30);
    assert_eq!(config.sink.provider, "log");
}

#[test]
fn test_validate_threshold_range() {
    let mut config = Config::default();

    config.batcher.visibility_threshold = 0.0;
    assert!(config.validate().is_ok());

    config.batcher.visibility_threshold = 1.0;
    assert!(config.validate().is_ok());

    config.batcher.visibility_threshold = 1.5;
    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("visibility_threshold"));

    config.batcher.visibility_threshold = f64::NAN;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_sink_provider() {
    let mut config = Config::default();

    for provider in VALID_SINK_PROVIDERS {
        config.sink.provider = provider.to_string();
        config.sink.endpoint = Some("https://edge.example.test/collect".to_string());
        assert!(config.validate().is_ok(), "provider {provider} should be valid");
    }

    config.sink.provider = "alloy".to_string();
    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Invalid sink provider"));
}

#[test]
fn test_validate_edge_requires_endpoint() {
    let mut config = Config::default();
    config.sink.provider = "edge".to_string();

    let result = config.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("sink.endpoint"));

    config.sink.endpoint = Some("   ".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_empty_dataset_id() {
    let mut config = Config::default();
    config.batcher.dataset_id = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_zero_timeout() {
    let mut config = Config::default();
    config.sink.timeout_secs = 0;
    assert!(config.validate().is_err());
}
