//! HTTP sink posting events to an edge collection endpoint

use super::error::SinkError;
use super::TelemetrySink;
use crate::events::SendEventOptions;
use assetpulse_core::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Posts each event as a JSON document
pub struct EdgeSink {
    client: Client,
    endpoint: String,
}

impl EdgeSink {
    /// Create a new edge sink
    ///
    /// # Arguments
    /// * `endpoint` - Collection URL events are posted to
    /// * `timeout_secs` - Request timeout in seconds
    pub fn new(endpoint: String, timeout_secs: u64) -> Result<Self> {
        info!("Initializing edge telemetry sink");
        info!("  Endpoint: {endpoint}");
        info!("  Timeout: {timeout_secs}s");

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SinkError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TelemetrySink for EdgeSink {
    async fn send_event(&self, options: SendEventOptions) -> Result<()> {
        let asset_count = options.xdm.assets_ids().len();

        let response = self
            .client
            .post(&self.endpoint)
            .json(&options)
            .send()
            .await
            .map_err(|e| {
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection"
                } else if e.is_request() {
                    "request build"
                } else {
                    "unknown"
                };
                warn!(
                    "Edge send failed ({}): {} - {} assets",
                    error_kind, e, asset_count
                );
                SinkError::Transport(format!("{error_kind}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        debug!("Edge accepted content event with {asset_count} assets");
        Ok(())
    }
}
