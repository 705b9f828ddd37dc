//! Sink that writes events to the tracing log

use super::TelemetrySink;
use crate::events::SendEventOptions;
use assetpulse_core::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Writes each event as one structured log record
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TelemetrySink for LogSink {
    async fn send_event(&self, options: SendEventOptions) -> Result<()> {
        let payload = serde_json::to_string(&options)?;
        info!(
            event_type = ?options.xdm.content_event_type(),
            experience_id = options.xdm.experience_id(),
            asset_count = options.xdm.assets_ids().len(),
            %payload,
            "content event"
        );
        Ok(())
    }
}
