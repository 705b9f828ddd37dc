//! Telemetry sinks
//!
//! A sink is the opaque experience-platform SDK the batcher hands events to.
//! Delivery is best-effort: the batcher never awaits a sink on behalf of its
//! callers, and a failed send is logged and dropped.

use crate::events::SendEventOptions;
use assetpulse_core::config::SinkConfig;
use assetpulse_core::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, warn};

mod edge;
pub mod error;
mod log;
mod mock;

pub use edge::EdgeSink;
pub use error::SinkError;
pub use log::LogSink;
pub use mock::RecordingSink;

/// Destination for content events
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Send one event
    ///
    /// Callers inside this crate discard the result after logging it; an
    /// error never causes the event to be resent.
    async fn send_event(&self, options: SendEventOptions) -> Result<()>;
}

/// Send an event, treating a missing sink as a successful no-op
pub async fn send_content_event(
    sink: Option<&Arc<dyn TelemetrySink>>,
    options: SendEventOptions,
) -> Result<()> {
    match sink {
        Some(sink) => sink.send_event(options).await,
        None => {
            warn!("telemetry sink not initialized, cannot send analytics event");
            Ok(())
        }
    }
}

/// Spawn a send on `runtime` without waiting for it
///
/// The outcome is logged and otherwise discarded.
pub fn dispatch_detached(
    runtime: &Handle,
    sink: Option<Arc<dyn TelemetrySink>>,
    options: SendEventOptions,
) {
    runtime.spawn(async move {
        let event_type = options.xdm.content_event_type();
        let asset_count = options.xdm.assets_ids().len();
        if let Err(e) = send_content_event(sink.as_ref(), options).await {
            warn!(
                event_type = ?event_type,
                asset_count,
                error = %e,
                "Dropping content event after failed send"
            );
        }
    });
}

/// Create a telemetry sink based on configuration
///
/// Returns `None` for the `none` provider.
pub fn create_telemetry_sink(config: &SinkConfig) -> Result<Option<Arc<dyn TelemetrySink>>> {
    match config.provider.as_str() {
        "edge" => {
            let endpoint = config.endpoint.clone().ok_or_else(|| {
                Error::config("sink.endpoint is required for the edge provider".to_string())
            })?;

            info!("Creating edge telemetry sink");
            let sink = EdgeSink::new(endpoint, config.timeout_secs)?;
            Ok(Some(Arc::new(sink)))
        }
        "log" => {
            info!("Creating log telemetry sink");
            Ok(Some(Arc::new(LogSink::new())))
        }
        "none" => {
            info!("No telemetry sink configured, events will be dropped");
            Ok(None)
        }
        other => Err(Error::config(format!(
            "Unknown sink provider: '{other}'. Valid providers: edge, log, none"
        ))),
    }
}
