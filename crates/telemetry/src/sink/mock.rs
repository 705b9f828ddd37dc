//! In-memory sink for testing

use super::TelemetrySink;
use crate::events::{ContentEventType, SendEventOptions};
use assetpulse_core::error::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Sink that records every event it receives
///
/// Events are recorded even when the sink is set to fail, so tests can tell
/// that a send was attempted.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SendEventOptions>>,
    subscriber: Mutex<Option<mpsc::UnboundedSender<SendEventOptions>>>,
    fail: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose sends all fail after recording
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Receive every event sent from now on
    ///
    /// Replaces any previous subscriber.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SendEventOptions> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self
            .subscriber
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    /// All events recorded so far
    pub fn events(&self) -> Vec<SendEventOptions> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded events of one type
    pub fn events_of_type(&self, event_type: ContentEventType) -> Vec<SendEventOptions> {
        self.events()
            .into_iter()
            .filter(|options| options.xdm.content_event_type() == event_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn send_event(&self, options: SendEventOptions) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(options.clone());

        if let Some(tx) = self
            .subscriber
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            let _ = tx.send(options);
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::sink("recording sink set to fail"));
        }
        Ok(())
    }
}
