//! Trailing-edge debounce timer
//!
//! Holds at most one pending timer. Re-arming aborts the pending timer and
//! starts the quiet period over, so a burst of requests runs the action once,
//! one window after the last request.

use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

/// Single-slot debounce timer
pub struct FlushTimer {
    /// Quiet period before the action runs
    window: Duration,
    /// Pending timer task, if one has been armed
    pending: Option<JoinHandle<()>>,
}

impl FlushTimer {
    /// Create a timer with the given debounce window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Debounce window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Cancel any pending timer and arm a new one that runs `action` after the window
    pub fn rearm<F>(&mut self, runtime: &Handle, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.pending.take() {
            trace!("Superseding pending flush timer");
            previous.abort();
        }

        let window = self.window;
        self.pending = Some(runtime.spawn(async move {
            sleep(window).await;
            action.await;
        }));
    }

    /// Cancel the pending timer without running its action
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether a timer is armed and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for FlushTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
