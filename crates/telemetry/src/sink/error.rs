//! Error types for telemetry sinks

use std::fmt;

/// Errors that can occur while delivering an event
#[derive(Debug)]
pub enum SinkError {
    /// Request could not be sent or timed out
    Transport(String),

    /// Collector answered with a non-success status
    Rejected { status: u16, body: String },

    /// Configuration error
    ConfigError(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "Transport failed: {msg}"),
            Self::Rejected { status, body } => {
                write!(f, "Collector rejected event with status {status}: {body}")
            }
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<SinkError> for assetpulse_core::error::Error {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::ConfigError(msg) => assetpulse_core::error::Error::Config(msg),
            other => assetpulse_core::error::Error::Sink(other.to_string()),
        }
    }
}
