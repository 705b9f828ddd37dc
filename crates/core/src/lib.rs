//! Core types for the assetpulse asset telemetry system
//!
//! This crate provides the foundational pieces shared by the telemetry
//! batcher and the command-line driver:
//!
//! - **Configuration**: batcher and sink settings, loaded from TOML and the environment
//! - **Error handling**: unified error types
//!

pub mod config;
pub mod error;

// Re-export main types for convenience
pub use config::{BatcherConfig, Config, SinkConfig};
pub use error::{Error, Result, ResultExt};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Result, ResultExt};
}
