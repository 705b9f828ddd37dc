//! Library interface for the assetpulse CLI
//!
//! This module exposes the scenario replay driver for integration testing while
//! keeping the argument handling in main.rs.

pub mod replay;

// Re-export commonly needed types for tests
pub use anyhow::Result;
pub use assetpulse_core::config::Config;
pub use replay::{run_scenario, ReplaySummary, Scenario, ScenarioStep};
