//! assetpulse CLI - asset view/click telemetry
//!
//! This binary replays recorded page sessions through the telemetry batcher
//! and exposes the experience identifier helpers.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use assetpulse::replay::{run_scenario, Scenario};
use assetpulse_core::config::Config;
use assetpulse_telemetry::{
    create_telemetry_sink, format_last_modified, ExperienceResolver, PageDocument,
    ServedExperiences,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

#[derive(Parser)]
#[command(name = "assetpulse")]
#[command(about = "Asset view and click telemetry batching")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded page session through the batcher
    Replay {
        /// Scenario JSON file
        scenario: PathBuf,
        /// Time to wait for in-flight sends after the final flush
        #[arg(long, default_value_t = 1000)]
        settle_ms: u64,
    },
    /// Print the experience identifier for a page
    ExperienceId {
        /// Current page URL
        #[arg(long)]
        page_url: String,
        /// Document last-modified value
        #[arg(long)]
        last_modified: Option<String>,
        /// Served campaign experience path
        #[arg(long)]
        campaign: Option<String>,
        /// Served experiment experience path
        #[arg(long)]
        experiment: Option<String>,
        /// Served audience experience path
        #[arg(long)]
        audience: Option<String>,
    },
    /// Format a last-modified value as YYYY-MM-DD
    LastModified {
        /// Raw last-modified value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    // Execute commands
    match cli.command {
        Some(Commands::Replay {
            scenario,
            settle_ms,
        }) => replay(&scenario, cli.config.as_deref(), settle_ms).await,
        Some(Commands::ExperienceId {
            page_url,
            last_modified,
            campaign,
            experiment,
            audience,
        }) => {
            let experiences = ServedExperiences {
                campaign,
                experiment,
                audience,
            };
            let page_url =
                Url::parse(&page_url).with_context(|| format!("Invalid page URL '{page_url}'"))?;
            let resolver = ExperienceResolver::new(
                Arc::new(experiences),
                Arc::new(PageDocument::new(page_url, last_modified)),
            );
            println!("{}", resolver.experience_id());
            Ok(())
        }
        Some(Commands::LastModified { value }) => match format_last_modified(&value) {
            Some(date) => {
                println!("{date}");
                Ok(())
            }
            None => anyhow::bail!("Unrecognized last-modified value: '{value}'"),
        },
        None => {
            // Default behavior - show help
            println!("Run 'assetpulse replay <scenario.json>' to replay a session, or --help for more options");
            Ok(())
        }
    }
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "assetpulse={level},assetpulse_telemetry={level},assetpulse_core={level}"
        ))
        .init();

    Ok(())
}

/// Replay a scenario file with the configured sink
async fn replay(scenario_path: &Path, config_path: Option<&Path>, settle_ms: u64) -> Result<()> {
    let config = Config::load(config_path)?;
    config.validate()?;

    let scenario = Scenario::from_file(scenario_path)?;
    let sink = create_telemetry_sink(&config.sink).context("Failed to create telemetry sink")?;

    info!("Using sink provider '{}'", config.sink.provider);
    let summary = run_scenario(
        &scenario,
        config.batcher.clone(),
        sink,
        Duration::from_millis(settle_ms),
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
