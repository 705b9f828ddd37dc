//! Scenario replay
//!
//! Drives an [`AssetTelemetryBatcher`] from a recorded sequence of host
//! events, standing in for the browser bridge that would normally call it.

use anyhow::{Context, Result};
use assetpulse_core::config::BatcherConfig;
use assetpulse_telemetry::{
    AnchorElement, AssetElement, AssetTelemetryBatcher, DocumentProvider, ElementId,
    ExperienceContextProvider, IntersectionEntry, LifecycleEvent, PageDocument,
    ServedExperiences, SharedExperienceContext, TelemetrySink,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// A recorded page session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub page_url: String,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub experiences: ServedExperiences,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// Read a scenario from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }
}

/// One host event in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Register an element for visibility observation
    Observe { element: AssetElement },
    /// Register an element for click tracking
    TrackClick {
        element: AssetElement,
        anchor: AnchorElement,
    },
    /// Visibility changes reported by the host
    Intersect { entries: Vec<IntersectionEntry> },
    /// A click on an element
    Click { target: ElementId },
    /// Page lifecycle notification
    Lifecycle { event: LifecycleEvent },
    /// Navigation to another document
    Navigate {
        url: String,
        #[serde(default)]
        last_modified: Option<String>,
    },
    /// New campaign/experiment/audience overrides
    Personalize { experiences: ServedExperiences },
    /// Manual flush
    Drain,
    /// Let time pass
    Wait { ms: u64 },
}

/// What a replay did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Assets that became visible and were queued
    pub views_recorded: usize,
    /// Click events sent
    pub clicks_sent: usize,
    /// Identifiers flushed by manual drains and lifecycle events
    pub views_flushed: usize,
    /// Steps that failed and were skipped
    pub failed_steps: usize,
}

/// Replay `scenario` against a fresh batcher
///
/// A page hide is simulated at the end so no queued views are left behind,
/// then `settle` is waited so detached sends can complete.
pub async fn run_scenario(
    scenario: &Scenario,
    config: BatcherConfig,
    sink: Option<Arc<dyn TelemetrySink>>,
    settle: Duration,
) -> Result<ReplaySummary> {
    let page_url = Url::parse(&scenario.page_url)
        .with_context(|| format!("Invalid page URL '{}'", scenario.page_url))?;
    let document = Arc::new(PageDocument::new(page_url, scenario.last_modified.clone()));
    let context = Arc::new(SharedExperienceContext::new(scenario.experiences.clone()));

    let batcher = AssetTelemetryBatcher::builder(
        Arc::clone(&context) as Arc<dyn ExperienceContextProvider>,
        Arc::clone(&document) as Arc<dyn DocumentProvider>,
    )
    .config(config)
    .sink(sink)
    .build()
    .context("Failed to create asset telemetry batcher")?;

    info!(
        "Replaying {} steps for {}",
        scenario.steps.len(),
        scenario.page_url
    );

    let mut summary = ReplaySummary::default();
    for (index, step) in scenario.steps.iter().enumerate() {
        debug!("Step {index}: {step:?}");
        match step {
            ScenarioStep::Observe { element } => {
                batcher.register_asset_observer(element.clone());
            }
            ScenarioStep::TrackClick { element, anchor } => {
                batcher.register_asset_click(element.clone(), anchor.clone());
            }
            ScenarioStep::Intersect { entries } => match batcher.handle_intersections(entries) {
                Ok(recorded) => summary.views_recorded += recorded,
                Err(e) => {
                    warn!("Step {index}: intersection failed: {e}");
                    summary.failed_steps += 1;
                }
            },
            ScenarioStep::Click { target } => match batcher.handle_click(*target) {
                Ok(sent) => summary.clicks_sent += sent,
                Err(e) => {
                    warn!("Step {index}: click failed: {e}");
                    summary.failed_steps += 1;
                }
            },
            ScenarioStep::Lifecycle { event } => {
                summary.views_flushed += batcher.handle_lifecycle_event(*event);
            }
            ScenarioStep::Navigate { url, last_modified } => match Url::parse(url) {
                Ok(url) => document.navigate(url, last_modified.clone()),
                Err(e) => {
                    warn!("Step {index}: invalid navigation URL '{url}': {e}");
                    summary.failed_steps += 1;
                }
            },
            ScenarioStep::Personalize { experiences } => {
                context.update(experiences.clone());
            }
            ScenarioStep::Drain => {
                summary.views_flushed += batcher.drain_assets_queue();
            }
            ScenarioStep::Wait { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
        }
    }

    summary.views_flushed += batcher.handle_lifecycle_event(LifecycleEvent::PageHide);
    tokio::time::sleep(settle).await;

    info!(
        views_recorded = summary.views_recorded,
        clicks_sent = summary.clicks_sent,
        views_flushed = summary.views_flushed,
        failed_steps = summary.failed_steps,
        "Replay finished"
    );
    Ok(summary)
}
