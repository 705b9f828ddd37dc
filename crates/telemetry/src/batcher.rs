//! Asset view batching and click tracking
//!
//! Visible assets accumulate in memory and are flushed as one view event once
//! the debounce window passes without new views, or immediately when the page
//! is hidden. Clicks bypass the accumulator and are sent one event per click.

use crate::asset::{resolve_asset_source, AnchorElement, AssetElement, ElementId};
use crate::debouncer::FlushTimer;
use crate::events::{ContentEvent, SendEventOptions};
use crate::experience::{
    get_last_modified, DocumentProvider, ExperienceContextProvider, ExperienceResolver,
};
use crate::observer::{IntersectionEntry, VisibilityObserver};
use crate::sink::{dispatch_detached, TelemetrySink};
use assetpulse_core::config::BatcherConfig;
use assetpulse_core::error::{Error, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

/// Page lifecycle notifications that force a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    VisibilityChange,
    PageHide,
}

/// Click target recorded for a tracked asset
#[derive(Debug, Clone)]
struct ClickRegistration {
    asset: AssetElement,
    anchor: AnchorElement,
}

struct BatcherInner {
    runtime: Handle,
    resolver: ExperienceResolver,
    sink: Option<Arc<dyn TelemetrySink>>,
    dataset_id: String,
    /// `None` when the host cannot observe visibility
    observer: Option<VisibilityObserver>,
    accumulator: Mutex<Vec<String>>,
    flush_timer: Mutex<FlushTimer>,
    clicks: DashMap<ElementId, Vec<ClickRegistration>>,
}

impl BatcherInner {
    fn lock_accumulator(&self) -> MutexGuard<'_, Vec<String>> {
        self.accumulator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_timer(&self) -> MutexGuard<'_, FlushTimer> {
        self.flush_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn drain(&self) -> usize {
        let assets_ids = std::mem::take(&mut *self.lock_accumulator());
        if assets_ids.is_empty() {
            trace!("Asset queue empty, nothing to drain");
            return 0;
        }

        let count = assets_ids.len();
        let event = ContentEvent::view(self.resolver.experience_id(), assets_ids);
        debug!("Draining {count} asset views");
        self.dispatch(event);
        count
    }

    fn dispatch(&self, event: ContentEvent) {
        let options = SendEventOptions::new(event, self.dataset_id.clone());
        dispatch_detached(&self.runtime, self.sink.clone(), options);
    }
}

/// Batches asset views and reports asset clicks to a telemetry sink
///
/// Cloning yields another handle to the same batcher.
#[derive(Clone)]
pub struct AssetTelemetryBatcher {
    inner: Arc<BatcherInner>,
}

impl AssetTelemetryBatcher {
    /// Start building a batcher around the host collaborators
    pub fn builder(
        context: Arc<dyn ExperienceContextProvider>,
        document: Arc<dyn DocumentProvider>,
    ) -> AssetTelemetryBatcherBuilder {
        AssetTelemetryBatcherBuilder::new(context, document)
    }

    /// Start observing an image or video element
    ///
    /// Other elements are ignored, as is every element when visibility
    /// observation is unsupported.
    pub fn register_asset_observer(&self, element: AssetElement) {
        if element.asset_kind().is_none() {
            trace!(
                "Not observing <{}> element {}",
                element.tag_name,
                element.id
            );
            return;
        }
        if let Some(observer) = &self.inner.observer {
            observer.observe(element);
        }
    }

    /// Report visibility changes from the host
    ///
    /// Returns how many assets were newly recorded. An element whose source
    /// cannot be resolved fails the call after it has been unobserved; entries
    /// after it are not processed.
    pub fn handle_intersections(&self, entries: &[IntersectionEntry]) -> Result<usize> {
        let Some(observer) = &self.inner.observer else {
            return Ok(0);
        };

        let mut recorded = 0;
        for entry in entries {
            let Some(element) = observer.take_visible(entry) else {
                continue;
            };

            let page_url = self.inner.resolver.document().page_url();
            let asset_id = resolve_asset_source(&element, &page_url)?;
            debug!("Asset {} visible: {asset_id}", element.id);
            self.inner.lock_accumulator().push(asset_id);
            recorded += 1;
            self.request_flush();
        }
        Ok(recorded)
    }

    /// Track clicks on an image or video that links to `anchor`
    ///
    /// Registering the same element more than once reports each click once
    /// per registration.
    pub fn register_asset_click(&self, asset: AssetElement, anchor: AnchorElement) {
        if asset.asset_kind().is_none() {
            trace!("Not tracking clicks on <{}> element {}", asset.tag_name, asset.id);
            return;
        }
        self.inner
            .clicks
            .entry(asset.id)
            .or_default()
            .push(ClickRegistration { asset, anchor });
    }

    /// Report a click from the host; sends one click event per registration
    ///
    /// Returns the number of events sent. Clicks on untracked elements send
    /// nothing.
    pub fn handle_click(&self, id: ElementId) -> Result<usize> {
        let registrations = match self.inner.clicks.get(&id) {
            Some(registrations) => registrations.value().clone(),
            None => {
                trace!("Ignoring click on untracked element {id}");
                return Ok(0);
            }
        };

        let page_url = self.inner.resolver.document().page_url();
        for registration in &registrations {
            let asset_id = resolve_asset_source(&registration.asset, &page_url)?;
            debug!("Asset {id} clicked: {asset_id}");
            let event = ContentEvent::click(
                self.inner.resolver.experience_id(),
                asset_id,
                registration.anchor.href.clone(),
            );
            self.inner.dispatch(event);
        }
        Ok(registrations.len())
    }

    /// Flush accumulated views now
    ///
    /// Returns the number of asset identifiers handed to the sink; an empty
    /// queue sends nothing. The send itself runs detached.
    pub fn drain_assets_queue(&self) -> usize {
        self.inner.drain()
    }

    /// Flush on page lifecycle changes, regardless of the debounce timer
    pub fn handle_lifecycle_event(&self, event: LifecycleEvent) -> usize {
        debug!("Lifecycle event {event:?}, draining asset queue");
        self.inner.drain()
    }

    /// Drain on every lifecycle event received until the channel closes
    pub fn spawn_lifecycle_listener(
        &self,
        mut events: mpsc::Receiver<LifecycleEvent>,
    ) -> JoinHandle<()> {
        let batcher = self.clone();
        self.inner.runtime.spawn(async move {
            while let Some(event) = events.recv().await {
                batcher.handle_lifecycle_event(event);
            }
            debug!("Lifecycle channel closed");
        })
    }

    /// Debounced flush: (re)start the quiet period
    pub fn request_flush(&self) {
        let inner = Arc::clone(&self.inner);
        self.inner
            .lock_timer()
            .rearm(&self.inner.runtime, async move {
                inner.drain();
            });
    }

    /// Whether a debounced flush is waiting to fire
    pub fn is_flush_pending(&self) -> bool {
        self.inner.lock_timer().is_pending()
    }

    /// Number of asset identifiers waiting to be flushed
    pub fn pending_count(&self) -> usize {
        self.inner.lock_accumulator().len()
    }

    /// Whether visibility observation is available
    pub fn observes_visibility(&self) -> bool {
        self.inner.observer.is_some()
    }

    /// Number of elements still waiting to become visible
    pub fn observed_count(&self) -> usize {
        self.inner
            .observer
            .as_ref()
            .map_or(0, VisibilityObserver::observed_count)
    }

    /// Current experience identifier
    pub fn experience_id(&self) -> String {
        self.inner.resolver.experience_id()
    }

    /// The document's last-modified date as `YYYY-MM-DD`
    pub fn get_last_modified(&self) -> Option<String> {
        get_last_modified(self.inner.resolver.document().as_ref())
    }
}

/// Builder for [`AssetTelemetryBatcher`]
pub struct AssetTelemetryBatcherBuilder {
    context: Arc<dyn ExperienceContextProvider>,
    document: Arc<dyn DocumentProvider>,
    sink: Option<Arc<dyn TelemetrySink>>,
    config: BatcherConfig,
    runtime: Option<Handle>,
}

impl AssetTelemetryBatcherBuilder {
    fn new(
        context: Arc<dyn ExperienceContextProvider>,
        document: Arc<dyn DocumentProvider>,
    ) -> Self {
        Self {
            context,
            document,
            sink: None,
            config: BatcherConfig::default(),
            runtime: None,
        }
    }

    /// Sink events are sent to; without one every send is a logged no-op
    pub fn sink(mut self, sink: Option<Arc<dyn TelemetrySink>>) -> Self {
        self.sink = sink;
        self
    }

    /// Apply debounce, threshold, observation support and dataset settings
    pub fn config(mut self, config: BatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the debounce window
    pub fn debounce(mut self, window: Duration) -> Self {
        self.config.debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Treat the host as lacking visibility observation
    pub fn without_visibility_observation(mut self) -> Self {
        self.config.observe_visibility = false;
        self
    }

    /// Runtime timers and sends are spawned on; defaults to the current one
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the batcher
    pub fn build(self) -> Result<AssetTelemetryBatcher> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| {
                Error::runtime(format!("Asset telemetry requires a tokio runtime: {e}"))
            })?,
        };

        let threshold = self.config.visibility_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "visibility threshold must be between 0.0 and 1.0, got {threshold}"
            )));
        }

        let observer = if self.config.observe_visibility {
            Some(VisibilityObserver::new(threshold))
        } else {
            info!("Visibility observation unsupported, asset views will not be tracked");
            None
        };

        Ok(AssetTelemetryBatcher {
            inner: Arc::new(BatcherInner {
                runtime,
                resolver: ExperienceResolver::new(self.context, self.document),
                sink: self.sink,
                dataset_id: self.config.dataset_id.clone(),
                observer,
                accumulator: Mutex::new(Vec::new()),
                flush_timer: Mutex::new(FlushTimer::new(self.config.debounce_duration())),
                clicks: DashMap::new(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experience::{PageDocument, ServedExperiences};
    use crate::sink::RecordingSink;
    use url::Url;

    fn batcher_with(sink: &Arc<RecordingSink>) -> AssetTelemetryBatcher {
        AssetTelemetryBatcher::builder(
            Arc::new(ServedExperiences::default()),
            Arc::new(PageDocument::new(
                Url::parse("https://x.test/page").unwrap(),
                Some("03/07/2024 10:00:00".to_string()),
            )),
        )
        .sink(Some(Arc::clone(sink) as Arc<dyn TelemetrySink>))
        .debounce(Duration::from_millis(100))
        .build()
        .unwrap()
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let result = AssetTelemetryBatcher::builder(
            Arc::new(ServedExperiences::default()),
            Arc::new(PageDocument::new(Url::parse("https://x.test/").unwrap(), None)),
        )
        .build();
        assert!(matches!(result, Err(Error::Runtime(_))));
    }

    #[tokio::test]
    async fn test_invalid_threshold_rejected() {
        let result = AssetTelemetryBatcher::builder(
            Arc::new(ServedExperiences::default()),
            Arc::new(PageDocument::new(Url::parse("https://x.test/").unwrap(), None)),
        )
        .config(BatcherConfig {
            visibility_threshold: 2.0,
            ..BatcherConfig::default()
        })
        .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_asset_arms_flush() {
        let sink = Arc::new(RecordingSink::new());
        let batcher = batcher_with(&sink);

        batcher.register_asset_observer(AssetElement::new(ElementId(1), "img", "/a.png?w=10"));
        assert_eq!(batcher.observed_count(), 1);
        assert!(!batcher.is_flush_pending());

        let recorded = batcher
            .handle_intersections(&[IntersectionEntry::new(ElementId(1), 0.9)])
            .unwrap();
        assert_eq!(recorded, 1);
        assert_eq!(batcher.pending_count(), 1);
        assert!(batcher.is_flush_pending());
        assert_eq!(batcher.observed_count(), 0);
    }

    #[tokio::test]
    async fn test_non_asset_elements_ignored() {
        let sink = Arc::new(RecordingSink::new());
        let batcher = batcher_with(&sink);

        batcher.register_asset_observer(AssetElement::new(ElementId(1), "div", "/a.png"));
        batcher.register_asset_click(
            AssetElement::new(ElementId(2), "span", "/b.png"),
            AnchorElement::new("https://x.test/b"),
        );

        assert_eq!(batcher.observed_count(), 0);
        assert_eq!(batcher.handle_click(ElementId(2)).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_observation_is_noop() {
        let sink = Arc::new(RecordingSink::new());
        let batcher = AssetTelemetryBatcher::builder(
            Arc::new(ServedExperiences::default()),
            Arc::new(PageDocument::new(Url::parse("https://x.test/").unwrap(), None)),
        )
        .sink(Some(Arc::clone(&sink) as Arc<dyn TelemetrySink>))
        .without_visibility_observation()
        .build()
        .unwrap();

        assert!(!batcher.observes_visibility());
        batcher.register_asset_observer(AssetElement::new(ElementId(1), "img", "/a.png"));
        let recorded = batcher
            .handle_intersections(&[IntersectionEntry::new(ElementId(1), 1.0)])
            .unwrap();
        assert_eq!(recorded, 0);
        assert_eq!(batcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_source_propagates_after_unobserve() {
        let sink = Arc::new(RecordingSink::new());
        let batcher = batcher_with(&sink);

        batcher.register_asset_observer(AssetElement::new(ElementId(1), "img", "https://[::1"));
        let result = batcher.handle_intersections(&[IntersectionEntry::new(ElementId(1), 1.0)]);

        assert!(matches!(result, Err(Error::InvalidAssetSource { .. })));
        assert_eq!(batcher.observed_count(), 0);
        assert_eq!(batcher.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_click_source_propagates() {
        let sink = Arc::new(RecordingSink::new());
        let batcher = batcher_with(&sink);

        batcher.register_asset_click(
            AssetElement::new(ElementId(1), "img", "https://[::1"),
            AnchorElement::new("https://x.test/a"),
        );
        let result = batcher.handle_click(ElementId(1));

        assert!(matches!(result, Err(Error::InvalidAssetSource { .. })));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_get_last_modified() {
        let sink = Arc::new(RecordingSink::new());
        let batcher = batcher_with(&sink);
        assert_eq!(batcher.get_last_modified().as_deref(), Some("2024-03-07"));
        assert_eq!(batcher.experience_id(), "https://x.test/page::2024-03-07");
    }
}
