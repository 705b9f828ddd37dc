#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Asset view and click telemetry
//!
//! This crate batches asset telemetry for an experience-platform SDK:
//! - One-shot visibility observation of image and video elements
//! - Debounced, batched view events with forced flushes on page hide
//! - Immediate, unbatched click events
//! - Experience identifiers derived from served campaign/experiment/audience overrides
//!
//! # Example
//!
//! ```no_run
//! use assetpulse_telemetry::{
//!     AssetElement, AssetTelemetryBatcher, ElementId, IntersectionEntry, LifecycleEvent,
//!     PageDocument, ServedExperiences,
//! };
//! use std::sync::Arc;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let document = PageDocument::new(Url::parse("https://www.example.test/")?, None);
//! let batcher = AssetTelemetryBatcher::builder(
//!     Arc::new(ServedExperiences::default()),
//!     Arc::new(document),
//! )
//! .build()?;
//!
//! batcher.register_asset_observer(AssetElement::new(ElementId(1), "img", "/hero.png"));
//! batcher.handle_intersections(&[IntersectionEntry::new(ElementId(1), 0.75)])?;
//!
//! // Page is going away: flush without waiting for the debounce window
//! batcher.handle_lifecycle_event(LifecycleEvent::PageHide);
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod batcher;
pub mod debouncer;
pub mod events;
pub mod experience;
pub mod observer;
pub mod sink;

pub use asset::{resolve_asset_source, AnchorElement, AssetElement, AssetKind, ElementId};
pub use batcher::{AssetTelemetryBatcher, AssetTelemetryBatcherBuilder, LifecycleEvent};
pub use debouncer::FlushTimer;
pub use events::{ContentEvent, ContentEventType, SendEventOptions};
pub use experience::{
    format_last_modified, get_last_modified, DocumentProvider, ExperienceContextProvider,
    ExperienceResolver, PageDocument, ServedExperiences, SharedExperienceContext,
};
pub use observer::{IntersectionEntry, VisibilityObserver};
pub use sink::{create_telemetry_sink, RecordingSink, TelemetrySink};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::asset::{AnchorElement, AssetElement, ElementId};
    pub use crate::batcher::{AssetTelemetryBatcher, LifecycleEvent};
    pub use crate::observer::IntersectionEntry;
}
