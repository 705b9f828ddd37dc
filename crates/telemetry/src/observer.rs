//! One-shot visibility observation of asset elements

use crate::asset::{AssetElement, ElementId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Visibility change reported by the host for one element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionEntry {
    pub target: ElementId,
    /// Fraction of the element inside the viewport, `0.0..=1.0`
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    pub fn new(target: ElementId, intersection_ratio: f64) -> Self {
        Self {
            target,
            intersection_ratio,
        }
    }
}

/// Tracks elements waiting to become visible
///
/// An element is removed the first time it crosses the threshold and is
/// never reported again.
pub struct VisibilityObserver {
    threshold: f64,
    observed: DashMap<ElementId, AssetElement>,
}

impl VisibilityObserver {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            observed: DashMap::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Start observing an element; re-observing replaces the stored snapshot
    pub fn observe(&self, element: AssetElement) {
        debug!("Observing asset element {}", element.id);
        self.observed.insert(element.id, element);
    }

    /// Stop observing an element
    pub fn unobserve(&self, id: ElementId) -> Option<AssetElement> {
        self.observed.remove(&id).map(|(_, element)| element)
    }

    pub fn is_observed(&self, id: ElementId) -> bool {
        self.observed.contains_key(&id)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// Consume an entry, returning the element if it just became visible
    ///
    /// The element is unobserved as part of the same map operation, so it can
    /// be returned at most once.
    pub fn take_visible(&self, entry: &IntersectionEntry) -> Option<AssetElement> {
        if !(entry.intersection_ratio >= self.threshold && entry.intersection_ratio > 0.0) {
            trace!(
                "Entry for {} below threshold ({} < {})",
                entry.target,
                entry.intersection_ratio,
                self.threshold
            );
            return None;
        }

        let element = self.unobserve(entry.target);
        if element.is_none() {
            trace!("Ignoring entry for unobserved element {}", entry.target);
        }
        element
    }
}
