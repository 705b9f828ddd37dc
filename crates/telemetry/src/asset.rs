//! Host element model and asset source resolution

use assetpulse_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Host-assigned identity of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kinds of elements that carry trackable assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    /// Classify an element by tag name, case-insensitively
    pub fn from_tag_name(tag_name: &str) -> Option<Self> {
        if tag_name.eq_ignore_ascii_case("img") {
            Some(Self::Image)
        } else if tag_name.eq_ignore_ascii_case("video") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Snapshot of an element as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetElement {
    pub id: ElementId,
    pub tag_name: String,
    /// Source the browser actually picked (`currentSrc`)
    #[serde(default)]
    pub current_src: Option<String>,
    /// Resolved `src` property
    #[serde(default)]
    pub src: Option<String>,
    /// Raw `src` attribute
    #[serde(default)]
    pub src_attribute: Option<String>,
}

impl AssetElement {
    /// Create an element with only a `src` set
    pub fn new(id: ElementId, tag_name: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id,
            tag_name: tag_name.into(),
            current_src: None,
            src: Some(src.into()),
            src_attribute: None,
        }
    }

    /// The asset kind, or `None` for elements that are not images or videos
    pub fn asset_kind(&self) -> Option<AssetKind> {
        AssetKind::from_tag_name(&self.tag_name)
    }

    /// First non-empty of `currentSrc`, `src` and the `src` attribute
    pub fn source_value(&self) -> Option<&str> {
        [&self.current_src, &self.src, &self.src_attribute]
            .into_iter()
            .filter_map(|value| value.as_deref())
            .find(|value| !value.is_empty())
    }
}

/// Link enclosing a clickable asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorElement {
    pub href: String,
}

impl AnchorElement {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// Resolve an asset's source into the identifier used in telemetry
///
/// Relative sources resolve against `page_url`. The query string is dropped.
pub fn resolve_asset_source(element: &AssetElement, page_url: &Url) -> Result<String> {
    let value = element.source_value().ok_or_else(|| {
        Error::invalid_asset_source("", format!("element {} has no source", element.id))
    })?;

    let mut url = page_url
        .join(value)
        .map_err(|e| Error::invalid_asset_source(value, e.to_string()))?;
    url.set_query(None);

    Ok(url.into())
}
