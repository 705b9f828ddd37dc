//! Experience identifier resolution
//!
//! An experience identifier names the content variant a visitor was served:
//! the URL of the served experience joined with the document's last-modified
//! date. It is recomputed for every event since the page may have navigated
//! or been re-personalised since the asset was observed.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;
use url::Url;

/// Separator between the experience URL and the last-modified date
pub const EXPERIENCE_ID_SEPARATOR: &str = "::";

/// Suffixes removed from a served experience path, in order
const INDEX_PLAIN_HTML: &str = "index.plain.html";
const PLAIN_HTML: &str = ".plain.html";

/// Source of the active campaign/experiment/audience override
pub trait ExperienceContextProvider: Send + Sync {
    /// Path of the experience currently being served, if an override is active
    fn served_experience(&self) -> Option<String>;
}

/// Source of the current page's URL and last-modified timestamp
pub trait DocumentProvider: Send + Sync {
    /// URL of the current page
    fn page_url(&self) -> Url;

    /// Raw last-modified value, as the host reports it
    fn last_modified(&self) -> Option<String>;
}

/// Served experience paths for each override kind
///
/// Campaigns take priority over experiments, which take priority over
/// audiences. Empty paths count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedExperiences {
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default)]
    pub experiment: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
}

impl ExperienceContextProvider for ServedExperiences {
    fn served_experience(&self) -> Option<String> {
        [&self.campaign, &self.experiment, &self.audience]
            .into_iter()
            .filter_map(|path| path.as_deref())
            .find(|path| !path.is_empty())
            .map(str::to_string)
    }
}

/// Experience context that the host can update while the page is live
#[derive(Debug, Default)]
pub struct SharedExperienceContext {
    inner: RwLock<ServedExperiences>,
}

impl SharedExperienceContext {
    pub fn new(experiences: ServedExperiences) -> Self {
        Self {
            inner: RwLock::new(experiences),
        }
    }

    /// Replace the active overrides
    pub fn update(&self, experiences: ServedExperiences) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = experiences;
    }
}

impl ExperienceContextProvider for SharedExperienceContext {
    fn served_experience(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .served_experience()
    }
}

/// The current document as last reported by the host
#[derive(Debug)]
pub struct PageDocument {
    url: RwLock<Url>,
    last_modified: RwLock<Option<String>>,
}

impl PageDocument {
    pub fn new(url: Url, last_modified: Option<String>) -> Self {
        Self {
            url: RwLock::new(url),
            last_modified: RwLock::new(last_modified),
        }
    }

    /// Record a navigation to a new document
    pub fn navigate(&self, url: Url, last_modified: Option<String>) {
        *self.url.write().unwrap_or_else(PoisonError::into_inner) = url;
        *self
            .last_modified
            .write()
            .unwrap_or_else(PoisonError::into_inner) = last_modified;
    }
}

impl DocumentProvider for PageDocument {
    fn page_url(&self) -> Url {
        self.url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn last_modified(&self) -> Option<String> {
        self.last_modified
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Format the document's last-modified timestamp as `YYYY-MM-DD`
pub fn get_last_modified(document: &dyn DocumentProvider) -> Option<String> {
    let raw = document.last_modified()?;
    let formatted = format_last_modified(&raw);
    if formatted.is_none() {
        debug!("Ignoring unparseable last-modified value: {raw:?}");
    }
    formatted
}

/// Parse a last-modified value and format its calendar date as `YYYY-MM-DD`
///
/// Accepts the browser's `MM/DD/YYYY HH:MM:SS`, a bare `MM/DD/YYYY`, RFC 2822,
/// RFC 3339 and `YYYY-MM-DD`. Timestamps carrying an offset are converted to
/// local time first.
pub fn format_last_modified(raw: &str) -> Option<String> {
    parse_last_modified(raw.trim()).map(|date| date.format("%Y-%m-%d").to_string())
}

fn parse_last_modified(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%m/%d/%Y %H:%M:%S") {
        return Some(datetime.date());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc2822(raw) {
        return Some(datetime.with_timezone(&Local).date_naive());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.with_timezone(&Local).date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Strip the plain-HTML suffixes from a served experience path
///
/// Only a removed `index.plain.html` also drops the directory slash it leaves
/// behind; other paths keep their trailing slash.
fn normalize_experience_path(path: &str) -> &str {
    if let Some(dir) = path.strip_suffix(INDEX_PLAIN_HTML) {
        if dir.len() > 1 {
            return dir.strip_suffix('/').unwrap_or(dir);
        }
        return dir;
    }
    path.strip_suffix(PLAIN_HTML).unwrap_or(path)
}

/// Computes experience identifiers from the injected host collaborators
#[derive(Clone)]
pub struct ExperienceResolver {
    context: Arc<dyn ExperienceContextProvider>,
    document: Arc<dyn DocumentProvider>,
}

impl ExperienceResolver {
    pub fn new(
        context: Arc<dyn ExperienceContextProvider>,
        document: Arc<dyn DocumentProvider>,
    ) -> Self {
        Self { context, document }
    }

    /// The document collaborator, used to resolve relative asset sources
    pub fn document(&self) -> &Arc<dyn DocumentProvider> {
        &self.document
    }

    /// URL of the served override experience, if one is active
    ///
    /// The override path replaces the page URL's path and the query is dropped.
    pub fn served_experience_url(&self) -> Option<Url> {
        let served = self.context.served_experience()?;
        let mut url = self.document.page_url();
        url.set_path(normalize_experience_path(&served));
        url.set_query(None);
        Some(url)
    }

    /// URL identifying the experience: the override if any, else the page
    pub fn experience_url(&self) -> Url {
        self.served_experience_url()
            .unwrap_or_else(|| self.document.page_url())
    }

    /// Current experience identifier, `<experience url>::<YYYY-MM-DD>`
    ///
    /// The date part is empty when the last-modified value is unknown.
    pub fn experience_id(&self) -> String {
        let last_modified = get_last_modified(self.document.as_ref()).unwrap_or_default();
        format!(
            "{}{EXPERIENCE_ID_SEPARATOR}{last_modified}",
            self.experience_url()
        )
    }
}
