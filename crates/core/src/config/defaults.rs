//! Default values and functions for configuration

// Default constants
/// Dataset the content events are recorded into unless configured otherwise
pub const DEFAULT_DATASET_ID: &str = "65b25691b366902c6951cf0b";
pub(crate) const DEFAULT_SINK_PROVIDER: &str = "log";

pub(crate) fn default_debounce_ms() -> u64 {
    5000
}

pub(crate) fn default_visibility_threshold() -> f64 {
    0.5
}

pub(crate) fn default_observe_visibility() -> bool {
    true
}

pub(crate) fn default_dataset_id() -> String {
    DEFAULT_DATASET_ID.to_string()
}

pub(crate) fn default_sink_provider() -> String {
    DEFAULT_SINK_PROVIDER.to_string()
}

pub(crate) fn default_sink_timeout_secs() -> u64 {
    10
}
