mod capture_config;
#[allow(clippy::module_inception)]
mod config;
mod content_config;

pub(crate) use {
    capture_config::{CaptureConfig, PolicyKind},
    config::Config,
    content_config::ContentConfig,
};

#[cfg(test)]
pub(crate) use content_config::BitrateModeKind;

pub(crate) const DEFAULT_SLICE_INTERVAL_SECS: f64 = 1.0;
pub(crate) const DEFAULT_SLICES_PER_SEGMENT: usize = 10;

pub(crate) fn default_slice_interval_secs() -> f64 {
    DEFAULT_SLICE_INTERVAL_SECS
}

pub(crate) fn default_slices_per_segment() -> usize {
    DEFAULT_SLICES_PER_SEGMENT
}
