use crate::config::{default_slice_interval_secs, default_slices_per_segment};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Chunking policy as written in the config file and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// One segment per driver slice.
    #[default]
    Continuous,
    /// One segment per `slices_per_segment` slices.
    Grouped,
}

/// Capture timing and chunking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Seconds between two driver slices.
    #[serde(default = "default_slice_interval_secs")]
    pub slice_interval_secs: f64,

    /// Chunking policy.
    #[serde(default)]
    pub policy: PolicyKind,

    /// Slices per segment for the grouped policy.
    #[serde(default = "default_slices_per_segment")]
    pub slices_per_segment: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            slice_interval_secs: default_slice_interval_secs(),
            policy: PolicyKind::default(),
            slices_per_segment: default_slices_per_segment(),
        }
    }
}
