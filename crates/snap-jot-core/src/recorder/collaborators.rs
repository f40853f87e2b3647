//! Boundary traits for what happens to a finished recording.

use crate::{CoreResult, Segment};

use std::{fmt, time::Duration};

use uuid::Uuid;

/// Route of the detail view opened after a recording is stored.
pub const RECORDING_DETAIL_ROUTE: &str = "playbook.a-recording";

/// Identifier assigned by a [`RecordingStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordingId(Uuid);

impl RecordingId {
    /// A new random identifier.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for RecordingId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Summary stored alongside the segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingMetadata {
    /// Content type reported by the capture configuration.
    pub mime_type: String,
    /// Number of segments.
    pub segment_count: usize,
    /// Sum of segment sizes.
    pub total_bytes: u64,
    /// Sum of known segment durations.
    pub total_watch_time: Duration,
}

/// Accepts a finished, ordered segment list.
pub trait RecordingStore {
    /// Persist the segments and return their identifier.
    ///
    /// # Errors
    ///
    /// Implementations report failures as `StoreFailed`.
    fn insert(
        &mut self,
        segments: &[Segment],
        metadata: &RecordingMetadata,
    ) -> CoreResult<RecordingId>;
}

/// Opens application views. Fire-and-forget.
pub trait Navigator {
    /// Show `route` for the given recording.
    fn navigate(&mut self, route: &str, recording_id: RecordingId);
}
