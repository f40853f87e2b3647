//! In-memory recording store.

use snap_jot_core::{
    CaptureError, CoreResult, RecordingId, RecordingMetadata, RecordingStore, Segment,
};

use std::{
    collections::HashMap,
    panic::Location,
    sync::{Arc, Mutex},
};

use error_location::ErrorLocation;
use tracing::{info, instrument};

/// A stored recording: its ordered segments and summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecording {
    /// Segments in production order.
    pub segments: Vec<Segment>,
    /// Summary written at insert time.
    pub metadata: RecordingMetadata,
}

/// Keeps finished recordings in process memory.
///
/// Clones share the same storage, so the store handed to a recorder and
/// the one read by the console see the same recordings.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordingStore {
    recordings: Arc<Mutex<HashMap<RecordingId, StoredRecording>>>,
    order: Arc<Mutex<Vec<RecordingId>>>,
}

impl MemoryRecordingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up one recording.
    pub fn get(&self, recording_id: RecordingId) -> Option<StoredRecording> {
        self.recordings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&recording_id)
            .cloned()
    }

    /// Ids and metadata of every recording, oldest first.
    pub fn list(&self) -> Vec<(RecordingId, RecordingMetadata)> {
        let recordings = self.recordings.lock().unwrap_or_else(|e| e.into_inner());
        self.order
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter_map(|id| recordings.get(id).map(|r| (*id, r.metadata.clone())))
            .collect()
    }

    /// Number of stored recordings.
    pub fn len(&self) -> usize {
        self.recordings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordingStore for MemoryRecordingStore {
    #[track_caller]
    #[instrument(skip_all, fields(segments = segments.len()))]
    fn insert(
        &mut self,
        segments: &[Segment],
        metadata: &RecordingMetadata,
    ) -> CoreResult<RecordingId> {
        let recording_id = RecordingId::new_v4();

        let mut recordings = self
            .recordings
            .lock()
            .map_err(|_| CaptureError::StoreFailed {
                reason: "Failed to lock recordings".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let mut order = self.order.lock().map_err(|_| CaptureError::StoreFailed {
            reason: "Failed to lock recording order".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        recordings.insert(
            recording_id,
            StoredRecording {
                segments: segments.to_vec(),
                metadata: metadata.clone(),
            },
        );
        order.push(recording_id);

        info!(
            recording_id = %recording_id,
            total_bytes = metadata.total_bytes,
            "Recording stored"
        );

        Ok(recording_id)
    }
}
