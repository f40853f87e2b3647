//! Console rendition of the application's views.

use crate::recording_store::MemoryRecordingStore;

use snap_jot_core::{Navigator, RECORDING_DETAIL_ROUTE, RecordingId};

use tracing::{info, warn};

/// Prints the requested view to stdout.
#[derive(Debug, Clone)]
pub struct ConsoleNavigator {
    store: MemoryRecordingStore,
}

impl ConsoleNavigator {
    /// Navigator that renders recordings from `store`.
    pub fn new(store: MemoryRecordingStore) -> Self {
        Self { store }
    }

    /// Text of the detail view for one recording, if it is stored.
    pub fn render_detail(&self, recording_id: RecordingId) -> Option<String> {
        let recording = self.store.get(recording_id)?;
        let metadata = &recording.metadata;

        let mut out = format!(
            "recording {recording_id}\n  {} segments, {} bytes, {:.1}s, {}",
            metadata.segment_count,
            metadata.total_bytes,
            metadata.total_watch_time.as_secs_f64(),
            metadata.mime_type,
        );
        for (index, segment) in recording.segments.iter().enumerate() {
            let duration = segment
                .duration()
                .map(|d| format!("{:.1}s", d.as_secs_f64()))
                .unwrap_or_else(|| "?".to_string());
            out.push_str(&format!("\n  #{index}: {} bytes, {duration}", segment.len()));
        }

        Some(out)
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&mut self, route: &str, recording_id: RecordingId) {
        if route != RECORDING_DETAIL_ROUTE {
            warn!(route, recording_id = %recording_id, "Unknown route");
            return;
        }

        match self.render_detail(recording_id) {
            Some(detail) => {
                info!(recording_id = %recording_id, "Showing recording");
                println!("{detail}");
            }
            None => warn!(recording_id = %recording_id, "Recording not in store"),
        }
    }
}
