use crate::{Segment, SessionState};

use std::time::Duration;

/// Aggregate progress of one recording, owned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderState {
    runtime_state: SessionState,
    total_watch_time: Duration,
    chunk_list: Vec<Segment>,
    total_recorded_bytes: u64,
}

impl RecorderState {
    /// Fresh state: not started, nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror of the session state.
    pub fn runtime_state(&self) -> SessionState {
        self.runtime_state
    }

    /// Sum of the known durations of delivered segments.
    pub fn total_watch_time(&self) -> Duration {
        self.total_watch_time
    }

    /// Delivered segments in delivery order.
    pub fn chunk_list(&self) -> &[Segment] {
        &self.chunk_list
    }

    /// Sum of delivered segment sizes.
    pub fn total_recorded_bytes(&self) -> u64 {
        self.total_recorded_bytes
    }

    pub(crate) fn set_runtime_state(&mut self, state: SessionState) {
        self.runtime_state = state;
    }

    pub(crate) fn push_segment(&mut self, segment: Segment) {
        self.total_recorded_bytes += segment.len() as u64;
        if let Some(duration) = segment.duration() {
            self.total_watch_time += duration;
        }
        self.chunk_list.push(segment);
    }
}
