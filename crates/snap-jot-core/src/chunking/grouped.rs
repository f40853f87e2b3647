use crate::{RawSlice, Segment, chunking::ChunkAction};

use std::{mem, num::NonZeroUsize};

use tracing::debug;

/// Sub-state of the grouped policy.
#[derive(Debug)]
pub(crate) enum GroupPhase {
    /// No hardware sub-session is feeding the buffer.
    Idle,
    /// A sub-session is running and its slices are being collected.
    Accumulating {
        /// Sub-session number, starting at 1.
        sub_session: u32,
        /// Non-empty slices collected so far, in arrival order.
        slices: Vec<RawSlice>,
    },
}

/// Accumulates slices and emits one segment per `threshold` slices.
///
/// Reaching the threshold asks the session to rotate to a fresh hardware
/// sub-session, so each full segment is an independently finishable asset.
/// Memory held by any one in-flight segment stays bounded by the threshold.
#[derive(Debug)]
pub(crate) struct GroupedChunker {
    threshold: NonZeroUsize,
    phase: GroupPhase,
    sub_sessions: u32,
}

impl GroupedChunker {
    pub(crate) fn new(threshold: NonZeroUsize) -> Self {
        Self {
            threshold,
            phase: GroupPhase::Idle,
            sub_sessions: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> &GroupPhase {
        &self.phase
    }

    /// Number of sub-sessions started so far.
    #[cfg(test)]
    pub(crate) fn sub_sessions(&self) -> u32 {
        self.sub_sessions
    }

    /// Enter `Accumulating` for a new sub-session with an empty buffer.
    pub(crate) fn start(&mut self) {
        self.sub_sessions += 1;
        self.phase = GroupPhase::Accumulating {
            sub_session: self.sub_sessions,
            slices: Vec::with_capacity(self.threshold.get()),
        };
        debug!(sub_session = self.sub_sessions, "Grouped sub-session started");
    }

    pub(crate) fn accept(&mut self, slice: RawSlice) -> ChunkAction {
        if slice.is_empty() {
            return ChunkAction::Discarded;
        }

        match self.push(slice) {
            Some(segment) => ChunkAction::Rotate(segment),
            None => ChunkAction::Buffered,
        }
    }

    /// Buffer one non-empty slice; returns the assembled segment once the
    /// threshold is reached.
    pub(crate) fn push(&mut self, slice: RawSlice) -> Option<Segment> {
        if let GroupPhase::Idle = self.phase {
            // Slices only arrive from a running sub-session.
            self.start();
        }

        let GroupPhase::Accumulating { slices, .. } = &mut self.phase else {
            return None;
        };
        slices.push(slice);

        if slices.len() >= self.threshold.get() {
            self.flush()
        } else {
            None
        }
    }

    /// Assemble and clear whatever is buffered. An empty buffer yields
    /// nothing; the phase stays `Accumulating`.
    pub(crate) fn flush(&mut self) -> Option<Segment> {
        let GroupPhase::Accumulating {
            sub_session,
            slices,
        } = &mut self.phase
        else {
            return None;
        };

        if slices.is_empty() {
            return None;
        }

        let taken = mem::replace(slices, Vec::with_capacity(self.threshold.get()));
        let slice_count = taken.len();
        let segment = Segment::from_slices(taken);

        debug!(
            sub_session = *sub_session,
            slice_count,
            bytes = segment.len(),
            "Grouped buffer flushed"
        );

        Some(segment)
    }

    /// Drop the sub-session; any buffered slices are discarded.
    pub(crate) fn reset(&mut self) {
        self.phase = GroupPhase::Idle;
    }

    /// Slices currently held in the buffer.
    #[cfg(test)]
    pub(crate) fn buffered(&self) -> usize {
        match &self.phase {
            GroupPhase::Idle => 0,
            GroupPhase::Accumulating { slices, .. } => slices.len(),
        }
    }
}
