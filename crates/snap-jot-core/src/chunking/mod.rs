//! Policies that turn raw driver slices into deliverable segments.

mod continuous;
mod grouped;

pub(crate) use {continuous::ContinuousChunker, grouped::GroupedChunker};

#[cfg(test)]
pub(crate) use grouped::GroupPhase;

use crate::{RawSlice, Segment};

use std::num::NonZeroUsize;

/// Default number of slices assembled into one grouped segment.
pub const DEFAULT_SLICES_PER_SEGMENT: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Chunking policy, fixed when a session is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkingPolicy {
    /// Every non-empty slice is delivered immediately as its own segment.
    #[default]
    Continuous,
    /// Slices are collected and delivered `slices_per_segment` at a time,
    /// restarting the hardware sub-session after each full segment.
    Grouped {
        /// Number of non-empty slices per full segment.
        slices_per_segment: NonZeroUsize,
    },
}

impl ChunkingPolicy {
    /// Grouped policy with [`DEFAULT_SLICES_PER_SEGMENT`].
    pub fn grouped() -> Self {
        Self::Grouped {
            slices_per_segment: DEFAULT_SLICES_PER_SEGMENT,
        }
    }

    /// Short name for logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Grouped { .. } => "grouped",
        }
    }
}

/// What the session should do with one slice.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ChunkAction {
    /// Zero-size slice, dropped.
    Discarded,
    /// Held by the strategy, nothing to deliver yet.
    Buffered,
    /// Deliver the segment.
    Deliver(Segment),
    /// Deliver the segment, then restart the hardware sub-session.
    Rotate(Segment),
}

/// The active chunking strategy of a session.
#[derive(Debug)]
pub(crate) enum ChunkingStrategy {
    Continuous(ContinuousChunker),
    Grouped(GroupedChunker),
}

impl ChunkingStrategy {
    pub(crate) fn new(policy: ChunkingPolicy) -> Self {
        match policy {
            ChunkingPolicy::Continuous => Self::Continuous(ContinuousChunker::new()),
            ChunkingPolicy::Grouped { slices_per_segment } => {
                Self::Grouped(GroupedChunker::new(slices_per_segment))
            }
        }
    }

    /// Called whenever a hardware sub-session starts.
    pub(crate) fn begin(&mut self) {
        if let Self::Grouped(grouped) = self {
            grouped.start();
        }
    }

    pub(crate) fn accept(&mut self, slice: RawSlice) -> ChunkAction {
        match self {
            Self::Continuous(continuous) => continuous.accept(slice),
            Self::Grouped(grouped) => grouped.accept(slice),
        }
    }

    /// Emit whatever is held back. The continuous policy never holds data.
    pub(crate) fn flush(&mut self) -> Option<Segment> {
        match self {
            Self::Continuous(_) => None,
            Self::Grouped(grouped) => grouped.flush(),
        }
    }

    /// Final flush on stop; leaves the strategy idle.
    pub(crate) fn finish(&mut self) -> Option<Segment> {
        let last = self.flush();
        if let Self::Grouped(grouped) = self {
            grouped.reset();
        }
        last
    }
}
