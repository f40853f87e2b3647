use crate::{RawSlice, Segment, chunking::ChunkAction};

/// Pass-through policy: segment boundaries equal hardware slice boundaries.
#[derive(Debug, Default)]
pub(crate) struct ContinuousChunker;

impl ContinuousChunker {
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn accept(&mut self, slice: RawSlice) -> ChunkAction {
        if slice.is_empty() {
            return ChunkAction::Discarded;
        }
        ChunkAction::Deliver(Segment::from(slice))
    }
}
