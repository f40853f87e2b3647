use std::time::Duration;

/// One driver-delivered fragment of captured bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSlice {
    /// Encoded bytes exactly as the driver produced them.
    pub data: Vec<u8>,
    /// Wall-clock span covered by the slice, when the driver knows it.
    pub duration: Option<Duration>,
}

impl RawSlice {
    /// Create a slice from driver bytes.
    pub fn new(data: Vec<u8>, duration: Option<Duration>) -> Self {
        Self { data, duration }
    }

    /// Size of the slice in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Zero-size slices carry nothing and are never delivered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A deliverable unit handed to the consumer.
///
/// Either a single raw slice (continuous policy) or the concatenation of
/// several (grouped policy). Bytes are opaque: nothing here decodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    data: Vec<u8>,
    duration: Option<Duration>,
}

impl Segment {
    /// Create a segment from an already assembled payload.
    pub fn new(data: Vec<u8>, duration: Option<Duration>) -> Self {
        Self { data, duration }
    }

    /// Concatenate slices in order.
    ///
    /// The duration is the sum of the slice durations, or `None` if any slice
    /// has an unknown duration.
    pub fn from_slices(slices: Vec<RawSlice>) -> Self {
        let total = slices.iter().map(RawSlice::len).sum();
        let mut data = Vec::with_capacity(total);
        let mut duration = Some(Duration::ZERO);

        for slice in slices {
            data.extend_from_slice(&slice.data);
            duration = match (duration, slice.duration) {
                (Some(acc), Some(d)) => Some(acc + d),
                _ => None,
            };
        }

        Self { data, duration }
    }

    /// Payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Covered duration, if known.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Consume the segment and return its payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl From<RawSlice> for Segment {
    fn from(slice: RawSlice) -> Self {
        Self {
            data: slice.data,
            duration: slice.duration,
        }
    }
}
