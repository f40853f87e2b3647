//! Hardware seam between the capture session and a concrete driver.
//!
//! A [`CaptureStream`] is the live media source (a microphone, a screen
//! share). It hands out [`CaptureHandle`]s, each one a hardware capture
//! sub-session that produces [`DriverEvent`]s on its own schedule. The
//! session drains those events synchronously through
//! [`CaptureHandle::next_event`], so everything above this seam is a plain
//! state machine that can be tested without real hardware.

use crate::{ContentOptions, CoreResult, RawSlice};

use std::time::Duration;

/// Notifications produced by a capture handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// The handle began producing data.
    Started,
    /// One slice became available.
    Slice(RawSlice),
    /// The hardware stopped on its own (device lost, track ended).
    Stopped,
}

/// A live media stream that can open capture handles.
pub trait CaptureStream {
    /// Handle type produced by [`open`](Self::open).
    type Handle: CaptureHandle;

    /// Open a new, not yet started, capture handle over this stream.
    fn open(&mut self, options: &ContentOptions) -> CoreResult<Self::Handle>;

    /// Terminate every underlying track.
    ///
    /// Must be idempotent and must not wait for any handle's stop event.
    fn stop_tracks(&mut self);
}

/// One hardware capture sub-session.
pub trait CaptureHandle {
    /// Begin capturing, emitting one slice per `slice_interval`.
    fn start(&mut self, slice_interval: Duration) -> CoreResult<()>;

    /// Suspend capture. No slices are produced until [`resume`](Self::resume).
    fn pause(&mut self) -> CoreResult<()>;

    /// Continue a paused capture.
    fn resume(&mut self) -> CoreResult<()>;

    /// Emit any partially captured data as a final [`DriverEvent::Slice`]
    /// and stop producing new slices.
    ///
    /// Called before the handle is paused, swapped or stopped, so the tail
    /// can still be drained with [`next_event`](Self::next_event).
    fn flush(&mut self) -> CoreResult<()>;

    /// Take the next pending event, if any, without blocking.
    ///
    /// Returns `None` once the handle is detached.
    fn next_event(&mut self) -> Option<DriverEvent>;

    /// Disconnect the delivery hook. Events produced afterwards are dropped.
    fn detach(&mut self);

    /// Stop the hardware capture.
    fn stop(&mut self) -> CoreResult<()>;
}
