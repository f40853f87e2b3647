use crate::Segment;

/// Lifecycle notifications emitted by a [`CaptureSession`](crate::CaptureSession).
///
/// Ordering contract: exactly one `on_start`, then any number of
/// `on_next_chunk` / `on_pause` / `on_resume`, then exactly one `on_stop`
/// after the hardware handle has been released. Implementations must not
/// call back into the session.
pub trait RecorderCallbacks {
    /// Capture began.
    fn on_start(&mut self);

    /// Capture ended and the hardware has been released.
    fn on_stop(&mut self);

    /// Capture was suspended.
    fn on_pause(&mut self);

    /// Capture continued after a pause.
    fn on_resume(&mut self);

    /// The next segment, in production order.
    fn on_next_chunk(&mut self, segment: Segment);
}
