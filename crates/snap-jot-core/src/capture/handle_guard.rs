use crate::{CaptureError, CaptureHandle, CoreResult, DriverEvent};

use std::{iter, panic::Location};

use error_location::ErrorLocation;
use tracing::{debug, warn};

/// RAII guard that guarantees a capture handle is stopped exactly once.
///
/// [`release`](Self::release) is the normal path. If the guard is dropped
/// while still holding a handle (an error unwound the session, or the
/// session itself was dropped mid-recording), `Drop` detaches and stops it
/// with best-effort semantics.
pub(crate) struct HandleGuard<H: CaptureHandle> {
    handle: Option<H>,
    generation: u32,
}

impl<H: CaptureHandle> HandleGuard<H> {
    pub(crate) fn new(handle: H, generation: u32) -> Self {
        Self {
            handle: Some(handle),
            generation,
        }
    }

    /// Sub-session number, starting at 1.
    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    #[track_caller]
    pub(crate) fn handle_mut(&mut self) -> CoreResult<&mut H> {
        self.handle.as_mut().ok_or_else(|| CaptureError::DeviceError {
            reason: "Capture handle already released".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Take the next pending event, or `None` when released.
    pub(crate) fn next_event(&mut self) -> Option<DriverEvent> {
        self.handle.as_mut().and_then(|handle| handle.next_event())
    }

    /// Flush the handle, then take every event it still holds, in order.
    ///
    /// A flush failure is logged and whatever is already queued is still
    /// returned.
    pub(crate) fn drain_tail(&mut self) -> Vec<DriverEvent> {
        let Some(handle) = self.handle.as_mut() else {
            return Vec::new();
        };

        if let Err(e) = handle.flush() {
            warn!(generation = self.generation, error = ?e, "Capture handle failed to flush");
        }

        let tail: Vec<DriverEvent> = iter::from_fn(|| handle.next_event()).collect();
        if !tail.is_empty() {
            debug!(
                generation = self.generation,
                events = tail.len(),
                "Drained capture handle tail"
            );
        }
        tail
    }

    /// Detach, stop and drop the handle. Later calls are no-ops.
    pub(crate) fn release(&mut self) -> CoreResult<()> {
        match self.handle.take() {
            Some(mut handle) => {
                handle.detach();
                let result = handle.stop();
                drop(handle);
                debug!(generation = self.generation, "Capture handle released");
                result
            }
            None => Ok(()),
        }
    }
}

impl<H: CaptureHandle> Drop for HandleGuard<H> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!(
                generation = self.generation,
                "Capture handle dropped while live, stopping"
            );
            let _ = self.release();
        }
    }
}
