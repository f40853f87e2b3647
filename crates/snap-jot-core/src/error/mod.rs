use crate::SessionState;

use error_location::ErrorLocation;
use thiserror::Error;

/// Capture engine errors with source location tracking.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// A constructor argument was missing or out of range.
    #[error("Invalid argument: {reason} {location}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A lifecycle operation was called from a state that does not allow it.
    #[error("Cannot {action} while {state} {location}")]
    InvalidState {
        /// The rejected operation.
        action: &'static str,
        /// The session state at the time of the call.
        state: SessionState,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No audio input device found.
    #[error("No input device found {location}")]
    NoInputDevice {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Capture device operation failed.
    #[error("Capture device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recording store rejected the finished segment list.
    #[error("Recording store failed: {reason} {location}")]
    StoreFailed {
        /// Description of the store failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`CaptureError`].
pub type Result<T> = std::result::Result<T, CaptureError>;
