mod content_options;
mod cpal_stream;
mod driver;
mod handle_guard;
mod session;

pub(crate) use handle_guard::HandleGuard;

#[cfg(test)]
pub(crate) use cpal_stream::SliceAssembler;

pub use {
    content_options::{AudioBitrateMode, ContentOptions, KBPS},
    cpal_stream::{CpalHandle, CpalStream},
    driver::{CaptureHandle, CaptureStream, DriverEvent},
    session::{CaptureSession, DEFAULT_SLICE_INTERVAL, SessionConfig, SessionState},
};
