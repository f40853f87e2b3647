//! Snap-jot Core Library
//!
//! Chunked capture engine: wraps a live media stream, cuts it into ordered
//! segments, and drives a pause/resume/stop lifecycle that always releases
//! the capture hardware exactly once.
//!
//! # Example
//!
//! ```no_run
//! use snap_jot_core::{
//!     CoreResult, CpalStream, Navigator, RecorderController, RecordingId, RecordingMetadata,
//!     RecordingStore, Segment, SessionConfig,
//! };
//!
//! use std::{thread::sleep, time::Duration};
//!
//! struct Discard;
//!
//! impl RecordingStore for Discard {
//!     fn insert(&mut self, _: &[Segment], _: &RecordingMetadata) -> CoreResult<RecordingId> {
//!         Ok(RecordingId::new_v4())
//!     }
//! }
//!
//! struct Print;
//!
//! impl Navigator for Print {
//!     fn navigate(&mut self, route: &str, id: RecordingId) {
//!         println!("{route} {id}");
//!     }
//! }
//!
//! fn main() -> CoreResult<()> {
//!     let stream = CpalStream::new()?;
//!     let mut recorder =
//!         RecorderController::new(Some(stream), SessionConfig::default(), Discard, Print)?;
//!
//!     recorder.start()?;
//!     for _ in 0..30 {
//!         sleep(Duration::from_millis(100));
//!         recorder.pump()?;
//!     }
//!     recorder.stop()?;
//!
//!     println!("Captured {} bytes", recorder.state().total_recorded_bytes());
//!     Ok(())
//! }
//! ```

mod capture;
mod chunking;
mod error;
mod recorder;
mod segment;

pub use {
    capture::{
        AudioBitrateMode, CaptureHandle, CaptureSession, CaptureStream, ContentOptions, CpalHandle,
        CpalStream, DEFAULT_SLICE_INTERVAL, DriverEvent, KBPS, SessionConfig, SessionState,
    },
    chunking::{ChunkingPolicy, DEFAULT_SLICES_PER_SEGMENT},
    error::{CaptureError, Result as CoreResult},
    recorder::{
        Navigator, RECORDING_DETAIL_ROUTE, RecorderCallbacks, RecorderController, RecorderState,
        RecordingId, RecordingMetadata, RecordingStore,
    },
    segment::{RawSlice, Segment},
};
