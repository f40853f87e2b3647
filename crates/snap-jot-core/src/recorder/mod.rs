mod callbacks;
mod collaborators;
mod controller;
mod state;

pub use {
    callbacks::RecorderCallbacks,
    collaborators::{Navigator, RECORDING_DETAIL_ROUTE, RecordingId, RecordingMetadata, RecordingStore},
    controller::RecorderController,
    state::RecorderState,
};
