use crate::{
    CaptureSession, CaptureStream, CoreResult, Navigator, RECORDING_DETAIL_ROUTE,
    RecorderCallbacks, RecorderState, RecordingId, RecordingMetadata, RecordingStore, Segment,
    SessionConfig, SessionState,
};

use tracing::{debug, error, info, instrument, warn};

/// Callback sink that turns session events into [`RecorderState`] and hands
/// the finished recording to the store and navigator.
pub(crate) struct RecorderHooks<St, N> {
    state: RecorderState,
    store: St,
    navigator: N,
    mime_type: String,
    recording_id: Option<RecordingId>,
}

impl<St: RecordingStore, N: Navigator> RecorderCallbacks for RecorderHooks<St, N> {
    fn on_start(&mut self) {
        self.state.set_runtime_state(SessionState::Recording);
    }

    fn on_stop(&mut self) {
        self.state.set_runtime_state(SessionState::Stopped);

        if self.recording_id.is_some() {
            warn!("Stop notification repeated, recording already stored");
            return;
        }

        let metadata = RecordingMetadata {
            mime_type: self.mime_type.clone(),
            segment_count: self.state.chunk_list().len(),
            total_bytes: self.state.total_recorded_bytes(),
            total_watch_time: self.state.total_watch_time(),
        };

        match self.store.insert(self.state.chunk_list(), &metadata) {
            Ok(recording_id) => {
                self.recording_id = Some(recording_id);
                info!(
                    recording_id = %recording_id,
                    segments = metadata.segment_count,
                    bytes = metadata.total_bytes,
                    "Recording stored"
                );
                self.navigator.navigate(RECORDING_DETAIL_ROUTE, recording_id);
            }
            Err(e) => {
                error!(error = ?e, "Failed to store recording, staying on recorder view");
            }
        }
    }

    fn on_pause(&mut self) {
        self.state.set_runtime_state(SessionState::Paused);
    }

    fn on_resume(&mut self) {
        self.state.set_runtime_state(SessionState::Recording);
    }

    fn on_next_chunk(&mut self, segment: Segment) {
        debug!(
            index = self.state.chunk_list().len(),
            bytes = segment.len(),
            "Chunk appended"
        );
        self.state.push_segment(segment);
    }
}

/// Application-level recorder: one capture session plus its progress view.
///
/// Created per recording attempt. On stop, the ordered segment list is
/// inserted into the store exactly once and the navigator is sent to
/// [`RECORDING_DETAIL_ROUTE`] with the returned id.
pub struct RecorderController<S: CaptureStream, St: RecordingStore, N: Navigator> {
    session: CaptureSession<S, RecorderHooks<St, N>>,
}

impl<S: CaptureStream, St: RecordingStore, N: Navigator> RecorderController<S, St, N> {
    /// Build a controller and its session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `stream` is `None` or the config is invalid.
    #[track_caller]
    #[instrument(skip_all)]
    pub fn new(
        stream: Option<S>,
        config: SessionConfig,
        store: St,
        navigator: N,
    ) -> CoreResult<Self> {
        let hooks = RecorderHooks {
            state: RecorderState::new(),
            store,
            navigator,
            mime_type: config.content.mime_type.clone(),
            recording_id: None,
        };

        let session = CaptureSession::new(stream, config, hooks)?;

        Ok(Self { session })
    }

    /// See [`CaptureSession::start`].
    #[track_caller]
    pub fn start(&mut self) -> CoreResult<()> {
        self.session.start()
    }

    /// See [`CaptureSession::pause`].
    #[track_caller]
    pub fn pause(&mut self) -> CoreResult<()> {
        self.session.pause()
    }

    /// See [`CaptureSession::resume`].
    #[track_caller]
    pub fn resume(&mut self) -> CoreResult<()> {
        self.session.resume()
    }

    /// See [`CaptureSession::stop`]. Stores and navigates before returning.
    #[track_caller]
    pub fn stop(&mut self) -> CoreResult<()> {
        self.session.stop()
    }

    /// See [`CaptureSession::pump`].
    pub fn pump(&mut self) -> CoreResult<usize> {
        self.session.pump()
    }

    /// Progress so far.
    pub fn state(&self) -> &RecorderState {
        &self.session.callbacks().state
    }

    /// State of the underlying session.
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Id returned by the store, once stopped and stored.
    pub fn recording_id(&self) -> Option<RecordingId> {
        self.session.callbacks().recording_id
    }

    /// The recording store.
    pub fn store(&self) -> &St {
        &self.session.callbacks().store
    }

    /// The navigator.
    pub fn navigator(&self) -> &N {
        &self.session.callbacks().navigator
    }
}
