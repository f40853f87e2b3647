use crate::{
    CaptureError, CaptureHandle, CaptureStream, ChunkingPolicy, ContentOptions, CoreResult,
    DriverEvent, RawSlice, RecorderCallbacks, Segment,
    capture::HandleGuard,
    chunking::{ChunkAction, ChunkingStrategy},
};

use std::{fmt, mem, panic::Location, time::Duration};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Default time between two driver slices.
pub const DEFAULT_SLICE_INTERVAL: Duration = Duration::from_secs(1);

/// Observable lifecycle state of a [`CaptureSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Constructed, `start` not yet called.
    #[default]
    NotStarted,
    /// Capturing and delivering segments.
    Recording,
    /// Capture suspended at the hardware level.
    Paused,
    /// Terminal. The hardware handle has been released.
    Stopped,
}

impl SessionState {
    /// Lowercase name for logs and status output.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construction-time settings of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time between two driver slices. Must be non-zero.
    pub slice_interval: Duration,
    /// Chunking policy.
    pub policy: ChunkingPolicy,
    /// Codec settings passed through to the driver.
    pub content: ContentOptions,
}

impl SessionConfig {
    /// Config with default content options.
    pub fn new(slice_interval: Duration, policy: ChunkingPolicy) -> Self {
        Self {
            slice_interval,
            policy,
            content: ContentOptions::default(),
        }
    }

    /// Convert a slice interval given in seconds to whole milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for non-finite, non-positive or sub-millisecond values.
    #[track_caller]
    pub fn slice_interval_from_secs(secs: f64) -> CoreResult<Duration> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(CaptureError::InvalidArgument {
                reason: format!("slice interval must be a positive number of seconds, got {secs}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let millis = (secs * 1000.0).round();
        if millis < 1.0 {
            return Err(CaptureError::InvalidArgument {
                reason: format!("slice interval {secs}s is shorter than 1ms"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Duration::from_millis(millis as u64))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SLICE_INTERVAL, ChunkingPolicy::default())
    }
}

/// The stream plus its one live hardware handle.
struct LiveCapture<S: CaptureStream> {
    stream: S,
    guard: HandleGuard<S::Handle>,
}

impl<S: CaptureStream> Drop for LiveCapture<S> {
    fn drop(&mut self) {
        if self.guard.is_live() {
            warn!(
                generation = self.guard.generation(),
                "Session dropped while capturing, releasing hardware"
            );
            self.stream.stop_tracks();
            let _ = self.guard.release();
        }
    }
}

/// Internal phase. A live handle exists only inside `Recording` and `Paused`.
enum Phase<S: CaptureStream> {
    NotStarted { stream: S },
    Recording(LiveCapture<S>),
    Paused(LiveCapture<S>),
    Stopped,
}

/// Owns one capture stream and drives it through
/// `NotStarted -> Recording <-> Paused -> Stopped`.
///
/// Driver notifications are pulled with [`pump`](Self::pump) on the owner's
/// thread; every state change and callback happens synchronously inside the
/// lifecycle methods or the pump. A session is single-use: once stopped,
/// every lifecycle call fails with `InvalidState`.
pub struct CaptureSession<S: CaptureStream, C: RecorderCallbacks> {
    phase: Phase<S>,
    config: SessionConfig,
    strategy: ChunkingStrategy,
    callbacks: C,
    generations: u32,
    delivered: u64,
}

impl<S: CaptureStream, C: RecorderCallbacks> CaptureSession<S, C> {
    /// Create a session over `stream`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no stream is supplied or the slice
    /// interval is zero.
    #[track_caller]
    #[instrument(skip_all, fields(policy = config.policy.as_str()))]
    pub fn new(stream: Option<S>, config: SessionConfig, callbacks: C) -> CoreResult<Self> {
        let stream = stream.ok_or_else(|| CaptureError::InvalidArgument {
            reason: "no stream provided".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if config.slice_interval.is_zero() {
            return Err(CaptureError::InvalidArgument {
                reason: "slice interval must be non-zero".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        debug!(
            slice_interval_ms = config.slice_interval.as_millis(),
            mime_type = %config.content.mime_type,
            "CaptureSession created"
        );

        Ok(Self {
            phase: Phase::NotStarted { stream },
            strategy: ChunkingStrategy::new(config.policy),
            config,
            callbacks,
            generations: 0,
            delivered: 0,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::NotStarted { .. } => SessionState::NotStarted,
            Phase::Recording(_) => SessionState::Recording,
            Phase::Paused(_) => SessionState::Paused,
            Phase::Stopped => SessionState::Stopped,
        }
    }

    /// Settings the session was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The callback sink.
    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    /// True while a hardware handle is held.
    pub fn has_live_handle(&self) -> bool {
        match &self.phase {
            Phase::Recording(live) | Phase::Paused(live) => live.guard.is_live(),
            Phase::NotStarted { .. } | Phase::Stopped => false,
        }
    }

    /// Number of hardware sub-sessions opened so far.
    pub fn generations(&self) -> u32 {
        self.generations
    }

    /// Open a handle and begin capturing.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless `NotStarted`. A driver failure leaves the
    /// session in `NotStarted` with no handle held.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<()> {
        match mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::NotStarted { mut stream } => {
                let generation = self.generations + 1;
                match Self::open_capture(&mut stream, &self.config, generation) {
                    Ok(guard) => {
                        self.generations = generation;
                        self.phase = Phase::Recording(LiveCapture { stream, guard });

                        info!(
                            policy = self.config.policy.as_str(),
                            slice_interval_ms = self.config.slice_interval.as_millis(),
                            "Capture started"
                        );

                        self.callbacks.on_start();
                        // Events are pulled, so nothing reaches the strategy
                        // before it begins.
                        self.strategy.begin();
                        Ok(())
                    }
                    Err(e) => {
                        self.phase = Phase::NotStarted { stream };
                        Err(e)
                    }
                }
            }
            other => {
                self.phase = other;
                Err(self.reject("start"))
            }
        }
    }

    /// Suspend capture.
    ///
    /// Events already queued by the driver are delivered first, followed by
    /// the handle's flushed tail. Any partial grouped buffer is flushed
    /// before `on_pause`, so no segment is ever delivered after the pause
    /// point.
    ///
    /// If the drained events include a hardware stop, the session has
    /// already run its terminal sequence: `Ok(())` is returned, the state is
    /// `Stopped` and `on_pause` does not fire.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless `Recording`.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn pause(&mut self) -> CoreResult<()> {
        if self.state() != SessionState::Recording {
            return Err(self.reject("pause"));
        }

        self.pump()?;
        let tail = self
            .recording_mut()
            .map(|live| live.guard.drain_tail())
            .unwrap_or_default();
        for event in tail {
            self.handle_event(event)?;
        }

        let Some(live) = self.recording_mut() else {
            info!("Capture ended by the device before pause");
            return Ok(());
        };
        live.guard.handle_mut()?.pause()?;

        if let Some(segment) = self.strategy.flush() {
            self.deliver(segment);
        }

        self.phase = match mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Recording(live) => Phase::Paused(live),
            other => other,
        };

        info!(delivered = self.delivered, "Capture paused");
        self.callbacks.on_pause();
        Ok(())
    }

    /// Continue a paused capture.
    ///
    /// The grouped policy flushed its buffer at the pause point, so it
    /// resumes on a fresh hardware sub-session; the continuous policy
    /// resumes the same handle.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless `Paused`. If the fresh grouped sub-session
    /// cannot be opened, the session is stopped and the driver error is
    /// returned.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn resume(&mut self) -> CoreResult<()> {
        if self.state() != SessionState::Paused {
            return Err(self.reject("resume"));
        }

        match self.config.policy {
            ChunkingPolicy::Grouped { .. } => {
                // Anything the paused handle still holds precedes the pause
                // point and is ignored like any slice seen while paused.
                for event in self.swap_handle()? {
                    self.handle_event(event)?;
                }
                if self.state() == SessionState::Stopped {
                    info!("Capture ended by the device before resume");
                    return Ok(());
                }
            }
            ChunkingPolicy::Continuous => {
                if let Phase::Paused(live) = &mut self.phase {
                    live.guard.handle_mut()?.resume()?;
                }
            }
        }

        self.phase = match mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Paused(live) => Phase::Recording(live),
            other => other,
        };

        info!("Capture resumed");
        self.callbacks.on_resume();
        Ok(())
    }

    /// Stop capturing and release the hardware. Terminal.
    ///
    /// Queued events and the handle's flushed tail are delivered first (only
    /// while `Recording`). Then the
    /// delivery hook is detached, every stream track is stopped, and the
    /// handle is stopped and released. A partial grouped buffer is flushed
    /// as the final segment, after which `on_stop` fires.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless `Recording` or `Paused`. A driver error while
    /// stopping the handle is returned after `on_stop` has fired; the handle
    /// is released regardless.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> CoreResult<()> {
        match self.state() {
            SessionState::Recording => {
                self.pump()?;
            }
            SessionState::Paused => {}
            SessionState::NotStarted | SessionState::Stopped => {
                return Err(self.reject("stop"));
            }
        }

        self.finish()
    }

    /// Drain and apply every pending driver event.
    ///
    /// Returns how many events were processed. Does nothing before `start`
    /// or after stop.
    ///
    /// # Errors
    ///
    /// Returns a driver error if a grouped sub-session could not be
    /// restarted; the session is stopped in that case.
    pub fn pump(&mut self) -> CoreResult<usize> {
        let mut processed = 0;

        while let Some(event) = self.next_event() {
            processed += 1;
            self.handle_event(event)?;
        }

        Ok(processed)
    }

    /// Apply one driver event to the state machine.
    ///
    /// # Errors
    ///
    /// See [`pump`](Self::pump).
    pub fn handle_event(&mut self, event: DriverEvent) -> CoreResult<()> {
        match event {
            DriverEvent::Started => {
                debug!(generation = self.generations, "Driver started");
                Ok(())
            }
            DriverEvent::Slice(slice) => self.accept_slice(slice),
            DriverEvent::Stopped => match self.state() {
                SessionState::Recording | SessionState::Paused => {
                    info!("Driver stopped capture");
                    self.finish()
                }
                SessionState::NotStarted | SessionState::Stopped => Ok(()),
            },
        }
    }

    fn next_event(&mut self) -> Option<DriverEvent> {
        match &mut self.phase {
            Phase::Recording(live) | Phase::Paused(live) => live.guard.next_event(),
            Phase::NotStarted { .. } | Phase::Stopped => None,
        }
    }

    fn recording_mut(&mut self) -> Option<&mut LiveCapture<S>> {
        match &mut self.phase {
            Phase::Recording(live) => Some(live),
            _ => None,
        }
    }

    fn accept_slice(&mut self, slice: RawSlice) -> CoreResult<()> {
        if self.state() != SessionState::Recording {
            debug!(
                bytes = slice.len(),
                state = %self.state(),
                "Slice ignored outside recording"
            );
            return Ok(());
        }

        match self.strategy.accept(slice) {
            ChunkAction::Discarded => {
                debug!("Empty slice discarded");
                Ok(())
            }
            ChunkAction::Buffered => Ok(()),
            ChunkAction::Deliver(segment) => {
                self.deliver(segment);
                Ok(())
            }
            ChunkAction::Rotate(segment) => {
                self.deliver(segment);
                self.rotate()
            }
        }
    }

    /// Continue on a fresh sub-session after a full grouped segment.
    ///
    /// Whatever the old handle had already captured is replayed, in order,
    /// into the new sub-session's buffer.
    fn rotate(&mut self) -> CoreResult<()> {
        for event in self.swap_handle()? {
            self.handle_event(event)?;
        }
        Ok(())
    }

    /// Drain and release the live handle, then open and start a new one on
    /// the same stream. Returns the old handle's remaining events.
    ///
    /// The old handle is stopped before the new one opens. If opening fails,
    /// the drained tail is absorbed, the session is finished and the error
    /// is returned.
    fn swap_handle(&mut self) -> CoreResult<Vec<DriverEvent>> {
        let generation = self.generations + 1;
        let (Phase::Recording(live) | Phase::Paused(live)) = &mut self.phase else {
            return Ok(Vec::new());
        };

        let tail = live.guard.drain_tail();
        if let Err(e) = live.guard.release() {
            warn!(error = ?e, "Previous sub-session did not stop cleanly");
        }

        match Self::open_capture(&mut live.stream, &self.config, generation) {
            Ok(guard) => {
                live.guard = guard;
                self.generations = generation;
                self.strategy.begin();
                debug!(generation, carried = tail.len(), "Sub-session rotated");
                Ok(tail)
            }
            Err(e) => {
                error!(error = ?e, "Failed to restart sub-session, stopping capture");
                self.absorb_tail(tail);
                if let Err(stop_err) = self.finish() {
                    warn!(error = ?stop_err, "Stop after failed restart reported an error");
                }
                Err(e)
            }
        }
    }

    /// Feed trailing slices through the strategy without any further
    /// rotation. Only used on the way to `Stopped`.
    fn absorb_tail(&mut self, tail: Vec<DriverEvent>) {
        if self.state() != SessionState::Recording {
            if !tail.is_empty() {
                debug!(events = tail.len(), state = %self.state(), "Tail ignored outside recording");
            }
            return;
        }

        for event in tail {
            let DriverEvent::Slice(slice) = event else {
                continue;
            };
            match self.strategy.accept(slice) {
                ChunkAction::Deliver(segment) | ChunkAction::Rotate(segment) => {
                    self.deliver(segment)
                }
                ChunkAction::Buffered | ChunkAction::Discarded => {}
            }
        }
    }

    /// Terminal sequence shared by `stop()` and driver-initiated stops.
    fn finish(&mut self) -> CoreResult<()> {
        // The flushed tail is still part of the recording.
        let tail = match &mut self.phase {
            Phase::Recording(live) => live.guard.drain_tail(),
            _ => Vec::new(),
        };
        self.absorb_tail(tail);

        let mut live = match mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Recording(live) | Phase::Paused(live) => live,
            other => {
                self.phase = other;
                return Ok(());
            }
        };

        // Detach first so nothing the hardware emits while shutting down is
        // processed. Tracks go before the handle.
        if let Ok(handle) = live.guard.handle_mut() {
            handle.detach();
        }
        live.stream.stop_tracks();
        let released = live.guard.release();
        drop(live);

        if let Some(segment) = self.strategy.finish() {
            self.deliver(segment);
        }

        info!(
            delivered = self.delivered,
            generations = self.generations,
            "Capture stopped"
        );

        self.callbacks.on_stop();

        if let Err(e) = &released {
            error!(error = ?e, "Capture handle reported an error while stopping");
        }
        released
    }

    fn deliver(&mut self, segment: Segment) {
        self.delivered += 1;
        debug!(
            sequence = self.delivered,
            bytes = segment.len(),
            "Segment delivered"
        );
        self.callbacks.on_next_chunk(segment);
    }

    #[track_caller]
    fn open_capture(
        stream: &mut S,
        config: &SessionConfig,
        generation: u32,
    ) -> CoreResult<HandleGuard<S::Handle>> {
        let handle = stream.open(&config.content)?;
        let mut guard = HandleGuard::new(handle, generation);
        guard.handle_mut()?.start(config.slice_interval)?;
        Ok(guard)
    }

    #[track_caller]
    fn reject(&self, action: &'static str) -> CaptureError {
        let state = self.state();
        warn!(action, state = %state, "Rejected lifecycle call");
        CaptureError::InvalidState {
            action,
            state,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
