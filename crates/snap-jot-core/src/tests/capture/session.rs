use crate::{
    CaptureError, CaptureSession, ChunkingPolicy, DriverEvent, SessionConfig, SessionState,
    tests::support::{Callback, CallbackLog, DriverCall, ScriptedDriver, ScriptedStream},
};

use std::time::Duration;

#[allow(clippy::unwrap_used)]
fn session(driver: &ScriptedDriver) -> CaptureSession<ScriptedStream, CallbackLog> {
    CaptureSession::new(
        Some(driver.stream()),
        SessionConfig::default(),
        CallbackLog::new(driver),
    )
    .unwrap()
}

#[allow(clippy::unwrap_used)]
fn position(calls: &[DriverCall], call: DriverCall) -> usize {
    calls.iter().position(|c| *c == call).unwrap()
}

/// WHAT: Construction without a stream is rejected
/// WHY: A session is meaningless without the hardware it wraps
#[test]
fn given_no_stream_when_creating_session_then_invalid_argument() {
    // Given: A driver whose stream is not handed over
    let driver = ScriptedDriver::new();

    // When: Creating a session with no stream
    let result = CaptureSession::<ScriptedStream, _>::new(
        None,
        SessionConfig::default(),
        CallbackLog::new(&driver),
    );

    // Then: InvalidArgument, and nothing was opened
    assert!(matches!(result, Err(CaptureError::InvalidArgument { .. })));
    assert_eq!(driver.opened(), 0);
}

/// WHAT: Zero slice interval is rejected
/// WHY: The driver cannot slice at a zero period
#[test]
fn given_zero_slice_interval_when_creating_session_then_invalid_argument() {
    // Given: A config with a zero interval
    let driver = ScriptedDriver::new();
    let config = SessionConfig::new(Duration::ZERO, ChunkingPolicy::Continuous);

    // When: Creating a session
    let result = CaptureSession::new(Some(driver.stream()), config, CallbackLog::new(&driver));

    // Then: InvalidArgument
    assert!(matches!(result, Err(CaptureError::InvalidArgument { .. })));
}

/// WHAT: Seconds convert to whole milliseconds, bad values are rejected
/// WHY: Interval is configured in seconds but the driver works in ms
#[test]
#[allow(clippy::unwrap_used)]
fn given_interval_in_seconds_when_converting_then_milliseconds_or_error() {
    assert_eq!(
        SessionConfig::slice_interval_from_secs(1.5).unwrap(),
        Duration::from_millis(1500)
    );
    assert_eq!(
        SessionConfig::slice_interval_from_secs(10.0).unwrap(),
        Duration::from_secs(10)
    );

    for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, 0.0004] {
        assert!(matches!(
            SessionConfig::slice_interval_from_secs(bad),
            Err(CaptureError::InvalidArgument { .. })
        ));
    }
}

/// WHAT: Start opens and starts one handle, then fires on_start
/// WHY: Exactly one live handle while recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_new_session_when_starting_then_recording_with_one_handle() {
    // Given: A fresh session
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    assert_eq!(session.state(), SessionState::NotStarted);
    assert!(!session.has_live_handle());

    // When: Starting
    session.start().unwrap();

    // Then: Recording, one handle started with the configured interval
    assert_eq!(session.state(), SessionState::Recording);
    assert!(session.has_live_handle());
    assert_eq!(driver.live_handles(), 1);
    assert_eq!(
        driver.calls(),
        vec![
            DriverCall::Open(1),
            DriverCall::Start(1, Duration::from_secs(1))
        ]
    );
    assert_eq!(session.callbacks().events, vec![Callback::Start]);
    assert_eq!(session.callbacks().live_handles_at_start, Some(1));
}

/// WHAT: Second start is rejected without side effects
/// WHY: Double start is an integration error and must not disturb the recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_starting_again_then_invalid_state_and_unchanged() {
    // Given: A started session
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();

    // When: Starting again
    let result = session.start();

    // Then: InvalidState, still recording, still one handle, one on_start
    assert!(matches!(
        result,
        Err(CaptureError::InvalidState {
            action: "start",
            state: SessionState::Recording,
            ..
        })
    ));
    assert_eq!(session.state(), SessionState::Recording);
    assert_eq!(driver.opened(), 1);
    assert_eq!(session.callbacks().count(&Callback::Start), 1);
}

/// WHAT: Stop, pause and resume are rejected before start
/// WHY: There is no hardware to act on yet
#[test]
fn given_new_session_when_calling_lifecycle_out_of_order_then_invalid_state() {
    // Given: A fresh session
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);

    // When/Then: Every non-start call fails and nothing reaches the driver
    assert!(matches!(session.stop(), Err(CaptureError::InvalidState { .. })));
    assert!(matches!(session.pause(), Err(CaptureError::InvalidState { .. })));
    assert!(matches!(session.resume(), Err(CaptureError::InvalidState { .. })));
    assert_eq!(session.state(), SessionState::NotStarted);
    assert!(driver.calls().is_empty());
    assert!(session.callbacks().events.is_empty());
}

/// WHAT: Resume while recording and pause while paused are rejected
/// WHY: Each transition has exactly one legal source state
#[test]
#[allow(clippy::unwrap_used)]
fn given_wrong_source_state_when_pausing_or_resuming_then_invalid_state() {
    // Given: A recording session
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();

    // When/Then: Resume from Recording fails
    assert!(matches!(session.resume(), Err(CaptureError::InvalidState { .. })));

    // When/Then: Pause twice, second fails
    session.pause().unwrap();
    assert!(matches!(session.pause(), Err(CaptureError::InvalidState { .. })));
    assert_eq!(session.state(), SessionState::Paused);
}

/// WHAT: Pause and resume toggle state and fire their callbacks in order
/// WHY: The controller mirrors these transitions
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_pausing_and_resuming_then_callbacks_ordered() {
    // Given: A recording session
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();

    // When: Pausing then resuming
    session.pause().unwrap();
    assert_eq!(session.state(), SessionState::Paused);
    session.resume().unwrap();

    // Then: Recording again; the same handle was paused and resumed
    assert_eq!(session.state(), SessionState::Recording);
    assert_eq!(
        session.callbacks().events,
        vec![Callback::Start, Callback::Pause, Callback::Resume]
    );
    let calls = driver.calls();
    assert!(position(&calls, DriverCall::Pause(1)) < position(&calls, DriverCall::Resume(1)));
    assert_eq!(driver.opened(), 1);
}

/// WHAT: Stop ends tracks before the handle and fires on_stop after release
/// WHY: The store must never observe a partially closed resource
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_stopping_then_tracks_then_handle_then_on_stop() {
    // Given: A recording session
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();

    // When: Stopping
    session.stop().unwrap();

    // Then: Detach, tracks, handle stop in that order; on_stop saw zero live handles
    let calls = driver.calls();
    let detach = position(&calls, DriverCall::Detach(1));
    let tracks = position(&calls, DriverCall::StopTracks);
    let stop = position(&calls, DriverCall::Stop(1));
    assert!(detach < tracks);
    assert!(tracks < stop);
    assert_eq!(calls.iter().filter(|c| **c == DriverCall::Stop(1)).count(), 1);

    assert_eq!(session.state(), SessionState::Stopped);
    assert!(!session.has_live_handle());
    assert_eq!(driver.live_handles(), 0);
    assert_eq!(session.callbacks().live_handles_at_stop, Some(0));
    assert_eq!(
        session.callbacks().events.last(),
        Some(&Callback::Stop)
    );
}

/// WHAT: Every lifecycle call after stop fails
/// WHY: Stopped is terminal and the session is single-use
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_session_when_calling_anything_then_invalid_state() {
    // Given: A stopped session
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();
    session.stop().unwrap();

    // When/Then: resume, start, pause and stop all fail
    assert!(matches!(
        session.resume(),
        Err(CaptureError::InvalidState {
            state: SessionState::Stopped,
            ..
        })
    ));
    assert!(matches!(session.start(), Err(CaptureError::InvalidState { .. })));
    assert!(matches!(session.pause(), Err(CaptureError::InvalidState { .. })));
    assert!(matches!(session.stop(), Err(CaptureError::InvalidState { .. })));
    assert_eq!(driver.opened(), 1);
    assert_eq!(session.callbacks().count(&Callback::Stop), 1);
}

/// WHAT: Slices produced after stop are never delivered
/// WHY: The delivery hook is detached before the hardware stop
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_session_when_driver_emits_late_slice_then_ignored() {
    // Given: A stopped continuous session
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();
    session.stop().unwrap();

    // When: The hardware emits a late slice and the owner pumps
    driver.push_slices(1, 64);
    let processed = session.pump().unwrap();

    // Then: Nothing processed, nothing delivered
    assert_eq!(processed, 0);
    assert!(session.callbacks().chunks().is_empty());
    assert_eq!(driver.pending(), 1);
}

/// WHAT: Paused-then-stopped sessions deliver nothing after the pause point
/// WHY: Pause is a hard capture boundary for the consumer
#[test]
#[allow(clippy::unwrap_used)]
fn given_paused_session_when_stopping_then_no_chunk_after_pause() {
    // Given: A continuous session that delivered two slices, then paused
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();
    driver.push_slices(2, 16);
    session.pump().unwrap();
    session.pause().unwrap();

    // When: Slices arrive while paused and the session is stopped
    driver.push_slices(3, 16);
    session.pump().unwrap();
    session.stop().unwrap();

    // Then: No chunk callback follows on_pause
    let events = &session.callbacks().events;
    let pause_at = events.iter().position(|e| *e == Callback::Pause).unwrap();
    assert!(
        events[pause_at..]
            .iter()
            .all(|e| !matches!(e, Callback::Chunk(_)))
    );
    assert_eq!(session.callbacks().chunks().len(), 2);
}

/// WHAT: A hardware stop notification runs the terminal sequence
/// WHY: Device loss must release resources and notify the consumer once
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_driver_reports_stop_then_session_stopped() {
    // Given: A recording session with a slice, a hardware stop, then a slice
    // the handle had already produced
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();
    driver.push_slices(1, 8);
    driver.push_event(DriverEvent::Stopped);
    driver.push_slices(1, 8);

    // When: Pumping
    session.pump().unwrap();

    // Then: Both slices delivered before on_stop, stopped, released
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(
        session.callbacks().events,
        vec![
            Callback::Start,
            Callback::Chunk(vec![0; 8]),
            Callback::Chunk(vec![1; 8]),
            Callback::Stop,
        ]
    );
    assert_eq!(session.callbacks().count(&Callback::Stop), 1);
    assert_eq!(session.callbacks().live_handles_at_stop, Some(0));
    assert!(driver.calls().contains(&DriverCall::StopTracks));
    assert!(matches!(session.stop(), Err(CaptureError::InvalidState { .. })));
}

/// WHAT: Started notifications are informational only
/// WHY: The session already transitioned synchronously in start()
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_driver_reports_started_then_nothing_delivered() {
    // Given: A recording session
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();

    // When: The driver reports Started
    session.handle_event(DriverEvent::Started).unwrap();

    // Then: State and callbacks unchanged
    assert_eq!(session.state(), SessionState::Recording);
    assert_eq!(session.callbacks().events, vec![Callback::Start]);
}

/// WHAT: Failing to open the hardware leaves the session startable
/// WHY: A failed start must not mutate state or leak a handle
#[test]
#[allow(clippy::unwrap_used)]
fn given_open_failure_when_starting_then_not_started_without_callbacks() {
    // Given: A driver that refuses the first open
    let driver = ScriptedDriver::new();
    driver.fail_open_from(1);
    let mut session = session(&driver);

    // When: Starting
    let result = session.start();

    // Then: DeviceError, still NotStarted, no on_start, no handle
    assert!(matches!(result, Err(CaptureError::DeviceError { .. })));
    assert_eq!(session.state(), SessionState::NotStarted);
    assert!(session.callbacks().events.is_empty());
    assert_eq!(driver.live_handles(), 0);
}

/// WHAT: Dropping an active session releases the hardware
/// WHY: Release is guaranteed on every exit path, not just stop()
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_dropped_then_handle_released() {
    // Given: A recording session
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();
    assert_eq!(driver.live_handles(), 1);

    // When: Dropping it without stop()
    drop(session);

    // Then: Tracks and handle were stopped
    let calls = driver.calls();
    assert!(calls.contains(&DriverCall::StopTracks));
    assert!(calls.contains(&DriverCall::Stop(1)));
    assert_eq!(driver.live_handles(), 0);
}

/// WHAT: Data the handle holds below a full slice is delivered on stop
/// WHY: The last partial interval of a recording is still captured audio
#[test]
#[allow(clippy::unwrap_used)]
fn given_handle_holding_partial_slice_when_stopping_then_tail_delivered_before_on_stop() {
    // Given: A continuous session with two queued slices and a held partial slice
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();
    driver.push_slices(2, 4);
    driver.hold_tail(2);

    // When: Stopping
    session.stop().unwrap();

    // Then: The tail arrives as the last chunk, before on_stop
    assert_eq!(
        session.callbacks().events,
        vec![
            Callback::Start,
            Callback::Chunk(vec![0; 4]),
            Callback::Chunk(vec![1; 4]),
            Callback::Chunk(vec![2; 2]),
            Callback::Stop,
        ]
    );

    // Then: The handle was flushed while still attached
    let calls = driver.calls();
    assert!(position(&calls, DriverCall::Flush(1)) < position(&calls, DriverCall::Detach(1)));
}

/// WHAT: Pausing after the device already stopped succeeds without on_pause
/// WHY: The caller asked to stop capturing and capture has stopped
#[test]
#[allow(clippy::unwrap_used)]
fn given_queued_hardware_stop_when_pausing_then_ok_and_stopped() {
    // Given: A recording session whose driver has queued a stop
    let driver = ScriptedDriver::new();
    let mut session = session(&driver);
    session.start().unwrap();
    driver.push_slices(1, 4);
    driver.push_event(DriverEvent::Stopped);

    // When: Pausing
    let result = session.pause();

    // Then: Ok, terminal state, one on_stop and no on_pause
    assert!(result.is_ok());
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(
        session.callbacks().events,
        vec![Callback::Start, Callback::Chunk(vec![0; 4]), Callback::Stop]
    );
    assert!(!driver.calls().contains(&DriverCall::Pause(1)));
    assert!(matches!(session.resume(), Err(CaptureError::InvalidState { .. })));
}
