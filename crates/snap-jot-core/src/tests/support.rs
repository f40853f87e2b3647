//! Scripted driver and callback recorder shared by the session tests.

use crate::{
    CaptureError, CaptureHandle, CaptureStream, ContentOptions, CoreResult, DriverEvent, RawSlice,
    RecorderCallbacks, Segment,
};

use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    panic::Location,
    rc::Rc,
    time::Duration,
};

use error_location::ErrorLocation;

pub(crate) const SLICE_DURATION: Duration = Duration::from_secs(1);

/// Calls observed by the scripted driver, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DriverCall {
    Open(u32),
    Start(u32, Duration),
    Pause(u32),
    Resume(u32),
    Flush(u32),
    Detach(u32),
    Stop(u32),
    StopTracks,
}

#[derive(Default)]
struct DriverLog {
    calls: Vec<DriverCall>,
    opened: u32,
    live_handles: u32,
    fail_open_from: Option<u32>,
}

/// In-memory hardware with one event queue per handle.
///
/// Events pushed by a test land on the most recently opened handle (handle 1
/// before the first open). A handle reads only its own queue.
#[derive(Clone, Default)]
pub(crate) struct ScriptedDriver {
    log: Rc<RefCell<DriverLog>>,
    queues: Rc<RefCell<BTreeMap<u32, VecDeque<DriverEvent>>>>,
    /// Partially captured data per handle, released by `flush`.
    tails: Rc<RefCell<BTreeMap<u32, RawSlice>>>,
    next_slice: Rc<RefCell<u8>>,
}

impl ScriptedDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn stream(&self) -> ScriptedStream {
        ScriptedStream {
            driver: self.clone(),
        }
    }

    /// Queue `count` slices of `len` bytes. Every byte of a slice holds the
    /// slice's sequence number, so delivery order can be read back.
    pub(crate) fn push_slices(&self, count: usize, len: usize) {
        for _ in 0..count {
            let slice = self.numbered_slice(len);
            self.push_event(DriverEvent::Slice(slice));
        }
    }

    /// Give the current handle `len` bytes of not yet sliced data, numbered
    /// like the next queued slice. Only a flush releases it.
    pub(crate) fn hold_tail(&self, len: usize) {
        let slice = self.numbered_slice(len);
        self.tails.borrow_mut().insert(self.current_handle(), slice);
    }

    pub(crate) fn push_empty_slice(&self) {
        self.push_event(DriverEvent::Slice(RawSlice::new(Vec::new(), Some(SLICE_DURATION))));
    }

    pub(crate) fn push_event(&self, event: DriverEvent) {
        self.queues
            .borrow_mut()
            .entry(self.current_handle())
            .or_default()
            .push_back(event);
    }

    /// Events still queued across every handle.
    pub(crate) fn pending(&self) -> usize {
        self.queues.borrow().values().map(VecDeque::len).sum()
    }

    pub(crate) fn calls(&self) -> Vec<DriverCall> {
        self.log.borrow().calls.clone()
    }

    pub(crate) fn opened(&self) -> u32 {
        self.log.borrow().opened
    }

    pub(crate) fn live_handles(&self) -> u32 {
        self.log.borrow().live_handles
    }

    /// Make the `n`th and later `open` calls fail.
    pub(crate) fn fail_open_from(&self, n: u32) {
        self.log.borrow_mut().fail_open_from = Some(n);
    }

    fn record(&self, call: DriverCall) {
        self.log.borrow_mut().calls.push(call);
    }

    fn current_handle(&self) -> u32 {
        self.log.borrow().opened.max(1)
    }

    fn numbered_slice(&self, len: usize) -> RawSlice {
        let mut next = self.next_slice.borrow_mut();
        let seq = *next;
        *next = next.wrapping_add(1);
        RawSlice::new(vec![seq; len], Some(SLICE_DURATION))
    }
}

pub(crate) struct ScriptedStream {
    driver: ScriptedDriver,
}

impl CaptureStream for ScriptedStream {
    type Handle = ScriptedHandle;

    #[track_caller]
    fn open(&mut self, _options: &ContentOptions) -> CoreResult<ScriptedHandle> {
        let id = {
            let mut log = self.driver.log.borrow_mut();
            let id = log.opened + 1;
            if log.fail_open_from.is_some_and(|n| id >= n) {
                return Err(CaptureError::DeviceError {
                    reason: "scripted open failure".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            log.opened = id;
            log.live_handles += 1;
            id
        };
        self.driver.record(DriverCall::Open(id));

        Ok(ScriptedHandle {
            id,
            driver: self.driver.clone(),
            attached: true,
            stopped: false,
        })
    }

    fn stop_tracks(&mut self) {
        self.driver.record(DriverCall::StopTracks);
    }
}

pub(crate) struct ScriptedHandle {
    id: u32,
    driver: ScriptedDriver,
    attached: bool,
    stopped: bool,
}

impl CaptureHandle for ScriptedHandle {
    fn start(&mut self, slice_interval: Duration) -> CoreResult<()> {
        self.driver.record(DriverCall::Start(self.id, slice_interval));
        Ok(())
    }

    fn pause(&mut self) -> CoreResult<()> {
        self.driver.record(DriverCall::Pause(self.id));
        Ok(())
    }

    fn resume(&mut self) -> CoreResult<()> {
        self.driver.record(DriverCall::Resume(self.id));
        Ok(())
    }

    fn flush(&mut self) -> CoreResult<()> {
        self.driver.record(DriverCall::Flush(self.id));
        if let Some(tail) = self.driver.tails.borrow_mut().remove(&self.id) {
            self.driver
                .queues
                .borrow_mut()
                .entry(self.id)
                .or_default()
                .push_back(DriverEvent::Slice(tail));
        }
        Ok(())
    }

    fn next_event(&mut self) -> Option<DriverEvent> {
        if !self.attached {
            return None;
        }
        self.driver
            .queues
            .borrow_mut()
            .get_mut(&self.id)
            .and_then(VecDeque::pop_front)
    }

    fn detach(&mut self) {
        self.attached = false;
        self.driver.record(DriverCall::Detach(self.id));
    }

    fn stop(&mut self) -> CoreResult<()> {
        if !self.stopped {
            self.stopped = true;
            self.driver.log.borrow_mut().live_handles -= 1;
        }
        self.driver.record(DriverCall::Stop(self.id));
        Ok(())
    }
}

/// Callbacks as observed by the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Callback {
    Start,
    Stop,
    Pause,
    Resume,
    Chunk(Vec<u8>),
}

/// Records every callback, plus how many handles were live when `on_start`
/// and `on_stop` ran.
pub(crate) struct CallbackLog {
    driver: ScriptedDriver,
    pub(crate) events: Vec<Callback>,
    pub(crate) live_handles_at_start: Option<u32>,
    pub(crate) live_handles_at_stop: Option<u32>,
}

impl CallbackLog {
    pub(crate) fn new(driver: &ScriptedDriver) -> Self {
        Self {
            driver: driver.clone(),
            events: Vec::new(),
            live_handles_at_start: None,
            live_handles_at_stop: None,
        }
    }

    pub(crate) fn chunks(&self) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Callback::Chunk(data) => Some(data.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, callback: &Callback) -> usize {
        self.events.iter().filter(|e| *e == callback).count()
    }
}

impl RecorderCallbacks for CallbackLog {
    fn on_start(&mut self) {
        self.live_handles_at_start = Some(self.driver.live_handles());
        self.events.push(Callback::Start);
    }

    fn on_stop(&mut self) {
        self.live_handles_at_stop = Some(self.driver.live_handles());
        self.events.push(Callback::Stop);
    }

    fn on_pause(&mut self) {
        self.events.push(Callback::Pause);
    }

    fn on_resume(&mut self) {
        self.events.push(Callback::Resume);
    }

    fn on_next_chunk(&mut self, segment: Segment) {
        self.events.push(Callback::Chunk(segment.into_data()));
    }
}
