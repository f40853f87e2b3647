use crate::{
    CaptureError, CaptureHandle, CaptureStream, ContentOptions, CoreResult, DriverEvent, RawSlice,
};

use std::{
    mem,
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
    },
    time::Duration,
};

use cpal::{
    Device, Stream, StreamConfig, StreamError,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Microphone stream backed by the default CPAL input device.
///
/// Slices carry interleaved little-endian `f32` PCM at the device's native
/// rate and channel count. [`ContentOptions`] are logged but not applied,
/// since CPAL does no encoding.
pub struct CpalStream {
    device: Device,
    config: StreamConfig,
    /// Cleared once by `stop_tracks`. Every handle's callback checks it
    /// before forwarding samples.
    tracks_live: Arc<AtomicBool>,
}

impl CpalStream {
    /// Acquire the default input device.
    ///
    /// # Errors
    ///
    /// Returns `NoInputDevice` if the host has no input device, or
    /// `DeviceError` if its configuration cannot be read.
    #[track_caller]
    #[instrument]
    pub fn new() -> CoreResult<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice {
                location: ErrorLocation::from(Location::caller()),
            })?;

        let config = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceError {
                reason: format!("Failed to get config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            "CpalStream initialized"
        );

        Ok(Self {
            device,
            config: config.into(),
            tracks_live: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Native sample rate of the input device.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Channel count of the input device.
    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

impl CaptureStream for CpalStream {
    type Handle = CpalHandle;

    #[track_caller]
    fn open(&mut self, options: &ContentOptions) -> CoreResult<CpalHandle> {
        if !self.tracks_live.load(Ordering::Acquire) {
            return Err(CaptureError::DeviceError {
                reason: "Input tracks already stopped".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        debug!(
            mime_type = %options.mime_type,
            bits_per_second = options.bits_per_second,
            audio_bitrate_mode = %options.audio_bitrate_mode,
            "Opening PCM capture handle"
        );

        let (events_tx, events_rx) = mpsc::channel();

        Ok(CpalHandle {
            device: self.device.clone(),
            config: self.config.clone(),
            tracks_live: Arc::clone(&self.tracks_live),
            attached: Arc::new(AtomicBool::new(true)),
            stream: None,
            assembler: None,
            events_tx,
            events_rx,
        })
    }

    fn stop_tracks(&mut self) {
        if self.tracks_live.swap(false, Ordering::AcqRel) {
            info!("Input tracks stopped");
        }
    }
}

/// One CPAL input stream, started on demand.
pub struct CpalHandle {
    device: Device,
    config: StreamConfig,
    tracks_live: Arc<AtomicBool>,
    /// The delivery hook. Cleared by `detach` so late callbacks drop data.
    attached: Arc<AtomicBool>,
    stream: Option<Stream>,
    /// Shared with the audio callback once started.
    assembler: Option<Arc<Mutex<SliceAssembler>>>,
    events_tx: Sender<DriverEvent>,
    events_rx: Receiver<DriverEvent>,
}

/// Cuts the callback's sample stream into fixed-length slices and keeps the
/// remainder until the next callback or a flush.
#[derive(Debug)]
pub(crate) struct SliceAssembler {
    pending: Vec<f32>,
    samples_per_slice: usize,
    sample_rate: u32,
    channels: u16,
    slice_interval: Duration,
}

impl SliceAssembler {
    pub(crate) fn new(sample_rate: u32, channels: u16, slice_interval: Duration) -> Self {
        let frames = u128::from(sample_rate) * slice_interval.as_millis() / 1000;
        let samples_per_slice = (frames as usize * usize::from(channels)).max(1);

        Self {
            pending: Vec::with_capacity(samples_per_slice),
            samples_per_slice,
            sample_rate,
            channels,
            slice_interval,
        }
    }

    pub(crate) fn samples_per_slice(&self) -> usize {
        self.samples_per_slice
    }

    /// Append samples; returns every slice completed by them, in order.
    pub(crate) fn push(&mut self, data: &[f32]) -> Vec<RawSlice> {
        self.pending.extend_from_slice(data);

        let mut slices = Vec::new();
        while self.pending.len() >= self.samples_per_slice {
            let rest = self.pending.split_off(self.samples_per_slice);
            let full = mem::replace(&mut self.pending, rest);
            slices.push(RawSlice::new(encode_f32_le(&full), Some(self.slice_interval)));
        }
        slices
    }

    /// Take the incomplete remainder as a shorter slice.
    pub(crate) fn take_tail(&mut self) -> Option<RawSlice> {
        if self.pending.is_empty() {
            return None;
        }

        let tail = mem::take(&mut self.pending);
        let frames = (tail.len() / usize::from(self.channels.max(1))) as u64;
        let duration =
            Duration::from_nanos(frames * 1_000_000_000 / u64::from(self.sample_rate.max(1)));
        Some(RawSlice::new(encode_f32_le(&tail), Some(duration)))
    }
}

fn encode_f32_le(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

impl CaptureHandle for CpalHandle {
    #[track_caller]
    #[instrument(skip(self))]
    fn start(&mut self, slice_interval: Duration) -> CoreResult<()> {
        if self.stream.is_some() {
            return Err(CaptureError::DeviceError {
                reason: "Capture handle already started".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let assembler =
            SliceAssembler::new(self.config.sample_rate, self.config.channels, slice_interval);
        let samples_per_slice = assembler.samples_per_slice();
        let assembler = Arc::new(Mutex::new(assembler));
        let callback_assembler = Arc::clone(&assembler);
        let tracks_live = Arc::clone(&self.tracks_live);
        let attached = Arc::clone(&self.attached);
        let slice_tx = self.events_tx.clone();
        let stop_tx = self.events_tx.clone();

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Both flags are checked before touching the buffer: once
                    // the session detaches or stops the tracks, no further
                    // slice leaves this callback.
                    if !tracks_live.load(Ordering::Acquire) || !attached.load(Ordering::Acquire) {
                        return;
                    }
                    let Ok(mut assembler) = callback_assembler.lock() else {
                        return;
                    };
                    for slice in assembler.push(data) {
                        if slice_tx.send(DriverEvent::Slice(slice)).is_err() {
                            return;
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    if matches!(err, StreamError::DeviceNotAvailable) {
                        let _ = stop_tx.send(DriverEvent::Stopped);
                    }
                },
                None,
            )
            .map_err(|e| CaptureError::DeviceError {
                reason: format!("Failed to build stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| CaptureError::DeviceError {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.stream = Some(stream);
        self.assembler = Some(assembler);
        let _ = self.events_tx.send(DriverEvent::Started);

        info!(
            samples_per_slice,
            slice_interval_ms = slice_interval.as_millis(),
            "PCM capture started"
        );

        Ok(())
    }

    #[track_caller]
    fn pause(&mut self) -> CoreResult<()> {
        let stream = self.stream.as_ref().ok_or_else(|| CaptureError::DeviceError {
            reason: "Capture handle not started".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        stream.pause().map_err(|e| CaptureError::DeviceError {
            reason: format!("Failed to pause stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn resume(&mut self) -> CoreResult<()> {
        let stream = self.stream.as_ref().ok_or_else(|| CaptureError::DeviceError {
            reason: "Capture handle not started".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        stream.play().map_err(|e| CaptureError::DeviceError {
            reason: format!("Failed to resume stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn flush(&mut self) -> CoreResult<()> {
        if let Some(stream) = &self.stream
            && let Err(e) = stream.pause()
        {
            warn!(error = %e, "Failed to pause stream before flush");
        }

        let Some(assembler) = &self.assembler else {
            return Ok(());
        };
        let tail = assembler
            .lock()
            .map_err(|_| CaptureError::DeviceError {
                reason: "Sample buffer poisoned by the audio callback".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?
            .take_tail();

        if let Some(slice) = tail {
            debug!(bytes = slice.len(), "Flushing partial PCM slice");
            let _ = self.events_tx.send(DriverEvent::Slice(slice));
        }
        Ok(())
    }

    fn next_event(&mut self) -> Option<DriverEvent> {
        if !self.attached.load(Ordering::Acquire) {
            return None;
        }
        self.events_rx.try_recv().ok()
    }

    fn detach(&mut self) {
        self.attached.store(false, Ordering::Release);
    }

    fn stop(&mut self) -> CoreResult<()> {
        self.detach();
        if let Some(stream) = self.stream.take() {
            // Dropping the stream joins the backend's audio thread.
            drop(stream);
            debug!("PCM capture stopped");
        }
        Ok(())
    }
}
