use crate::{
    AppCommand, AppError, AppResult, ConsoleNavigator, MemoryRecordingStore, config::Config,
};

use snap_jot_core::{
    CpalStream, Navigator, RECORDING_DETAIL_ROUTE, RecorderController, RecordingId, SessionState,
};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use tokio::{
    sync::{mpsc, watch},
    time::MissedTickBehavior,
};
use tracing::{debug, error, info, instrument, warn};

/// How often driver events are drained while a recording is live.
pub(crate) const PUMP_INTERVAL: Duration = Duration::from_millis(50);

/// Recorder bound to the default input device and the in-memory store.
pub(crate) type Recorder = RecorderController<CpalStream, MemoryRecordingStore, ConsoleNavigator>;

/// Main application state.
///
/// Owns at most one recorder at a time. Every recorder state change happens
/// on this task, either in a command handler or in the periodic pump.
pub struct App {
    pub(crate) config: Config,
    pub(crate) store: MemoryRecordingStore,
    pub(crate) navigator: ConsoleNavigator,
    pub(crate) recorder: Option<Recorder>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Snap-Jot starting");

        let mut pump = tokio::time::interval(PUMP_INTERVAL);
        pump.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut ctrl_c_armed = true;

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if cmd == AppCommand::Shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                    if let Err(e) = self.handle_command(cmd.clone()) {
                        error!(command = ?cmd, error = ?e, "Command failed");
                        eprintln!("error: {e}");
                    }
                }

                _ = pump.tick() => self.pump_recorder(),

                result = &mut ctrl_c, if ctrl_c_armed => {
                    match result {
                        Ok(()) => {
                            info!("Interrupted");
                            break;
                        }
                        Err(e) => {
                            warn!(error = ?e, "Failed to listen for Ctrl-C");
                            ctrl_c_armed = false;
                        }
                    }
                }
            }
        }

        self.finish_recording();

        let _ = self.shutdown_tx.send(true);
        info!("Snap-Jot shut down successfully");

        Ok(())
    }

    /// Apply one console command.
    #[instrument(skip(self))]
    pub(crate) fn handle_command(&mut self, cmd: AppCommand) -> AppResult<()> {
        match cmd {
            AppCommand::Start => self.start_recording(),
            AppCommand::Pause => {
                let recorder = self.active_recorder()?;
                recorder.pause()?;
                if recorder.session_state() == SessionState::Stopped {
                    println!("capture ended by the device");
                } else {
                    println!("paused");
                }
                Ok(())
            }
            AppCommand::Resume => {
                self.active_recorder()?.resume()?;
                println!("recording");
                Ok(())
            }
            AppCommand::Stop => self.stop_recording(),
            AppCommand::Status => {
                println!("{}", self.status_line());
                Ok(())
            }
            AppCommand::List => {
                self.print_recordings();
                Ok(())
            }
            AppCommand::Show { recording_id } => self.show_recording(recording_id),
            AppCommand::Shutdown => Ok(()),
        }
    }

    /// Start a new recording on the default input device.
    #[instrument(skip(self))]
    fn start_recording(&mut self) -> AppResult<()> {
        if let Some(recorder) = self.recorder.as_mut()
            && recorder.session_state() != SessionState::Stopped
        {
            // The engine reports the invalid transition.
            recorder.start()?;
            return Ok(());
        }

        let session_config = self.config.session_config()?;
        let policy = session_config.policy.as_str();
        let stream = CpalStream::new()?;

        let mut recorder = Recorder::new(
            Some(stream),
            session_config,
            self.store.clone(),
            self.navigator.clone(),
        )?;
        recorder.start()?;

        info!(policy, "Recording started");
        println!("recording ({policy})");

        self.recorder = Some(recorder);
        Ok(())
    }

    /// Stop the active recording. The recorder stores it and opens its view.
    #[instrument(skip(self))]
    fn stop_recording(&mut self) -> AppResult<()> {
        let recorder = self.active_recorder()?;
        recorder.stop()?;

        let state = recorder.state();
        info!(
            segments = state.chunk_list().len(),
            total_bytes = state.total_recorded_bytes(),
            "Recording stopped"
        );
        if recorder.recording_id().is_none() {
            eprintln!("recording stopped but could not be stored");
        }

        Ok(())
    }

    fn show_recording(&mut self, recording_id: RecordingId) -> AppResult<()> {
        if self.store.get(recording_id).is_none() {
            return Err(AppError::RecordingNotFound {
                recording_id,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.navigator.navigate(RECORDING_DETAIL_ROUTE, recording_id);
        Ok(())
    }

    /// Drain driver events for the current recorder.
    fn pump_recorder(&mut self) {
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };
        let before = recorder.session_state();
        if before == SessionState::Stopped {
            return;
        }

        match recorder.pump() {
            Ok(0) => {}
            Ok(processed) => debug!(processed, "Pumped driver events"),
            Err(e) => error!(error = ?e, "Capture failed"),
        }

        if recorder.session_state() == SessionState::Stopped {
            warn!(previous = %before, "Capture ended by the device");
            println!("capture ended by the device");
        }
    }

    /// Stop and store a recording that is still live at shutdown.
    fn finish_recording(&mut self) {
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };
        if recorder.session_state() == SessionState::Stopped {
            return;
        }

        info!("Stopping active recording before exit");
        if let Err(e) = recorder.stop() {
            error!(error = ?e, "Failed to stop recording on exit");
        }
    }

    pub(crate) fn status_line(&self) -> String {
        match &self.recorder {
            None => format!("idle, {} stored", self.store.len()),
            Some(recorder) => {
                let state = recorder.state();
                format!(
                    "{}: {} chunks, {} bytes, {:.1}s",
                    recorder.session_state(),
                    state.chunk_list().len(),
                    state.total_recorded_bytes(),
                    state.total_watch_time().as_secs_f64(),
                )
            }
        }
    }

    fn print_recordings(&self) {
        if self.store.is_empty() {
            println!("no recordings");
            return;
        }
        for (recording_id, metadata) in self.store.list() {
            println!(
                "{recording_id}  {} segments, {} bytes, {:.1}s",
                metadata.segment_count,
                metadata.total_bytes,
                metadata.total_watch_time.as_secs_f64(),
            );
        }
    }

    #[track_caller]
    fn active_recorder(&mut self) -> AppResult<&mut Recorder> {
        self.recorder
            .as_mut()
            .ok_or_else(|| AppError::NoActiveRecording {
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
