//! Console command reader.
//!
//! Reads stdin line by line on a blocking task, parses each line into an
//! [`AppCommand`] and forwards it to the main application.

use crate::{AppCommand, AppError, AppResult};

use std::{io::BufRead, panic::Location, time::Duration};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Forwards console commands to the application.
pub struct ConsoleHandler {
    command_tx: mpsc::Sender<AppCommand>,
}

impl ConsoleHandler {
    /// Create a handler sending to `command_tx`.
    pub fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Run the console loop until shutdown or end of input.
    ///
    /// End of input is treated as a shutdown request.
    #[instrument(skip_all)]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let (line_tx, mut line_rx) = mpsc::channel::<String>(32);

        // Shutdown: once line_rx is dropped the next blocking_send fails.
        // A task parked in read_line is only reclaimed on process exit.
        let handle = tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });

        println!("{}", AppCommand::HELP);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Console handler shutting down");
                    break;
                }
                line = line_rx.recv() => match line {
                    Some(line) => self.handle_line(&line).await?,
                    None => {
                        info!("Console input closed");
                        self.send(AppCommand::Shutdown).await?;
                        break;
                    }
                },
            }
        }

        drop(line_rx);

        match tokio::time::timeout(Duration::from_millis(100), handle).await {
            Ok(Ok(())) => debug!("Console reader stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Console reader task panicked"),
            Err(_) => debug!("Console reader still blocked on stdin, will be cleaned up on exit"),
        }

        Ok(())
    }

    /// Parse one console line and forward it.
    ///
    /// Blank lines are ignored. Unparseable lines are reported to the user
    /// and do not end the loop.
    #[instrument(skip(self))]
    pub async fn handle_line(&self, line: &str) -> AppResult<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        match line.parse::<AppCommand>() {
            Ok(command) => self.send(command).await,
            Err(e) => {
                warn!(error = %e, "Rejected console input");
                eprintln!("unknown command: {}\n{}", line.trim(), AppCommand::HELP);
                Ok(())
            }
        }
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        debug!(command = ?command, "Forwarding console command");
        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send console command: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
