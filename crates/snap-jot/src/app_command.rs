use crate::{AppError, AppResult};

use snap_jot_core::RecordingId;

use std::{panic::Location, str::FromStr};

use error_location::ErrorLocation;
use uuid::Uuid;

/// Commands read from the console and sent to the main application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Start a new recording.
    Start,
    /// Pause the active recording.
    Pause,
    /// Resume the active recording.
    Resume,
    /// Stop the active recording and store it.
    Stop,
    /// Print the recorder state.
    Status,
    /// List stored recordings.
    List,
    /// Open the detail view of a stored recording.
    Show {
        /// Recording to show.
        recording_id: RecordingId,
    },
    /// Request application shutdown.
    Shutdown,
}

impl AppCommand {
    /// One-line usage summary for the console.
    pub const HELP: &'static str =
        "commands: start | pause | resume | stop | status | list | show <id> | quit";
}

impl FromStr for AppCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(line: &str) -> AppResult<Self> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();

        let command = match (verb.as_str(), words.next()) {
            ("start", None) => AppCommand::Start,
            ("pause", None) => AppCommand::Pause,
            ("resume", None) => AppCommand::Resume,
            ("stop", None) => AppCommand::Stop,
            ("status", None) => AppCommand::Status,
            ("list", None) => AppCommand::List,
            ("quit" | "exit" | "q", None) => AppCommand::Shutdown,
            ("show", Some(id)) => match Uuid::parse_str(id) {
                Ok(uuid) => AppCommand::Show {
                    recording_id: RecordingId::from(uuid),
                },
                Err(_) => return Err(unknown(line)),
            },
            _ => return Err(unknown(line)),
        };

        if words.next().is_some() {
            return Err(unknown(line));
        }

        Ok(command)
    }
}

#[track_caller]
fn unknown(line: &str) -> AppError {
    AppError::UnknownCommand {
        input: line.trim().to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
