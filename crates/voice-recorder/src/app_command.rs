use crate::AppError;

use std::{panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// A recording named on the command line, by title or list position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Title or file name, e.g. `demo` or `demo.wav`.
    Name(String),
    /// 1-based position in the newest-first listing, unless a recording
    /// carries exactly these digits as its title. `2024.wav` always names.
    Index(usize),
}

impl Target {
    fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(index) if index > 0 => Target::Index(index),
            _ => Target::Name(raw.to_string()),
        }
    }
}

/// Commands typed at the recorder prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Start, pause or resume recording.
    Start,
    /// Discard the recording in progress.
    Reset,
    /// Stop and save the recording in progress.
    Stop,
    /// Toggle playback of the target, or of the selection.
    Play(Option<Target>),
    /// Pause or resume playback.
    Pause,
    /// Rename the target, or the selection.
    Rename(Option<Target>),
    /// Delete the target, or the selection.
    Delete(Option<Target>),
    /// Delete every recording.
    DeleteAll,
    /// Change the selection; no target clears it.
    Select(Option<Target>),
    /// Print the recordings, newest first.
    List,
    /// Print capture and playback state.
    Status,
    /// Print the command summary.
    Help,
    /// Leave the program.
    Quit,
}

/// Shown by `help`.
pub const HELP: &str = "\
commands:
  start              start, pause or resume recording
  reset              discard the current recording
  stop               stop and save the current recording
  play [name|#]      play or stop a recording
  pause              pause or resume playback
  select [name|#]    select a recording (no argument clears)
  rename [name|#]    rename a recording
  delete [name|#]    delete a recording
  delete-all         delete every recording
  list               list recordings, newest first
  status             show recorder state
  help               show this text
  quit               exit";

impl FromStr for AppCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let target = (!rest.is_empty()).then(|| Target::parse(rest));

        let no_argument = |command: AppCommand| {
            if rest.is_empty() {
                Ok(command)
            } else {
                Err(AppError::InvalidCommand {
                    reason: format!("'{}' takes no argument", verb),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "start" | "record" => no_argument(AppCommand::Start),
            "reset" => no_argument(AppCommand::Reset),
            "stop" | "save" => no_argument(AppCommand::Stop),
            "play" => Ok(AppCommand::Play(target)),
            "pause" => no_argument(AppCommand::Pause),
            "rename" => Ok(AppCommand::Rename(target)),
            "delete" | "rm" => Ok(AppCommand::Delete(target)),
            "delete-all" => no_argument(AppCommand::DeleteAll),
            "select" => Ok(AppCommand::Select(target)),
            "list" | "ls" => no_argument(AppCommand::List),
            "status" => no_argument(AppCommand::Status),
            "help" | "?" => no_argument(AppCommand::Help),
            "quit" | "exit" => no_argument(AppCommand::Quit),
            "" => Err(AppError::InvalidCommand {
                reason: "empty input".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            other => Err(AppError::InvalidCommand {
                reason: format!("unknown command '{}', try 'help'", other),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
