use std::{fmt, path::PathBuf};

use error_location::ErrorLocation;
use thiserror::Error;

/// Why a proposed recording title was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRejection {
    /// Nothing left after trimming and stripping the extension.
    Empty,
    /// Another recording already uses this identifier.
    Taken(String),
    /// Title exceeds the maximum number of characters.
    TooLong {
        /// Maximum accepted length in characters.
        max: usize,
    },
    /// Title contains a character that cannot appear in a file name.
    ForbiddenCharacter(char),
    /// Title starts with a dot and would become a hidden file.
    LeadingDot,
}

impl fmt::Display for NameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRejection::Empty => write!(f, "enter a file name"),
            NameRejection::Taken(id) => write!(f, "file name taken: {}", id),
            NameRejection::TooLong { max } => write!(f, "title longer than {} characters", max),
            NameRejection::ForbiddenCharacter(c) => write!(f, "character {:?} not allowed", c),
            NameRejection::LeadingDot => write!(f, "title cannot start with '.'"),
        }
    }
}

/// Failure taxonomy shown to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad title or duplicate name; the operation was not applied.
    UserInput,
    /// The target vanished before the command ran.
    NotFound,
    /// Microphone or output device could not be used.
    DeviceUnavailable,
    /// Rename, delete, move or write on disk failed.
    Filesystem,
}

/// Recorder errors with source location tracking.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// Proposed title was rejected.
    #[error("Invalid name: {rejection} {location}")]
    InvalidName {
        /// Reason for the rejection.
        rejection: NameRejection,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Recording no longer present in the store.
    #[error("Recording not found: {id} {location}")]
    NotFound {
        /// Identifier that was looked up.
        id: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Device could not be opened.
    #[error("Audio device unavailable: {reason} {location}")]
    DeviceUnavailable {
        /// Description of the device failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An open stream failed while reading or writing.
    #[error("Audio stream error: {reason} {location}")]
    Device {
        /// Description of the stream failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Filesystem operation failed.
    #[error("Filesystem error on {path:?}: {source} {location}")]
    Filesystem {
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// WAV encoding or decoding failed.
    #[error("WAV codec error on {path:?}: {source} {location}")]
    Codec {
        /// File being encoded or decoded.
        path: PathBuf,
        /// Underlying error from hound.
        #[source]
        source: hound::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A background worker thread panicked.
    #[error("{worker} worker panicked {location}")]
    WorkerPanicked {
        /// Which worker died.
        worker: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl RecorderError {
    /// Classify this error for display and recovery.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecorderError::InvalidName { .. } => ErrorKind::UserInput,
            RecorderError::NotFound { .. } => ErrorKind::NotFound,
            RecorderError::DeviceUnavailable { .. }
            | RecorderError::Device { .. }
            | RecorderError::WorkerPanicked { .. } => ErrorKind::DeviceUnavailable,
            RecorderError::Filesystem { .. } | RecorderError::Codec { .. } => {
                ErrorKind::Filesystem
            }
        }
    }

    /// The rejection behind a user-input error, if that is what this is.
    pub fn rejection(&self) -> Option<&NameRejection> {
        match self {
            RecorderError::InvalidName { rejection, .. } => Some(rejection),
            _ => None,
        }
    }
}

/// Result type alias using [`RecorderError`].
pub type Result<T> = std::result::Result<T, RecorderError>;
