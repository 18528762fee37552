//! Contract between the session controller and whatever draws the UI.
//!
//! The controller never touches widgets. It asks the adapter modal
//! questions synchronously and pushes [`RecorderEvent`]s for repainting.
//! Events may arrive from background workers, so implementations must be
//! `Send + Sync` and must not call back into the controller.

use crate::session::{CaptureState, ElapsedTime, PlaybackState};

/// State-change notifications pushed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// Recording timer advanced (or was reset to zero).
    ElapsedTime(ElapsedTime),
    /// Capture moved between Idle, Armed and Paused.
    CaptureStateChanged(CaptureState),
    /// Playback moved between Idle, Playing and Paused.
    PlaybackStateChanged {
        /// New playback state.
        state: PlaybackState,
        /// Recording being played, `None` once idle.
        recording: Option<String>,
    },
    /// Recording list changed, newest first.
    RecordingsChanged(Vec<String>),
    /// Active selection changed.
    SelectionChanged(Option<String>),
    /// A title or rename was refused; show inline and prompt again.
    InputRejected(String),
    /// The microphone failed mid-capture. The capture is paused and what
    /// was recorded so far can still be saved.
    DeviceFailed(String),
}

/// Presentation layer as seen from the controller.
pub trait PresentationAdapter: Send + Sync {
    /// Ask a yes/no question. Blocks until answered.
    fn confirm(&self, prompt: &str) -> bool;

    /// Ask for a title for a finished recording.
    ///
    /// An empty string means the user cancelled.
    fn prompt_title(&self, existing: &[String]) -> String;

    /// Ask for a new name for `current`.
    ///
    /// An empty string means cancelled; returning `current` is a no-op.
    fn prompt_rename(&self, current: &str) -> String;

    /// Receive a state-change notification.
    fn notify(&self, event: RecorderEvent);
}
