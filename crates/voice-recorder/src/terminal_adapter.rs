//! Line-oriented terminal front-end for the session controller.
//!
//! Prompts read from the same stdin line channel as the command loop. They
//! are only ever called from inside a blocking command task, while the
//! command loop is waiting on that task, so the two never compete for a line.

use voice_recorder_core::{
    CaptureState, PlaybackState, PresentationAdapter, RecorderEvent,
};

use std::{
    io::{self, Write},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

/// Shared receiver of stdin lines.
pub type LineSource = Arc<Mutex<mpsc::Receiver<String>>>;

const NO_SECOND: u64 = u64::MAX;

/// [`PresentationAdapter`] that asks questions on stdout and reads answers
/// from the stdin line channel.
pub struct TerminalAdapter {
    lines: LineSource,
    events: mpsc::UnboundedSender<RecorderEvent>,
    confirm_destructive: bool,
    last_second: AtomicU64,
}

impl TerminalAdapter {
    /// Create an adapter. With `confirm_destructive` off, confirmations
    /// are accepted without asking.
    pub fn new(
        lines: LineSource,
        events: mpsc::UnboundedSender<RecorderEvent>,
        confirm_destructive: bool,
    ) -> Self {
        Self {
            lines,
            events,
            confirm_destructive,
            last_second: AtomicU64::new(NO_SECOND),
        }
    }

    /// Print `prompt` and block for the next line. A closed input counts
    /// as an empty answer.
    fn ask(&self, prompt: &str) -> String {
        print!("{}", prompt);
        let _ = io::stdout().flush();

        match self.lines.blocking_lock().blocking_recv() {
            Some(line) => line.trim().to_string(),
            None => {
                debug!("Input closed while prompting");
                String::new()
            }
        }
    }

    /// Timer updates are forwarded once per whole second, plus every reset.
    fn should_forward(&self, event: &RecorderEvent) -> bool {
        match event {
            RecorderEvent::ElapsedTime(elapsed) => {
                let second = elapsed.as_hundredths() / 100;
                if elapsed.as_hundredths() == 0 {
                    self.last_second.store(NO_SECOND, Ordering::Relaxed);
                    return false;
                }
                self.last_second.swap(second, Ordering::Relaxed) != second
            }
            _ => true,
        }
    }
}

impl PresentationAdapter for TerminalAdapter {
    fn confirm(&self, prompt: &str) -> bool {
        if !self.confirm_destructive {
            debug!(prompt = prompt, "Confirmation auto-accepted");
            return true;
        }
        let answer = self.ask(&format!("{} [y/N] ", prompt));
        matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
    }

    fn prompt_title(&self, existing: &[String]) -> String {
        debug!(existing = existing.len(), "Prompting for title");
        self.ask("Save recording as (empty to cancel): ")
    }

    fn prompt_rename(&self, current: &str) -> String {
        self.ask(&format!("Rename {} to (empty to cancel): ", current))
    }

    fn notify(&self, event: RecorderEvent) {
        if !self.should_forward(&event) {
            return;
        }
        if self.events.send(event).is_err() {
            warn!("Event receiver dropped");
        }
    }
}

/// Text shown for an event, if any.
pub fn render(event: &RecorderEvent) -> Option<String> {
    let text = match event {
        RecorderEvent::ElapsedTime(elapsed) => format!("[rec] {}", elapsed),
        RecorderEvent::CaptureStateChanged(CaptureState::Armed) => {
            "Recording (start to pause, stop to save)".to_string()
        }
        RecorderEvent::CaptureStateChanged(CaptureState::Paused) => {
            "Recording paused (start to resume)".to_string()
        }
        RecorderEvent::CaptureStateChanged(CaptureState::Idle) => "Recorder idle".to_string(),
        RecorderEvent::PlaybackStateChanged {
            state: PlaybackState::Playing,
            recording: Some(name),
        } => format!("Playing: {}", name),
        RecorderEvent::PlaybackStateChanged {
            state: PlaybackState::Paused,
            recording: Some(name),
        } => format!("Paused: {}", name),
        RecorderEvent::PlaybackStateChanged { state, .. } => {
            if state.is_active() {
                return None;
            }
            "Playback stopped".to_string()
        }
        RecorderEvent::RecordingsChanged(names) => render_list(names),
        RecorderEvent::SelectionChanged(Some(name)) => format!("Selected: {}", name),
        RecorderEvent::SelectionChanged(None) => "Selection cleared".to_string(),
        RecorderEvent::InputRejected(reason) => format!("! {}", reason),
        RecorderEvent::DeviceFailed(reason) => format!(
            "! Microphone stopped: {} (stop to save, start to retry)",
            reason
        ),
    };
    Some(text)
}

/// Numbered listing, newest first.
pub fn render_list(names: &[String]) -> String {
    if names.is_empty() {
        return "No recordings".to_string();
    }
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{:>3}. {}", i + 1, name))
        .collect::<Vec<_>>()
        .join("\n")
}
