/// Capture activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// No capture session exists.
    #[default]
    Idle,
    /// Microphone audio is being buffered.
    Armed,
    /// Session alive, nothing is being buffered.
    Paused,
}

impl CaptureState {
    /// True while a capture session exists (Armed or Paused).
    pub fn is_active(self) -> bool {
        self != CaptureState::Idle
    }
}

/// Playback activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing is playing.
    #[default]
    Idle,
    /// Chunks are being written to the output device.
    Playing,
    /// Output held open, read position kept.
    Paused,
}

impl PlaybackState {
    /// True while a playback session exists (Playing or Paused).
    pub fn is_active(self) -> bool {
        self != PlaybackState::Idle
    }
}
