//! Background workers and the flags that steer them.

mod capture;
mod clock;
mod flags;
mod playback;
mod state;

pub use {
    capture::CapturedAudio,
    clock::{ElapsedTime, TICK},
    state::{CaptureState, PlaybackState},
};

pub(crate) use {
    capture::{CaptureSession, CaptureWorker},
    flags::{FlagsSnapshot, SessionFlags},
    playback::PlaybackSession,
};
