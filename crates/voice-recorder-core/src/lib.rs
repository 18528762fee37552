//! Voice Recorder Core Library
//!
//! Capture, playback and recording-library management for a desktop voice
//! recorder, driven through a [`SessionController`] and rendered by any
//! [`PresentationAdapter`].
//!
//! # Example
//!
//! ```no_run
//! use voice_recorder_core::{
//!     CoreResult, CpalAudioDevice, PresentationAdapter, RecorderEvent, RecordingStore,
//!     SessionController, SessionOptions, StopOutcome,
//! };
//!
//! use std::{sync::Arc, thread::sleep, time::Duration};
//!
//! struct Autosave;
//!
//! impl PresentationAdapter for Autosave {
//!     fn confirm(&self, _prompt: &str) -> bool {
//!         true
//!     }
//!     fn prompt_title(&self, _existing: &[String]) -> String {
//!         "memo".to_string()
//!     }
//!     fn prompt_rename(&self, _current: &str) -> String {
//!         String::new()
//!     }
//!     fn notify(&self, event: RecorderEvent) {
//!         println!("{:?}", event);
//!     }
//! }
//!
//! fn main() -> CoreResult<()> {
//!     let store = RecordingStore::new("audio_recordings", "audio_recordings/.staging");
//!     let mut controller = SessionController::new(
//!         store,
//!         Arc::new(CpalAudioDevice::new()),
//!         Arc::new(Autosave),
//!         SessionOptions::default(),
//!     )?;
//!
//!     controller.start_recording()?;
//!     sleep(Duration::from_secs(3));
//!     if let StopOutcome::Saved(id) = controller.stop_recording()? {
//!         controller.play_recording(&id)?;
//!     }
//!     Ok(())
//! }
//! ```

mod codec;
mod controller;
mod device;
mod error;
mod presentation;
mod session;
mod store;

pub use {
    codec::{WavFileReader, write_wav},
    controller::{
        DEFAULT_CHUNK_FRAMES, RecorderStatus, SessionController, SessionOptions, StopOutcome,
    },
    device::{AudioDevice, CpalAudioDevice, InputStream, OutputStream, StreamFormat},
    error::{ErrorKind, NameRejection, RecorderError, Result as CoreResult},
    presentation::{PresentationAdapter, RecorderEvent},
    session::{CaptureState, CapturedAudio, ElapsedTime, PlaybackState, TICK},
    store::{
        MAX_TITLE_CHARS, RECORDING_EXTENSION, RecordingSet, RecordingStore, StagedFile,
        recording_id, title_of, validate_title,
    },
};

#[cfg(test)]
mod tests;
