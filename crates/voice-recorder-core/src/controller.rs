//! The state machine behind every user command.
//!
//! [`SessionController`] owns the capture/playback flags, the recording
//! list and the selection. Commands run on the caller's thread; only the
//! reset confirmation, the save-title prompt and the rename/delete prompts
//! block it, by calling back into the [`PresentationAdapter`].

use crate::{
    CoreResult, ErrorKind, RecorderError,
    device::AudioDevice,
    error::NameRejection,
    presentation::{PresentationAdapter, RecorderEvent},
    session::{
        CaptureSession, CaptureState, CaptureWorker, ElapsedTime, PlaybackSession, PlaybackState, SessionFlags,
    },
    store::{RecordingSet, RecordingStore, recording_id, validate_title},
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Frames per chunk when the caller does not choose.
pub const DEFAULT_CHUNK_FRAMES: usize = 1024;

const RESET_PROMPT: &str = "Reset recording?";
const DELETE_ALL_PROMPT: &str = "Are you sure you want to delete all recordings?";

/// Tuning for the capture and playback workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Frames moved per blocking device read or write.
    pub chunk_frames: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            chunk_frames: DEFAULT_CHUNK_FRAMES,
        }
    }
}

/// How a stop request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was recording.
    NotRecording,
    /// Title prompt cancelled; capture stays paused.
    Cancelled,
    /// Capture ended with no audio; nothing was written.
    Empty,
    /// Recording persisted under this identifier.
    Saved(String),
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderStatus {
    /// Capture state.
    pub capture: CaptureState,
    /// Recording timer.
    pub elapsed: ElapsedTime,
    /// Playback state.
    pub playback: PlaybackState,
    /// Recording being played, if any.
    pub playing: Option<String>,
    /// Active list selection.
    pub selection: Option<String>,
    /// Number of stored recordings.
    pub recordings: usize,
}

/// Binds user commands to capture/playback sessions and the recording store.
pub struct SessionController {
    store: RecordingStore,
    device: Arc<dyn AudioDevice>,
    adapter: Arc<dyn PresentationAdapter>,
    options: SessionOptions,
    flags: SessionFlags,
    recordings: RecordingSet,
    selection: Option<String>,
    capture: Option<CaptureSession>,
    playback: Option<PlaybackSession>,
}

impl SessionController {
    /// Create a controller over `store`, loading the current recordings.
    #[track_caller]
    #[instrument(skip(store, device, adapter), fields(dir = ?store.dir()))]
    pub fn new(
        store: RecordingStore,
        device: Arc<dyn AudioDevice>,
        adapter: Arc<dyn PresentationAdapter>,
        options: SessionOptions,
    ) -> CoreResult<Self> {
        let recordings = store.list()?;

        info!(count = recordings.len(), "SessionController initialized");

        let controller = Self {
            store,
            device,
            adapter,
            options,
            flags: SessionFlags::new(),
            recordings,
            selection: None,
            capture: None,
            playback: None,
        };
        controller.notify_recordings();

        Ok(controller)
    }

    /// Capture state.
    pub fn capture_state(&self) -> CaptureState {
        self.flags.capture_state()
    }

    /// Playback state.
    pub fn playback_state(&self) -> PlaybackState {
        self.flags.playback_state()
    }

    /// Recording timer.
    pub fn elapsed(&self) -> ElapsedTime {
        self.flags.elapsed()
    }

    /// Recording currently loaded for playback.
    pub fn active_playback(&self) -> Option<String> {
        self.flags.active_playback()
    }

    /// Stored recordings, oldest first.
    pub fn recordings(&self) -> &RecordingSet {
        &self.recordings
    }

    /// Active list selection.
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// The backing store.
    pub fn store(&self) -> &RecordingStore {
        &self.store
    }

    /// Consistent view of state for display.
    pub fn status(&self) -> RecorderStatus {
        let snapshot = self.flags.snapshot();
        RecorderStatus {
            capture: snapshot.capture,
            elapsed: snapshot.elapsed,
            playback: snapshot.playback,
            playing: snapshot.playback_recording,
            selection: self.selection.clone(),
            recordings: self.recordings.len(),
        }
    }

    // --- recording ---------------------------------------------------------

    /// Start, pause or resume capture.
    ///
    /// Any playback is stopped first. The capture workers are spawned only
    /// on the Idle→Armed transition; later calls toggle Armed↔Paused.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start_recording(&mut self) -> CoreResult<()> {
        if self.flags.playback_state().is_active() {
            self.stop_playback_session();
        }

        let next = match self.flags.capture_state() {
            CaptureState::Idle => {
                match CaptureSession::start(&self.capture_worker(), &self.flags) {
                    Ok(session) => self.capture = Some(session),
                    Err(e) => {
                        error!(error = ?e, "Failed to start capture");
                        self.notify(RecorderEvent::CaptureStateChanged(CaptureState::Idle));
                        return Err(e);
                    }
                }
                CaptureState::Armed
            }
            CaptureState::Armed => {
                self.flags.set_capture_state(CaptureState::Paused);
                CaptureState::Paused
            }
            CaptureState::Paused => {
                let worker = self.capture_worker();
                if let Some(session) = self.capture.as_mut()
                    && session.is_interrupted()
                    && let Err(e) = session.reopen(&worker, &self.flags)
                {
                    error!(error = ?e, "Failed to reopen microphone, capture stays paused");
                    return Err(e);
                }
                self.flags.set_capture_state(CaptureState::Armed);
                CaptureState::Armed
            }
        };

        info!(state = ?next, "Capture state changed");
        self.notify(RecorderEvent::CaptureStateChanged(next));

        Ok(())
    }

    /// Discard the capture in progress after confirmation.
    ///
    /// Returns `true` if the capture was discarded. Declining leaves the
    /// capture paused.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn reset_recording(&mut self) -> CoreResult<bool> {
        if !self.flags.capture_state().is_active() {
            return Ok(false);
        }

        self.pause_capture();

        if !self.adapter.confirm(RESET_PROMPT) {
            debug!("Reset declined, capture stays paused");
            return Ok(false);
        }

        self.end_capture()?;
        info!("Recording reset");

        Ok(true)
    }

    /// Stop capture and save it under a title from the adapter.
    ///
    /// The capture is paused while the title is asked for and stays paused
    /// until the file is in the store, so cancelling or any failure keeps
    /// the audio. Titles taken in memory or on disk are reported through
    /// [`RecorderEvent::InputRejected`] and the prompt is repeated. An empty
    /// capture ends without asking for a title.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop_recording(&mut self) -> CoreResult<StopOutcome> {
        if !self.flags.capture_state().is_active() {
            return Ok(StopOutcome::NotRecording);
        }

        self.pause_capture();

        let captured = self
            .capture
            .as_ref()
            .map(|session| session.snapshot(&self.flags))
            .filter(|audio| !audio.is_empty());
        let Some(captured) = captured else {
            warn!("Capture produced no audio, nothing saved");
            self.end_capture()?;
            return Ok(StopOutcome::Empty);
        };

        // Pick up files that appeared since the last listing.
        self.resync();

        let id = loop {
            let raw = self.adapter.prompt_title(self.recordings.ids());
            if raw.trim().is_empty() {
                debug!("Save cancelled, capture stays paused");
                return Ok(StopOutcome::Cancelled);
            }
            let id = match validate_title(&raw, &self.recordings) {
                Ok(id) => id,
                Err(rejection) => {
                    self.reject(rejection);
                    continue;
                }
            };
            if self.store.path_of(&id).exists() {
                self.reject(NameRejection::Taken(id));
                self.resync();
                continue;
            }

            match captured.finalize(&self.store, &self.recordings, &id) {
                Ok(_) => break id,
                Err(RecorderError::InvalidName { rejection, .. }) => {
                    self.reject(rejection);
                    self.resync();
                }
                Err(e) => {
                    error!(id = %id, error = ?e, "Failed to save recording, capture stays paused");
                    self.resync();
                    return Err(e);
                }
            }
        };

        info!(
            id = %id,
            duration_ms = captured.duration().as_millis(),
            "Recording saved"
        );

        self.end_capture()?;
        self.recordings.push(id.clone());
        self.refresh()?;

        Ok(StopOutcome::Saved(id))
    }

    // --- playback ----------------------------------------------------------

    /// Toggle playback: stops whatever is playing, otherwise plays `id`.
    ///
    /// Ignored while capturing. An unknown `id` is ignored.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn play_recording(&mut self, id: &str) -> CoreResult<()> {
        if self.flags.capture_state().is_active() {
            return Ok(());
        }

        if self.flags.playback_state().is_active() {
            self.stop_playback_session();
            return Ok(());
        }

        if !self.recordings.contains(id) {
            debug!(id = id, "Play ignored, recording not in list");
            return Ok(());
        }

        // A worker that finished on its own still needs joining.
        if let Some(finished) = self.playback.take() {
            finished.join();
        }

        let session = PlaybackSession::start(
            Arc::clone(&self.device),
            &self.flags,
            Arc::clone(&self.adapter),
            id,
            self.store.path_of(id),
            self.options.chunk_frames,
        );

        match session {
            Ok(session) => {
                self.playback = Some(session);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(id = id, "Recording already gone");
                self.resync();
                Ok(())
            }
            Err(e) => {
                error!(id = id, error = ?e, "Failed to start playback");
                Err(e)
            }
        }
    }

    /// Play the selected recording, or stop playback.
    #[track_caller]
    pub fn play_selected(&mut self) -> CoreResult<()> {
        if self.flags.playback_state().is_active() {
            self.stop_playback_session();
            return Ok(());
        }
        match self.selection.clone() {
            Some(id) => self.play_recording(&id),
            None => Ok(()),
        }
    }

    /// Toggle Playing↔Paused. The worker keeps the device and read position.
    #[instrument(skip(self))]
    pub fn pause_playback(&mut self) {
        if self.flags.capture_state().is_active() {
            return;
        }

        let next = match self.flags.playback_state() {
            PlaybackState::Idle => return,
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
        };
        self.flags.set_playback_state(next);

        info!(state = ?next, "Playback state changed");
        self.notify(RecorderEvent::PlaybackStateChanged {
            state: next,
            recording: self.flags.active_playback(),
        });
    }

    // --- library -----------------------------------------------------------

    /// Change the active selection. Unknown identifiers clear it.
    #[instrument(skip(self))]
    pub fn select(&mut self, id: Option<&str>) {
        let next = id
            .filter(|id| self.recordings.contains(id))
            .map(str::to_string);

        if next.is_none() && id.is_some() {
            debug!(id = ?id, "Selection not in list, clearing");
        }

        if next != self.selection {
            self.selection = next;
            self.notify(RecorderEvent::SelectionChanged(self.selection.clone()));
        }
    }

    /// Rename `old` to the title in `new`.
    ///
    /// Ignored while capturing or when nothing is selected. `new` is
    /// normalised to `<title>.wav`; the same name is a no-op. Playback of
    /// `old` is stopped before the file moves.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn rename_recording(&mut self, old: &str, new: &str) -> CoreResult<()> {
        if self.flags.capture_state().is_active() {
            return Ok(());
        }

        if self.selection.is_none() || recording_id(new) == old {
            return Ok(());
        }

        if !self.recordings.contains(old) {
            debug!(id = old, "Rename ignored, recording not in list");
            return Ok(());
        }

        let new_id =
            validate_title(new, &self.recordings).map_err(|rejection| {
                RecorderError::InvalidName {
                    rejection,
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

        if self.flags.active_playback().as_deref() == Some(old) {
            self.stop_playback_session();
        }

        match self.store.rename(old, &new_id) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(id = old, "Recording already gone");
                self.resync();
                return Ok(());
            }
            Err(e) => {
                error!(from = old, to = %new_id, error = ?e, "Rename failed");
                self.resync();
                return Err(e);
            }
        }

        self.recordings.rename(old, &new_id);
        self.notify_recordings();

        if self.selection.as_deref() == Some(old) {
            self.selection = Some(new_id.clone());
            self.notify(RecorderEvent::SelectionChanged(self.selection.clone()));
        }

        Ok(())
    }

    /// Prompt for a new name for the selection and apply it.
    ///
    /// Rejected names are reported and the prompt repeats; an empty answer
    /// cancels.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn rename_selected(&mut self) -> CoreResult<()> {
        if self.flags.capture_state().is_active() {
            return Ok(());
        }
        let Some(current) = self.selection.clone() else {
            return Ok(());
        };

        loop {
            let raw = self.adapter.prompt_rename(&current);
            if raw.trim().is_empty() {
                return Ok(());
            }
            match self.rename_recording(&current, &raw) {
                Err(e) if e.kind() == ErrorKind::UserInput => match e.rejection() {
                    Some(rejection) => self.reject(rejection.clone()),
                    None => return Err(e),
                },
                other => return other,
            }
        }
    }

    /// Delete one recording, stopping its playback first.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn delete_recording(&mut self, id: &str) -> CoreResult<()> {
        if self.flags.capture_state().is_active() || self.recordings.is_empty() {
            return Ok(());
        }

        if !self.recordings.contains(id) {
            debug!(id = id, "Delete ignored, recording not in list");
            return Ok(());
        }

        if self.flags.active_playback().as_deref() == Some(id) {
            self.stop_playback_session();
        }

        match self.store.delete(id) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(id = id, "Recording already gone");
                self.resync();
                return Ok(());
            }
            Err(e) => {
                error!(id = id, error = ?e, "Delete failed");
                self.resync();
                return Err(e);
            }
        }

        self.recordings.remove(id);
        self.notify_recordings();

        if self.selection.as_deref() == Some(id) {
            self.selection = None;
            self.notify(RecorderEvent::SelectionChanged(None));
        }

        Ok(())
    }

    /// Ask for confirmation, then delete the selected recording.
    #[track_caller]
    pub fn delete_selected(&mut self) -> CoreResult<()> {
        if self.flags.capture_state().is_active() {
            return Ok(());
        }
        let Some(id) = self.selection.clone() else {
            return Ok(());
        };

        if self
            .adapter
            .confirm(&format!("Delete the following file?\n>{}", id))
        {
            self.delete_recording(&id)
        } else {
            Ok(())
        }
    }

    /// Delete every recording. Playback and selection are cleared.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn delete_all_recordings(&mut self) -> CoreResult<()> {
        if self.flags.capture_state().is_active() || self.recordings.is_empty() {
            return Ok(());
        }

        self.stop_playback_session();

        let ids = self.recordings.ids().to_vec();
        let result = self.store.delete_many(ids.iter().map(String::as_str));

        self.selection = None;
        self.notify(RecorderEvent::SelectionChanged(None));

        match result {
            Ok(removed) => {
                info!(removed = removed, "All recordings deleted");
                self.recordings.clear();
                self.notify_recordings();
                Ok(())
            }
            Err(e) => {
                error!(error = ?e, "Delete all failed");
                self.resync();
                Err(e)
            }
        }
    }

    /// Ask for confirmation, then delete every recording.
    #[track_caller]
    pub fn delete_all(&mut self) -> CoreResult<()> {
        if self.flags.capture_state().is_active() || self.recordings.is_empty() {
            return Ok(());
        }

        if self.adapter.confirm(DELETE_ALL_PROMPT) {
            self.delete_all_recordings()
        } else {
            Ok(())
        }
    }

    /// Re-read the recordings directory.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn refresh(&mut self) -> CoreResult<()> {
        self.recordings = self.store.list()?;

        if let Some(selected) = self.selection.as_deref()
            && !self.recordings.contains(selected)
        {
            self.selection = None;
            self.notify(RecorderEvent::SelectionChanged(None));
        }

        self.notify_recordings();
        Ok(())
    }

    // --- internals ---------------------------------------------------------

    /// Release the capture session and return to Idle. Its buffer is dropped.
    fn end_capture(&mut self) -> CoreResult<()> {
        let ended = match self.capture.take() {
            Some(session) => session.cancel(&self.flags),
            None => Ok(()),
        };
        self.flags.clear_capture();
        self.notify(RecorderEvent::CaptureStateChanged(CaptureState::Idle));
        self.notify(RecorderEvent::ElapsedTime(ElapsedTime::ZERO));
        ended
    }

    fn capture_worker(&self) -> CaptureWorker {
        CaptureWorker {
            device: Arc::clone(&self.device),
            adapter: Arc::clone(&self.adapter),
            chunk_frames: self.options.chunk_frames,
        }
    }

    fn pause_capture(&mut self) {
        if self.flags.capture_state() == CaptureState::Armed {
            self.flags.set_capture_state(CaptureState::Paused);
            self.notify(RecorderEvent::CaptureStateChanged(CaptureState::Paused));
        }
    }

    fn stop_playback_session(&mut self) {
        let stopped = self.flags.stop_playback();
        if let Some(session) = self.playback.take() {
            debug!(recording = session.recording(), "Joining playback worker");
            session.join();
        }
        if stopped.is_some() {
            info!(recording = ?stopped, "Playback stopped");
            self.notify(RecorderEvent::PlaybackStateChanged {
                state: PlaybackState::Idle,
                recording: None,
            });
        }
    }

    /// Best-effort re-list after a failed filesystem change.
    fn resync(&mut self) {
        if let Err(e) = self.refresh() {
            warn!(error = ?e, "Failed to re-list recordings");
        }
    }

    fn reject(&self, rejection: NameRejection) {
        debug!(reason = %rejection, "Name rejected");
        self.notify(RecorderEvent::InputRejected(rejection.to_string()));
    }

    fn notify_recordings(&self) {
        self.notify(RecorderEvent::RecordingsChanged(
            self.recordings.newest_first(),
        ));
    }

    fn notify(&self, event: RecorderEvent) {
        self.adapter.notify(event);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(session) = self.capture.take()
            && let Err(e) = session.cancel(&self.flags)
        {
            warn!(error = ?e, "Capture did not shut down cleanly");
        }
        self.stop_playback_session();
    }
}
