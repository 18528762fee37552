use crate::session::{CaptureState, ElapsedTime, PlaybackState};

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use tracing::error;
use uuid::Uuid;

/// State shared between the controller and its background workers.
///
/// The controller drives capture and playback state. Workers read
/// snapshots, block on the condvar while paused, and only write through
/// their own session id: the elapsed clock, the parked marker, a pause
/// after a microphone failure, or the playback completion signal. A worker
/// whose id no longer matches sees `Idle`.
#[derive(Clone, Default)]
pub(crate) struct SessionFlags {
    inner: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    flags: Mutex<Flags>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct Flags {
    capture: CaptureState,
    capture_session: Option<Uuid>,
    cancel_pending: bool,
    capture_parked: bool,
    elapsed: ElapsedTime,
    playback: PlaybackState,
    playback_session: Option<Uuid>,
    playback_recording: Option<String>,
}

/// Consistent view of all flags at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlagsSnapshot {
    pub(crate) capture: CaptureState,
    pub(crate) elapsed: ElapsedTime,
    pub(crate) playback: PlaybackState,
    pub(crate) playback_recording: Option<String>,
}

impl SessionFlags {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Flags> {
        self.inner.flags.lock().unwrap_or_else(|e| {
            error!("Session flags lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, Flags>) -> MutexGuard<'a, Flags> {
        self.inner
            .changed
            .wait(guard)
            .unwrap_or_else(|e| e.into_inner())
    }

    fn changed(&self) {
        self.inner.changed.notify_all();
    }

    pub(crate) fn snapshot(&self) -> FlagsSnapshot {
        let flags = self.lock();
        FlagsSnapshot {
            capture: flags.capture,
            elapsed: flags.elapsed,
            playback: flags.playback,
            playback_recording: flags.playback_recording.clone(),
        }
    }

    pub(crate) fn capture_state(&self) -> CaptureState {
        self.lock().capture
    }

    pub(crate) fn playback_state(&self) -> PlaybackState {
        self.lock().playback
    }

    pub(crate) fn elapsed(&self) -> ElapsedTime {
        self.lock().elapsed
    }

    pub(crate) fn active_playback(&self) -> Option<String> {
        self.lock().playback_recording.clone()
    }

    // --- capture -----------------------------------------------------------

    pub(crate) fn begin_capture(&self, session: Uuid) {
        let mut flags = self.lock();
        flags.capture = CaptureState::Armed;
        flags.capture_session = Some(session);
        flags.cancel_pending = false;
        flags.capture_parked = false;
        flags.elapsed = ElapsedTime::ZERO;
        drop(flags);
        self.changed();
    }

    /// Toggle between Armed and Paused for a live session.
    pub(crate) fn set_capture_state(&self, state: CaptureState) {
        let mut flags = self.lock();
        if flags.capture_session.is_some() && state.is_active() {
            flags.capture = state;
        }
        drop(flags);
        self.changed();
    }

    /// A capture worker for `session` is about to run.
    pub(crate) fn worker_started(&self, session: Uuid) {
        let mut flags = self.lock();
        if flags.capture_session == Some(session) {
            flags.capture_parked = false;
        }
    }

    /// The worker for `session` stopped touching its buffer, either because
    /// it is waiting out a pause or because it exited.
    pub(crate) fn park_capture(&self, session: Uuid) {
        let mut flags = self.lock();
        if flags.capture_session == Some(session) {
            flags.capture_parked = true;
        }
        drop(flags);
        self.changed();
    }

    /// Block until the worker for a paused `session` has parked.
    pub(crate) fn wait_capture_parked(&self, session: Uuid) {
        let mut flags = self.lock();
        while flags.capture_session == Some(session)
            && flags.capture == CaptureState::Paused
            && !flags.capture_parked
        {
            flags = self.wait(flags);
        }
    }

    /// Pause `session` from its own worker after the microphone failed.
    ///
    /// Returns `false` if the session was no longer Armed.
    pub(crate) fn interrupt_capture(&self, session: Uuid) -> bool {
        let mut flags = self.lock();
        if flags.capture_session != Some(session) || flags.capture != CaptureState::Armed {
            return false;
        }
        flags.capture = CaptureState::Paused;
        drop(flags);
        self.changed();
        true
    }

    /// Move to Idle. With `discard` the capture worker drops its buffer.
    pub(crate) fn end_capture(&self, discard: bool) {
        let mut flags = self.lock();
        flags.capture = CaptureState::Idle;
        flags.cancel_pending = discard;
        flags.elapsed = ElapsedTime::ZERO;
        drop(flags);
        self.changed();
    }

    /// Forget a session whose worker has been joined.
    pub(crate) fn clear_capture(&self) {
        let mut flags = self.lock();
        flags.capture = CaptureState::Idle;
        flags.capture_session = None;
        flags.cancel_pending = false;
        flags.capture_parked = false;
        drop(flags);
        self.changed();
    }

    /// Capture state as seen by the worker owning `session`.
    pub(crate) fn capture_state_for(&self, session: Uuid) -> CaptureState {
        let flags = self.lock();
        if flags.capture_session == Some(session) {
            flags.capture
        } else {
            CaptureState::Idle
        }
    }

    /// Block while `session` is paused. Returns the state that ended the wait.
    pub(crate) fn wait_while_capture_paused(&self, session: Uuid) -> CaptureState {
        let mut flags = self.lock();
        loop {
            if flags.capture_session != Some(session) {
                return CaptureState::Idle;
            }
            if flags.capture != CaptureState::Paused {
                return flags.capture;
            }
            flags = self.wait(flags);
        }
    }

    /// [`SessionFlags::wait_while_capture_paused`] for the capture worker,
    /// which counts as parked for the duration of the wait.
    pub(crate) fn park_while_capture_paused(&self, session: Uuid) -> CaptureState {
        let mut flags = self.lock();
        if flags.capture_session == Some(session) {
            flags.capture_parked = true;
            self.changed();
        }
        loop {
            if flags.capture_session != Some(session) {
                return CaptureState::Idle;
            }
            if flags.capture != CaptureState::Paused {
                flags.capture_parked = false;
                return flags.capture;
            }
            flags = self.wait(flags);
        }
    }

    /// Consume the cancel request for `session`.
    pub(crate) fn take_cancel(&self, session: Uuid) -> bool {
        let mut flags = self.lock();
        if flags.capture_session != Some(session) {
            return true;
        }
        std::mem::take(&mut flags.cancel_pending)
    }

    /// Advance the clock if `session` is Armed.
    pub(crate) fn tick(&self, session: Uuid) -> Option<ElapsedTime> {
        let mut flags = self.lock();
        if flags.capture_session == Some(session) && flags.capture == CaptureState::Armed {
            flags.elapsed = flags.elapsed.advanced();
            Some(flags.elapsed)
        } else {
            None
        }
    }

    // --- playback ----------------------------------------------------------

    pub(crate) fn begin_playback(&self, session: Uuid, recording: &str) {
        let mut flags = self.lock();
        flags.playback = PlaybackState::Playing;
        flags.playback_session = Some(session);
        flags.playback_recording = Some(recording.to_string());
        drop(flags);
        self.changed();
    }

    /// Toggle between Playing and Paused for a live session.
    pub(crate) fn set_playback_state(&self, state: PlaybackState) {
        let mut flags = self.lock();
        if flags.playback_session.is_some() && state.is_active() {
            flags.playback = state;
        }
        drop(flags);
        self.changed();
    }

    /// Force playback to Idle. Returns the recording that was active.
    pub(crate) fn stop_playback(&self) -> Option<String> {
        let mut flags = self.lock();
        flags.playback = PlaybackState::Idle;
        flags.playback_session = None;
        let recording = flags.playback_recording.take();
        drop(flags);
        self.changed();
        recording
    }

    /// Completion signal from the worker owning `session`.
    ///
    /// Returns `false` if the controller already stopped that session.
    pub(crate) fn finish_playback(&self, session: Uuid) -> bool {
        let mut flags = self.lock();
        if flags.playback_session != Some(session) {
            return false;
        }
        flags.playback = PlaybackState::Idle;
        flags.playback_session = None;
        flags.playback_recording = None;
        drop(flags);
        self.changed();
        true
    }

    pub(crate) fn playback_state_for(&self, session: Uuid) -> PlaybackState {
        let flags = self.lock();
        if flags.playback_session == Some(session) {
            flags.playback
        } else {
            PlaybackState::Idle
        }
    }

    /// Block while `session` is paused. Returns the state that ended the wait.
    pub(crate) fn wait_while_playback_paused(&self, session: Uuid) -> PlaybackState {
        let mut flags = self.lock();
        loop {
            if flags.playback_session != Some(session) {
                return PlaybackState::Idle;
            }
            if flags.playback != PlaybackState::Paused {
                return flags.playback;
            }
            flags = self.wait(flags);
        }
    }
}
