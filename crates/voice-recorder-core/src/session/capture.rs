use crate::{
    CoreResult, RecorderError,
    codec::write_wav,
    device::{AudioDevice, InputStream, StreamFormat},
    presentation::{PresentationAdapter, RecorderEvent},
    session::{CaptureState, SessionFlags, clock::run_clock},
    store::{RecordingSet, RecordingStore},
};

use std::{
    panic::Location,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, mpsc},
    thread::{self, JoinHandle},
    time::Duration,
};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Audio buffered by one capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    /// Format reported by the microphone.
    pub format: StreamFormat,
    /// Interleaved 16-bit samples.
    pub samples: Vec<i16>,
}

impl CapturedAudio {
    /// True if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the captured audio.
    pub fn duration(&self) -> Duration {
        let per_second = self.format.samples_for(self.format.sample_rate as usize);
        if per_second == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / per_second as f64)
    }

    /// Persist as `id` in `store`.
    ///
    /// The audio is written under a random temporary name in the staging
    /// directory, renamed to `id` there, then moved into the store. Any
    /// failure removes the staged file.
    #[track_caller]
    #[instrument(skip(self, store, existing), fields(sample_count = self.samples.len()))]
    pub fn finalize(
        &self,
        store: &RecordingStore,
        existing: &RecordingSet,
        id: &str,
    ) -> CoreResult<PathBuf> {
        let staged = store.stage(existing)?;
        write_wav(staged.path(), self.format, &self.samples)?;
        store.persist(staged, id)
    }
}

/// A running capture: the microphone worker plus its clock.
///
/// Spawned once per Idle→Armed transition. Pausing and resuming only flip
/// the shared flags; the workers stay alive until [`CaptureSession::cancel`].
/// The buffer is shared with the worker so a paused capture can be saved
/// while it stays resumable.
pub(crate) struct CaptureSession {
    session: Uuid,
    format: StreamFormat,
    samples: SharedSamples,
    worker: JoinHandle<()>,
    clock: JoinHandle<()>,
}

#[derive(Clone, Default)]
struct SharedSamples(Arc<Mutex<Vec<i16>>>);

impl SharedSamples {
    fn lock(&self) -> MutexGuard<'_, Vec<i16>> {
        self.0.lock().unwrap_or_else(|e| {
            error!("Capture buffer lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

/// Everything a capture worker needs besides its buffer.
#[derive(Clone)]
pub(crate) struct CaptureWorker {
    pub(crate) device: Arc<dyn AudioDevice>,
    pub(crate) adapter: Arc<dyn PresentationAdapter>,
    pub(crate) chunk_frames: usize,
}

impl CaptureSession {
    /// Arm the flags, open the microphone on a worker thread and start the clock.
    ///
    /// Returns once the microphone is open. If it cannot be opened the
    /// flags are rolled back to Idle and the device error is returned.
    #[track_caller]
    #[instrument(skip(worker, flags))]
    pub(crate) fn start(worker: &CaptureWorker, flags: &SessionFlags) -> CoreResult<Self> {
        let session = Uuid::new_v4();
        flags.begin_capture(session);

        let samples = SharedSamples::default();
        let (handle, format) = match spawn_worker(worker, flags, session, &samples, None) {
            Ok(spawned) => spawned,
            Err(e) => {
                flags.clear_capture();
                return Err(e);
            }
        };

        let clock_flags = flags.clone();
        let adapter = Arc::clone(&worker.adapter);
        let clock = thread::spawn(move || run_clock(clock_flags, session, adapter));

        info!(session_id = %session, "Capture session started");

        Ok(Self {
            session,
            format,
            samples,
            worker: handle,
            clock,
        })
    }

    /// True once the microphone worker has exited, e.g. after a device failure.
    pub(crate) fn is_interrupted(&self) -> bool {
        self.worker.is_finished()
    }

    /// Reopen the microphone for a session whose worker exited.
    ///
    /// Called while Paused. New audio is appended to the same buffer, so
    /// the stream must report the format the session started with.
    #[track_caller]
    #[instrument(skip(self, worker, flags), fields(session_id = %self.session))]
    pub(crate) fn reopen(&mut self, worker: &CaptureWorker, flags: &SessionFlags) -> CoreResult<()> {
        let (handle, _) = spawn_worker(worker, flags, self.session, &self.samples, Some(self.format))?;
        let previous = std::mem::replace(&mut self.worker, handle);
        if previous.join().is_err() {
            warn!(session_id = %self.session, "Previous capture worker panicked");
        }
        info!(session_id = %self.session, "Microphone reopened");
        Ok(())
    }

    /// Copy of everything captured so far.
    ///
    /// The session must be Paused; this waits for the worker to park so
    /// no chunk still in flight is missed.
    pub(crate) fn snapshot(&self, flags: &SessionFlags) -> CapturedAudio {
        flags.wait_capture_parked(self.session);
        CapturedAudio {
            format: self.format,
            samples: self.samples.lock().clone(),
        }
    }

    /// End the session and discard its buffer.
    #[track_caller]
    pub(crate) fn cancel(self, flags: &SessionFlags) -> CoreResult<()> {
        flags.end_capture(true);

        let clock = self.clock.join();
        let worker = self.worker.join();
        flags.clear_capture();

        if clock.is_err() {
            warn!(session_id = %self.session, "Clock worker panicked");
        }

        worker.map_err(|_| RecorderError::WorkerPanicked {
            worker: "capture",
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

#[track_caller]
fn spawn_worker(
    worker: &CaptureWorker,
    flags: &SessionFlags,
    session: Uuid,
    samples: &SharedSamples,
    expected: Option<StreamFormat>,
) -> CoreResult<(JoinHandle<()>, StreamFormat)> {
    flags.worker_started(session);

    let (ready_tx, ready_rx) = mpsc::sync_channel(1);
    let device = Arc::clone(&worker.device);
    let adapter = Arc::clone(&worker.adapter);
    let chunk_frames = worker.chunk_frames;
    let worker_flags = flags.clone();
    let worker_samples = samples.clone();
    let handle = thread::spawn(move || {
        run_capture(
            device,
            adapter,
            worker_flags,
            session,
            chunk_frames,
            worker_samples,
            expected,
            ready_tx,
        )
    });

    let opened = ready_rx.recv().unwrap_or_else(|_| {
        Err(RecorderError::WorkerPanicked {
            worker: "capture",
            location: ErrorLocation::from(Location::caller()),
        })
    });

    match opened {
        Ok(format) => Ok((handle, format)),
        Err(e) => {
            let _ = handle.join();
            Err(e)
        }
    }
}

/// Marks the worker parked however it exits, so a pending snapshot never hangs.
struct ParkOnExit {
    flags: SessionFlags,
    session: Uuid,
}

impl Drop for ParkOnExit {
    fn drop(&mut self) {
        self.flags.park_capture(self.session);
    }
}

/// Capture worker body. Reports the open result through `ready`, then
/// buffers chunks until the session goes Idle or the microphone fails.
#[allow(clippy::too_many_arguments)]
fn run_capture(
    device: Arc<dyn AudioDevice>,
    adapter: Arc<dyn PresentationAdapter>,
    flags: SessionFlags,
    session: Uuid,
    chunk_frames: usize,
    samples: SharedSamples,
    expected: Option<StreamFormat>,
    ready: mpsc::SyncSender<CoreResult<StreamFormat>>,
) {
    let _parked = ParkOnExit {
        flags: flags.clone(),
        session,
    };

    let mut stream = match device.open_input() {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let format = stream.format();
    if let Some(expected) = expected
        && expected != format
    {
        let _ = ready.send(Err(RecorderError::Device {
            reason: format!(
                "Microphone format changed from {:?} to {:?}",
                expected, format
            ),
            location: ErrorLocation::from(Location::caller()),
        }));
        return;
    }
    let _ = ready.send(Ok(format));

    if let Err(e) = capture_loop(stream.as_mut(), &flags, session, chunk_frames, &samples) {
        error!(session_id = %session, error = ?e, "Capture interrupted, keeping audio read so far");
        if flags.interrupt_capture(session) {
            adapter.notify(RecorderEvent::CaptureStateChanged(CaptureState::Paused));
            adapter.notify(RecorderEvent::DeviceFailed(failure_reason(&e)));
        }
    }

    drop(stream);
    debug!(session_id = %session, "Microphone stream closed");

    if flags.take_cancel(session) {
        let mut buffer = samples.lock();
        info!(
            session_id = %session,
            sample_count = buffer.len(),
            "Capture discarded"
        );
        buffer.clear();
        return;
    }

    info!(
        session_id = %session,
        sample_count = samples.lock().len(),
        "Capture worker stopped"
    );
}

fn capture_loop(
    stream: &mut dyn InputStream,
    flags: &SessionFlags,
    session: Uuid,
    chunk_frames: usize,
    samples: &SharedSamples,
) -> CoreResult<()> {
    loop {
        match flags.capture_state_for(session) {
            CaptureState::Armed => {
                let chunk = stream.read_chunk(chunk_frames)?;
                samples.lock().extend(chunk);
            }
            CaptureState::Paused => {
                stream.pause()?;
                if flags.park_while_capture_paused(session) == CaptureState::Armed {
                    stream.resume()?;
                }
            }
            CaptureState::Idle => return Ok(()),
        }
    }
}

fn failure_reason(err: &RecorderError) -> String {
    match err {
        RecorderError::Device { reason, .. } | RecorderError::DeviceUnavailable { reason, .. } => {
            reason.clone()
        }
        other => other.to_string(),
    }
}
