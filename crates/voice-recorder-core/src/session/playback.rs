use crate::{
    CoreResult, RecorderError,
    codec::WavFileReader,
    device::{AudioDevice, OutputStream},
    presentation::{PresentationAdapter, RecorderEvent},
    session::{PlaybackState, SessionFlags},
};

use std::{
    panic::Location,
    path::PathBuf,
    sync::{Arc, mpsc},
    thread::{self, JoinHandle},
};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// A running playback worker for one recording.
pub(crate) struct PlaybackSession {
    session: Uuid,
    recording: String,
    worker: JoinHandle<()>,
}

impl PlaybackSession {
    /// Open `path` and the output device on a worker thread and start playing.
    ///
    /// Returns once both are open. On failure the flags are rolled back to
    /// Idle and the error is returned.
    #[track_caller]
    #[instrument(skip(device, flags, adapter, path))]
    pub(crate) fn start(
        device: Arc<dyn AudioDevice>,
        flags: &SessionFlags,
        adapter: Arc<dyn PresentationAdapter>,
        recording: &str,
        path: PathBuf,
        chunk_frames: usize,
    ) -> CoreResult<Self> {
        let session = Uuid::new_v4();
        flags.begin_playback(session, recording);

        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let worker_flags = flags.clone();
        let worker_recording = recording.to_string();
        let worker = thread::spawn(move || {
            run_playback(
                device,
                worker_flags,
                adapter,
                session,
                worker_recording,
                path,
                chunk_frames,
                ready_tx,
            )
        });

        let opened = ready_rx.recv().unwrap_or_else(|_| {
            Err(RecorderError::WorkerPanicked {
                worker: "playback",
                location: ErrorLocation::from(Location::caller()),
            })
        });

        if let Err(e) = opened {
            flags.finish_playback(session);
            let _ = worker.join();
            return Err(e);
        }

        info!(session_id = %session, recording = recording, "Playback started");

        Ok(Self {
            session,
            recording: recording.to_string(),
            worker,
        })
    }

    /// Recording this worker plays.
    pub(crate) fn recording(&self) -> &str {
        &self.recording
    }

    /// Wait for the worker to exit. The caller must already have moved the
    /// flags away from this session (or the worker must have finished).
    pub(crate) fn join(self) {
        if self.worker.join().is_err() {
            warn!(session_id = %self.session, "Playback worker panicked");
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_playback(
    device: Arc<dyn AudioDevice>,
    flags: SessionFlags,
    adapter: Arc<dyn PresentationAdapter>,
    session: Uuid,
    recording: String,
    path: PathBuf,
    chunk_frames: usize,
    ready: mpsc::SyncSender<CoreResult<()>>,
) {
    let opened = WavFileReader::open(&path)
        .and_then(|reader| Ok((device.open_output(reader.format())?, reader)));

    let (mut output, mut reader) = match opened {
        Ok(pair) => {
            adapter.notify(RecorderEvent::PlaybackStateChanged {
                state: PlaybackState::Playing,
                recording: Some(recording.clone()),
            });
            let _ = ready.send(Ok(()));
            pair
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let outcome = playback_loop(output.as_mut(), &mut reader, &flags, session, chunk_frames);

    drop(output);
    drop(reader);
    debug!(session_id = %session, "Output stream and file closed");

    match outcome {
        Ok(true) => info!(session_id = %session, recording = %recording, "Playback complete"),
        Ok(false) => info!(session_id = %session, recording = %recording, "Playback stopped"),
        Err(e) => error!(session_id = %session, error = ?e, "Playback failed"),
    }

    // Natural end or failure: report completion unless the controller
    // already moved on to something else.
    if flags.finish_playback(session) {
        adapter.notify(RecorderEvent::PlaybackStateChanged {
            state: PlaybackState::Idle,
            recording: None,
        });
    }
}

/// Returns `Ok(true)` at end of data, `Ok(false)` when stopped.
fn playback_loop(
    output: &mut dyn OutputStream,
    reader: &mut WavFileReader,
    flags: &SessionFlags,
    session: Uuid,
    chunk_frames: usize,
) -> CoreResult<bool> {
    loop {
        match flags.playback_state_for(session) {
            PlaybackState::Playing => {
                let chunk = reader.read_chunk(chunk_frames)?;
                if chunk.is_empty() {
                    output.drain()?;
                    return Ok(true);
                }
                output.write_chunk(&chunk)?;
            }
            PlaybackState::Paused => {
                flags.wait_while_playback_paused(session);
            }
            PlaybackState::Idle => return Ok(false),
        }
    }
}
