use crate::{
    AudioDevice, CoreResult, InputStream, OutputStream, PresentationAdapter, RecorderError,
    RecorderEvent, RecordingStore, SessionController, SessionOptions, StreamFormat, write_wav,
};

use std::{
    collections::VecDeque,
    panic::Location,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread::sleep,
    time::{Duration, Instant},
};

use error_location::ErrorLocation;
use tempfile::TempDir;

pub(crate) const TEST_FORMAT: StreamFormat = StreamFormat {
    channels: 1,
    sample_rate: 8_000,
};

pub(crate) const TEST_CHUNK_FRAMES: usize = 64;

/// In-memory audio device counting every stream it hands out.
#[derive(Default)]
pub(crate) struct FakeAudioDevice {
    pub(crate) fail_input: AtomicBool,
    pub(crate) fail_output: AtomicBool,
    /// Input streams yield no samples at all.
    pub(crate) silent_input: AtomicBool,
    /// Input streams fail after this many chunks; zero means never.
    pub(crate) fail_input_after: AtomicUsize,
    pub(crate) inputs_opened: AtomicUsize,
    pub(crate) outputs_opened: AtomicUsize,
    pub(crate) live_inputs: Arc<AtomicUsize>,
    pub(crate) live_outputs: Arc<AtomicUsize>,
    pub(crate) played: Arc<Mutex<Vec<i16>>>,
}

impl FakeAudioDevice {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing_input() -> Arc<Self> {
        let device = Self::default();
        device.fail_input.store(true, Ordering::SeqCst);
        Arc::new(device)
    }

    pub(crate) fn silent() -> Arc<Self> {
        let device = Self::default();
        device.silent_input.store(true, Ordering::SeqCst);
        Arc::new(device)
    }

    pub(crate) fn failing_after(chunks: usize) -> Arc<Self> {
        let device = Self::default();
        device.fail_input_after.store(chunks, Ordering::SeqCst);
        Arc::new(device)
    }

    pub(crate) fn inputs_opened(&self) -> usize {
        self.inputs_opened.load(Ordering::SeqCst)
    }

    pub(crate) fn outputs_opened(&self) -> usize {
        self.outputs_opened.load(Ordering::SeqCst)
    }

    pub(crate) fn live_inputs(&self) -> usize {
        self.live_inputs.load(Ordering::SeqCst)
    }

    pub(crate) fn live_outputs(&self) -> usize {
        self.live_outputs.load(Ordering::SeqCst)
    }

    pub(crate) fn played(&self) -> Vec<i16> {
        self.played
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl AudioDevice for FakeAudioDevice {
    #[track_caller]
    fn open_input(&self) -> CoreResult<Box<dyn InputStream>> {
        if self.fail_input.load(Ordering::SeqCst) {
            return Err(RecorderError::DeviceUnavailable {
                reason: "No microphone found".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.inputs_opened.fetch_add(1, Ordering::SeqCst);
        self.live_inputs.fetch_add(1, Ordering::SeqCst);
        let fail_after = self.fail_input_after.load(Ordering::SeqCst);
        Ok(Box::new(FakeInputStream {
            next: 0,
            silent: self.silent_input.load(Ordering::SeqCst),
            chunks_left: (fail_after > 0).then_some(fail_after),
            live: Arc::clone(&self.live_inputs),
        }))
    }

    #[track_caller]
    fn open_output(&self, _format: StreamFormat) -> CoreResult<Box<dyn OutputStream>> {
        if self.fail_output.load(Ordering::SeqCst) {
            return Err(RecorderError::DeviceUnavailable {
                reason: "No output device found".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.outputs_opened.fetch_add(1, Ordering::SeqCst);
        self.live_outputs.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeOutputStream {
            played: Arc::clone(&self.played),
            live: Arc::clone(&self.live_outputs),
        }))
    }
}

/// Microphone producing a ramp at roughly real-time pace.
struct FakeInputStream {
    next: i16,
    silent: bool,
    chunks_left: Option<usize>,
    live: Arc<AtomicUsize>,
}

impl InputStream for FakeInputStream {
    fn format(&self) -> StreamFormat {
        TEST_FORMAT
    }

    #[track_caller]
    fn read_chunk(&mut self, frames: usize) -> CoreResult<Vec<i16>> {
        sleep(Duration::from_millis(1));
        match self.chunks_left {
            Some(0) => {
                return Err(RecorderError::Device {
                    reason: "Microphone unplugged".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Some(ref mut left) => *left -= 1,
            None => {}
        }
        if self.silent {
            return Ok(Vec::new());
        }
        let chunk = (0..TEST_FORMAT.samples_for(frames))
            .map(|_| {
                self.next = self.next.wrapping_add(1);
                self.next
            })
            .collect();
        Ok(chunk)
    }
}

impl Drop for FakeInputStream {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Speaker that records what it was asked to play.
struct FakeOutputStream {
    played: Arc<Mutex<Vec<i16>>>,
    live: Arc<AtomicUsize>,
}

impl OutputStream for FakeOutputStream {
    fn write_chunk(&mut self, samples: &[i16]) -> CoreResult<()> {
        sleep(Duration::from_millis(1));
        self.played
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(samples);
        Ok(())
    }
}

impl Drop for FakeOutputStream {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Adapter answering prompts from queues and recording every event.
///
/// An exhausted queue answers "no" to confirmations and cancels prompts.
#[derive(Default)]
pub(crate) struct ScriptedAdapter {
    confirms: Mutex<VecDeque<bool>>,
    titles: Mutex<VecDeque<String>>,
    renames: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    titles_asked: AtomicUsize,
    events: Mutex<Vec<RecorderEvent>>,
}

impl ScriptedAdapter {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn confirm_next(&self, answer: bool) {
        self.confirms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(answer);
    }

    pub(crate) fn title_next(&self, title: &str) {
        self.titles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(title.to_string());
    }

    pub(crate) fn rename_next(&self, name: &str) {
        self.renames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(name.to_string());
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of times a save title was asked for.
    pub(crate) fn titles_asked(&self) -> usize {
        self.titles_asked.load(Ordering::SeqCst)
    }

    pub(crate) fn events(&self) -> Vec<RecorderEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn rejections(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RecorderEvent::InputRejected(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn clear_events(&self) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl PresentationAdapter for ScriptedAdapter {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        self.confirms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(false)
    }

    fn prompt_title(&self, _existing: &[String]) -> String {
        self.titles_asked.fetch_add(1, Ordering::SeqCst);
        self.titles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_default()
    }

    fn prompt_rename(&self, _current: &str) -> String {
        self.renames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_default()
    }

    fn notify(&self, event: RecorderEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

pub(crate) fn test_store(dir: &TempDir) -> RecordingStore {
    RecordingStore::new(dir.path().join("recordings"), dir.path().join("staging"))
}

pub(crate) fn test_options() -> SessionOptions {
    SessionOptions {
        chunk_frames: TEST_CHUNK_FRAMES,
    }
}

/// Write a mono recording of `frames` ramp samples straight into the store.
#[allow(clippy::unwrap_used)]
pub(crate) fn write_fixture(store: &RecordingStore, id: &str, frames: usize) -> Vec<i16> {
    std::fs::create_dir_all(store.dir()).unwrap();
    let samples: Vec<i16> = (0..frames).map(|i| (i % 1000) as i16).collect();
    write_wav(&store.path_of(id), TEST_FORMAT, &samples).unwrap();
    samples
}

#[allow(clippy::unwrap_used)]
pub(crate) fn controller(
    dir: &TempDir,
    device: &Arc<FakeAudioDevice>,
    adapter: &Arc<ScriptedAdapter>,
) -> SessionController {
    SessionController::new(
        test_store(dir),
        Arc::clone(device) as Arc<dyn AudioDevice>,
        Arc::clone(adapter) as Arc<dyn PresentationAdapter>,
        test_options(),
    )
    .unwrap()
}

/// Poll `condition` until it holds or `timeout` passes.
pub(crate) fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(2));
    }
    condition()
}

/// Files currently in `dir`, sorted by name. Missing directory yields none.
pub(crate) fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
