use crate::{
    CoreResult, RecorderError,
    device::{
        AudioDevice, InputStream, OutputStream, StreamFormat,
        sample_queue::{SampleQueue, f32_to_i16, u16_to_i16},
    },
};

use std::{panic::Location, sync::Arc, time::Duration};

use cpal::{
    BufferSize, BuildStreamError, Device, SampleFormat, SizedSample, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument};

/// How long a read or write may wait on the device before giving up.
const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Seconds of microphone audio buffered between callback and reader.
/// Older samples are dropped if the capture loop falls further behind.
const INPUT_QUEUE_SECONDS: usize = 2;

/// Output queue depth as a fraction of one second (1/4 s).
const OUTPUT_QUEUE_DIVISOR: usize = 4;

/// Default-device backend built on cpal.
///
/// Holds no device handles itself; each `open_*` call resolves the current
/// default device so the streams can be created on the worker thread that
/// owns them.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalAudioDevice;

impl CpalAudioDevice {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

impl AudioDevice for CpalAudioDevice {
    #[track_caller]
    #[instrument(skip(self))]
    fn open_input(&self) -> CoreResult<Box<dyn InputStream>> {
        let host = cpal::default_host();

        let device =
            host.default_input_device()
                .ok_or_else(|| RecorderError::DeviceUnavailable {
                    reason: "No microphone found".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        let supported =
            device
                .default_input_config()
                .map_err(|e| RecorderError::DeviceUnavailable {
                    reason: format!("Failed to get input config: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        let format = StreamFormat {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
        };
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        let queue = Arc::new(SampleQueue::new(
            format.samples_for(format.sample_rate as usize * INPUT_QUEUE_SECONDS),
        ));

        let built = match sample_format {
            SampleFormat::F32 => build_input(&device, &config, &queue, f32_to_i16),
            SampleFormat::I16 => build_input(&device, &config, &queue, |s: i16| s),
            SampleFormat::U16 => build_input(&device, &config, &queue, u16_to_i16),
            other => {
                return Err(RecorderError::DeviceUnavailable {
                    reason: format!("Unsupported microphone sample format: {}", other),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };
        let stream = built.map_err(|e| RecorderError::DeviceUnavailable {
            reason: format!("Failed to build input stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        stream.play().map_err(|e| RecorderError::DeviceUnavailable {
            reason: format!("Failed to start input stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(
            device_id = ?device.id(),
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Microphone opened"
        );

        Ok(Box::new(CpalInputStream {
            stream,
            format,
            queue,
        }))
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn open_output(&self, format: StreamFormat) -> CoreResult<Box<dyn OutputStream>> {
        let host = cpal::default_host();

        let device =
            host.default_output_device()
                .ok_or_else(|| RecorderError::DeviceUnavailable {
                    reason: "No output device found".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: format.sample_rate,
            buffer_size: BufferSize::Default,
        };

        let queue = Arc::new(SampleQueue::new(
            format.samples_for(format.sample_rate as usize / OUTPUT_QUEUE_DIVISOR),
        ));
        let data_queue = Arc::clone(&queue);
        let error_queue = Arc::clone(&queue);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    data_queue.pop_into(data);
                },
                move |err| {
                    error!("Output stream error: {}", err);
                    error_queue.mark_failed();
                },
                None,
            )
            .map_err(|e| RecorderError::DeviceUnavailable {
                reason: format!("Failed to build output stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| RecorderError::DeviceUnavailable {
            reason: format!("Failed to start output stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(
            device_id = ?device.id(),
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Output device opened"
        );

        Ok(Box::new(CpalOutputStream {
            stream,
            format,
            queue,
        }))
    }
}

/// Input stream delivering `T` samples, converted to i16 into `queue`.
fn build_input<T: SizedSample + 'static>(
    device: &Device,
    config: &StreamConfig,
    queue: &Arc<SampleQueue>,
    convert: fn(T) -> i16,
) -> Result<Stream, BuildStreamError> {
    let data_queue = Arc::clone(queue);
    let error_queue = Arc::clone(queue);
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            data_queue.push_overwrite(data.iter().copied().map(convert));
        },
        move |err| {
            error!("Input stream error: {}", err);
            error_queue.mark_failed();
        },
        None,
    )
}

struct CpalInputStream {
    stream: Stream,
    format: StreamFormat,
    queue: Arc<SampleQueue>,
}

impl InputStream for CpalInputStream {
    fn format(&self) -> StreamFormat {
        self.format
    }

    #[track_caller]
    fn read_chunk(&mut self, frames: usize) -> CoreResult<Vec<i16>> {
        self.queue
            .pop_exact(self.format.samples_for(frames), STALL_TIMEOUT)
            .ok_or_else(|| RecorderError::Device {
                reason: "Microphone stopped delivering audio".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    #[track_caller]
    fn pause(&mut self) -> CoreResult<()> {
        self.stream.pause().map_err(|e| RecorderError::Device {
            reason: format!("Failed to pause input stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn resume(&mut self) -> CoreResult<()> {
        self.queue.clear();
        self.stream.play().map_err(|e| RecorderError::Device {
            reason: format!("Failed to resume input stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

impl Drop for CpalInputStream {
    fn drop(&mut self) {
        // Stop the callback before the stream itself is torn down.
        let _ = self.stream.pause();
        debug!("Microphone released");
    }
}

struct CpalOutputStream {
    stream: Stream,
    format: StreamFormat,
    queue: Arc<SampleQueue>,
}

impl OutputStream for CpalOutputStream {
    #[track_caller]
    fn write_chunk(&mut self, samples: &[i16]) -> CoreResult<()> {
        if self.queue.push_blocking(samples, STALL_TIMEOUT) {
            Ok(())
        } else {
            Err(RecorderError::Device {
                reason: "Output device stopped consuming audio".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }

    #[track_caller]
    fn drain(&mut self) -> CoreResult<()> {
        let per_second = self.format.samples_for(self.format.sample_rate as usize).max(1);
        let queued = Duration::from_secs_f64(self.queue.len() as f64 / per_second as f64);

        if self.queue.wait_empty(queued + STALL_TIMEOUT) {
            Ok(())
        } else {
            Err(RecorderError::Device {
                reason: "Output device did not finish playing queued audio".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}

impl Drop for CpalOutputStream {
    fn drop(&mut self) {
        let _ = self.stream.pause();
        self.queue.clear();
        debug!("Output device released");
    }
}
