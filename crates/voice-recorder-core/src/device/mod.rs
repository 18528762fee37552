//! Audio device contract and the cpal backend.
//!
//! Samples are interleaved signed 16-bit PCM. Streams release the device
//! when dropped, so every exit path of a session closes them.

mod cpal_device;
pub(crate) mod sample_queue;

pub use cpal_device::CpalAudioDevice;

use crate::CoreResult;

/// Channel layout and rate of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Interleaved channel count.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
}

impl StreamFormat {
    /// Number of interleaved samples making up `frames` frames.
    pub fn samples_for(&self, frames: usize) -> usize {
        frames * usize::from(self.channels.max(1))
    }
}

/// Opens microphone and speaker streams.
pub trait AudioDevice: Send + Sync {
    /// Open the default input.
    fn open_input(&self) -> CoreResult<Box<dyn InputStream>>;

    /// Open the default output for the given format.
    fn open_output(&self, format: StreamFormat) -> CoreResult<Box<dyn OutputStream>>;
}

/// An open microphone stream.
pub trait InputStream {
    /// Format of the samples returned by [`InputStream::read_chunk`].
    fn format(&self) -> StreamFormat;

    /// Block until `frames` frames are available and return them.
    fn read_chunk(&mut self, frames: usize) -> CoreResult<Vec<i16>>;

    /// Stop delivering audio without closing the stream.
    fn pause(&mut self) -> CoreResult<()> {
        Ok(())
    }

    /// Resume after [`InputStream::pause`], dropping anything queued meanwhile.
    fn resume(&mut self) -> CoreResult<()> {
        Ok(())
    }
}

/// An open speaker stream.
pub trait OutputStream {
    /// Queue samples for playback, blocking while the device is saturated.
    fn write_chunk(&mut self, samples: &[i16]) -> CoreResult<()>;

    /// Block until everything queued has been played.
    fn drain(&mut self) -> CoreResult<()> {
        Ok(())
    }
}
