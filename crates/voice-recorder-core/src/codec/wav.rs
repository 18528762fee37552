use crate::{CoreResult, RecorderError, device::StreamFormat};

use std::{
    fs::File,
    io::BufReader,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::{debug, instrument};

/// Recordings are always written as 16-bit integer PCM.
const BITS_PER_SAMPLE: u16 = 16;

/// Write interleaved samples to a new WAV file at `path`.
#[track_caller]
#[instrument(skip(samples), fields(sample_count = samples.len()))]
pub fn write_wav(path: &Path, format: StreamFormat, samples: &[i16]) -> CoreResult<()> {
    let codec_error = |source: hound::Error| RecorderError::Codec {
        path: path.to_path_buf(),
        source,
        location: ErrorLocation::from(Location::caller()),
    };

    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(codec_error)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(codec_error)?;
    }
    writer.finalize().map_err(codec_error)?;

    debug!(path = ?path, "WAV file written");

    Ok(())
}

/// Sequential chunk reader over a stored recording.
pub struct WavFileReader {
    reader: WavReader<BufReader<File>>,
    spec: WavSpec,
    path: PathBuf,
}

impl WavFileReader {
    /// Open `path` and read its header.
    #[track_caller]
    pub fn open(path: &Path) -> CoreResult<Self> {
        let reader = WavReader::open(path).map_err(|source| match source {
            hound::Error::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                RecorderError::NotFound {
                    id: path.display().to_string(),
                    location: ErrorLocation::from(Location::caller()),
                }
            }
            hound::Error::IoError(io) => RecorderError::Filesystem {
                path: path.to_path_buf(),
                source: io,
                location: ErrorLocation::from(Location::caller()),
            },
            source => RecorderError::Codec {
                path: path.to_path_buf(),
                source,
                location: ErrorLocation::from(Location::caller()),
            },
        })?;
        let spec = reader.spec();

        debug!(
            path = ?path,
            channels = spec.channels,
            bits_per_sample = spec.bits_per_sample,
            sample_rate = spec.sample_rate,
            "WAV file opened"
        );

        Ok(Self {
            reader,
            spec,
            path: path.to_path_buf(),
        })
    }

    /// Channel count and rate from the header.
    pub fn format(&self) -> StreamFormat {
        StreamFormat {
            channels: self.spec.channels,
            sample_rate: self.spec.sample_rate,
        }
    }

    /// Sample width in bits from the header.
    pub fn bits_per_sample(&self) -> u16 {
        self.spec.bits_per_sample
    }

    /// Read up to `frames` frames as 16-bit samples. Empty at end of data.
    #[track_caller]
    pub fn read_chunk(&mut self, frames: usize) -> CoreResult<Vec<i16>> {
        let count = self.format().samples_for(frames);
        let bits = self.spec.bits_per_sample;

        let chunk: Result<Vec<i16>, hound::Error> = match self.spec.sample_format {
            SampleFormat::Int if bits <= 16 => self.reader.samples::<i16>().take(count).collect(),
            SampleFormat::Int => self
                .reader
                .samples::<i32>()
                .take(count)
                .map(|s| s.map(|v| (v >> (bits - 16)) as i16))
                .collect(),
            SampleFormat::Float => self
                .reader
                .samples::<f32>()
                .take(count)
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16))
                .collect(),
        };

        chunk.map_err(|source| RecorderError::Codec {
            path: self.path.clone(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
