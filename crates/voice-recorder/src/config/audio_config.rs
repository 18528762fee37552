use crate::config::{DEFAULT_CHUNK_FRAMES, default_chunk_frames};

use serde::{Deserialize, Serialize};

/// Audio streaming configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Frames moved per blocking read or write in the capture and playback loops.
    #[serde(default = "default_chunk_frames")]
    pub chunk_frames: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            chunk_frames: DEFAULT_CHUNK_FRAMES,
        }
    }
}
