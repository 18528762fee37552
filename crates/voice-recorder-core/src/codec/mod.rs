//! WAV container support via hound.

mod wav;

pub use wav::{WavFileReader, write_wav};
