mod names;
mod recording_set;
mod recording_store;
mod staged_file;

pub use {
    names::{MAX_TITLE_CHARS, RECORDING_EXTENSION, recording_id, title_of, validate_title},
    recording_set::RecordingSet,
    recording_store::RecordingStore,
    staged_file::StagedFile,
};
