mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod storage_config;

pub(crate) use {
    audio_config::AudioConfig, behaviour_config::BehaviourConfig, config::Config,
    storage_config::StorageConfig,
};

pub(crate) const DEFAULT_CHUNK_FRAMES: usize = voice_recorder_core::DEFAULT_CHUNK_FRAMES;
pub(crate) const DEFAULT_CONFIRM_DESTRUCTIVE: bool = true;

pub(crate) fn default_chunk_frames() -> usize {
    DEFAULT_CHUNK_FRAMES
}

pub(crate) fn default_confirm_destructive() -> bool {
    DEFAULT_CONFIRM_DESTRUCTIVE
}
