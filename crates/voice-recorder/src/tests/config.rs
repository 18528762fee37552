use crate::{
    AppError,
    config::{Config, DEFAULT_CHUNK_FRAMES},
};

use std::fs;

use tempfile::TempDir;

/// WHAT: Default storage sits under the data directory, confirmations on
/// WHY: A fresh install must work without any hand-written config
#[test]
fn given_data_dir_when_building_defaults_then_storage_under_it() {
    // Given
    let data_dir = std::path::Path::new("/tmp/voice-recorder-data");

    // When
    let config = Config::with_data_dir(data_dir);

    // Then
    assert_eq!(config.storage.recordings_dir, data_dir.join("recordings"));
    assert_eq!(config.storage.staging_dir, data_dir.join("staging"));
    assert_eq!(config.audio.chunk_frames, DEFAULT_CHUNK_FRAMES);
    assert!(config.behaviour.confirm_destructive);
    assert!(config.validate().is_ok());
}

/// WHAT: Loading a missing file writes defaults and returns them
/// WHY: First run creates a config the user can then edit
#[test]
#[allow(clippy::unwrap_used)]
fn given_missing_file_when_loading_then_defaults_written() {
    // Given
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    // When
    let config = Config::load_from(&path, dir.path()).unwrap();

    // Then
    assert!(path.exists());
    assert!(!dir.path().join("config.toml.tmp").exists());
    assert_eq!(config, Config::with_data_dir(dir.path()));
}

/// WHAT: A saved config loads back unchanged
/// WHY: Edits made through save_to must survive a restart
#[test]
#[allow(clippy::unwrap_used)]
fn given_saved_config_when_loading_then_same_values() {
    // Given
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let mut config = Config::with_data_dir(dir.path());
    config.audio.chunk_frames = 256;
    config.behaviour.confirm_destructive = false;
    config.save_to(&path).unwrap();

    // When
    let loaded = Config::load_from(&path, dir.path()).unwrap();

    // Then
    assert_eq!(loaded, config);
}

/// WHAT: Omitted audio and behaviour sections fall back to defaults
/// WHY: Older config files only carry the storage section
#[test]
#[allow(clippy::unwrap_used)]
fn given_storage_only_file_when_loading_then_other_sections_default() {
    // Given
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[storage]\nrecordings_dir = \"/data/rec\"\nstaging_dir = \"/data/tmp\"\n",
    )
    .unwrap();

    // When
    let config = Config::load_from(&path, dir.path()).unwrap();

    // Then
    assert_eq!(config.storage.recordings_dir, std::path::PathBuf::from("/data/rec"));
    assert_eq!(config.audio.chunk_frames, DEFAULT_CHUNK_FRAMES);
    assert!(config.behaviour.confirm_destructive);
}

/// WHAT: A zero chunk size is rejected at load time
/// WHY: The capture loop cannot make progress reading zero frames
#[test]
#[allow(clippy::unwrap_used)]
fn given_zero_chunk_frames_when_loading_then_config_error() {
    // Given
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[storage]\nrecordings_dir = \"/data/rec\"\nstaging_dir = \"/data/tmp\"\n\n[audio]\nchunk_frames = 0\n",
    )
    .unwrap();

    // When
    let result = Config::load_from(&path, dir.path());

    // Then
    assert!(matches!(result, Err(AppError::ConfigError { .. })));
}

/// WHAT: Staging and recordings must be different directories
/// WHY: Temporary files in the recordings directory would show up in the list
#[test]
fn given_same_staging_and_recordings_dir_when_validating_then_config_error() {
    // Given
    let mut config = Config::with_data_dir(std::path::Path::new("/tmp/voice-recorder-data"));
    config.storage.staging_dir = config.storage.recordings_dir.clone();

    // When
    let result = config.validate();

    // Then
    assert!(matches!(result, Err(AppError::ConfigError { .. })));
}

/// WHAT: Malformed TOML is a config error, not a silent default
/// WHY: Overwriting a broken file would lose the user's settings
#[test]
#[allow(clippy::unwrap_used)]
fn given_malformed_file_when_loading_then_config_error_and_file_kept() {
    // Given
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[storage\nrecordings_dir = ").unwrap();

    // When
    let result = Config::load_from(&path, dir.path());

    // Then
    assert!(matches!(result, Err(AppError::ConfigError { .. })));
    assert_eq!(fs::read_to_string(&path).unwrap(), "[storage\nrecordings_dir = ");
}
