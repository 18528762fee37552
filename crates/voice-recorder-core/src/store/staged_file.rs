use crate::{CoreResult, RecorderError};

use std::{
    fs,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{debug, warn};

/// RAII guard over a file in the staging directory.
///
/// The file is removed when the guard drops unless [`StagedFile::persist`]
/// moved it into the recordings directory, so an aborted finalization
/// never leaves a temporary file behind.
pub struct StagedFile {
    path: PathBuf,
    armed: bool,
}

impl StagedFile {
    /// Take ownership of `path`; it is deleted on drop from now on.
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Current location of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename within the staging directory.
    #[track_caller]
    pub(crate) fn rename_to(mut self, target: PathBuf) -> CoreResult<Self> {
        fs::rename(&self.path, &target).map_err(|source| RecorderError::Filesystem {
            path: target.clone(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(from = ?self.path, to = ?target, "Staged file renamed");

        self.path = target;
        Ok(self)
    }

    /// Move into its final location and stop guarding it.
    ///
    /// Falls back to copy-then-remove when a plain rename cannot cross
    /// filesystems.
    #[track_caller]
    pub(crate) fn persist(mut self, target: &Path) -> CoreResult<()> {
        if fs::rename(&self.path, target).is_err() {
            if let Err(source) = fs::copy(&self.path, target) {
                // A partial copy must not show up as a recording.
                let _ = fs::remove_file(target);
                return Err(RecorderError::Filesystem {
                    path: target.to_path_buf(),
                    source,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = ?self.path, error = %e, "Failed to remove staged file after copy");
            }
        }

        self.armed = false;
        debug!(to = ?target, "Staged file persisted");

        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = ?self.path, "Staged file discarded"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, error = %e, "Failed to remove staged file"),
        }
    }
}
