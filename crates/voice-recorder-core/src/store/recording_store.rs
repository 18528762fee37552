use crate::{
    CoreResult, RecorderError,
    error::NameRejection,
    store::{RECORDING_EXTENSION, RecordingSet, StagedFile},
};

use std::{
    fs, io,
    panic::Location,
    path::{Path, PathBuf},
    time::SystemTime,
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Digits in a temporary recording name.
const TEMP_NAME_DIGITS: u32 = 12;

/// Directory of persisted `<title>.wav` recordings plus a sibling staging
/// directory used while a capture is being finalized.
///
/// The directory listing is the only source of truth; there is no index file.
#[derive(Debug, Clone)]
pub struct RecordingStore {
    dir: PathBuf,
    staging_dir: PathBuf,
}

impl RecordingStore {
    /// Store rooted at `dir`, staging temporary files in `staging_dir`.
    ///
    /// Both should live on the same filesystem so finalization is a rename.
    pub fn new(dir: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staging_dir: staging_dir.into(),
        }
    }

    /// Directory holding persisted recordings.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory holding in-flight temporary files.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Path of the backing file for `id`.
    pub fn path_of(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    /// Recordings on disk, oldest first. Creates the directory if missing.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn list(&self) -> CoreResult<RecordingSet> {
        create_dir(&self.dir)?;

        let entries = fs::read_dir(&self.dir).map_err(|source| RecorderError::Filesystem {
            path: self.dir.clone(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

        let mut recordings: Vec<(SystemTime, String)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let is_recording = Path::new(&name)
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case(RECORDING_EXTENSION))
                    .unwrap_or(false);
                is_recording.then(|| (created_at(&entry.path()), name))
            })
            .collect();

        recordings.sort();

        debug!(count = recordings.len(), dir = ?self.dir, "Recordings listed");

        Ok(RecordingSet::from_sorted(
            recordings.into_iter().map(|(_, name)| name),
        ))
    }

    /// Rename the backing file of `old` to `new`.
    ///
    /// Refuses to overwrite an existing file.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn rename(&self, old: &str, new: &str) -> CoreResult<()> {
        let from = self.path_of(old);
        let to = self.path_of(new);

        if to.exists() {
            return Err(RecorderError::InvalidName {
                rejection: NameRejection::Taken(new.to_string()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        fs::rename(&from, &to).map_err(|source| fs_error(old, from, source))?;

        info!(from = old, to = new, "Recording renamed");

        Ok(())
    }

    /// Remove the backing file of `id`.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> CoreResult<()> {
        let path = self.path_of(id);

        fs::remove_file(&path).map_err(|source| fs_error(id, path, source))?;

        info!(id = id, "Recording deleted");

        Ok(())
    }

    /// Remove several recordings, stopping at the first failure.
    #[track_caller]
    #[instrument(skip(self, ids))]
    pub fn delete_many<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> CoreResult<usize> {
        let mut removed = 0;
        for id in ids {
            self.delete(id)?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Random `<12 digits>.wav` name used by neither a recording nor a staged file.
    pub fn unique_temp_name(&self, existing: &RecordingSet) -> String {
        loop {
            let digits = Uuid::new_v4().as_u128() % 10u128.pow(TEMP_NAME_DIGITS);
            let name = format!(
                "{:0width$}.{}",
                digits,
                RECORDING_EXTENSION,
                width = TEMP_NAME_DIGITS as usize
            );
            if !existing.contains(&name) && !self.staging_dir.join(&name).exists() {
                return name;
            }
        }
    }

    /// Claim a fresh staging path for a capture, creating the staging directory.
    #[track_caller]
    pub fn stage(&self, existing: &RecordingSet) -> CoreResult<StagedFile> {
        create_dir(&self.staging_dir)?;
        Ok(StagedFile::new(
            self.staging_dir.join(self.unique_temp_name(existing)),
        ))
    }

    /// Rename a staged file to `id` and move it into the store.
    #[track_caller]
    #[instrument(skip(self, staged), fields(staged = ?staged.path()))]
    pub fn persist(&self, staged: StagedFile, id: &str) -> CoreResult<PathBuf> {
        create_dir(&self.dir)?;

        let target = self.path_of(id);
        if target.exists() {
            return Err(RecorderError::InvalidName {
                rejection: NameRejection::Taken(id.to_string()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let titled = staged.rename_to(self.staging_dir.join(id))?;
        titled.persist(&target)?;

        info!(id = id, path = ?target, "Recording persisted");

        Ok(target)
    }
}

#[track_caller]
fn create_dir(dir: &Path) -> CoreResult<()> {
    fs::create_dir_all(dir).map_err(|source| RecorderError::Filesystem {
        path: dir.to_path_buf(),
        source,
        location: ErrorLocation::from(Location::caller()),
    })
}

#[track_caller]
fn fs_error(id: &str, path: PathBuf, source: io::Error) -> RecorderError {
    if source.kind() == io::ErrorKind::NotFound {
        RecorderError::NotFound {
            id: id.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    } else {
        RecorderError::Filesystem {
            path,
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Birth time where the filesystem records it, otherwise modification time.
///
/// Birth time survives renames, so a renamed recording keeps its place.
fn created_at(path: &Path) -> SystemTime {
    match fs::metadata(path) {
        Ok(meta) => meta
            .created()
            .or_else(|_| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH),
        Err(e) => {
            warn!(path = ?path, error = %e, "Failed to read recording metadata");
            SystemTime::UNIX_EPOCH
        }
    }
}
