use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where recordings live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of saved `<title>.wav` recordings.
    pub recordings_dir: PathBuf,
    /// Directory for in-flight temporary files. Keep it on the same
    /// filesystem as `recordings_dir`.
    pub staging_dir: PathBuf,
}

impl StorageConfig {
    /// Default layout under `data_dir`.
    pub fn under(data_dir: &Path) -> Self {
        Self {
            recordings_dir: data_dir.join("recordings"),
            staging_dir: data_dir.join("staging"),
        }
    }
}
