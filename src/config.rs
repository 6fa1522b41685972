use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-manager";
/// SQLite file holding the live catalogue.
const LIVE_DB_FILE_NAME: &str = "library.sqlite";
/// Disposable SQLite file the self-test harness resets and writes to.
const TEST_DB_FILE_NAME: &str = "library_test.sqlite";

/// Where the two library databases live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPaths {
    data_dir: PathBuf,
}

impl LibraryPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Use `override_dir` when given, otherwise `~/.library-manager`.
    pub fn resolve(override_dir: Option<PathBuf>) -> Result<Self> {
        match override_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => {
                let base_dirs =
                    BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
                Ok(Self::new(base_dirs.home_dir().join(DATA_DIR_NAME)))
            }
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn live_db(&self) -> PathBuf {
        self.data_dir.join(LIVE_DB_FILE_NAME)
    }

    pub fn test_db(&self) -> PathBuf {
        self.data_dir.join(TEST_DB_FILE_NAME)
    }
}
