//! Local tool cache.
//!
//! Layout follows the pipeline agent's tool cache so tools installed by this
//! task and by other installer tasks can share one directory:
//!
//! ```text
//! <tools dir>/
//! └── bicep/
//!     └── 0.4.1008/
//!         ├── x64/
//!         │   └── bicep
//!         └── x64.complete
//! ```
//!
//! An entry only counts once its `.complete` marker exists.

use crate::error::{InstallerError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub trait ToolCache {
    /// Directory of the cached entry for `(tool, version)`, if complete.
    fn find(&self, tool: &str, version: &str) -> Option<PathBuf>;

    /// Copies `source` into the cache as `file_name` and returns the entry
    /// directory.
    fn cache_file(&self, source: &Path, file_name: &str, tool: &str, version: &str) -> Result<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct LocalToolCache {
    root: PathBuf,
    arch: String,
}

impl LocalToolCache {
    pub fn new(root: impl Into<PathBuf>, arch: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            arch: arch.into(),
        }
    }

    fn version_dir(&self, tool: &str, version: &str) -> PathBuf {
        self.root.join(tool).join(version)
    }

    pub fn entry_dir(&self, tool: &str, version: &str) -> PathBuf {
        self.version_dir(tool, version).join(&self.arch)
    }

    fn marker_path(&self, tool: &str, version: &str) -> PathBuf {
        self.version_dir(tool, version)
            .join(format!("{}.complete", self.arch))
    }
}

impl ToolCache for LocalToolCache {
    fn find(&self, tool: &str, version: &str) -> Option<PathBuf> {
        let dir = self.entry_dir(tool, version);
        if dir.is_dir() && self.marker_path(tool, version).is_file() {
            tracing::trace!("Cache hit for {} {} at {}", tool, version, dir.display());
            Some(dir)
        } else {
            tracing::trace!("Cache miss for {} {}", tool, version);
            None
        }
    }

    fn cache_file(&self, source: &Path, file_name: &str, tool: &str, version: &str) -> Result<PathBuf> {
        let dir = self.entry_dir(tool, version);
        let marker = self.marker_path(tool, version);

        // Leftovers from an interrupted write are never trusted
        if marker.exists() {
            fs::remove_file(&marker).map_err(|e| InstallerError::cache(&marker, e))?;
        }
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| InstallerError::cache(&dir, e))?;
        }
        fs::create_dir_all(&dir).map_err(|e| InstallerError::cache(&dir, e))?;

        let dest = dir.join(file_name);
        fs::copy(source, &dest).map_err(|e| InstallerError::cache(&dest, e))?;
        fs::write(&marker, "").map_err(|e| InstallerError::cache(&marker, e))?;

        tracing::debug!("Cached {} {} at {}", tool, version, dest.display());
        Ok(dir)
    }
}
