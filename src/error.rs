use crate::download::DownloadError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstallerError>;

/// Failures that end an installer run.
///
/// A failed "latest" lookup is not in here: it is recovered by falling back
/// to the stable version (see [`crate::install::github::ReleaseLookupError`]).
#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("'{input}' is not a valid semver version")]
    InvalidVersion { input: String },

    #[error("Failed to download Bicep from {url}")]
    DownloadFailed {
        url: String,
        #[source]
        source: DownloadError,
    },

    #[error("Tool cache error at {}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to locate executable '{name}' on PATH")]
    ExecutableNotFound {
        name: String,
        #[source]
        source: which::Error,
    },

    #[error("Verification of {} failed: {reason}", path.display())]
    VerificationFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl InstallerError {
    pub fn cache(path: impl Into<PathBuf>, source: io::Error) -> Self {
        InstallerError::Cache {
            path: path.into(),
            source,
        }
    }
}
