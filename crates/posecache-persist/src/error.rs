//! Error types for side-file persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while locating, reading, or writing a cache file.
#[derive(Debug, Error)]
pub enum PersistError {
    /// No cache file exists yet at this path. Expected on first use.
    #[error("cache file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but does not hold a valid cache file.
    #[error("corrupt cache file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The host document has never been saved, so there is no directory to
    /// place a cache file next to.
    #[error("document has not been saved yet; save it before saving or loading caches")]
    NoDocument,

    /// Encoding the snapshot failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error while reading or writing the file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PersistError {
    pub(crate) fn corrupt(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistError>;
