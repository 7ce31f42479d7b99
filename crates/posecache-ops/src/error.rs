//! Error types for cache operations, and how the UI should surface them.

use posecache_persist::PersistError;
use posecache_store::StoreError;
use posecache_types::TypeError;
use thiserror::Error;

/// Errors returned by [`CacheCommands`](crate::CacheCommands) methods.
#[derive(Debug, Error)]
pub enum OpsError {
    /// A store operation failed (usually a stale skeleton or cache name).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Loading or saving the cache file failed.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The change was applied in memory but the autosave that followed it
    /// failed. The store is consistent; the file on disk is stale.
    #[error("change kept in memory but not saved: {0}")]
    Autosave(#[source] PersistError),

    /// A name supplied by the host was malformed.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// The settings file could not be read or parsed.
    #[error("invalid settings: {0}")]
    Config(String),
}

/// How the UI should present an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Expected in an interactive UI; log it and carry on.
    Silent,
    /// Show a non-blocking message to the user.
    Notify,
}

impl OpsError {
    /// Returns `true` for stale references to a skeleton or cache.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns `true` if a cache file exists but could not be decoded.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Persist(PersistError::Corrupt { .. }))
    }

    /// Returns `true` if the host document has never been saved.
    pub fn is_no_document(&self) -> bool {
        matches!(
            self,
            Self::Persist(PersistError::NoDocument) | Self::Autosave(PersistError::NoDocument)
        )
    }

    pub fn disposition(&self) -> Disposition {
        if self.is_not_found() {
            Disposition::Silent
        } else {
            Disposition::Notify
        }
    }

    /// Text for a non-blocking message, or `None` when the error should be
    /// swallowed.
    pub fn user_message(&self) -> Option<String> {
        match self.disposition() {
            Disposition::Silent => None,
            Disposition::Notify => Some(self.to_string()),
        }
    }
}

/// Convenience type alias for cache operations.
pub type OpsResult<T> = std::result::Result<T, OpsError>;
