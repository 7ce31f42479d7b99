//! Error types for selection store operations.

use posecache_types::SkeletonId;
use thiserror::Error;

/// Errors that can occur during selection store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The skeleton has never been observed by the store.
    #[error("skeleton not found: {skeleton}")]
    SkeletonNotFound { skeleton: SkeletonId },

    /// The skeleton is known but has no cache with this name.
    #[error("cache not found: {skeleton}/{name}")]
    CacheNotFound { skeleton: SkeletonId, name: String },

    /// The cache map and the order index disagree for a skeleton.
    #[error("inconsistent caches for {skeleton}: {reason}")]
    Inconsistent { skeleton: SkeletonId, reason: String },
}

impl StoreError {
    /// Returns `true` for stale references to a skeleton or cache.
    ///
    /// Interactive callers treat these as benign: the UI was drawn before
    /// the cache was removed.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SkeletonNotFound { .. } | Self::CacheNotFound { .. }
        )
    }

    pub(crate) fn inconsistent(skeleton: &SkeletonId, reason: impl Into<String>) -> Self {
        Self::Inconsistent {
            skeleton: skeleton.clone(),
            reason: reason.into(),
        }
    }

    pub(crate) fn cache_not_found(skeleton: &SkeletonId, name: &str) -> Self {
        Self::CacheNotFound {
            skeleton: skeleton.clone(),
            name: name.to_string(),
        }
    }
}

/// Convenience type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
