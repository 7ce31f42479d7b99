//! Selection store for posecache.
//!
//! This crate owns the authoritative in-memory mapping from skeleton to its
//! named bone caches, plus the per-skeleton display order of those caches.
//!
//! # Invariant
//!
//! For every skeleton in the store, the set of names in its order list equals
//! the key set of its cache map, with no duplicates. Every mutating method
//! restores this before returning, and a failed call never mutates.
//!
//! # Modules
//!
//! - [`error`] — Error types for store operations
//! - [`types`] — [`Snapshot`], [`CacheSummary`], and the map aliases
//! - [`store`] — The [`SelectionStore`] itself

pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::SelectionStore;
pub use types::{Cache, CacheMap, CacheSummary, OrderMap, Snapshot, Upsert};
