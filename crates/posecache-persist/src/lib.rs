//! Side-file persistence for posecache.
//!
//! Bone caches are saved in a small JSON file next to the host document,
//! either one file per document or one file shared by every document in the
//! directory.
//!
//! # Modules
//!
//! - [`error`] — [`PersistError`] and the crate `Result`
//! - [`paths`] — [`PathConfig`] and save-path computation
//! - [`format`] — The versioned [`CacheFile`] envelope
//! - [`legacy`] — Import of literal-syntax files from older script revisions
//! - [`gateway`] — [`load`], [`save`], and the [`PersistenceGateway`] wrapper
//!
//! # Failure policy
//!
//! A missing file is [`PersistError::NotFound`] and callers treat it as an
//! empty first run. A file that does not decode is [`PersistError::Corrupt`];
//! nothing from it is returned, so a caller cannot partially merge it.

pub mod error;
pub mod format;
pub mod gateway;
pub mod legacy;
pub mod paths;

pub use error::{PersistError, Result};
pub use format::{CacheFile, FORMAT_TAG, FORMAT_VERSION};
pub use gateway::{load, save, PersistenceGateway};
pub use paths::{compute_save_path, PathConfig};
