//! Foundation types for posecache.
//!
//! posecache keeps named, ordered sets of bones ("caches") per skeleton so an
//! animator can recall a bone selection with one click. This crate holds the
//! identifiers shared by every other posecache crate.
//!
//! # Key Types
//!
//! - [`SkeletonId`] — Name of one armature object in the host scene
//! - [`BoneName`] — Name of one bone inside a skeleton (unvalidated)
//! - [`CacheName`] — Non-empty name of a cache, unique per skeleton
//! - [`Direction`] — Reorder direction for the per-skeleton cache list

pub mod direction;
pub mod error;
pub mod names;

pub use direction::Direction;
pub use error::TypeError;
pub use names::{BoneName, CacheName, SkeletonId};
