//! The [`CacheCommands`] trait: the typed interface the UI layer calls.
//!
//! There is one method per user action. The UI decides when to call them
//! (button press, panel draw, pie-menu choice); the implementation never
//! initiates UI actions and never changes the host selection itself.

use std::path::PathBuf;

use posecache_store::{CacheSummary, Upsert};
use posecache_types::{BoneName, CacheName, Direction, SkeletonId};
use serde::Serialize;

use crate::error::OpsResult;

/// Cache operations available to the UI.
pub trait CacheCommands {
    /// Register a skeleton the UI is about to draw. Idempotent.
    ///
    /// Returns `true` the first time a skeleton is seen.
    fn observe_skeleton(&mut self, skeleton: &SkeletonId) -> bool;

    /// Returns `true` if the skeleton has been observed or loaded.
    fn is_known(&self, skeleton: &SkeletonId) -> bool;

    /// Caches for a skeleton in display order, with member counts.
    fn list_caches(&self, skeleton: &SkeletonId) -> Vec<CacheSummary>;

    /// Save the current bone selection under `name`.
    ///
    /// Missing preconditions (empty name, nothing selected, nothing left
    /// after filtering against the skeleton's live bones) are not errors:
    /// they return [`CreateOutcome::Skipped`] and change nothing.
    fn create_cache(
        &mut self,
        skeleton: &SkeletonId,
        name: &str,
        selection: &[BoneName],
    ) -> OpsResult<CreateOutcome>;

    /// Work out which bones selecting a cache should touch.
    fn select_cache(&self, skeleton: &SkeletonId, name: &str) -> OpsResult<SelectionPlan>;

    /// Move a cache one step in the circular display order.
    ///
    /// Returns `true` if the order changed.
    fn move_cache(
        &mut self,
        skeleton: &SkeletonId,
        name: &str,
        direction: Direction,
    ) -> OpsResult<bool>;

    /// Delete a cache.
    fn delete_cache(&mut self, skeleton: &SkeletonId, name: &str) -> OpsResult<()>;

    /// Load the document's cache file and merge it into memory.
    fn load(&mut self) -> OpsResult<LoadOutcome>;

    /// Write every skeleton's caches to the document's cache file.
    fn save(&self) -> OpsResult<PathBuf>;
}

/// Why a create request changed nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyName,
    EmptySelection,
    /// Every selected bone belongs to some other skeleton.
    NoValidBones,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "enter a name for the new cache"),
            Self::EmptySelection => write!(f, "select bone(s) to make a new cache"),
            Self::NoValidBones => write!(f, "none of the selected bones belong to this skeleton"),
        }
    }
}

/// Result of [`CacheCommands::create_cache`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Skipped(SkipReason),
    Committed {
        name: CacheName,
        /// The bones actually stored, after filtering.
        bones: Vec<BoneName>,
        /// Whether an existing cache was overwritten.
        replaced: bool,
        /// Where the autosave wrote, if autosave is on.
        saved_to: Option<PathBuf>,
    },
}

impl CreateOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    pub(crate) fn committed(
        name: CacheName,
        bones: Vec<BoneName>,
        upsert: Upsert,
        saved_to: Option<PathBuf>,
    ) -> Self {
        Self::Committed {
            name,
            bones,
            replaced: upsert == Upsert::Replaced,
            saved_to,
        }
    }
}

/// What the host should do when a cache is selected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectionPlan {
    pub skeleton: SkeletonId,
    pub cache: CacheName,
    /// Cached bones that still exist on the skeleton, in cache order.
    pub bones: Vec<BoneName>,
    /// Cached bones the skeleton no longer has.
    pub missing: Vec<BoneName>,
    /// Clear the current selection before selecting `bones`.
    pub replace: bool,
    /// Frame the viewport on the selection afterwards.
    pub frame_selected: bool,
}

/// Result of [`CacheCommands::load`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file was read and `skeletons` entries were merged.
    Merged { path: PathBuf, skeletons: usize },
    /// No cache file exists yet.
    Missing { path: PathBuf },
}
