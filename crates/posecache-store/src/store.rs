//! The in-memory selection store.
//!
//! [`SelectionStore`] holds two parallel maps keyed by skeleton: the cache
//! contents and the display order of cache names. Every mutating method
//! leaves the two maps consistent before returning, and every failing method
//! leaves the store unchanged.

use std::collections::BTreeMap;

use posecache_types::{BoneName, CacheName, Direction, SkeletonId};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::types::{check_consistency, Cache, CacheMap, CacheSummary, OrderMap, Snapshot, Upsert};

/// Per-skeleton bone caches and their display order.
///
/// The store is plain owned data mutated through `&mut self`. It is owned by
/// the session object of the running application instance and is never
/// shared across threads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionStore {
    caches: CacheMap,
    order: OrderMap,
}

impl SelectionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every skeleton and cache.
    pub fn clear(&mut self) {
        self.caches.clear();
        self.order.clear();
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Returns `true` if the skeleton has been observed.
    pub fn contains_skeleton(&self, skeleton: &SkeletonId) -> bool {
        self.order.contains_key(skeleton)
    }

    /// All known skeletons, sorted by name.
    pub fn skeletons(&self) -> impl Iterator<Item = &SkeletonId> {
        self.order.keys()
    }

    /// Cache names for a skeleton in display order.
    ///
    /// Unknown skeletons yield an empty slice.
    pub fn order(&self, skeleton: &SkeletonId) -> &[CacheName] {
        self.order.get(skeleton).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up a cache without treating absence as an error.
    pub fn get(&self, skeleton: &SkeletonId, name: &str) -> Option<&[BoneName]> {
        self.caches
            .get(skeleton)
            .and_then(|entries| entries.get(name))
            .map(Vec::as_slice)
    }

    /// Rows for the UI: each cache in display order with its bone count.
    pub fn list(&self, skeleton: &SkeletonId) -> Vec<CacheSummary> {
        let Some(entries) = self.caches.get(skeleton) else {
            return Vec::new();
        };
        self.order(skeleton)
            .iter()
            .map(|name| CacheSummary {
                name: name.clone(),
                bone_count: entries.get(name).map_or(0, Vec::len),
            })
            .collect()
    }

    /// Number of caches stored for a skeleton.
    pub fn cache_count(&self, skeleton: &SkeletonId) -> usize {
        self.order(skeleton).len()
    }

    /// Owned copy of both structures, for saving.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.caches.clone(), self.order.clone())
    }

    /// Verify the store invariant.
    pub fn check_consistency(&self) -> Result<()> {
        check_consistency(&self.caches, &self.order)
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Register a skeleton with no caches. Returns `true` if it was new.
    pub fn ensure_skeleton(&mut self, skeleton: &SkeletonId) -> bool {
        if self.order.contains_key(skeleton) {
            return false;
        }
        debug!(%skeleton, "registering skeleton");
        self.caches.insert(skeleton.clone(), BTreeMap::new());
        self.order.insert(skeleton.clone(), Vec::new());
        true
    }

    /// Store `bones` under `name` for `skeleton`.
    ///
    /// A new name is appended to the end of the skeleton's order. An existing
    /// name has its bones overwritten and keeps its position. An empty bone
    /// list changes nothing.
    pub fn create_or_replace(
        &mut self,
        skeleton: &SkeletonId,
        name: CacheName,
        bones: Vec<BoneName>,
    ) -> Upsert {
        if bones.is_empty() {
            debug!(%skeleton, cache = %name, "ignoring cache with no bones");
            return Upsert::Ignored;
        }

        self.ensure_skeleton(skeleton);
        let entries = self.caches.entry(skeleton.clone()).or_default();
        let order = self.order.entry(skeleton.clone()).or_default();

        if let Some(existing) = entries.get_mut(&name) {
            debug!(%skeleton, cache = %name, bones = bones.len(), "replacing cache");
            *existing = bones;
            return Upsert::Replaced;
        }

        debug!(%skeleton, cache = %name, bones = bones.len(), "creating cache");
        order.push(name.clone());
        entries.insert(name, bones);
        Upsert::Inserted
    }

    /// Return the stored bones for a cache, unfiltered.
    pub fn apply(&self, skeleton: &SkeletonId, name: &str) -> Result<&[BoneName]> {
        let entries = self
            .caches
            .get(skeleton)
            .ok_or_else(|| StoreError::SkeletonNotFound {
                skeleton: skeleton.clone(),
            })?;
        entries
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::cache_not_found(skeleton, name))
    }

    /// Remove a cache from both the content map and the order.
    ///
    /// Returns the bones the cache held.
    pub fn delete(&mut self, skeleton: &SkeletonId, name: &str) -> Result<Cache> {
        self.apply(skeleton, name)?;

        let order = self
            .order
            .get_mut(skeleton)
            .ok_or_else(|| StoreError::inconsistent(skeleton, "missing from order index"))?;
        let position = order
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| StoreError::inconsistent(skeleton, format!("cache missing from order: {name}")))?;

        order.remove(position);
        let removed = self
            .caches
            .get_mut(skeleton)
            .and_then(|entries| entries.remove(name))
            .unwrap_or_default();
        debug!(%skeleton, cache = name, "deleted cache");
        Ok(removed)
    }

    /// Swap a cache with its neighbor in the circular display order.
    ///
    /// Returns `true` if the order changed. With one cache or none there is
    /// nothing to swap.
    pub fn move_cache(
        &mut self,
        skeleton: &SkeletonId,
        name: &str,
        direction: Direction,
    ) -> Result<bool> {
        self.apply(skeleton, name)?;

        let order = self
            .order
            .get_mut(skeleton)
            .ok_or_else(|| StoreError::inconsistent(skeleton, "missing from order index"))?;
        if order.len() <= 1 {
            return Ok(false);
        }

        let index = order
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| StoreError::inconsistent(skeleton, format!("cache missing from order: {name}")))?;
        let neighbor = direction.neighbor(index, order.len());
        order.swap(index, neighbor);
        debug!(%skeleton, cache = name, %direction, from = index, to = neighbor, "moved cache");
        Ok(true)
    }

    /// Replace every skeleton present in `snapshot` wholesale.
    ///
    /// Skeletons absent from the snapshot keep their in-memory state. The
    /// snapshot is validated first; an inconsistent snapshot is rejected and
    /// nothing is merged. Returns the number of skeletons replaced.
    pub fn merge(&mut self, snapshot: Snapshot) -> Result<usize> {
        snapshot.validate()?;

        let Snapshot { caches, mut order } = snapshot;
        let mut merged = 0;
        for (skeleton, entries) in caches {
            let names = order.remove(&skeleton).unwrap_or_default();
            debug!(%skeleton, caches = names.len(), "merging skeleton from disk");
            self.order.insert(skeleton.clone(), names);
            self.caches.insert(skeleton, entries);
            merged += 1;
        }
        Ok(merged)
    }
}
