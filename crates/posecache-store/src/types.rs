//! Value types shared between the store, the persistence layer, and the UI.

use std::collections::{BTreeMap, BTreeSet};

use posecache_types::{BoneName, CacheName, SkeletonId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// The bones captured by one cache, in selection order.
pub type Cache = Vec<BoneName>;

/// Content map: skeleton → cache name → bones.
pub type CacheMap = BTreeMap<SkeletonId, BTreeMap<CacheName, Cache>>;

/// Display order: skeleton → cache names.
pub type OrderMap = BTreeMap<SkeletonId, Vec<CacheName>>;

/// Owned copy of the store's two structures.
///
/// This is the unit exchanged with the persistence layer: `save` writes a
/// snapshot, `load` produces one, and [`SelectionStore::merge`] consumes it.
///
/// [`SelectionStore::merge`]: crate::SelectionStore::merge
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub caches: CacheMap,
    pub order: OrderMap,
}

impl Snapshot {
    pub fn new(caches: CacheMap, order: OrderMap) -> Self {
        Self { caches, order }
    }

    /// Returns `true` if the snapshot holds no skeletons.
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty() && self.order.is_empty()
    }

    /// Verify that `caches` and `order` describe the same names.
    pub fn validate(&self) -> Result<()> {
        check_consistency(&self.caches, &self.order)
    }
}

/// One row of a skeleton's cache list, as drawn by the UI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSummary {
    pub name: CacheName,
    pub bone_count: usize,
}

/// What [`SelectionStore::create_or_replace`] did.
///
/// [`SelectionStore::create_or_replace`]: crate::SelectionStore::create_or_replace
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    /// A new cache was appended to the skeleton's order.
    Inserted,
    /// An existing cache's bones were overwritten in place.
    Replaced,
    /// The bone list was empty; nothing changed.
    Ignored,
}

/// Check the store invariant over a pair of maps.
///
/// Both maps must have the same skeletons, and for each skeleton the order
/// list must hold every cache name exactly once.
pub(crate) fn check_consistency(caches: &CacheMap, order: &OrderMap) -> Result<()> {
    for skeleton in caches.keys() {
        if !order.contains_key(skeleton) {
            return Err(StoreError::inconsistent(skeleton, "missing from order index"));
        }
    }

    for (skeleton, names) in order {
        let Some(entries) = caches.get(skeleton) else {
            return Err(StoreError::inconsistent(skeleton, "missing from cache map"));
        };

        let mut seen = BTreeSet::new();
        for name in names {
            if !seen.insert(name) {
                return Err(StoreError::inconsistent(
                    skeleton,
                    format!("duplicate entry in order: {name}"),
                ));
            }
            if !entries.contains_key(name) {
                return Err(StoreError::inconsistent(
                    skeleton,
                    format!("ordered cache has no content: {name}"),
                ));
            }
        }

        if let Some(orphan) = entries.keys().find(|name| !seen.contains(name)) {
            return Err(StoreError::inconsistent(
                skeleton,
                format!("cache missing from order: {orphan}"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sk(name: &str) -> SkeletonId {
        SkeletonId::new(name).unwrap()
    }

    fn cn(name: &str) -> CacheName {
        CacheName::new(name).unwrap()
    }

    fn snapshot_with(order: &[&str], content: &[&str]) -> Snapshot {
        let mut caches = CacheMap::new();
        let mut entries = BTreeMap::new();
        for name in content {
            entries.insert(cn(name), vec![BoneName::from("spine")]);
        }
        caches.insert(sk("Rig"), entries);

        let mut order_map = OrderMap::new();
        order_map.insert(sk("Rig"), order.iter().map(|n| cn(n)).collect());
        Snapshot::new(caches, order_map)
    }

    #[test]
    fn matching_snapshot_is_valid() {
        assert!(snapshot_with(&["B", "A"], &["A", "B"]).validate().is_ok());
        assert!(Snapshot::default().validate().is_ok());
    }

    #[test]
    fn orphan_cache_is_rejected() {
        let err = snapshot_with(&["A"], &["A", "B"]).validate().unwrap_err();
        assert!(matches!(err, StoreError::Inconsistent { .. }));
        assert!(err.to_string().contains("missing from order: B"));
    }

    #[test]
    fn ordered_name_without_content_is_rejected() {
        let err = snapshot_with(&["A", "C"], &["A"]).validate().unwrap_err();
        assert!(err.to_string().contains("no content: C"));
    }

    #[test]
    fn duplicate_order_entry_is_rejected() {
        let err = snapshot_with(&["A", "A"], &["A"]).validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn skeleton_missing_from_either_map_is_rejected() {
        let mut snap = snapshot_with(&["A"], &["A"]);
        snap.order.clear();
        assert!(snap.validate().is_err());

        let mut snap = snapshot_with(&["A"], &["A"]);
        snap.caches.clear();
        assert!(snap.validate().is_err());
    }
}
