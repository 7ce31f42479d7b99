//! The [`HostScene`] trait: what the cache tools need to know about the host.
//!
//! The host application implements this over its live scene. Everything
//! posecache asks of the host goes through here; selection changes and
//! keyframe edits are returned as plans instead.

use std::collections::BTreeMap;
use std::path::PathBuf;

use posecache_types::{BoneName, SkeletonId};

/// Read-only view of the host document and its skeletons.
pub trait HostScene {
    /// Path of the open document on disk.
    ///
    /// Returns `None` if the document has never been saved.
    fn document_path(&self) -> Option<PathBuf>;

    /// Bones that currently exist on `skeleton`.
    ///
    /// Returns an empty list if the skeleton is not in the scene.
    fn bone_names(&self, skeleton: &SkeletonId) -> Vec<BoneName>;
}

/// A fixed, in-memory [`HostScene`] for tests and headless use.
#[derive(Clone, Debug, Default)]
pub struct StaticScene {
    document: Option<PathBuf>,
    skeletons: BTreeMap<SkeletonId, Vec<BoneName>>,
}

impl StaticScene {
    /// A scene for a document that has never been saved.
    pub fn unsaved() -> Self {
        Self::default()
    }

    /// A scene for the document at `path`.
    pub fn with_document(path: impl Into<PathBuf>) -> Self {
        Self {
            document: Some(path.into()),
            skeletons: BTreeMap::new(),
        }
    }

    /// Add (or replace) a skeleton and its bones.
    pub fn with_skeleton<I, B>(mut self, skeleton: SkeletonId, bones: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<BoneName>,
    {
        self.add_skeleton(skeleton, bones);
        self
    }

    pub fn add_skeleton<I, B>(&mut self, skeleton: SkeletonId, bones: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<BoneName>,
    {
        self.skeletons
            .insert(skeleton, bones.into_iter().map(Into::into).collect());
    }

    /// Simulate the host saving the document under a new path.
    pub fn set_document(&mut self, path: Option<PathBuf>) {
        self.document = path;
    }
}

impl HostScene for StaticScene {
    fn document_path(&self) -> Option<PathBuf> {
        self.document.clone()
    }

    fn bone_names(&self, skeleton: &SkeletonId) -> Vec<BoneName> {
        self.skeletons.get(skeleton).cloned().unwrap_or_default()
    }
}

impl<T: HostScene + ?Sized> HostScene for &T {
    fn document_path(&self) -> Option<PathBuf> {
        (**self).document_path()
    }

    fn bone_names(&self, skeleton: &SkeletonId) -> Vec<BoneName> {
        (**self).bone_names(skeleton)
    }
}
