//! Loading and saving cache files.
//!
//! `save` always writes the full snapshot and overwrites whatever is on
//! disk. There is no lock and no merge with the existing file: when several
//! documents share one file, the last writer wins.

use std::fs;
use std::path::{Path, PathBuf};

use posecache_store::Snapshot;
use tracing::{debug, info, warn};

use crate::error::{PersistError, Result};
use crate::format::{CacheFile, DecodeError};
use crate::legacy::{looks_like_literal, snapshot_from_legacy};
use crate::paths::PathConfig;

/// Reads and writes cache files for host documents.
#[derive(Clone, Debug, Default)]
pub struct PersistenceGateway {
    paths: PathConfig,
}

impl PersistenceGateway {
    pub fn new(paths: PathConfig) -> Self {
        Self { paths }
    }

    /// The naming rules in use.
    pub fn paths(&self) -> &PathConfig {
        &self.paths
    }

    /// Resolve the cache file for a document.
    pub fn compute_save_path(&self, document: Option<&Path>, shared_mode: bool) -> Result<PathBuf> {
        self.paths.save_path(document, shared_mode)
    }

    /// Read a cache file into a snapshot.
    pub fn load(&self, path: &Path) -> Result<Snapshot> {
        load(path)
    }

    /// Write a snapshot, replacing the file.
    pub fn save(&self, path: &Path, snapshot: &Snapshot) -> Result<()> {
        save(path, snapshot)
    }
}

/// Read and decode a cache file.
///
/// A missing file is [`PersistError::NotFound`], the normal state before the
/// first save. Anything that does not decode to a consistent snapshot is
/// [`PersistError::Corrupt`].
pub fn load(path: &Path) -> Result<Snapshot> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no cache file yet");
            return Err(PersistError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            return Err(PersistError::corrupt(path, "file is not valid UTF-8"));
        }
        Err(e) => return Err(e.into()),
    };

    let snapshot = decode(path, &text)?;
    debug!(
        path = %path.display(),
        skeletons = snapshot.caches.len(),
        "loaded cache file"
    );
    Ok(snapshot)
}

fn decode(path: &Path, text: &str) -> Result<Snapshot> {
    match CacheFile::decode(text) {
        Ok(snapshot) => Ok(snapshot),
        Err(DecodeError::Invalid(reason)) => {
            warn!(path = %path.display(), %reason, "rejecting cache file");
            Err(PersistError::corrupt(path, reason))
        }
        Err(DecodeError::NotEnvelope(json_reason)) => {
            if !looks_like_literal(text) {
                warn!(path = %path.display(), reason = %json_reason, "rejecting cache file");
                return Err(PersistError::corrupt(path, json_reason));
            }
            match snapshot_from_legacy(text) {
                Ok(snapshot) => {
                    info!(path = %path.display(), "imported legacy cache file");
                    Ok(snapshot)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "rejecting legacy cache file");
                    Err(PersistError::corrupt(path, e.to_string()))
                }
            }
        }
    }
}

/// Encode a snapshot and write it to `path`, replacing any existing file.
///
/// The parent directory is created if needed.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let text = CacheFile::from_snapshot(snapshot.clone())
        .encode()
        .map_err(PersistError::Serialization)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    info!(
        path = %path.display(),
        skeletons = snapshot.caches.len(),
        "saved cache file"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use posecache_store::SelectionStore;
    use posecache_types::{BoneName, CacheName, Direction, SkeletonId};

    fn sk(name: &str) -> SkeletonId {
        SkeletonId::new(name).unwrap()
    }

    fn populated_store() -> SelectionStore {
        let rig = sk("Rig");
        let mut store = SelectionStore::new();
        store.create_or_replace(
            &rig,
            CacheName::new("Hands").unwrap(),
            vec![BoneName::from("hand.L"), BoneName::from("hand.R")],
        );
        store.create_or_replace(
            &rig,
            CacheName::new("Spine").unwrap(),
            vec![BoneName::from("spine.001")],
        );
        store.create_or_replace(
            &rig,
            CacheName::new("Head").unwrap(),
            vec![BoneName::from("neck"), BoneName::from("head")],
        );
        store.move_cache(&rig, "Head", Direction::Down).unwrap();
        store.ensure_skeleton(&sk("Camera_Rig"));
        store
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.posecache.json");
        let store = populated_store();

        save(&path, &store.snapshot()).unwrap();

        let mut fresh = SelectionStore::new();
        fresh.merge(load(&path).unwrap()).unwrap();
        assert_eq!(fresh, store);
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.json");

        save(&path, &populated_store().snapshot()).unwrap();
        save(&path, &SelectionStore::new().snapshot()).unwrap();

        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("caches.json");
        save(&path, &populated_store().snapshot()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PersistError::NotFound { .. }));
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "this is not a cache file").unwrap();
        assert!(matches!(
            load(&path).unwrap_err(),
            PersistError::Corrupt { .. }
        ));
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.json");
        save(&path, &populated_store().snapshot()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, &text[..text.len() / 2]).unwrap();

        assert!(matches!(
            load(&path).unwrap_err(),
            PersistError::Corrupt { .. }
        ));
    }

    #[test]
    fn non_utf8_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.json");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();
        assert!(matches!(
            load(&path).unwrap_err(),
            PersistError::Corrupt { .. }
        ));
    }

    #[test]
    fn legacy_literal_is_imported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.txt");
        fs::write(&path, "{'Rig': {'Hands': ['hand.L', 'hand.R']}}").unwrap();

        let snapshot = load(&path).unwrap();
        let rig = sk("Rig");
        assert_eq!(snapshot.order[&rig], vec![CacheName::new("Hands").unwrap()]);
    }

    #[test]
    fn broken_legacy_literal_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.txt");
        fs::write(&path, "{'Rig': {'Hands': ['hand.L'").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt { .. }));
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn deeply_nested_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.posecache.json");
        fs::write(&path, format!("{}{}", "(".repeat(200_000), ")".repeat(200_000))).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt { .. }));
        assert!(err.to_string().contains("nesting too deep"));
    }

    #[test]
    fn gateway_resolves_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("walk.blend");
        let gateway = PersistenceGateway::default();

        let path = gateway.compute_save_path(Some(&document), false).unwrap();
        assert_eq!(path, dir.path().join("walk.posecache.json"));

        let snapshot = populated_store().snapshot();
        gateway.save(&path, &snapshot).unwrap();
        assert_eq!(gateway.load(&path).unwrap(), snapshot);
    }
}
