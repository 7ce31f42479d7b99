//! [`CacheSession`]: the running instance of the cache tools.
//!
//! A session owns the selection store, the settings, and the handle to the
//! host scene. The host creates one per application instance and hands the
//! UI a `&mut dyn CacheCommands` to it.

use std::collections::HashSet;
use std::path::PathBuf;

use posecache_persist::{PersistError, PersistenceGateway};
use posecache_store::{CacheSummary, SelectionStore, Snapshot, Upsert};
use posecache_types::{BoneName, CacheName, Direction, SkeletonId};
use tracing::{debug, info};

use crate::commands::{CacheCommands, CreateOutcome, LoadOutcome, SelectionPlan, SkipReason};
use crate::config::ToolSettings;
use crate::error::{OpsError, OpsResult};
use crate::scene::HostScene;

/// Cache tools state for one application instance.
pub struct CacheSession<S> {
    store: SelectionStore,
    settings: ToolSettings,
    gateway: PersistenceGateway,
    scene: S,
}

impl<S: std::fmt::Debug> std::fmt::Debug for CacheSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSession")
            .field("skeletons", &self.store.skeletons().count())
            .field("settings", &self.settings)
            .field("scene", &self.scene)
            .finish()
    }
}

impl<S: HostScene> CacheSession<S> {
    /// Create a session with an empty store. Call [`CacheCommands::load`]
    /// once the document is open.
    pub fn new(scene: S, settings: ToolSettings) -> Self {
        let gateway = PersistenceGateway::new(settings.paths.clone());
        Self {
            store: SelectionStore::new(),
            settings,
            gateway,
            scene,
        }
    }

    /// Create a session and load the document's cache file.
    ///
    /// A missing file is a first run and starts empty.
    pub fn open(scene: S, settings: ToolSettings) -> OpsResult<Self> {
        let mut session = Self::new(scene, settings);
        session.load()?;
        Ok(session)
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Replace the settings. File naming follows the new settings.
    pub fn set_settings(&mut self, settings: ToolSettings) {
        self.gateway = PersistenceGateway::new(settings.paths.clone());
        self.settings = settings;
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// Drop every cache held in memory. The file on disk is untouched.
    pub fn reset(&mut self) {
        debug!("resetting selection store");
        self.store.clear();
    }

    /// Cache file for the current document and mode.
    pub fn save_path(&self) -> OpsResult<PathBuf> {
        let document = self.scene.document_path();
        Ok(self
            .gateway
            .compute_save_path(document.as_deref(), self.settings.shared_mode)?)
    }

    /// Save if autosave is on. Failures are reported as [`OpsError::Autosave`].
    fn autosave(&self) -> OpsResult<Option<PathBuf>> {
        if !self.settings.autosave {
            return Ok(None);
        }
        let result = self
            .save_path()
            .map_err(|e| match e {
                OpsError::Persist(inner) => OpsError::Autosave(inner),
                other => other,
            })
            .and_then(|path| {
                self.gateway
                    .save(&path, &self.store.snapshot())
                    .map(|()| path)
                    .map_err(OpsError::Autosave)
            });
        result.map(Some)
    }

    /// Read the document's companion file from the earlier scripts, if any.
    ///
    /// Only consulted in per-document mode when the current file is missing.
    /// The next save writes the current format.
    fn find_legacy(&self) -> OpsResult<Option<(PathBuf, Snapshot)>> {
        if self.settings.shared_mode {
            return Ok(None);
        }
        let document = self.scene.document_path();
        for candidate in self.gateway.paths().legacy_paths(document.as_deref())? {
            match self.gateway.load(&candidate) {
                Ok(snapshot) => {
                    info!(path = %candidate.display(), "found cache file from earlier version");
                    return Ok(Some((candidate, snapshot)));
                }
                Err(PersistError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    /// Keep only the bones the skeleton currently has, in selection order.
    fn filter_selection(&self, skeleton: &SkeletonId, selection: &[BoneName]) -> Vec<BoneName> {
        let live: HashSet<BoneName> = self.scene.bone_names(skeleton).into_iter().collect();
        let mut seen = HashSet::new();
        selection
            .iter()
            .filter(|bone| live.contains(*bone) && seen.insert(*bone))
            .cloned()
            .collect()
    }
}

impl<S: HostScene> CacheCommands for CacheSession<S> {
    fn observe_skeleton(&mut self, skeleton: &SkeletonId) -> bool {
        self.store.ensure_skeleton(skeleton)
    }

    fn is_known(&self, skeleton: &SkeletonId) -> bool {
        self.store.contains_skeleton(skeleton)
    }

    fn list_caches(&self, skeleton: &SkeletonId) -> Vec<CacheSummary> {
        self.store.list(skeleton)
    }

    fn create_cache(
        &mut self,
        skeleton: &SkeletonId,
        name: &str,
        selection: &[BoneName],
    ) -> OpsResult<CreateOutcome> {
        if name.is_empty() {
            return Ok(CreateOutcome::Skipped(SkipReason::EmptyName));
        }
        if selection.is_empty() {
            return Ok(CreateOutcome::Skipped(SkipReason::EmptySelection));
        }
        let name = CacheName::new(name)?;

        let bones = self.filter_selection(skeleton, selection);
        if bones.is_empty() {
            debug!(%skeleton, cache = %name, selected = selection.len(), "no selected bone belongs to skeleton");
            return Ok(CreateOutcome::Skipped(SkipReason::NoValidBones));
        }
        if bones.len() < selection.len() {
            debug!(
                %skeleton,
                cache = %name,
                dropped = selection.len() - bones.len(),
                "dropped bones outside skeleton"
            );
        }

        let upsert = self
            .store
            .create_or_replace(skeleton, name.clone(), bones.clone());
        debug_assert_ne!(upsert, Upsert::Ignored);
        info!(%skeleton, cache = %name, bones = bones.len(), ?upsert, "cached selection");

        let saved_to = self.autosave()?;
        Ok(CreateOutcome::committed(name, bones, upsert, saved_to))
    }

    fn select_cache(&self, skeleton: &SkeletonId, name: &str) -> OpsResult<SelectionPlan> {
        let cached = self.store.apply(skeleton, name)?;
        let cache = CacheName::new(name)?;

        let live: HashSet<BoneName> = self.scene.bone_names(skeleton).into_iter().collect();
        let (bones, missing): (Vec<BoneName>, Vec<BoneName>) =
            cached.iter().cloned().partition(|bone| live.contains(bone));
        if !missing.is_empty() {
            debug!(%skeleton, cache = name, missing = missing.len(), "cache names bones the skeleton no longer has");
        }

        Ok(SelectionPlan {
            skeleton: skeleton.clone(),
            cache,
            bones,
            missing,
            replace: self.settings.replace_selection,
            frame_selected: self.settings.focus_on_selected,
        })
    }

    fn move_cache(
        &mut self,
        skeleton: &SkeletonId,
        name: &str,
        direction: Direction,
    ) -> OpsResult<bool> {
        let moved = self.store.move_cache(skeleton, name, direction)?;
        if moved {
            self.autosave()?;
        }
        Ok(moved)
    }

    fn delete_cache(&mut self, skeleton: &SkeletonId, name: &str) -> OpsResult<()> {
        self.store.delete(skeleton, name)?;
        info!(%skeleton, cache = name, "deleted cache");
        self.autosave()?;
        Ok(())
    }

    fn load(&mut self) -> OpsResult<LoadOutcome> {
        let path = self.save_path()?;
        let (path, snapshot) = match self.gateway.load(&path) {
            Ok(snapshot) => (path, snapshot),
            Err(PersistError::NotFound { path }) => match self.find_legacy()? {
                Some(found) => found,
                None => return Ok(LoadOutcome::Missing { path }),
            },
            Err(e) => return Err(e.into()),
        };
        let skeletons = self.store.merge(snapshot)?;
        info!(path = %path.display(), skeletons, "merged cache file");
        Ok(LoadOutcome::Merged { path, skeletons })
    }

    fn save(&self) -> OpsResult<PathBuf> {
        let path = self.save_path()?;
        self.gateway.save(&path, &self.store.snapshot())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::StaticScene;

    fn sk(name: &str) -> SkeletonId {
        SkeletonId::new(name).unwrap()
    }

    fn bones(names: &[&str]) -> Vec<BoneName> {
        names.iter().map(|n| BoneName::from(*n)).collect()
    }

    fn scene_in(dir: &std::path::Path) -> StaticScene {
        StaticScene::with_document(dir.join("shot.blend"))
            .with_skeleton(sk("Rig"), ["b1", "b2", "b3"])
            .with_skeleton(sk("Prop"), ["p1"])
    }

    fn manual_settings() -> ToolSettings {
        ToolSettings {
            autosave: false,
            ..ToolSettings::default()
        }
    }

    #[test]
    fn create_filters_bones_of_other_skeletons() {
        let scene = StaticScene::unsaved().with_skeleton(sk("Rig"), ["b1", "b2"]);
        let mut session = CacheSession::new(scene, manual_settings());

        let outcome = session
            .create_cache(&sk("Rig"), "Mixed", &bones(&["b1", "b3"]))
            .unwrap();
        let stored = match outcome {
            CreateOutcome::Committed { bones, .. } => bones,
            other => panic!("expected commit, got {other:?}"),
        };
        assert_eq!(stored, bones(&["b1"]));
        assert_eq!(session.store().apply(&sk("Rig"), "Mixed").unwrap(), bones(&["b1"]).as_slice());
    }

    #[test]
    fn filtered_create_always_commits_or_skips() {
        let scene = StaticScene::unsaved().with_skeleton(sk("Rig"), ["b1", "b2"]);
        let mut session = CacheSession::new(scene, manual_settings());
        let rig = sk("Rig");

        let first = session.create_cache(&rig, "Pose", &bones(&["b1"])).unwrap();
        assert!(matches!(first, CreateOutcome::Committed { replaced: false, .. }));
        let second = session.create_cache(&rig, "Pose", &bones(&["b2", "b9"])).unwrap();
        assert!(matches!(second, CreateOutcome::Committed { replaced: true, .. }));
        let third = session.create_cache(&rig, "Pose", &bones(&["b9"])).unwrap();
        assert_eq!(third, CreateOutcome::Skipped(SkipReason::NoValidBones));
        assert_eq!(session.store().apply(&rig, "Pose").unwrap(), bones(&["b2"]).as_slice());
    }

    #[test]
    fn create_drops_duplicate_selection_entries() {
        let scene = StaticScene::unsaved().with_skeleton(sk("Rig"), ["b1", "b2"]);
        let mut session = CacheSession::new(scene, manual_settings());
        session
            .create_cache(&sk("Rig"), "Dup", &bones(&["b2", "b1", "b2"]))
            .unwrap();
        assert_eq!(session.store().apply(&sk("Rig"), "Dup").unwrap(), bones(&["b2", "b1"]).as_slice());
    }

    #[test]
    fn missing_preconditions_skip_without_mutation() {
        let scene = StaticScene::unsaved().with_skeleton(sk("Rig"), ["b1"]);
        let mut session = CacheSession::new(scene, manual_settings());
        let rig = sk("Rig");

        assert_eq!(
            session.create_cache(&rig, "", &bones(&["b1"])).unwrap(),
            CreateOutcome::Skipped(SkipReason::EmptyName)
        );
        assert_eq!(
            session.create_cache(&rig, "G", &[]).unwrap(),
            CreateOutcome::Skipped(SkipReason::EmptySelection)
        );
        assert_eq!(
            session.create_cache(&rig, "G", &bones(&["zz"])).unwrap(),
            CreateOutcome::Skipped(SkipReason::NoValidBones)
        );
        assert!(!session.is_known(&rig));
    }

    #[test]
    fn autosave_writes_after_each_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CacheSession::new(scene_in(dir.path()), ToolSettings::default());
        let rig = sk("Rig");
        let file = dir.path().join("shot.posecache.json");

        let outcome = session.create_cache(&rig, "A", &bones(&["b1"])).unwrap();
        assert_eq!(
            outcome,
            CreateOutcome::Committed {
                name: CacheName::new("A").unwrap(),
                bones: bones(&["b1"]),
                replaced: false,
                saved_to: Some(file.clone()),
            }
        );
        session.create_cache(&rig, "B", &bones(&["b2"])).unwrap();
        session.move_cache(&rig, "B", Direction::Up).unwrap();

        let on_disk = posecache_persist::load(&file).unwrap();
        assert_eq!(on_disk, session.store().snapshot());

        session.delete_cache(&rig, "A").unwrap();
        let on_disk = posecache_persist::load(&file).unwrap();
        assert_eq!(on_disk.order[&rig], vec![CacheName::new("B").unwrap()]);
    }

    #[test]
    fn autosave_off_leaves_disk_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CacheSession::new(scene_in(dir.path()), manual_settings());
        let outcome = session.create_cache(&sk("Rig"), "A", &bones(&["b1"])).unwrap();
        assert!(matches!(outcome, CreateOutcome::Committed { saved_to: None, .. }));
        assert!(!dir.path().join("shot.posecache.json").exists());

        let path = session.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn autosave_on_unsaved_document_keeps_change() {
        let scene = StaticScene::unsaved().with_skeleton(sk("Rig"), ["b1"]);
        let mut session = CacheSession::new(scene, ToolSettings::default());

        let err = session
            .create_cache(&sk("Rig"), "A", &bones(&["b1"]))
            .unwrap_err();
        assert!(matches!(err, OpsError::Autosave(PersistError::NoDocument)));
        assert_eq!(session.list_caches(&sk("Rig")).len(), 1);
    }

    #[test]
    fn stale_references_are_silent_not_found() {
        let scene = StaticScene::unsaved().with_skeleton(sk("Rig"), ["b1"]);
        let mut session = CacheSession::new(scene, manual_settings());
        let rig = sk("Rig");
        session.observe_skeleton(&rig);

        for err in [
            session.select_cache(&rig, "Gone").unwrap_err(),
            session.delete_cache(&rig, "Gone").unwrap_err(),
            session.move_cache(&rig, "Gone", Direction::Up).unwrap_err(),
        ] {
            assert!(err.is_not_found());
            assert!(err.user_message().is_none());
        }
    }

    #[test]
    fn select_plan_follows_settings_and_live_bones() {
        let mut scene = StaticScene::unsaved().with_skeleton(sk("Rig"), ["b1", "b2", "b3"]);
        let rig = sk("Rig");
        let settings = ToolSettings {
            autosave: false,
            replace_selection: true,
            focus_on_selected: true,
            ..ToolSettings::default()
        };
        let mut session = CacheSession::new(scene.clone(), settings);
        session
            .create_cache(&rig, "Arm", &bones(&["b3", "b1", "b2"]))
            .unwrap();

        // The host deletes b1 after the cache was made.
        scene.add_skeleton(rig.clone(), ["b2", "b3"]);
        *session.scene_mut() = scene;

        let plan = session.select_cache(&rig, "Arm").unwrap();
        assert_eq!(plan.bones, bones(&["b3", "b2"]));
        assert_eq!(plan.missing, bones(&["b1"]));
        assert!(plan.replace);
        assert!(plan.frame_selected);
    }

    #[test]
    fn load_without_file_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CacheSession::new(scene_in(dir.path()), ToolSettings::default());
        assert!(matches!(session.load().unwrap(), LoadOutcome::Missing { .. }));
    }

    #[test]
    fn open_reads_back_saved_caches() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = CacheSession::open(scene_in(dir.path()), ToolSettings::default()).unwrap();
        first.create_cache(&sk("Rig"), "A", &bones(&["b2", "b1"])).unwrap();

        let second = CacheSession::open(scene_in(dir.path()), ToolSettings::default()).unwrap();
        assert_eq!(second.store(), first.store());
        assert!(CacheSession::open(StaticScene::unsaved(), ToolSettings::default()).is_err());
    }

    #[test]
    fn open_imports_companion_file_from_earlier_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("shot-LeetBoneToolsSelctionCache.txt");
        std::fs::write(
            &legacy,
            "({'Rig': {'Arms': ['b1', 'b2'], 'Chest': ['b3']}}, {'Rig': ['Chest', 'Arms']})",
        )
        .unwrap();

        let mut session = CacheSession::new(scene_in(dir.path()), ToolSettings::default());
        match session.load().unwrap() {
            LoadOutcome::Merged { path, skeletons } => {
                assert_eq!(path, legacy);
                assert_eq!(skeletons, 1);
            }
            other => panic!("expected a merge, got {other:?}"),
        }
        let names: Vec<_> = session.list_caches(&sk("Rig")).into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["Chest", "Arms"]);

        // Saving writes the current format next to the old file.
        let saved = session.save().unwrap();
        assert_eq!(saved, dir.path().join("shot.posecache.json"));
        let reopened = CacheSession::open(scene_in(dir.path()), ToolSettings::default()).unwrap();
        assert_eq!(reopened.store(), session.store());
    }

    #[test]
    fn current_file_wins_over_earlier_companion() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("shot-LeetBoneToolsSelctionCache.txt"),
            "{'Rig': {'Old': ['b1']}}",
        )
        .unwrap();
        let mut first = CacheSession::new(scene_in(dir.path()), ToolSettings::default());
        first.create_cache(&sk("Rig"), "New", &bones(&["b2"])).unwrap();

        let second = CacheSession::open(scene_in(dir.path()), ToolSettings::default()).unwrap();
        let names: Vec<_> = second.list_caches(&sk("Rig")).into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["New"]);
    }

    #[test]
    fn earlier_companion_is_ignored_in_shared_mode() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("shot-LeetBoneToolsSelctionCache.txt"),
            "{'Rig': {'Old': ['b1']}}",
        )
        .unwrap();
        let settings = ToolSettings {
            shared_mode: true,
            ..ToolSettings::default()
        };
        let mut session = CacheSession::new(scene_in(dir.path()), settings);
        assert!(matches!(session.load().unwrap(), LoadOutcome::Missing { .. }));
    }

    #[test]
    fn load_on_unsaved_document_is_no_document() {
        let mut session = CacheSession::new(StaticScene::unsaved(), ToolSettings::default());
        let err = session.load().unwrap_err();
        assert!(err.is_no_document());
        assert!(err.user_message().is_some());
    }

    #[test]
    fn corrupt_file_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CacheSession::new(scene_in(dir.path()), manual_settings());
        session.create_cache(&sk("Rig"), "A", &bones(&["b1"])).unwrap();
        let before = session.store().clone();

        std::fs::write(dir.path().join("shot.posecache.json"), "{{{ nope").unwrap();
        let err = session.load().unwrap_err();
        assert!(err.is_corrupt());
        assert!(err.user_message().is_some());
        assert_eq!(session.store(), &before);
    }

    #[test]
    fn reset_discards_store() {
        let scene = StaticScene::unsaved().with_skeleton(sk("Rig"), ["b1"]);
        let mut session = CacheSession::new(scene, manual_settings());
        session.create_cache(&sk("Rig"), "A", &bones(&["b1"])).unwrap();
        session.reset();
        assert!(!session.is_known(&sk("Rig")));
    }

    #[test]
    fn ui_can_drive_session_through_trait_object() {
        let scene = StaticScene::unsaved().with_skeleton(sk("Rig"), ["b1", "b2"]);
        let mut session = CacheSession::new(scene, manual_settings());
        let ui: &mut dyn CacheCommands = &mut session;
        let rig = sk("Rig");

        assert!(ui.observe_skeleton(&rig));
        assert!(!ui.observe_skeleton(&rig));
        ui.create_cache(&rig, "One", &bones(&["b1"])).unwrap();
        ui.create_cache(&rig, "Two", &bones(&["b1", "b2"])).unwrap();

        let rows = ui.list_caches(&rig);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "Two");
        assert_eq!(rows[1].bone_count, 2);
    }
}
