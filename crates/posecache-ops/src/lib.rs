//! Cache operations for posecache.
//!
//! This crate is the layer the host UI talks to. It wraps the selection
//! store and the cache file behind the [`CacheCommands`] trait, applies the
//! autosave policy, filters new caches against the skeleton's live bones,
//! and turns selection and keying actions into plans the host carries out.
//!
//! # Modules
//!
//! - [`commands`] — The [`CacheCommands`] trait and its outcome types
//! - [`session`] — [`CacheSession`], the implementation owned by the host
//! - [`scene`] — The [`HostScene`] trait and the in-memory [`StaticScene`]
//! - [`config`] — [`ToolSettings`], loadable from TOML
//! - [`keying`] — Keyframe insert/clear/reset plans
//! - [`error`] — [`OpsError`] and how the UI should surface it
//!
//! # Example
//!
//! ```
//! use posecache_ops::{CacheCommands, CacheSession, StaticScene, ToolSettings};
//! use posecache_types::{BoneName, SkeletonId};
//!
//! let rig = SkeletonId::new("Rig").unwrap();
//! let scene = StaticScene::unsaved().with_skeleton(rig.clone(), ["hand.L", "hand.R"]);
//! let settings = ToolSettings { autosave: false, ..ToolSettings::default() };
//! let mut session = CacheSession::new(scene, settings);
//!
//! let selection = [BoneName::from("hand.L"), BoneName::from("hand.R")];
//! session.create_cache(&rig, "Hands", &selection).unwrap();
//! assert_eq!(session.list_caches(&rig)[0].bone_count, 2);
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod keying;
pub mod scene;
pub mod session;

pub use commands::{CacheCommands, CreateOutcome, LoadOutcome, SelectionPlan, SkipReason};
pub use config::ToolSettings;
pub use error::{Disposition, OpsError, OpsResult};
pub use keying::{clear_keys, insert_keys, reset_transforms, KeyDeletion, KeyingSettings, TransformChannel};
pub use posecache_store::CacheSummary;
pub use scene::{HostScene, StaticScene};
pub use session::CacheSession;
