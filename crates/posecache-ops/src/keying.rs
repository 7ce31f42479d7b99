//! Keyframe plans for the current frame.
//!
//! The host owns keyframes. These functions only decide which transform
//! channels a key, clear, or reset action touches, based on the animator's
//! channel toggles; the host carries the plan out.

use posecache_types::BoneName;
use serde::{Deserialize, Serialize};

/// Which transform channels the keying actions affect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyingSettings {
    pub location: bool,
    pub rotation: bool,
    pub scale: bool,
}

impl Default for KeyingSettings {
    fn default() -> Self {
        Self {
            location: true,
            rotation: true,
            scale: false,
        }
    }
}

impl KeyingSettings {
    /// Enabled channels, always in location, rotation, scale order.
    pub fn channels(&self) -> Vec<TransformChannel> {
        [
            (self.location, TransformChannel::Location),
            (self.rotation, TransformChannel::Rotation),
            (self.scale, TransformChannel::Scale),
        ]
        .into_iter()
        .filter_map(|(enabled, channel)| enabled.then_some(channel))
        .collect()
    }
}

/// One group of pose-bone transform properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformChannel {
    Location,
    Rotation,
    Scale,
}

impl TransformChannel {
    /// Name of the host's built-in keying set for this channel.
    pub fn keying_set(self) -> &'static str {
        match self {
            Self::Location => "Location",
            Self::Rotation => "Rotation",
            Self::Scale => "Scaling",
        }
    }

    /// Animated property paths on a pose bone. Rotation covers both modes.
    pub fn data_paths(self) -> &'static [&'static str] {
        match self {
            Self::Location => &["location"],
            Self::Rotation => &["rotation_euler", "rotation_quaternion"],
            Self::Scale => &["scale"],
        }
    }
}

impl std::fmt::Display for TransformChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Location => write!(f, "location"),
            Self::Rotation => write!(f, "rotation"),
            Self::Scale => write!(f, "scale"),
        }
    }
}

/// A single keyframe to delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyDeletion {
    pub bone: BoneName,
    pub data_path: &'static str,
    pub frame: i32,
}

/// Keying sets to insert on the selected bones, in order.
pub fn insert_keys(settings: &KeyingSettings) -> Vec<TransformChannel> {
    settings.channels()
}

/// Keyframes to delete from `bones` at `frame`.
pub fn clear_keys(settings: &KeyingSettings, frame: i32, bones: &[BoneName]) -> Vec<KeyDeletion> {
    let channels = settings.channels();
    bones
        .iter()
        .flat_map(|bone| {
            channels
                .iter()
                .flat_map(|channel| channel.data_paths().iter().copied())
                .map(move |data_path| KeyDeletion {
                    bone: bone.clone(),
                    data_path,
                    frame,
                })
        })
        .collect()
}

/// Channels to reset to the rest pose on the selected bones.
pub fn reset_transforms(settings: &KeyingSettings) -> Vec<TransformChannel> {
    settings.channels()
}
