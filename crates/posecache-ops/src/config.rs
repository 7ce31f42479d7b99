use std::path::Path;

use posecache_persist::PathConfig;
use serde::{Deserialize, Serialize};

use crate::error::{OpsError, OpsResult};
use crate::keying::KeyingSettings;

/// Animator-facing settings for the cache tools.
///
/// Every field has a default, so a settings file only needs the keys it
/// changes:
///
/// ```toml
/// autosave = false
/// shared_mode = true
///
/// [keying]
/// scale = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolSettings {
    /// Save the cache file after every create, move, and delete.
    pub autosave: bool,
    /// Use one cache file for every document in the directory.
    pub shared_mode: bool,
    /// Selecting a cache replaces the current selection instead of adding
    /// to it.
    pub replace_selection: bool,
    /// Frame the viewport on the bones after selecting a cache.
    pub focus_on_selected: bool,
    pub keying: KeyingSettings,
    pub paths: PathConfig,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            autosave: true,
            shared_mode: false,
            replace_selection: false,
            focus_on_selected: false,
            keying: KeyingSettings::default(),
            paths: PathConfig::default(),
        }
    }
}

impl ToolSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> OpsResult<Self> {
        toml::from_str(text).map_err(|e| OpsError::Config(e.to_string()))
    }

    /// Read settings from a TOML file.
    pub fn load(path: &Path) -> OpsResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| OpsError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML, e.g. to write a starter settings file.
    pub fn to_toml_string(&self) -> OpsResult<String> {
        toml::to_string_pretty(self).map_err(|e| OpsError::Config(e.to_string()))
    }
}
