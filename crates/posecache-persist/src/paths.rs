//! Save-path computation.
//!
//! A cache file lives next to the host document. In per-document mode its
//! name is derived from the document's base name; in shared mode every
//! document in the directory uses the same file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PersistError, Result};

/// File naming for cache files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathConfig {
    /// Extension of host documents, stripped from the base name.
    pub document_extension: String,
    /// Appended to the stripped base name in per-document mode.
    pub companion_suffix: String,
    /// File name used by every document in a directory in shared mode.
    pub shared_file_name: String,
    /// Suffix of the companion files written by the earlier script
    /// revisions. Empty disables the lookup.
    pub legacy_suffix: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            document_extension: ".blend".into(),
            companion_suffix: ".posecache.json".into(),
            shared_file_name: "posecache-shared.json".into(),
            legacy_suffix: "-LeetBoneToolsSelctionCache.txt".into(),
        }
    }
}

impl PathConfig {
    /// Resolve the cache file for a document.
    ///
    /// `document` is `None` (or has no file name) when the host document has
    /// never been saved; that is reported as [`PersistError::NoDocument`].
    pub fn save_path(&self, document: Option<&Path>, shared_mode: bool) -> Result<PathBuf> {
        let (directory, file_name) = split_document(document)?;
        if shared_mode {
            return Ok(directory.join(&self.shared_file_name));
        }
        Ok(directory.join(format!("{}{}", self.stem(file_name), self.companion_suffix)))
    }

    /// Older companion files a document may still have, most likely first.
    ///
    /// The earlier scripts stripped the extension as a character set, so
    /// `label.blend` was saved under the stem `a`. Both spellings are
    /// returned when they differ.
    pub fn legacy_paths(&self, document: Option<&Path>) -> Result<Vec<PathBuf>> {
        let (directory, file_name) = split_document(document)?;
        if self.legacy_suffix.is_empty() {
            return Ok(Vec::new());
        }

        let mut stems = vec![self.stem(file_name)];
        let trimmed = file_name.trim_matches(|c| self.document_extension.contains(c));
        if !trimmed.is_empty() && !stems.contains(&trimmed) {
            stems.push(trimmed);
        }
        Ok(stems
            .into_iter()
            .map(|stem| directory.join(format!("{stem}{}", self.legacy_suffix)))
            .collect())
    }

    /// Document file name with the document extension removed as a suffix.
    fn stem<'a>(&self, file_name: &'a str) -> &'a str {
        file_name
            .strip_suffix(self.document_extension.as_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or(file_name)
    }
}

/// Directory and file name of a saved document.
fn split_document(document: Option<&Path>) -> Result<(&Path, &str)> {
    let document = document.ok_or(PersistError::NoDocument)?;
    let file_name = document
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or(PersistError::NoDocument)?;
    let directory = document.parent().unwrap_or_else(|| Path::new(""));
    Ok((directory, file_name))
}

/// Resolve a cache file path with the default naming.
pub fn compute_save_path(document: Option<&Path>, shared_mode: bool) -> Result<PathBuf> {
    PathConfig::default().save_path(document, shared_mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_document_path_strips_extension() {
        let path = compute_save_path(Some(Path::new("/shots/walk_cycle.blend")), false).unwrap();
        assert_eq!(path, PathBuf::from("/shots/walk_cycle.posecache.json"));
    }

    #[test]
    fn extension_is_stripped_as_a_suffix_not_a_char_set() {
        // A character-set strip would eat the trailing "l" and "e" too.
        let path = compute_save_path(Some(Path::new("/shots/label.blend")), false).unwrap();
        assert_eq!(path, PathBuf::from("/shots/label.posecache.json"));

        let path = compute_save_path(Some(Path::new("/shots/blended.blend")), false).unwrap();
        assert_eq!(path, PathBuf::from("/shots/blended.posecache.json"));
    }

    #[test]
    fn other_extensions_are_kept() {
        let path = compute_save_path(Some(Path::new("/shots/rig.blend1")), false).unwrap();
        assert_eq!(path, PathBuf::from("/shots/rig.blend1.posecache.json"));
    }

    #[test]
    fn shared_mode_uses_directory_file() {
        let a = compute_save_path(Some(Path::new("/shots/a.blend")), true).unwrap();
        let b = compute_save_path(Some(Path::new("/shots/b.blend")), true).unwrap();
        assert_eq!(a, PathBuf::from("/shots/posecache-shared.json"));
        assert_eq!(a, b);
    }

    #[test]
    fn unsaved_document_is_no_document() {
        assert!(matches!(
            compute_save_path(None, false),
            Err(PersistError::NoDocument)
        ));
        assert!(matches!(
            compute_save_path(Some(Path::new("")), true),
            Err(PersistError::NoDocument)
        ));
    }

    #[test]
    fn custom_naming() {
        let config = PathConfig {
            document_extension: ".ma".into(),
            companion_suffix: "-caches.json".into(),
            shared_file_name: "caches.json".into(),
            legacy_suffix: String::new(),
        };
        let path = config.save_path(Some(Path::new("/proj/hero.ma")), false).unwrap();
        assert_eq!(path, PathBuf::from("/proj/hero-caches.json"));
        assert!(config.legacy_paths(Some(Path::new("/proj/hero.ma"))).unwrap().is_empty());
    }

    #[test]
    fn legacy_paths_cover_both_stem_spellings() {
        let config = PathConfig::default();
        let paths = config.legacy_paths(Some(Path::new("/shots/shot.blend"))).unwrap();
        assert_eq!(
            paths,
            [PathBuf::from("/shots/shot-LeetBoneToolsSelctionCache.txt")]
        );

        let paths = config.legacy_paths(Some(Path::new("/shots/label.blend"))).unwrap();
        assert_eq!(
            paths,
            [
                PathBuf::from("/shots/label-LeetBoneToolsSelctionCache.txt"),
                PathBuf::from("/shots/a-LeetBoneToolsSelctionCache.txt"),
            ]
        );
        assert!(matches!(
            config.legacy_paths(None),
            Err(PersistError::NoDocument)
        ));
    }
}
