//! The versioned cache file format.
//!
//! A cache file is one JSON object:
//!
//! ```text
//! {
//!   "format": "posecache",
//!   "version": 1,
//!   "saved_at": "2026-10-16T12:00:00Z",
//!   "caches": { "<skeleton>": { "<cache>": ["<bone>", ...] } },
//!   "order":  { "<skeleton>": ["<cache>", ...] }
//! }
//! ```
//!
//! Decoding checks the format tag and version, rejects unknown fields, and
//! validates that `caches` and `order` agree before anything is returned.

use chrono::{DateTime, Utc};
use posecache_store::{CacheMap, OrderMap, Snapshot};
use serde::{Deserialize, Serialize};

/// Value of the `format` field.
pub const FORMAT_TAG: &str = "posecache";

/// The only version this build reads and writes.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk envelope around a [`Snapshot`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheFile {
    pub format: String,
    pub version: u32,
    /// Informational; ignored on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub caches: CacheMap,
    pub order: OrderMap,
}

impl CacheFile {
    /// Wrap a snapshot for writing, stamped with the current time.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot { caches, order } = snapshot;
        Self {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION,
            saved_at: Some(Utc::now()),
            caches,
            order,
        }
    }

    /// Encode as pretty-printed JSON.
    pub fn encode(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| e.to_string())
    }

    /// Decode and check the envelope.
    pub fn decode(text: &str) -> Result<Snapshot, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| DecodeError::NotEnvelope(e.to_string()))?;
        if value.get("format").is_none() {
            return Err(DecodeError::NotEnvelope("no format tag".into()));
        }
        let file: CacheFile =
            serde_json::from_value(value).map_err(|e| DecodeError::Invalid(e.to_string()))?;

        if file.format != FORMAT_TAG {
            return Err(DecodeError::Invalid(format!(
                "unexpected format tag {:?}, expected {FORMAT_TAG:?}",
                file.format
            )));
        }
        if file.version != FORMAT_VERSION {
            return Err(DecodeError::Invalid(format!(
                "unsupported version {}, expected {FORMAT_VERSION}",
                file.version
            )));
        }

        let snapshot = Snapshot::new(file.caches, file.order);
        snapshot
            .validate()
            .map_err(|e| DecodeError::Invalid(e.to_string()))?;
        Ok(snapshot)
    }
}

/// Why a cache file failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The text is not a tagged JSON object. It may still be a legacy
    /// literal.
    #[error("{0}")]
    NotEnvelope(String),
    /// The text is a tagged cache file, but its contents are unusable.
    #[error("{0}")]
    Invalid(String),
}
