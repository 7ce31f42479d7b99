//! String identifiers for skeletons, bones, and caches.
//!
//! All three are thin newtypes over `String` so that maps keyed by one kind
//! of name cannot be indexed with another. Each implements `Borrow<str>`, so
//! lookups in a `BTreeMap<CacheName, _>` can use a plain `&str`.
//!
//! [`SkeletonId`] and [`CacheName`] must be non-empty; the check also runs
//! during deserialization. [`BoneName`] is whatever the host reports and is
//! never validated here.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! string_newtype_common {
    ($name:ident) => {
        impl $name {
            /// The name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

fn require_non_empty(kind: &'static str, name: String) -> Result<String, TypeError> {
    if name.is_empty() {
        return Err(TypeError::InvalidName {
            kind,
            name,
            reason: "must not be empty".into(),
        });
    }
    Ok(name)
}

/// Identity of one skeleton (armature object) in the host scene.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SkeletonId(String);

impl SkeletonId {
    /// Create a skeleton id, rejecting empty names.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        require_non_empty("skeleton", name.into()).map(Self)
    }
}

impl TryFrom<String> for SkeletonId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SkeletonId {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

string_newtype_common!(SkeletonId);

/// Name of a cache. Unique within the caches of one skeleton.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CacheName(String);

impl CacheName {
    /// Create a cache name, rejecting empty names.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        require_non_empty("cache", name.into()).map(Self)
    }
}

impl TryFrom<String> for CacheName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for CacheName {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

string_newtype_common!(CacheName);

/// Name of one bone. Validity is decided by the host.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoneName(String);

impl BoneName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl From<String> for BoneName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BoneName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

string_newtype_common!(BoneName);
