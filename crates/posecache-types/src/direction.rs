use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Direction to move a cache within its skeleton's display order.
///
/// The order list is circular: moving the first entry up swaps it with the
/// last, and moving the last entry down swaps it with the first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Index of the neighbor to swap with, for a list of `len` entries.
    ///
    /// `len` must be non-zero.
    pub fn neighbor(self, index: usize, len: usize) -> usize {
        debug_assert!(len > 0 && index < len);
        match self {
            Direction::Up => (index + len - 1) % len,
            Direction::Down => (index + 1) % len,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

impl FromStr for Direction {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(TypeError::InvalidDirection(s.to_string())),
        }
    }
}
