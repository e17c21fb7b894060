//! Rendered notification reports and output-group partitioning.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An output channel partition, selected by the count of a product's allowed
/// sizes. Valid values are 1..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u8);

impl GroupId {
    /// Zero-based index into per-group tables.
    pub fn index(&self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The multi-line human-readable body.
    pub text: String,
    /// Representative product image URL, may be empty.
    pub image_url: String,
    /// Destination output group.
    pub group: GroupId,
}
