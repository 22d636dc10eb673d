//! Listing entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    /// A stored object
    Object,

    /// A common prefix produced by delimiter grouping
    Prefix,
}

impl EntryKind {
    /// The wire name of this kind (`OBJECT` or `PREFIX`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Object => "OBJECT",
            EntryKind::Prefix => "PREFIX",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry discovered by a listing.
///
/// Size and modification time only exist on objects; a prefix is just a
/// grouping of keys and carries neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum Entry {
    /// A stored object
    Object {
        bucket: String,
        key: String,
        size: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_modified: Option<DateTime<Utc>>,
    },

    /// A common prefix (only produced when a delimiter is given)
    Prefix { bucket: String, key: String },
}

impl Entry {
    /// Create an object entry.
    pub fn object(
        bucket: impl Into<String>,
        key: impl Into<String>,
        size: u64,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Entry::Object {
            bucket: bucket.into(),
            key: key.into(),
            size,
            last_modified,
        }
    }

    /// Create a prefix entry.
    pub fn prefix(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Entry::Prefix {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Object { .. } => EntryKind::Object,
            Entry::Prefix { .. } => EntryKind::Prefix,
        }
    }

    pub fn bucket(&self) -> &str {
        match self {
            Entry::Object { bucket, .. } | Entry::Prefix { bucket, .. } => bucket,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Entry::Object { key, .. } | Entry::Prefix { key, .. } => key,
        }
    }

    /// Object size in bytes, `None` for prefixes.
    pub fn size(&self) -> Option<u64> {
        match self {
            Entry::Object { size, .. } => Some(*size),
            Entry::Prefix { .. } => None,
        }
    }

    /// Object modification time, `None` for prefixes or when the provider omits it.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        match self {
            Entry::Object { last_modified, .. } => *last_modified,
            Entry::Prefix { .. } => None,
        }
    }

    pub fn is_prefix(&self) -> bool {
        matches!(self, Entry::Prefix { .. })
    }
}
