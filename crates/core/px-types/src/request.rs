//! Listing request parameters.

use serde::{Deserialize, Serialize};

/// Largest page the object store will return.
pub const MAX_KEYS_LIMIT: i32 = 1000;

/// Page and key caps for one listing call.
///
/// Shallow discovery and deep traversal each get their own value, so a
/// listing never depends on state left behind by another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Keys requested per page (1..=1000)
    pub max_keys: i32,

    /// Maximum pages to fetch (0 = unlimited)
    pub max_pages: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            max_keys: MAX_KEYS_LIMIT,
            max_pages: 0,
        }
    }
}

impl Pagination {
    pub fn new(max_keys: i32, max_pages: usize) -> Self {
        Self {
            max_keys,
            max_pages,
        }
    }

    /// Unbounded pagination with full-size pages.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether page number `page` (1-based) may still be requested.
    pub fn allows_page(&self, page: usize) -> bool {
        self.max_pages == 0 || page <= self.max_pages
    }

    /// Page size clamped to what the provider accepts.
    pub fn page_size(&self) -> i32 {
        self.max_keys.clamp(1, MAX_KEYS_LIMIT)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_KEYS_LIMIT).contains(&self.max_keys) {
            return Err(format!(
                "max_keys must be in 1..={MAX_KEYS_LIMIT}, got {}",
                self.max_keys
            ));
        }
        Ok(())
    }
}

/// Parameters of a single listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    pub bucket: String,

    /// Key prefix to list under (empty = whole bucket)
    pub prefix: String,

    /// Hierarchy delimiter; when set, common prefixes are reported as entries
    pub delimiter: Option<String>,

    pub pagination: Pagination,
}

impl ListRequest {
    /// A deep, ungrouped listing.
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            delimiter: None,
            pagination: Pagination::default(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Whether common prefixes should be reported.
    pub fn is_grouped(&self) -> bool {
        self.delimiter.as_deref().is_some_and(|d| !d.is_empty())
    }
}
