//! The listing capability.

use async_trait::async_trait;
use px_error::Result;
use px_types::ListRequest;
use serde::{Deserialize, Serialize};

use crate::consumer::EntryConsumer;

/// Paginated enumeration of a bucket/prefix.
///
/// Implementations call the consumer once per discovered entry, page after
/// page, and stop requesting pages once the request's page cap is reached or
/// the provider reports no more pages. Common prefixes are only reported when
/// the request carries a delimiter.
///
/// Entries handed to the consumer before an error stay delivered; callers
/// that treat listing errors as "no further pages" keep partial results.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    async fn list(
        &self,
        request: &ListRequest,
        consumer: &mut dyn EntryConsumer,
    ) -> Result<ListSummary>;
}

/// Counts for one completed listing call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    /// Pages fetched from the provider
    pub pages: usize,

    /// Object entries delivered
    pub objects: usize,

    /// Prefix entries delivered
    pub prefixes: usize,
}

impl ListSummary {
    pub fn entries(&self) -> usize {
        self.objects + self.prefixes
    }
}
