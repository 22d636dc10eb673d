//! Entry consumers.
//!
//! A listing pushes every discovered entry into an [`EntryConsumer`]. The
//! shallow pass collects entries in memory with [`EntryCollector`]; deep
//! traversals append them to an output file.

use async_trait::async_trait;
use px_error::Result;
use px_types::Entry;

/// Sink for entries produced by a listing.
#[async_trait]
pub trait EntryConsumer: Send {
    /// Consume one entry.
    ///
    /// Returning an error aborts the listing that is feeding this consumer.
    async fn consume(&mut self, entry: Entry) -> Result<()>;
}

/// Consumer that accumulates entries in memory.
///
/// Owned by the caller of the listing; the collected entries are handed
/// back with [`EntryCollector::into_entries`].
#[derive(Debug, Default)]
pub struct EntryCollector {
    entries: Vec<Entry>,
}

impl EntryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl EntryConsumer for EntryCollector {
    async fn consume(&mut self, entry: Entry) -> Result<()> {
        self.entries.push(entry);
        Ok(())
    }
}
