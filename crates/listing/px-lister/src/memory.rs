//! In-memory object store listing.
//!
//! [`InMemoryLister`] serves a fixed key set with the same paging and
//! grouping rules as `ListObjectsV2`: keys are returned in lexicographic
//! order, objects and common prefixes both count toward a page, and a
//! continuation is offered while entries remain.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use px_error::{ExportError, Result};
use px_types::{Entry, ListRequest};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::consumer::EntryConsumer;
use crate::lister::{ListSummary, ObjectLister};

#[derive(Debug, Clone)]
struct StoredObject {
    size: u64,
    last_modified: Option<DateTime<Utc>>,
}

/// Deterministic [`ObjectLister`] over objects held in memory.
#[derive(Debug, Default)]
pub struct InMemoryLister {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,

    /// Prefix -> number of pages served before failing
    failures: HashMap<String, usize>,

    /// Delay before each page is served
    page_latency: Option<Duration>,

    /// Every request received, in order
    requests: Mutex<Vec<ListRequest>>,
}

impl InMemoryLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.buckets.entry(bucket.into()).or_default();
        self
    }

    /// Add an object, creating the bucket if needed.
    pub fn with_object(
        mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        size: u64,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        self.buckets.entry(bucket.into()).or_default().insert(
            key.into(),
            StoredObject {
                size,
                last_modified,
            },
        );
        self
    }

    /// Fail listings of `prefix` after `pages` pages have been served.
    pub fn with_failure_after(mut self, prefix: impl Into<String>, pages: usize) -> Self {
        self.failures.insert(prefix.into(), pages);
        self
    }

    /// Sleep before serving each page.
    pub fn with_page_latency(mut self, latency: Duration) -> Self {
        self.page_latency = Some(latency);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ListRequest> {
        self.requests.lock().clone()
    }

    /// All entries a request would see across unbounded pages, in key order.
    fn matching_entries(&self, request: &ListRequest) -> Result<Vec<Entry>> {
        let objects = self.buckets.get(&request.bucket).ok_or_else(|| {
            ExportError::Listing(format!("NoSuchBucket: {}", request.bucket))
        })?;

        let delimiter = request.delimiter.as_deref().filter(|d| !d.is_empty());
        let mut entries = Vec::new();
        let mut last_prefix: Option<String> = None;

        for (key, object) in objects.range(request.prefix.clone()..) {
            let Some(rest) = key.strip_prefix(request.prefix.as_str()) else {
                break;
            };

            if let Some(delimiter) = delimiter {
                if let Some(idx) = rest.find(delimiter) {
                    let common = format!(
                        "{}{}",
                        request.prefix,
                        &rest[..idx + delimiter.len()]
                    );
                    if last_prefix.as_deref() != Some(common.as_str()) {
                        entries.push(Entry::prefix(&request.bucket, common.clone()));
                        last_prefix = Some(common);
                    }
                    continue;
                }
            }

            entries.push(Entry::object(
                &request.bucket,
                key.clone(),
                object.size,
                object.last_modified,
            ));
        }

        Ok(entries)
    }
}

#[async_trait]
impl ObjectLister for InMemoryLister {
    async fn list(
        &self,
        request: &ListRequest,
        consumer: &mut dyn EntryConsumer,
    ) -> Result<ListSummary> {
        self.requests.lock().push(request.clone());

        let entries = self.matching_entries(request)?;
        let page_size = request.pagination.page_size() as usize;
        let fail_after = self.failures.get(&request.prefix).copied();

        let mut summary = ListSummary::default();
        let mut pages = entries.chunks(page_size);

        // An empty listing still costs one request
        let mut next = pages.next().map(<[Entry]>::to_vec).or(Some(Vec::new()));

        while let Some(page) = next.take() {
            if !request.pagination.allows_page(summary.pages + 1) {
                break;
            }
            if fail_after.is_some_and(|n| summary.pages >= n) {
                return Err(ExportError::Listing(format!(
                    "simulated failure listing {}/{} after {} pages",
                    request.bucket, request.prefix, summary.pages
                )));
            }
            if let Some(latency) = self.page_latency {
                tokio::time::sleep(latency).await;
            }

            summary.pages += 1;

            let (prefixes, objects): (Vec<Entry>, Vec<Entry>) =
                page.into_iter().partition(Entry::is_prefix);
            for entry in objects {
                consumer.consume(entry).await?;
                summary.objects += 1;
            }
            for entry in prefixes {
                consumer.consume(entry).await?;
                summary.prefixes += 1;
            }

            next = pages.next().map(<[Entry]>::to_vec);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::EntryCollector;
    use px_types::{EntryKind, Pagination};

    fn store() -> InMemoryLister {
        InMemoryLister::new()
            .with_object("b", "root/a/1.csv", 10, None)
            .with_object("b", "root/a/2.csv", 20, None)
            .with_object("b", "root/b/deep/3.csv", 30, None)
            .with_object("b", "root/c/4.csv", 40, None)
            .with_object("b", "root/top.csv", 5, None)
            .with_object("b", "other/5.csv", 50, None)
    }

    async fn collect(lister: &InMemoryLister, request: &ListRequest) -> (Vec<Entry>, ListSummary) {
        let mut collector = EntryCollector::new();
        let summary = lister.list(request, &mut collector).await.unwrap();
        (collector.into_entries(), summary)
    }

    #[tokio::test]
    async fn test_grouped_listing() {
        let lister = store();
        let request = ListRequest::new("b", "root/").with_delimiter("/");

        let (entries, summary) = collect(&lister, &request).await;

        let prefixes: Vec<_> = entries
            .iter()
            .filter(|e| e.kind() == EntryKind::Prefix)
            .map(|e| e.key().to_string())
            .collect();
        assert_eq!(prefixes, vec!["root/a/", "root/b/", "root/c/"]);

        let objects: Vec<_> = entries
            .iter()
            .filter(|e| e.kind() == EntryKind::Object)
            .map(|e| e.key().to_string())
            .collect();
        assert_eq!(objects, vec!["root/top.csv"]);

        assert_eq!(summary.pages, 1);
        assert_eq!(summary.prefixes, 3);
        assert_eq!(summary.objects, 1);
    }

    #[tokio::test]
    async fn test_deep_listing_has_no_prefixes() {
        let lister = store();
        let request = ListRequest::new("b", "root/b/");

        let (entries, _) = collect(&lister, &request).await;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key(), "root/b/deep/3.csv");
        assert_eq!(entries[0].size(), Some(30));
    }

    #[tokio::test]
    async fn test_page_cap() {
        let lister = store();
        let request = ListRequest::new("b", "root/").with_pagination(Pagination::new(2, 1));

        let (entries, summary) = collect(&lister, &request).await;

        assert_eq!(summary.pages, 1);
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_unbounded_pages() {
        let lister = store();
        let request = ListRequest::new("b", "").with_pagination(Pagination::new(2, 0));

        let (entries, summary) = collect(&lister, &request).await;

        assert_eq!(entries.len(), 6);
        assert_eq!(summary.pages, 3);
    }

    #[tokio::test]
    async fn test_empty_prefix_costs_one_page() {
        let lister = InMemoryLister::new().with_bucket("empty");
        let request = ListRequest::new("empty", "").with_delimiter("/");

        let (entries, summary) = collect(&lister, &request).await;

        assert!(entries.is_empty());
        assert_eq!(summary.pages, 1);
    }

    #[tokio::test]
    async fn test_missing_bucket() {
        let lister = InMemoryLister::new();
        let mut collector = EntryCollector::new();

        let result = lister.list(&ListRequest::new("nope", ""), &mut collector).await;
        assert!(matches!(result, Err(ExportError::Listing(_))));
    }

    #[tokio::test]
    async fn test_failure_keeps_delivered_entries() {
        let lister = store().with_failure_after("root/a/", 1);
        let request = ListRequest::new("b", "root/a/").with_pagination(Pagination::new(1, 0));

        let mut collector = EntryCollector::new();
        let result = lister.list(&request, &mut collector).await;

        assert!(result.is_err());
        assert_eq!(collector.len(), 1);
        assert_eq!(collector.entries()[0].key(), "root/a/1.csv");
    }

    #[tokio::test]
    async fn test_requests_are_recorded() {
        let lister = store();
        let request = ListRequest::new("b", "root/").with_delimiter("/");
        collect(&lister, &request).await;

        assert_eq!(lister.requests(), vec![request]);
    }
}
