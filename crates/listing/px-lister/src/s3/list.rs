//! S3 object listing with pagination support.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::list_objects_v2::{ListObjectsV2Error, ListObjectsV2Output};
use chrono::DateTime;
use px_error::{ExportError, Result};
use px_types::{Entry, ListRequest};
use tracing::{debug, info, warn};

use super::retry::{RetryConfig, classify_sdk_error, with_retry};
use crate::consumer::EntryConsumer;
use crate::lister::{ListSummary, ObjectLister};

/// One page of a `ListObjectsV2` response.
struct Page {
    entries: Vec<Entry>,
    next_token: Option<String>,
}

/// [`ObjectLister`] backed by S3 `ListObjectsV2`.
///
/// Within a page, objects are delivered before common prefixes.
#[derive(Debug, Clone)]
pub struct S3Lister {
    client: Client,
    retry: RetryConfig,
}

impl S3Lister {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry: RetryConfig::default(),
        }
    }

    /// Set the per-page retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn send_request(
        &self,
        request: &ListRequest,
        token: Option<String>,
    ) -> std::result::Result<ListObjectsV2Output, SdkError<ListObjectsV2Error, HttpResponse>> {
        let mut req = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .max_keys(request.pagination.page_size());

        if !request.prefix.is_empty() {
            req = req.prefix(&request.prefix);
        }

        if let Some(delimiter) = request.delimiter.as_deref().filter(|d| !d.is_empty()) {
            req = req.delimiter(delimiter);
        }

        if let Some(token) = token {
            req = req.continuation_token(token);
        }

        req.send().await
    }

    /// Fetch one page, retrying per the configured policy.
    async fn fetch_page(&self, request: &ListRequest, token: Option<String>) -> Result<Page> {
        let resp = with_retry(&self.retry, "list_objects_v2", classify_sdk_error, || {
            self.send_request(request, token.clone())
        })
        .await
        .map_err(|e| {
            ExportError::Listing(format!(
                "S3 list objects failed for {}/{}: {}",
                request.bucket,
                request.prefix,
                DisplayErrorContext(&e)
            ))
        })?;

        let mut entries = Vec::new();

        if let Some(contents) = resp.contents {
            for obj in contents {
                let key = obj.key.unwrap_or_default();
                if key.is_empty() {
                    continue;
                }

                let last_modified = obj
                    .last_modified
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()));

                entries.push(Entry::object(
                    &request.bucket,
                    key,
                    obj.size.unwrap_or(0).max(0) as u64,
                    last_modified,
                ));
            }
        }

        if let Some(common_prefixes) = resp.common_prefixes {
            for cp in common_prefixes {
                if let Some(prefix) = cp.prefix {
                    entries.push(Entry::prefix(&request.bucket, prefix));
                }
            }
        }

        let next_token = if resp.is_truncated == Some(true) {
            resp.next_continuation_token
        } else {
            None
        };

        Ok(Page {
            entries,
            next_token,
        })
    }
}

#[async_trait]
impl ObjectLister for S3Lister {
    async fn list(
        &self,
        request: &ListRequest,
        consumer: &mut dyn EntryConsumer,
    ) -> Result<ListSummary> {
        info!(
            bucket = %request.bucket,
            prefix = %request.prefix,
            delimiter = ?request.delimiter,
            max_keys = request.pagination.page_size(),
            max_pages = request.pagination.max_pages,
            "Retrieving object listing"
        );

        let mut summary = ListSummary::default();
        let mut continuation_token: Option<String> = None;

        let outcome = loop {
            if !request.pagination.allows_page(summary.pages + 1) {
                debug!(pages = summary.pages, "Reached page cap");
                break Ok(());
            }

            let page = match self.fetch_page(request, continuation_token.take()).await {
                Ok(page) => page,
                Err(e) => break Err(e),
            };

            summary.pages += 1;
            debug!(
                page = summary.pages,
                bucket = %request.bucket,
                prefix = %request.prefix,
                entries = page.entries.len(),
                "Processing page"
            );

            let mut consumer_error = None;
            for entry in page.entries {
                let is_prefix = entry.is_prefix();
                if let Err(e) = consumer.consume(entry).await {
                    consumer_error = Some(e);
                    break;
                }
                if is_prefix {
                    summary.prefixes += 1;
                } else {
                    summary.objects += 1;
                }
            }
            if let Some(e) = consumer_error {
                break Err(e);
            }

            match page.next_token {
                Some(token) => continuation_token = Some(token),
                None => break Ok(()),
            }
        };

        info!(
            bucket = %request.bucket,
            prefix = %request.prefix,
            pages = summary.pages,
            "Found {} objects for {}/{}",
            summary.entries(),
            request.bucket,
            request.prefix
        );

        if let Err(e) = &outcome {
            warn!(
                bucket = %request.bucket,
                prefix = %request.prefix,
                error = %e,
                "Listing stopped early"
            );
        }

        outcome.map(|()| summary)
    }
}
