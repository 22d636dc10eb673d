//! Partition discovery and job dispatch.

use px_lister::{EntryCollector, ObjectLister};
use px_types::{Entry, ListRequest, partition_id};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::job::TraversalJob;
use crate::queue::JobSender;
use crate::sink::{OpenMode, OutputTarget};
use crate::stats::ExportStats;

/// What the producer did with the shallow listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerSummary {
    /// Prefixes returned by the shallow pass
    pub partitions_found: usize,

    /// Partitions whose output already existed
    pub skipped_existing: usize,

    /// Prefixes without a usable partition id
    pub skipped_invalid: usize,

    /// Jobs enqueued
    pub dispatched: usize,

    /// Objects directly under the root prefix
    pub root_objects: usize,
}

/// Lists the root prefix once and enqueues one job per partition.
pub struct Producer {
    lister: Arc<dyn ObjectLister>,
    config: Arc<ExportConfig>,
    stats: Arc<ExportStats>,
    cancel: CancellationToken,
}

impl Producer {
    pub fn new(
        lister: Arc<dyn ObjectLister>,
        config: Arc<ExportConfig>,
        stats: Arc<ExportStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            lister,
            config,
            stats,
            cancel,
        }
    }

    /// Grouped listing of the root prefix.
    pub fn shallow_request(&self) -> ListRequest {
        ListRequest::new(&self.config.bucket, &self.config.root_prefix)
            .with_delimiter(&self.config.delimiter)
            .with_pagination(self.config.shallow)
    }

    /// Build the traversal job for a discovered prefix.
    ///
    /// Returns `None` when the prefix has no usable partition id.
    pub fn job_for(&self, prefix_key: &str) -> Option<TraversalJob> {
        let id = partition_id(prefix_key, &self.config.delimiter)?;
        let output =
            OutputTarget::for_partition(&self.config.output_dir, &self.config.output_prefix, &id);
        let request = ListRequest::new(&self.config.bucket, prefix_key)
            .with_pagination(self.config.deep);
        let open_mode = if self.config.force {
            OpenMode::Truncate
        } else {
            OpenMode::Append
        };
        Some(TraversalJob::new(id, request, output, open_mode))
    }

    /// Discover partitions and dispatch their jobs.
    ///
    /// A failed shallow listing dispatches whatever was discovered before the
    /// failure. Dispatch stops early when the run is cancelled or no worker
    /// is left to take jobs. The queue is closed on every return path.
    pub async fn run(self, queue: JobSender) -> ProducerSummary {
        info!(
            bucket = %self.config.bucket,
            prefix = %self.config.root_prefix,
            "Starting producer"
        );

        let mut collector = EntryCollector::new();
        if let Err(e) = self.lister.list(&self.shallow_request(), &mut collector).await {
            warn!(
                error = %e,
                discovered = collector.len(),
                "Shallow listing failed, dispatching what was discovered"
            );
        }
        info!("Found {} entries under root prefix", collector.len());

        let mut summary = ProducerSummary::default();

        for entry in collector.into_entries() {
            let key = match entry {
                Entry::Prefix { key, .. } => key,
                Entry::Object { key, .. } => {
                    debug!(key = %key, "Skipping object under root prefix");
                    summary.root_objects += 1;
                    self.stats.record_root_object();
                    continue;
                }
            };

            summary.partitions_found += 1;
            self.stats.record_discovered();

            let Some(job) = self.job_for(&key) else {
                warn!(prefix = %key, "Prefix has no usable partition id, skipping");
                summary.skipped_invalid += 1;
                self.stats.record_invalid();
                continue;
            };

            if !self.config.force {
                match job.output.exists().await {
                    Ok(false) => {}
                    Ok(true) => {
                        info!(
                            partition = %job.partition_id,
                            "{} file already exists, skipping",
                            job.output.path().display()
                        );
                        summary.skipped_existing += 1;
                        self.stats.record_skipped();
                        continue;
                    }
                    Err(e) => {
                        warn!(
                            partition = %job.partition_id,
                            error = %e,
                            "Cannot check output file, skipping"
                        );
                        summary.skipped_existing += 1;
                        self.stats.record_skipped();
                        continue;
                    }
                }
            }

            let partition = job.partition_id.clone();
            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("Run cancelled, stopping dispatch");
                    false
                }
                result = queue.send(job) => match result {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "Stopping dispatch");
                        false
                    }
                },
            };
            if !sent {
                break;
            }

            debug!(partition = %partition, "Dispatched partition");
            summary.dispatched += 1;
            self.stats.record_dispatched();
        }

        queue.close();
        info!(
            dispatched = summary.dispatched,
            skipped = summary.skipped_existing,
            "Finished producer"
        );
        summary
    }
}
