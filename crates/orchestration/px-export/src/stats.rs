//! Statistics for export runs.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected during an export run.
///
/// Shared between the producer and every worker; counters are updated
/// concurrently without locking. Partition name lists sit behind a mutex
/// since they only grow on failures.
#[derive(Debug, Default)]
pub struct ExportStats {
    started_at: Option<DateTime<Utc>>,

    /// Prefixes returned by the shallow pass
    partitions_discovered: AtomicU64,

    /// Partitions whose output already existed
    partitions_skipped: AtomicU64,

    /// Prefixes that do not yield a usable partition id
    partitions_invalid: AtomicU64,

    /// Jobs handed to the queue
    partitions_dispatched: AtomicU64,

    /// Jobs that listed the whole partition
    partitions_completed: AtomicU64,

    /// Objects directly under the root prefix (not exported)
    root_objects: AtomicU64,

    /// Records written across all outputs
    entries_written: AtomicU64,

    /// Total object size across all outputs
    bytes_listed: AtomicU64,

    /// Listing pages fetched by workers
    pages_listed: AtomicU64,

    /// Partitions whose listing ended early
    partial: Mutex<Vec<String>>,

    /// Partitions whose output could not be written
    failed: Mutex<Vec<String>>,
}

impl ExportStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn record_discovered(&self) {
        self.partitions_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.partitions_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid(&self) {
        self.partitions_invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatched(&self) {
        self.partitions_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_root_object(&self) {
        self.root_objects.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a partition that was listed in full.
    pub fn record_job_completed(&self, entries: u64, bytes: u64, pages: u64) {
        self.partitions_completed.fetch_add(1, Ordering::Relaxed);
        self.record_output(entries, bytes);
        self.pages_listed.fetch_add(pages, Ordering::Relaxed);
    }

    /// Record a partition whose listing stopped early; what was written stays.
    pub fn record_job_partial(&self, partition_id: &str, entries: u64, bytes: u64) {
        self.partial.lock().push(partition_id.to_string());
        self.record_output(entries, bytes);
    }

    /// Record a partition whose output could not be written.
    pub fn record_job_failed(&self, partition_id: &str) {
        self.failed.lock().push(partition_id.to_string());
    }

    fn record_output(&self, entries: u64, bytes: u64) {
        self.entries_written.fetch_add(entries, Ordering::Relaxed);
        self.bytes_listed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn partitions_dispatched(&self) -> u64 {
        self.partitions_dispatched.load(Ordering::Relaxed)
    }

    pub fn partitions_completed(&self) -> u64 {
        self.partitions_completed.load(Ordering::Relaxed)
    }

    pub fn entries_written(&self) -> u64 {
        self.entries_written.load(Ordering::Relaxed)
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> ExportSummary {
        let mut partial = self.partial.lock().clone();
        let mut failed = self.failed.lock().clone();
        partial.sort();
        failed.sort();

        ExportSummary {
            started_at: self.started_at,
            completed_at: None,
            partitions_discovered: self.partitions_discovered.load(Ordering::Relaxed),
            partitions_skipped: self.partitions_skipped.load(Ordering::Relaxed),
            partitions_invalid: self.partitions_invalid.load(Ordering::Relaxed),
            partitions_dispatched: self.partitions_dispatched(),
            partitions_completed: self.partitions_completed(),
            root_objects: self.root_objects.load(Ordering::Relaxed),
            entries_written: self.entries_written(),
            bytes_listed: self.bytes_listed.load(Ordering::Relaxed),
            pages_listed: self.pages_listed.load(Ordering::Relaxed),
            partial_partitions: partial,
            failed_partitions: failed,
        }
    }
}

/// A serializable summary of an export run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub partitions_discovered: u64,
    pub partitions_skipped: u64,
    pub partitions_invalid: u64,
    pub partitions_dispatched: u64,
    pub partitions_completed: u64,
    pub root_objects: u64,
    pub entries_written: u64,
    pub bytes_listed: u64,
    pub pages_listed: u64,
    /// Partitions whose output holds only part of the listing
    pub partial_partitions: Vec<String>,
    /// Partitions with no usable output
    pub failed_partitions: Vec<String>,
}

impl ExportSummary {
    /// Stamp the summary with the current time as completion time.
    pub fn completed(mut self) -> Self {
        self.completed_at = Some(Utc::now());
        self
    }

    /// Wall-clock duration of the run.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Whether any partition failed or ended up partial.
    pub fn has_failures(&self) -> bool {
        !self.partial_partitions.is_empty() || !self.failed_partitions.is_empty()
    }

    /// Records written per second over the whole run.
    pub fn entries_per_second(&self) -> Option<f64> {
        self.duration().map(|d| {
            let secs = d.num_milliseconds() as f64 / 1000.0;
            if secs > 0.0 {
                self.entries_written as f64 / secs
            } else {
                0.0
            }
        })
    }
}
