//! Export run orchestration.

use anyhow::anyhow;
use px_error::{ExportError, Result};
use px_lister::ObjectLister;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ExportConfig;
use crate::format::RecordFormatter;
use crate::pool::WorkerPool;
use crate::producer::Producer;
use crate::queue::job_queue;
use crate::stats::{ExportStats, ExportSummary};
use crate::worker::WorkerContext;

/// Runs one export: discovery, dispatch, and parallel traversal.
pub struct Exporter {
    config: Arc<ExportConfig>,
    lister: Arc<dyn ObjectLister>,
    shutdown: CancellationToken,
}

impl Exporter {
    pub fn new(config: ExportConfig, lister: Arc<dyn ObjectLister>) -> Self {
        Self {
            config: Arc::new(config),
            lister,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Token that ends the run early when cancelled.
    ///
    /// Workers finish the job in hand and exit; the producer stops
    /// dispatching. The run still returns a summary.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the export to completion.
    ///
    /// Workers start before the producer so the queue drains while partitions
    /// are being discovered. Returns once every worker has completed and the
    /// producer has returned. Fails on invalid configuration, an unusable
    /// output directory, or an output error under the abort-run policy.
    pub async fn run(&self) -> Result<ExportSummary> {
        self.config.validate()?;

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| ExportError::output_target(&self.config.output_dir, e))?;

        info!(
            bucket = %self.config.bucket,
            prefix = %self.config.root_prefix,
            workers = self.config.worker_count,
            queue_capacity = self.config.queue_capacity,
            format = %self.config.format,
            output = %self.config.output_dir.display(),
            "Starting export"
        );

        let stats = Arc::new(ExportStats::new());
        let run_token = self.shutdown.child_token();
        let (sender, receiver) = job_queue(self.config.queue_capacity);

        let context = Arc::new(WorkerContext::new(
            Arc::clone(&self.lister),
            RecordFormatter::new(self.config.format),
            Arc::clone(&stats),
            self.config.output_error_policy,
            run_token.clone(),
        ));
        let pool = WorkerPool::spawn(self.config.worker_count, receiver, Arc::clone(&context));

        let producer = Producer::new(
            Arc::clone(&self.lister),
            Arc::clone(&self.config),
            Arc::clone(&stats),
            run_token,
        );
        let producer_task = tokio::spawn(producer.run(sender));

        pool.join().await;
        let producer_summary = producer_task
            .await
            .map_err(|e| ExportError::Other(anyhow!("producer task failed: {e}")))?;

        if let Some(error) = context.take_fatal() {
            return Err(error);
        }

        let summary = stats.snapshot().completed();
        info!(
            discovered = producer_summary.partitions_found,
            dispatched = producer_summary.dispatched,
            completed = summary.partitions_completed,
            partial = summary.partial_partitions.len(),
            failed = summary.failed_partitions.len(),
            entries = summary.entries_written,
            "Export finished"
        );
        Ok(summary)
    }
}
