//! Traversal workers.
//!
//! A worker takes jobs from the shared queue and lists each partition into
//! its output file. Its stop token is raced against the queue on every
//! intake, so a stop request ends the worker as soon as it is between jobs
//! without consuming another job. A job already in progress is finished.

use parking_lot::Mutex;
use px_error::{ErrorKind, ExportError, Result};
use px_lister::ObjectLister;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::completion::CompletionGuard;
use crate::config::OutputErrorPolicy;
use crate::format::RecordFormatter;
use crate::job::TraversalJob;
use crate::queue::JobReceiver;
use crate::stats::ExportStats;

/// State shared by every worker of a run.
pub struct WorkerContext {
    lister: Arc<dyn ObjectLister>,
    formatter: RecordFormatter,
    stats: Arc<ExportStats>,
    policy: OutputErrorPolicy,

    /// Cancelled to end the whole run; worker stop tokens are its children
    run_token: CancellationToken,

    /// First error that aborted the run
    fatal: Mutex<Option<ExportError>>,
}

impl WorkerContext {
    pub fn new(
        lister: Arc<dyn ObjectLister>,
        formatter: RecordFormatter,
        stats: Arc<ExportStats>,
        policy: OutputErrorPolicy,
        run_token: CancellationToken,
    ) -> Self {
        Self {
            lister,
            formatter,
            stats,
            policy,
            run_token,
            fatal: Mutex::new(None),
        }
    }

    pub fn run_token(&self) -> &CancellationToken {
        &self.run_token
    }

    pub fn stats(&self) -> &Arc<ExportStats> {
        &self.stats
    }

    /// Take the error that aborted the run, if any.
    pub fn take_fatal(&self) -> Option<ExportError> {
        self.fatal.lock().take()
    }

    fn abort_run(&self, error: ExportError) {
        let mut fatal = self.fatal.lock();
        if fatal.is_none() {
            *fatal = Some(error);
        }
        drop(fatal);
        self.run_token.cancel();
    }
}

/// How a worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The queue was closed and drained
    QueueClosed,

    /// Stop was requested
    Stopped,

    /// An output error aborted the run
    Aborted,
}

/// Result of one traversal job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The partition was listed in full
    Completed,

    /// Listing ended early; the output holds what was listed before
    Partial,

    /// The output could not be written
    Failed,
}

/// Handle for requesting a worker to stop.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    id: usize,
    stop: CancellationToken,
}

impl WorkerHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Ask the worker to stop taking jobs. Idempotent.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

/// One traversal worker.
pub struct Worker {
    id: usize,
    jobs: JobReceiver,
    stop: CancellationToken,
    completion: CompletionGuard,
    context: Arc<WorkerContext>,
}

impl Worker {
    pub fn new(
        id: usize,
        jobs: JobReceiver,
        stop: CancellationToken,
        completion: CompletionGuard,
        context: Arc<WorkerContext>,
    ) -> Self {
        Self {
            id,
            jobs,
            stop,
            completion,
            context,
        }
    }

    pub fn handle(&self) -> WorkerHandle {
        WorkerHandle {
            id: self.id,
            stop: self.stop.clone(),
        }
    }

    /// Process jobs until the queue is drained, stop is requested, or an
    /// output error aborts the run. Completion is signalled on return.
    pub async fn run(self) -> WorkerExit {
        let Worker {
            id,
            jobs,
            stop,
            completion,
            context,
        } = self;

        debug!(worker = id, "Worker started");

        let exit = loop {
            let job = tokio::select! {
                biased;
                _ = stop.cancelled() => break WorkerExit::Stopped,
                job = jobs.recv() => job,
            };

            let Some(job) = job else {
                break WorkerExit::QueueClosed;
            };

            if let Err(e) = process_job(id, job, &context).await {
                error!(worker = id, error = %e, "Aborting run");
                context.abort_run(e);
                break WorkerExit::Aborted;
            }
        };

        info!(worker = id, exit = ?exit, "Worker finished");
        drop(completion);
        exit
    }
}

/// List one partition into its output.
///
/// Returns an error only when the output failed and the policy aborts the run.
pub async fn process_job(
    worker_id: usize,
    job: TraversalJob,
    context: &WorkerContext,
) -> Result<JobOutcome> {
    info!(
        worker = worker_id,
        partition = %job.partition_id,
        prefix = %job.request.prefix,
        output = %job.output.path().display(),
        "Processing partition"
    );

    let mut sink = match job.output.open(job.open_mode, context.formatter).await {
        Ok(sink) => sink,
        Err(e) => return output_failure(worker_id, &job, e, context),
    };

    let listing = context.lister.list(&job.request, &mut sink).await;
    let entries = sink.entries_written();
    let bytes = sink.bytes_listed();

    if let Err(e) = sink.close().await {
        discard_output(worker_id, &job).await;
        return output_failure(worker_id, &job, e, context);
    }

    match listing {
        Ok(summary) => {
            context
                .stats
                .record_job_completed(entries, bytes, summary.pages as u64);
            info!(
                worker = worker_id,
                partition = %job.partition_id,
                entries,
                pages = summary.pages,
                "Partition exported"
            );
            Ok(JobOutcome::Completed)
        }
        Err(e) if e.kind() != ErrorKind::Degraded => {
            discard_output(worker_id, &job).await;
            output_failure(worker_id, &job, e, context)
        }
        Err(e) => {
            context
                .stats
                .record_job_partial(&job.partition_id, entries, bytes);
            warn!(
                worker = worker_id,
                partition = %job.partition_id,
                entries,
                error = %e,
                "Listing stopped early, partition output is partial"
            );
            Ok(JobOutcome::Partial)
        }
    }
}

/// Remove the output of a failed job so a later run lists it again.
async fn discard_output(worker_id: usize, job: &TraversalJob) {
    if let Err(e) = job.output.remove().await {
        warn!(
            worker = worker_id,
            partition = %job.partition_id,
            error = %e,
            "Cannot remove output of failed partition"
        );
    }
}

fn output_failure(
    worker_id: usize,
    job: &TraversalJob,
    error: ExportError,
    context: &WorkerContext,
) -> Result<JobOutcome> {
    context.stats.record_job_failed(&job.partition_id);
    match context.policy {
        OutputErrorPolicy::FailJob => {
            error!(
                worker = worker_id,
                partition = %job.partition_id,
                error = %error,
                "Cannot write partition output"
            );
            Ok(JobOutcome::Failed)
        }
        OutputErrorPolicy::AbortRun => Err(error),
    }
}
