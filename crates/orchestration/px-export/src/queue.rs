//! Bounded job queue shared by the producer and all workers.
//!
//! A single-consumer tokio channel made multi-consumer by sharing the
//! receiver behind an async mutex. Each job is delivered to exactly one
//! worker; once the sender is closed and the buffer drained, every
//! receiver observes `None`.

use px_error::{ExportError, Result};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::job::TraversalJob;

/// Create a job queue holding at most `capacity` pending jobs.
pub fn job_queue(capacity: usize) -> (JobSender, JobReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        JobSender { tx },
        JobReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer side of the job queue.
#[derive(Debug)]
pub struct JobSender {
    tx: mpsc::Sender<TraversalJob>,
}

impl JobSender {
    /// Enqueue a job, waiting while the queue is full.
    ///
    /// Fails once every receiver is gone.
    pub async fn send(&self, job: TraversalJob) -> Result<()> {
        self.tx.send(job).await.map_err(|e| {
            ExportError::Queue(format!(
                "no workers left to take partition {}",
                e.0.partition_id
            ))
        })
    }

    /// Close the queue. Workers drain what is buffered, then finish.
    pub fn close(self) {
        debug!("Closing job queue");
        drop(self.tx);
    }
}

/// Worker side of the job queue. Clones share the same queue.
#[derive(Debug, Clone)]
pub struct JobReceiver {
    rx: Arc<Mutex<mpsc::Receiver<TraversalJob>>>,
}

impl JobReceiver {
    /// Take the next job, or `None` once the queue is closed and drained.
    pub async fn recv(&self) -> Option<TraversalJob> {
        self.rx.lock().await.recv().await
    }
}
