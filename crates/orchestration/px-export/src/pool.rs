//! Worker pool.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::completion::CompletionGroup;
use crate::queue::JobReceiver;
use crate::worker::{Worker, WorkerContext, WorkerExit, WorkerHandle};

/// A fixed set of workers sharing one job queue.
///
/// The pool keeps no receiver of its own: once every worker has exited, the
/// queue has no receivers left and the producer's next send fails instead of
/// waiting forever.
pub struct WorkerPool {
    handles: Vec<WorkerHandle>,
    tasks: Vec<JoinHandle<WorkerExit>>,
    completion: CompletionGroup,
}

impl WorkerPool {
    /// Spawn `worker_count` workers, numbered from 1.
    ///
    /// Each worker's stop token is a child of the context's run token, so
    /// cancelling the run stops every worker.
    pub fn spawn(worker_count: usize, jobs: JobReceiver, context: Arc<WorkerContext>) -> Self {
        let completion = CompletionGroup::new();
        let mut handles = Vec::with_capacity(worker_count);
        let mut tasks = Vec::with_capacity(worker_count);

        for id in 1..=worker_count {
            let worker = Worker::new(
                id,
                jobs.clone(),
                context.run_token().child_token(),
                completion.guard(id),
                Arc::clone(&context),
            );
            handles.push(worker.handle());
            tasks.push(tokio::spawn(worker.run()));
        }

        info!(workers = worker_count, "Worker pool started");

        Self {
            handles,
            tasks,
            completion,
        }
    }

    pub fn workers(&self) -> &[WorkerHandle] {
        &self.handles
    }

    pub fn completion(&self) -> &CompletionGroup {
        &self.completion
    }

    /// Ask every worker to stop taking jobs.
    pub fn stop_all(&self) {
        for handle in &self.handles {
            handle.stop();
        }
    }

    /// Wait until every worker has completed.
    ///
    /// Returns how each worker ended; a worker that panicked is logged and
    /// left out.
    pub async fn join(self) -> Vec<WorkerExit> {
        self.completion.wait().await;

        let mut exits = Vec::with_capacity(self.tasks.len());
        for (handle, task) in self.handles.iter().zip(self.tasks) {
            match task.await {
                Ok(exit) => exits.push(exit),
                Err(e) => error!(worker = handle.id(), error = %e, "Worker task panicked"),
            }
        }
        exits
    }
}
