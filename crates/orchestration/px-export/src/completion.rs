//! Completion tracking for a set of workers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    completed: AtomicUsize,
    notify: Notify,
}

/// Waits until every registered worker has signalled completion.
///
/// Each worker holds a [`CompletionGuard`]; dropping it is the worker's one
/// completion signal, so a worker that returns early or panics still counts.
#[derive(Debug, Clone, Default)]
pub struct CompletionGroup {
    inner: Arc<Inner>,
}

impl CompletionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one worker.
    pub fn guard(&self, worker_id: usize) -> CompletionGuard {
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        CompletionGuard {
            worker_id,
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.inner.completed.load(Ordering::SeqCst)
    }

    /// Wait until no registered worker is pending.
    ///
    /// Returns immediately when nothing was registered.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Completion signal of one worker, fired on drop.
#[derive(Debug)]
pub struct CompletionGuard {
    worker_id: usize,
    inner: Arc<Inner>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.inner.completed.fetch_add(1, Ordering::SeqCst);
        let remaining = self.inner.pending.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(worker = self.worker_id, remaining, "Worker completed");
        if remaining == 0 {
            self.inner.notify.notify_waiters();
        }
    }
}
