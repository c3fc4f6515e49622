//! Bounded fire-and-forget worker pool (§9 design notes): backs the three
//! detached-task points in the control flow — vector indexing after
//! `remember`, access tracking after `recall`, and `last_used_at` updates
//! after auth. Enqueue never blocks the request path; on saturation the
//! job is dropped with a warn-level log rather than applying back-pressure
//! to the caller.

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tracing::warn;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Clone)]
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
}

impl WorkerPool {
    /// Spawns `concurrency` consumer tasks draining a channel of capacity
    /// `queue_capacity`.
    pub fn spawn(queue_capacity: usize, concurrency: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>(queue_capacity);
        let receiver = std::sync::Arc::new(tokio::sync::Mutex::new(receiver));
        for _ in 0..concurrency.max(1) {
            let receiver = receiver.clone();
            tokio::spawn(async move {
                loop {
                    let job = {
                        let mut receiver = receiver.lock().await;
                        receiver.recv().await
                    };
                    match job {
                        Some(job) => job.await,
                        None => break,
                    }
                }
            });
        }
        Self { sender }
    }

    /// Enqueues `job`. Drops it with a warn-level log on saturation rather
    /// than blocking the caller.
    pub fn enqueue(&self, label: &'static str, job: impl Future<Output = ()> + Send + 'static) {
        match self.sender.try_send(Box::pin(job)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(task = label, "worker pool saturated, dropping task");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(task = label, "worker pool closed, dropping task");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn enqueued_jobs_run() {
        let pool = WorkerPool::spawn(8, 2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let counter = counter.clone();
            pool.enqueue("test", async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn saturated_pool_drops_without_blocking() {
        let pool = WorkerPool::spawn(1, 1);
        let (block_tx, block_rx) = tokio::sync::oneshot::channel::<()>();
        let block_rx = std::sync::Arc::new(tokio::sync::Mutex::new(Some(block_rx)));
        pool.enqueue("blocker", async move {
            if let Some(rx) = block_rx.lock().await.take() {
                let _ = rx.await;
            }
        });
        // Give the blocker a moment to be picked up by the single worker.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        for _ in 0..3 {
            pool.enqueue("extra", async move {});
        }
        let _ = block_tx.send(());
    }
}
