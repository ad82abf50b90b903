//! Bounded pool of request handler tasks

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs at most `size` handlers at once and can wait for all of them to finish.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    size: u32,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        let size = u32::try_from(size).context("Worker count does not fit in u32")?;
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(size as usize)),
            size,
        })
    }

    /// Wait for a free slot, then run `task` on its own Tokio task.
    pub async fn spawn<F>(&self, task: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker pool closed")?;

        tokio::spawn(async move {
            task.await;
            drop(permit);
        });
        Ok(())
    }

    /// Number of handlers currently running
    pub fn in_flight(&self) -> usize {
        self.size as usize - self.semaphore.available_permits()
    }

    /// Wait until every spawned handler has finished.
    pub async fn drain(&self) -> Result<()> {
        let _all = self
            .semaphore
            .acquire_many(self.size)
            .await
            .context("Worker pool closed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_drain_waits_for_in_flight_tasks() {
        let pool = WorkerPool::new(2).unwrap();
        let finished = Arc::new(AtomicUsize::new(0));

        for delay_ms in [30, 10, 20] {
            let finished = finished.clone();
            pool.spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        pool.drain().await.unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        let pool = WorkerPool::new(1).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let running = running.clone();
            let peak = peak.clone();
            pool.spawn(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        pool.drain().await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
