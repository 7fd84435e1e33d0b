//! Bounded concurrency for request handling

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Limits how many requests are scored at once.
///
/// Each spawned task holds a permit until its response is published;
/// [`WorkerLimiter::drain`] waits for all of them to come back.
#[derive(Clone)]
pub struct WorkerLimiter {
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl WorkerLimiter {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of requests currently being processed
    pub fn in_flight(&self) -> usize {
        self.workers - self.semaphore.available_permits()
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        Ok(self.semaphore.clone().acquire_owned().await?)
    }

    /// Wait until every in-flight request has released its permit, then stop
    /// handing out new ones
    pub async fn drain(&self) -> Result<()> {
        let permits = self.semaphore.acquire_many(self.workers as u32).await?;
        permits.forget();
        self.semaphore.close();
        Ok(())
    }
}
