//! MuPDF Job Concurrency Control
//!
//! Every request opens its own MuPDF document on a blocking thread, so there
//! is nothing to share between jobs. What does need bounding is how many of
//! those CPU-heavy jobs run at once; this pool hands out permits and keeps
//! counters for the health endpoint.
//!
//! ```text
//! acquire() → JobPermit → [job runs on blocking thread] → drop()
//!     ↑                                                    ↓
//! [active++]                                   [active--, completed/failed++]
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounded pool of MuPDF job slots
#[derive(Debug)]
pub struct JobPool {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    active: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl JobPool {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            active: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Wait for a free slot
    ///
    /// Returns a RAII guard that frees the slot on drop. The semaphore is
    /// never closed, so acquisition only fails if the pool is being torn down.
    pub async fn acquire(self: &Arc<Self>) -> Option<JobPermit> {
        let permit = Arc::clone(&self.permits).acquire_owned().await.ok()?;
        self.active.fetch_add(1, Ordering::Relaxed);
        Some(JobPermit {
            _permit: permit,
            pool: Arc::clone(self),
            succeeded: false,
        })
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active: self.active.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            max_concurrent: self.max_concurrent,
        }
    }
}

impl Default for JobPool {
    fn default() -> Self {
        Self::new(4)
    }
}

/// RAII guard - returns the slot to the pool on drop
pub struct JobPermit {
    _permit: OwnedSemaphorePermit,
    pool: Arc<JobPool>,
    succeeded: bool,
}

impl JobPermit {
    /// Count this job as completed rather than failed
    pub fn succeed(&mut self) {
        self.succeeded = true;
    }
}

impl Drop for JobPermit {
    fn drop(&mut self) {
        self.pool.active.fetch_sub(1, Ordering::Relaxed);
        if self.succeeded {
            self.pool.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.pool.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Jobs currently holding a slot
    pub active: usize,
    /// Jobs that finished successfully
    pub completed: usize,
    /// Jobs that returned an error, timed out or panicked
    pub failed: usize,
    pub max_concurrent: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_acquire_release() {
        let pool = Arc::new(JobPool::new(2));

        {
            let mut permit = pool.acquire().await.unwrap();
            assert_eq!(pool.stats().active, 1);
            permit.succeed();
        }

        let stats = pool.stats();
        assert_eq!(stats.active, 0);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_dropped_permit_counts_as_failure() {
        let pool = Arc::new(JobPool::new(1));
        drop(pool.acquire().await.unwrap());
        assert_eq!(pool.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_pool_max_size() {
        let pool = Arc::new(JobPool::new(1));
        let first = pool.acquire().await.unwrap();

        let waiting = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire().await.is_some() })
        };
        tokio::task::yield_now().await;
        assert_eq!(pool.stats().active, 1);

        drop(first);
        assert!(waiting.await.unwrap());
    }

    #[test]
    fn test_zero_is_clamped() {
        assert_eq!(JobPool::new(0).stats().max_concurrent, 1);
    }
}
