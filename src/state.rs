//! Application state management

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::auth::Credentials;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::mupdf::{JobPool, PoolStats};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    credentials: Credentials,
    pool: Arc<JobPool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let credentials = Credentials::from_users(&config.auth.users);
        let pool = Arc::new(JobPool::new(config.jobs.max_concurrent));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                credentials,
                pool,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the API credentials
    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// Current job pool statistics
    pub fn job_stats(&self) -> PoolStats {
        self.inner.pool.stats()
    }

    /// Run a CPU-bound PDF job on the blocking pool
    ///
    /// Waits for a pool slot, then runs `job` under the configured timeout.
    /// The slot is held until the job returns, even after the request has
    /// timed out, so abandoned jobs still count against the limit.
    pub async fn run_job<T, F>(&self, name: &'static str, job: F) -> Result<T>
    where
        F: FnOnce() -> crate::pdf::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let job_id = Uuid::new_v4();
        let span = tracing::info_span!("job", %job_id, name);

        let mut permit = self
            .inner
            .pool
            .acquire()
            .await
            .ok_or_else(|| AppError::Internal("job pool is shut down".to_string()))?;

        let handle = tokio::task::spawn_blocking(move || {
            span.in_scope(|| {
                let started = Instant::now();
                tracing::debug!("Job started");
                let result = job();
                match &result {
                    Ok(_) => {
                        permit.succeed();
                        tracing::info!("Job finished in {:?}", started.elapsed());
                    }
                    Err(e) => tracing::warn!("Job failed after {:?}: {}", started.elapsed(), e),
                }
                result
            })
        });

        let jobs = &self.inner.config.jobs;
        match tokio::time::timeout(jobs.timeout(), handle).await {
            Err(_) => Err(AppError::Timeout(jobs.timeout_secs)),
            Ok(Err(e)) => Err(AppError::Internal(format!("{} job panicked: {}", name, e))),
            Ok(Ok(result)) => result.map_err(AppError::from),
        }
    }
}
