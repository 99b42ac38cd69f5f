//! The PostgreSQL store handle.

use std::future::Future;
use std::time::Duration;

use quizgate_core::error::DomainError;
use sqlx::PgPool;
use tracing::warn;

use crate::error::StoreError;

/// Timeout applied to each store call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL-backed implementation of every Quizgate store trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    /// Creates a store with the default timeout.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs `work` under the store timeout and maps failures to domain
    /// errors. Database failures and timeouts become `StorageUnavailable`.
    pub(crate) async fn bounded<T>(
        &self,
        operation: &'static str,
        work: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, DomainError> {
        match tokio::time::timeout(self.timeout, work).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(StoreError::Domain(e))) => Err(e),
            Ok(Err(e)) => {
                warn!(operation, error = %e, "storage call failed");
                Err(e.into())
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(operation, timeout_ms, "storage call timed out");
                Err(DomainError::StorageUnavailable(format!(
                    "{operation} timed out after {timeout_ms}ms"
                )))
            }
        }
    }
}
