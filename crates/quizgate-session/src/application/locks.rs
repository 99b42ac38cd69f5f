//! Per-user mutual exclusion for session transitions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use quizgate_core::ids::UserId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle entries are swept once the table grows past this size.
const SWEEP_THRESHOLD: usize = 1024;

/// A table of async mutexes keyed by user id.
///
/// Holding the guard serializes every session transition of one user while
/// leaving other users unaffected.
#[derive(Debug, Default)]
pub struct UserLocks {
    table: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `user_id`'s session.
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            if table.len() >= SWEEP_THRESHOLD {
                // Only the table itself holds idle entries.
                table.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(table.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of users currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no users are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
