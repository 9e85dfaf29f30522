//! In-process advisory locks for backends without a native equivalent.
//!
//! DuckDB admits a single read-write process per database, so exclusion
//! between runners only has to hold between connections of that process.
//! One [`AdvisoryLocks`] registry is shared by every connection cloned from
//! the same backend.

use crate::error::{DbError, DbResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tm_core::LockKey;
use tokio::sync::OwnedMutexGuard;

/// Held advisory lock; dropping it releases the key.
pub type AdvisoryGuard = OwnedMutexGuard<()>;

/// Registry of keyed locks.
#[derive(Debug, Default)]
pub struct AdvisoryLocks {
    locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl AdvisoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock for `key`.
    pub async fn acquire(&self, key: LockKey) -> DbResult<AdvisoryGuard> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
            Arc::clone(locks.entry(key.get()).or_default())
        };
        Ok(lock.lock_owned().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_blocks_until_released() {
        let locks = Arc::new(AdvisoryLocks::new());
        let first = locks.acquire(LockKey::DEFAULT).await.unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move { locks.acquire(LockKey::DEFAULT).await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter should acquire after release")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = AdvisoryLocks::new();
        let _a = locks.acquire(LockKey::new(1)).await.unwrap();
        let b = tokio::time::timeout(Duration::from_secs(1), locks.acquire(LockKey::new(2))).await;
        assert!(b.is_ok());
    }
}
