//! Distributed lock over the key-value store.
//!
//! Acquisition is a single atomic set-if-absent with a TTL, so a holder
//! that crashes without releasing can only block other workers until
//! the TTL lapses. There is no internal retry: callers that fail to
//! acquire treat the resource as busy and move on.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use careerhub_core::result::AppResult;
use careerhub_core::traits::kv::KeyValueStore;

/// Distributed mutual exclusion over a shared key-value store.
#[derive(Debug, Clone)]
pub struct DistributedLock {
    store: Arc<dyn KeyValueStore>,
}

impl DistributedLock {
    /// Create a new lock manager over a store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Try to acquire the lock named `key` for `timeout`.
    ///
    /// Returns `true` if this caller now holds the lock, `false` if
    /// someone else does. Failure to acquire has no side effects.
    pub async fn acquire(&self, key: &str, timeout: Duration) -> AppResult<bool> {
        let token = Uuid::new_v4().to_string();
        let acquired = self.store.set_nx(key, &token, timeout).await?;
        debug!(key, acquired, timeout_ms = timeout.as_millis() as u64, "Lock acquire");
        Ok(acquired)
    }

    /// Release the lock named `key`.
    ///
    /// Unconditional and idempotent: releasing a lock that has already
    /// expired or was never held is not an error.
    pub async fn release(&self, key: &str) -> AppResult<()> {
        self.store.delete(key).await?;
        debug!(key, "Lock released");
        Ok(())
    }

    /// Extend a currently-held lock to `timeout` from now.
    ///
    /// Returns `false` if the lock has already expired or does not
    /// exist; extension never creates a lock.
    pub async fn extend(&self, key: &str, timeout: Duration) -> AppResult<bool> {
        if self.store.ttl_remaining(key).await?.is_none() {
            return Ok(false);
        }
        self.store.expire(key, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn lock() -> DistributedLock {
        DistributedLock::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_mutual_exclusion() {
        let lock = lock();
        let key = "careerhub:lock:test";

        let (first, second) = tokio::join!(
            lock.acquire(key, Duration::from_secs(10)),
            lock.acquire(key, Duration::from_secs(10)),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        // Exactly one winner.
        assert!(first ^ second);
    }

    #[tokio::test]
    async fn test_release_allows_reacquire() {
        let lock = lock();
        let key = "careerhub:lock:test";

        assert!(lock.acquire(key, Duration::from_secs(10)).await.unwrap());
        assert!(!lock.acquire(key, Duration::from_secs(10)).await.unwrap());

        lock.release(key).await.unwrap();
        assert!(lock.acquire(key, Duration::from_secs(10)).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let lock = lock();
        lock.release("careerhub:lock:never-held").await.unwrap();
        lock.release("careerhub:lock:never-held").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_lock_can_be_reacquired() {
        let lock = lock();
        let key = "careerhub:lock:test";

        assert!(lock.acquire(key, Duration::from_secs(5)).await.unwrap());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(lock.acquire(key, Duration::from_secs(5)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_held_lock() {
        let lock = lock();
        let key = "careerhub:lock:test";

        assert!(lock.acquire(key, Duration::from_secs(5)).await.unwrap());
        tokio::time::advance(Duration::from_secs(3)).await;

        assert!(lock.extend(key, Duration::from_secs(10)).await.unwrap());

        // Would have expired under the original TTL.
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(!lock.acquire(key, Duration::from_secs(5)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_after_expiry_fails() {
        let lock = lock();
        let key = "careerhub:lock:test";

        assert!(lock.acquire(key, Duration::from_secs(5)).await.unwrap());
        tokio::time::advance(Duration::from_secs(6)).await;

        assert!(!lock.extend(key, Duration::from_secs(10)).await.unwrap());
        // Extension must not create the lock.
        assert!(lock.acquire(key, Duration::from_secs(5)).await.unwrap());
    }
}
