//! Per-record write serialization.
//!
//! Upserts are query-then-write against the store. Two writers for the same
//! `(user, story)` must not interleave, or both see "absent" and both insert.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Async mutexes keyed by string, created on demand.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<Mutex<HashMap<String, Weak<AsyncMutex<()>>>>>,
}

impl KeyedLocks {
    /// New empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: String) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock();
            locks.retain(|_, lock| lock.strong_count() > 0);

            match locks.get(&key).and_then(Weak::upgrade) {
                Some(mutex) => mutex,
                None => {
                    let mutex = Arc::new(AsyncMutex::new(()));
                    locks.insert(key, Arc::downgrade(&mutex));
                    mutex
                }
            }
        };

        mutex.lock_owned().await
    }

    /// Number of keys currently held or waited on.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }
}

/// Lock key for one record of a collection.
pub fn record_key(collection: &str, user_id: &str, story_id: &str) -> String {
    format!("{}/{}/{}", collection, user_id, story_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let guard = locks.lock("a".to_string()).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.lock("a".to_string()).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        waiting.await.unwrap();
    }

    #[tokio::test]
    async fn test_released_keys_are_forgotten() {
        let locks = KeyedLocks::new();
        let a = locks.lock("a".to_string()).await;
        let _b = locks.lock("b".to_string()).await;
        assert_eq!(locks.active(), 2);

        drop(a);
        assert_eq!(locks.active(), 1);
    }
}
