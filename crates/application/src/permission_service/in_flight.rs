use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable<K> = HashMap<K, Arc<Mutex<()>>>;
type LockMap<K> = Arc<StdMutex<LockTable<K>>>;

/// One async mutex per key, created on demand and dropped once uncontended.
pub(super) struct KeyedLocks<K> {
    locks: LockMap<K>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Arc::new(StdMutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash + Copy> KeyedLocks<K> {
    /// Waits until no other holder owns `key`.
    ///
    /// The key is released when the returned guard drops, including when the
    /// holding future is cancelled.
    pub(super) async fn acquire(&self, key: K) -> KeyGuard<K> {
        let lock = {
            let mut locks = entries(&self.locks);
            locks.entry(key).or_default().clone()
        };
        let held = lock.lock_owned().await;

        KeyGuard {
            key,
            locks: Arc::clone(&self.locks),
            held: Some(held),
        }
    }

    #[cfg(test)]
    pub(super) fn tracked_keys(&self) -> usize {
        entries(&self.locks).len()
    }
}

/// Exclusive hold on one key of a [`KeyedLocks`].
pub(super) struct KeyGuard<K: Eq + Hash> {
    key: K,
    locks: LockMap<K>,
    held: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyGuard<K> {
    fn drop(&mut self) {
        drop(self.held.take());

        let mut locks = entries(&self.locks);
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

// The map is only touched in short synchronous sections, so a poisoned lock
// still holds a consistent map.
fn entries<K>(locks: &StdMutex<LockTable<K>>) -> MutexGuard<'_, LockTable<K>> {
    locks.lock().unwrap_or_else(PoisonError::into_inner)
}
