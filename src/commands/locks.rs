use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Number of entries below which dead locks are never pruned
const PRUNE_FLOOR: usize = 64;

/// Table of lazily created locks, one per key
///
/// Entries are held weakly: a lock stays alive while some caller holds or waits on it, and is
/// dropped from the table once nobody references it. Keys never share a lock, so callers working
/// on different keys never wait on each other.
#[derive(Debug)]
pub struct KeyLocks<K> {
    inner: Mutex<Table<K>>,
}

#[derive(Debug)]
struct Table<K> {
    locks: HashMap<K, Weak<AsyncMutex<()>>>,
    /// Table size that triggers the next prune
    prune_at: usize,
}

impl<K> Default for KeyLocks<K> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Table {
                locks: HashMap::new(),
                prune_at: PRUNE_FLOOR,
            }),
        }
    }
}

impl<K> KeyLocks<K>
where
    K: Eq + Hash + Clone,
{
    /// Wait for exclusive access to `key`
    ///
    /// The returned guard releases the lock when dropped. Waiters are served in FIFO order.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        self.lock_for(key).lock_owned().await
    }

    /// Number of entries currently in the table, including dead ones not pruned yet
    pub fn len(&self) -> usize {
        self.table().locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys whose lock is currently referenced
    pub fn active(&self) -> usize {
        self.table()
            .locks
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }

    fn lock_for(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut table = self.table();
        if let Some(lock) = table.locks.get(key).and_then(Weak::upgrade) {
            return lock;
        }

        if table.locks.len() >= table.prune_at {
            table.locks.retain(|_, lock| lock.strong_count() > 0);
            table.prune_at = (table.locks.len() * 2).max(PRUNE_FLOOR);
        }

        let lock = Arc::new(AsyncMutex::new(()));
        table.locks.insert(key.clone(), Arc::downgrade(&lock));
        lock
    }

    /// Lock the table, ignoring poisoning
    fn table(&self) -> std::sync::MutexGuard<'_, Table<K>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
