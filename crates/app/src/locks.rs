//! Keyed async mutexes.

use std::{
    fmt,
    hash::Hash,
    sync::{Arc, Mutex as SyncMutex, MutexGuard as SyncMutexGuard, PoisonError},
};

use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Entries<K> = FxHashMap<K, Arc<Mutex<()>>>;

/// One async mutex per key, created on first use and dropped with its last
/// guard.
///
/// Used to serialise all cart and checkout work belonging to a single user
/// without making unrelated users wait on each other.
pub struct KeyedLocks<K> {
    entries: SyncMutex<Entries<K>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Copy,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: SyncMutex::new(FxHashMap::default()),
        }
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The returned guard releases the key when dropped.
    pub async fn lock(&self, key: K) -> KeyGuard<'_, K> {
        let lock = Arc::clone(self.entries().entry(key).or_default());

        let mut guard = KeyGuard {
            locks: self,
            key,
            held: None,
        };

        guard.held = Some(lock.lock_owned().await);

        guard
    }

    /// Number of keys currently held or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The map is only touched between awaits, so a blocking mutex is enough.
    fn entries(&self) -> SyncMutexGuard<'_, Entries<K>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove `key` once nobody holds or waits for it.
    ///
    /// Waiters clone the entry's `Arc` under the map lock, so a strong count
    /// of one seen under the same lock means the entry is idle.
    fn prune(&self, key: K) {
        let mut entries = self.entries();

        if entries
            .get(&key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            entries.remove(&key);
        }
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for KeyedLocks<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLocks").finish_non_exhaustive()
    }
}

/// Exclusive access to one key of a [`KeyedLocks`].
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct KeyGuard<'a, K>
where
    K: Eq + Hash + Copy,
{
    locks: &'a KeyedLocks<K>,
    key: K,
    held: Option<OwnedMutexGuard<()>>,
}

impl<K> Drop for KeyGuard<'_, K>
where
    K: Eq + Hash + Copy,
{
    fn drop(&mut self) {
        drop(self.held.take());

        self.locks.prune(self.key);
    }
}

impl<K> fmt::Debug for KeyGuard<'_, K>
where
    K: Eq + Hash + Copy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGuard")
            .field("held", &self.held.is_some())
            .finish_non_exhaustive()
    }
}
