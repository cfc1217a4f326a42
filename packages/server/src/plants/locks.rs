use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-key async mutual exclusion.
///
/// Entries are created on first use and dropped again once nobody holds or
/// waits for them, so the table only ever contains keys with work in flight.
#[derive(Default)]
pub struct KeyedLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

/// Held while a key is locked. Releases and prunes on drop.
pub struct KeyedGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let mutex = Arc::clone(&self.inner.entry(key.to_string()).or_default());
        let guard = mutex.lock_owned().await;
        KeyedGuard {
            locks: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Keys currently held or awaited.
    pub fn active(&self) -> usize {
        self.inner.len()
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The map holds the only remaining reference unless someone is waiting.
        self.locks
            .inner
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
