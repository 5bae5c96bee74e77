//! Lock-based cache
//!
//! The store is shared behind a mutex that is held only for the lookup and,
//! on a miss, the insert of a pending entry. Fetching and waiting both happen
//! after the lock is released, so a slow key never holds up other keys.
//!
//! The fetch for a miss runs in its own task. A caller that gives up on its
//! `get` leaves the fetch running, and the entry still receives the real
//! outcome.

use crate::cache::entry::{Completer, Entry};
use crate::cache::{Cache, CacheStats, Counters, Strategy};
use crate::error::{FetchError, MemoResult};
use crate::fetch::{self, Fetcher};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Result of the critical section
enum Lookup<V> {
    Hit(Entry<V>),
    Miss(Completer<V>),
}

/// Memoizing cache guarded by a mutex
///
/// Has no worker task and therefore nothing to shut down.
pub struct MutexCache<F: Fetcher> {
    fetcher: Arc<F>,
    store: Mutex<HashMap<String, Entry<F::Value>>>,
    counters: Counters,
}

impl<F: Fetcher> MutexCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            store: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Find the entry for `key`, or insert a pending one and claim the fetch
    fn lookup(&self, key: &str) -> Lookup<F::Value> {
        let mut store = self.store.lock();
        if let Some(entry) = store.get(key) {
            return Lookup::Hit(entry.clone());
        }

        let (entry, completer) = Entry::pending(key);
        store.insert(key.to_string(), entry);
        Lookup::Miss(completer)
    }
}

#[async_trait]
impl<F: Fetcher> Cache for MutexCache<F> {
    type Value = F::Value;

    async fn get(&self, key: &str) -> MemoResult<F::Value> {
        let outcome = match self.lookup(key) {
            Lookup::Hit(entry) => {
                self.counters.hit();
                debug!("Cache hit for {}", key);
                entry.wait().await
            }
            Lookup::Miss(completer) => {
                self.counters.miss();
                debug!("Cache miss for {}, fetching", key);

                let fetcher = Arc::clone(&self.fetcher);
                let owned = key.to_string();
                let task = tokio::spawn(async move {
                    completer.complete(fetch::guarded(&*fetcher, &owned).await)
                });

                // Only a runtime shutdown cancels the task; the completer is dropped with it
                task.await.unwrap_or_else(|_| Err(FetchError::abandoned(key)))
            }
        };

        outcome.map_err(Into::into)
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot(Strategy::Mutex)
    }

    fn strategy(&self) -> Strategy {
        Strategy::Mutex
    }
}
