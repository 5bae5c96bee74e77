//! Per-key cache entries
//!
//! An entry is split into two halves. [`Entry`] is the read side: cheap to
//! clone, stored in the cache, awaited by any number of callers. [`Completer`]
//! is the write side: exactly one exists per entry and it is consumed when the
//! outcome is recorded, so an entry can be completed at most once.
//!
//! Readiness is a `watch` channel holding `None` until the outcome arrives.
//! Late waiters see the stored value immediately, early waiters are woken
//! together when it is sent.

use crate::error::{FetchError, Outcome};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Read side of a memoized fetch
pub struct Entry<V> {
    key: Arc<str>,
    ready: watch::Receiver<Option<Outcome<V>>>,
}

/// Write side of a memoized fetch
///
/// Dropping a completer without calling [`complete`](Self::complete) closes
/// the channel; waiters then observe [`FetchError::Abandoned`].
pub struct Completer<V> {
    key: Arc<str>,
    ready: watch::Sender<Option<Outcome<V>>>,
}

impl<V: Clone> Entry<V> {
    /// Create a pending entry together with its only completer
    pub fn pending(key: &str) -> (Self, Completer<V>) {
        let key: Arc<str> = Arc::from(key);
        let (tx, rx) = watch::channel(None);
        (
            Self {
                key: Arc::clone(&key),
                ready: rx,
            },
            Completer { key, ready: tx },
        )
    }

    /// The key this entry memoizes
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the outcome has been recorded
    pub fn is_ready(&self) -> bool {
        self.ready.borrow().is_some()
    }

    /// Wait until the entry is ready and return its outcome
    pub async fn wait(&self) -> Outcome<V> {
        let mut ready = self.ready.clone();
        let recorded = match ready.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };
        recorded.unwrap_or_else(|| Err(FetchError::abandoned(self.key())))
    }
}

impl<V> Completer<V> {
    /// The key this completer writes
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<V: Clone> Completer<V> {
    /// Record the outcome, wake every waiter, and hand the outcome back
    pub fn complete(self, outcome: Outcome<V>) -> Outcome<V> {
        self.ready.send_replace(Some(outcome.clone()));
        outcome
    }
}

impl<V> Clone for Entry<V> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            ready: self.ready.clone(),
        }
    }
}

impl<V> fmt::Debug for Entry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("ready", &self.ready.borrow().is_some())
            .finish()
    }
}
