//! Duplicate-suppressing memoizing caches
//!
//! Every cache in this module guarantees that the fetcher runs at most once
//! per key, no matter how many callers ask for that key concurrently, and
//! that every caller for a key sees the same outcome. Failed fetches are
//! memoized like successful ones. Nothing is ever evicted.
//!
//! # Strategies
//!
//! | Strategy | Store owner | Waiting on a hit | Shutdown |
//! |----------|-------------|------------------|----------|
//! | Confinement | one worker task, reached by message | delivery task | stop signal |
//! | Mutex | whoever holds the lock | caller, lock released | none |
//!
//! Both implement [`Cache`] and can be swapped at runtime with [`build_cache`].

mod confinement;
mod entry;
mod mutex;
mod shutdown;

pub use confinement::{ConfinementCache, DEFAULT_REQUEST_BUFFER};
pub use entry::{Completer, Entry};
pub use mutex::MutexCache;
pub use shutdown::Shutdown;

use crate::config::schema::CacheConfig;
use crate::error::MemoResult;
use crate::fetch::Fetcher;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Concurrency-control strategy used to guard the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// A single worker task owns the store
    #[default]
    Confinement,
    /// The store is shared behind a lock
    Mutex,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confinement => "confinement",
            Self::Mutex => "mutex",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confinement" => Ok(Self::Confinement),
            "mutex" => Ok(Self::Mutex),
            other => Err(format!(
                "unknown cache strategy '{other}', expected 'confinement' or 'mutex'"
            )),
        }
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub strategy: Strategy,
    /// Entries in the store; equal to `misses` since nothing is evicted
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Hit/miss counters readable without touching the store
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, strategy: Strategy) -> CacheStats {
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            strategy,
            entries: misses,
            hits: self.hits.load(Ordering::Relaxed),
            misses,
        }
    }
}

/// Memoizing, duplicate-suppressing cache
#[async_trait]
pub trait Cache: Send + Sync {
    /// Value produced by the underlying fetcher
    type Value: Clone + Send + Sync + 'static;

    /// Get the value for `key`, fetching it if no caller has asked before
    ///
    /// Concurrent callers for the same key share one fetch and receive equal
    /// outcomes, including equal errors.
    async fn get(&self, key: &str) -> MemoResult<Self::Value>;

    /// Current counters
    fn stats(&self) -> CacheStats;

    /// Strategy implemented by this cache
    fn strategy(&self) -> Strategy;

    /// Stop coordinator, for strategies that run a background worker
    fn shutdown_handle(&self) -> Option<Shutdown> {
        None
    }
}

/// Build a cache for `fetcher` using the chosen strategy
///
/// The confinement strategy spawns its worker, so this must be called from
/// within a Tokio runtime.
pub fn build_cache<F: Fetcher>(
    strategy: Strategy,
    fetcher: F,
    config: &CacheConfig,
) -> Arc<dyn Cache<Value = F::Value>> {
    match strategy {
        Strategy::Confinement => Arc::new(ConfinementCache::with_capacity(
            fetcher,
            config.request_buffer,
        )),
        Strategy::Mutex => Arc::new(MutexCache::new(fetcher)),
    }
}
