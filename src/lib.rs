//! Memo - duplicate-suppressing memoizing cache
//!
//! Wraps a slow, fallible fetch so that each key is fetched at most once,
//! however many tasks ask for it at the same time. Two interchangeable
//! strategies are provided: a confinement cache whose store is owned by a
//! single worker task, and a mutex cache whose store sits behind a lock.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod ui;

pub use cache::{build_cache, Cache, CacheStats, ConfinementCache, MutexCache, Shutdown, Strategy};
pub use error::{FetchError, MemoError, MemoResult, Outcome};
pub use fetch::{fetch_fn, Fetcher};
