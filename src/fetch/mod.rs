//! Fetch capability consumed by the caches
//!
//! A [`Fetcher`] turns a key into a value, possibly slowly. The caches call
//! it concurrently for distinct keys and never twice for the same key.

mod delay;
mod http;

pub use delay::DelayFetcher;
pub use http::HttpFetcher;

use crate::error::{FetchError, Outcome};
use async_trait::async_trait;
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::warn;

/// Key-to-value fetch function
///
/// Implementations must be safe to call concurrently for distinct keys and
/// may take an unbounded amount of time. Blocking work belongs on the
/// blocking pool (`tokio::task::spawn_blocking`).
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Value produced by a successful fetch
    type Value: Clone + Send + Sync + 'static;

    /// Fetch the value for `key`
    async fn fetch(&self, key: &str) -> Outcome<Self::Value>;
}

/// Fetcher backed by an async closure
pub struct FnFetcher<F>(F);

/// Adapt `f` into a [`Fetcher`]
///
/// ```rust,ignore
/// let fetcher = memo::fetch::fetch_fn(|key: String| async move {
///     Ok::<_, memo::FetchError>(key.len())
/// });
/// ```
pub fn fetch_fn<F>(f: F) -> FnFetcher<F> {
    FnFetcher(f)
}

#[async_trait]
impl<F, Fut, V> Fetcher for FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<V>> + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Value = V;

    async fn fetch(&self, key: &str) -> Outcome<V> {
        (self.0)(key.to_string()).await
    }
}

// Lets a caller keep a handle on a fetcher (and its counters) after the
// cache takes ownership of it.
#[async_trait]
impl<F: Fetcher> Fetcher for Arc<F> {
    type Value = F::Value;

    async fn fetch(&self, key: &str) -> Outcome<F::Value> {
        (**self).fetch(key).await
    }
}

/// Run a fetch, turning a panic into [`FetchError::Abandoned`]
pub(crate) async fn guarded<F: Fetcher + ?Sized>(fetcher: &F, key: &str) -> Outcome<F::Value> {
    match AssertUnwindSafe(fetcher.fetch(key)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!("Fetch for {} panicked", key);
            Err(FetchError::abandoned(key))
        }
    }
}
