//! Synthetic fetcher for `memo simulate`

use crate::error::{FetchError, Outcome};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Sleeps for a fixed delay, then returns the key upper-cased
///
/// Keys starting with `bad` fail. Every invocation is counted so callers can
/// check how many fetches actually ran.
#[derive(Debug)]
pub struct DelayFetcher {
    delay: Duration,
    calls: AtomicU64,
}

impl DelayFetcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of fetches started so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for DelayFetcher {
    type Value = String;

    async fn fetch(&self, key: &str) -> Outcome<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if key.starts_with("bad") {
            return Err(FetchError::failed(key, "simulated failure"));
        }
        Ok(key.to_uppercase())
    }
}
