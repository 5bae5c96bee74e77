//! Key producer and response consumer that drive a cache
//!
//! The producer replays a list of keys onto a channel. The consumer spawns
//! one task per key that calls [`Cache::get`] and reports how long it took.
//! Both halves observe a shared stop token; neither adds any constraint on
//! the cache beyond accepting concurrent `get` calls.

use crate::cache::Cache;
use crate::error::MemoResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

/// Outcome of one `get`, with timing
#[derive(Debug)]
pub struct Response<V> {
    pub key: String,
    pub outcome: MemoResult<V>,
    /// Wall-clock time the `get` started
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Call `cache.get(key)` and time it
pub async fn timed_get<C>(cache: &C, key: String) -> Response<C::Value>
where
    C: Cache + ?Sized,
{
    let started_at = Utc::now();
    let start = Instant::now();
    let outcome = cache.get(&key).await;

    Response {
        key,
        outcome,
        started_at,
        elapsed: start.elapsed(),
    }
}

/// Emit `keys` onto a channel `repeat + 1` times
///
/// The stream closes when every round has been sent, when `stop` fires, or
/// when the receiver is dropped.
pub fn produce_keys(
    keys: Vec<String>,
    repeat: u32,
    buffer: usize,
    stop: CancellationToken,
) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(buffer.max(1));

    tokio::spawn(async move {
        'rounds: for round in 0..=repeat {
            if stop.is_cancelled() {
                info!("Key producer was stopped");
                break;
            }
            debug!(
                "Producing round {} of {}",
                u64::from(round) + 1,
                u64::from(repeat) + 1
            );

            for key in &keys {
                tokio::select! {
                    biased;

                    _ = stop.cancelled() => {
                        info!("Key producer was stopped");
                        break 'rounds;
                    }

                    sent = tx.send(key.clone()) => {
                        if sent.is_err() {
                            debug!("Key consumer went away");
                            break 'rounds;
                        }
                    }
                }
            }
        }
        info!("Key producer done producing");
    });

    rx
}

/// Fetch every key from `keys` through `cache`, concurrently
///
/// One task is spawned per key. When `stop` fires no further keys are taken,
/// but tasks already running finish and report. The response stream closes
/// after the last of them.
pub fn consume_keys<V>(
    cache: Arc<dyn Cache<Value = V>>,
    mut keys: mpsc::Receiver<String>,
    buffer: usize,
    stop: CancellationToken,
) -> mpsc::Receiver<Response<V>>
where
    V: Clone + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel(buffer.max(1));

    tokio::spawn(async move {
        let tasks = TaskTracker::new();

        loop {
            let key = tokio::select! {
                biased;

                _ = stop.cancelled() => {
                    info!("Key consumer was stopped");
                    break;
                }

                key = keys.recv() => match key {
                    Some(key) => key,
                    None => break,
                },
            };

            let cache = Arc::clone(&cache);
            let tx = tx.clone();
            tasks.spawn(async move {
                let response = timed_get(&*cache, key).await;
                if tx.send(response).await.is_err() {
                    debug!("Response reader went away");
                }
            });
        }

        tasks.close();
        tasks.wait().await;
        info!("Key consumer done consuming");
    });

    rx
}
