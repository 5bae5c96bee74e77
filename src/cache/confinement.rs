//! Single-owner cache
//!
//! One worker task owns the store outright; no lock protects it because no
//! other task can reach it. Callers talk to the worker by sending a
//! [`Request`] carrying a one-shot reply channel. The worker only ever does
//! map operations and spawns: a miss spawns a fetch task, a hit spawns a
//! delivery task that waits on the entry. Its own loop never waits on a fetch.
//!
//! # Shutdown
//!
//! Firing the stop signal makes the worker close the request channel and
//! exit. Requests it already accepted keep running to completion. Requests
//! still queued, or sent afterwards, fail with [`MemoError::CacheShutDown`]
//! instead of blocking.

use crate::cache::entry::Entry;
use crate::cache::shutdown::Shutdown;
use crate::cache::{Cache, CacheStats, Counters, Strategy};
use crate::error::{MemoError, MemoResult, Outcome};
use crate::fetch::{self, Fetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Default capacity of the request channel
pub const DEFAULT_REQUEST_BUFFER: usize = 64;

/// Lookup-or-create request sent to the worker
struct Request<V> {
    key: String,
    reply: oneshot::Sender<Outcome<V>>,
}

/// Memoizing cache whose store is confined to one worker task
pub struct ConfinementCache<V> {
    requests: mpsc::Sender<Request<V>>,
    shutdown: Shutdown,
    counters: Arc<Counters>,
}

impl<V: Clone + Send + Sync + 'static> ConfinementCache<V> {
    /// Start a cache and its worker with the default request buffer
    pub fn new<F>(fetcher: F) -> Self
    where
        F: Fetcher<Value = V>,
    {
        Self::with_capacity(fetcher, DEFAULT_REQUEST_BUFFER)
    }

    /// Start a cache and its worker
    ///
    /// `capacity` bounds how many requests may queue up for the worker; it is
    /// raised to 1 if zero. Must be called within a Tokio runtime.
    pub fn with_capacity<F>(fetcher: F, capacity: usize) -> Self
    where
        F: Fetcher<Value = V>,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let shutdown = Shutdown::new();
        let counters = Arc::new(Counters::default());

        let worker = Worker {
            fetcher: Arc::new(fetcher),
            store: HashMap::new(),
            shutdown: shutdown.clone(),
            counters: Arc::clone(&counters),
        };
        shutdown.spawn(worker.run(rx));

        Self {
            requests: tx,
            shutdown,
            counters,
        }
    }

    /// Stop accepting requests and wait for in-flight work to finish
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        self.shutdown.trigger();
        self.shutdown.wait().await;
    }

    /// Whether the stop signal has fired
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_triggered()
    }
}

#[async_trait]
impl<V: Clone + Send + Sync + 'static> Cache for ConfinementCache<V> {
    type Value = V;

    async fn get(&self, key: &str) -> MemoResult<V> {
        if self.shutdown.is_triggered() {
            return Err(MemoError::CacheShutDown);
        }

        let (reply, response) = oneshot::channel();
        let request = Request {
            key: key.to_string(),
            reply,
        };

        self.requests
            .send(request)
            .await
            .map_err(|_| MemoError::CacheShutDown)?;

        // A dropped reply means the worker closed the channel with this request still queued
        let outcome = response.await.map_err(|_| MemoError::CacheShutDown)?;
        outcome.map_err(Into::into)
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot(Strategy::Confinement)
    }

    fn strategy(&self) -> Strategy {
        Strategy::Confinement
    }

    fn shutdown_handle(&self) -> Option<Shutdown> {
        Some(self.shutdown.clone())
    }
}

/// Owner of the store
struct Worker<F: Fetcher> {
    fetcher: Arc<F>,
    store: HashMap<String, Entry<F::Value>>,
    shutdown: Shutdown,
    counters: Arc<Counters>,
}

impl<F: Fetcher> Worker<F> {
    async fn run(mut self, mut requests: mpsc::Receiver<Request<F::Value>>) {
        debug!("Cache request handler started");
        let shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.triggered() => {
                    requests.close();
                    let mut rejected = 0usize;
                    while requests.try_recv().is_ok() {
                        rejected += 1;
                    }
                    info!(
                        "Cache request handler is shut down ({} entries, {} queued requests rejected)",
                        self.store.len(),
                        rejected
                    );
                    break;
                }

                request = requests.recv() => match request {
                    Some(request) => self.handle(request),
                    None => {
                        debug!("All cache handles dropped, request handler exiting");
                        break;
                    }
                },
            }
        }
    }

    fn handle(&mut self, request: Request<F::Value>) {
        let Request { key, reply } = request;

        if let Some(entry) = self.store.get(&key) {
            self.counters.hit();
            debug!("Cache hit for {}", key);

            let entry = entry.clone();
            self.shutdown.spawn(async move {
                let outcome = entry.wait().await;
                deliver(&key, reply, outcome);
            });
            return;
        }

        self.counters.miss();
        debug!("Cache miss for {}, fetching", key);

        let (entry, completer) = Entry::pending(&key);
        self.store.insert(key.clone(), entry);

        let fetcher = Arc::clone(&self.fetcher);
        self.shutdown.spawn(async move {
            let outcome = completer.complete(fetch::guarded(&*fetcher, &key).await);
            deliver(&key, reply, outcome);
        });
    }
}

fn deliver<V>(key: &str, reply: oneshot::Sender<Outcome<V>>, outcome: Outcome<V>) {
    if reply.send(outcome).is_err() {
        debug!("Requester for {} went away before delivery", key);
    }
}
