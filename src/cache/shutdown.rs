//! Cooperative shutdown for the confinement cache worker
//!
//! The coordinator pairs a stop trigger with a task group. The worker and
//! every fetch/delivery task it spawns are tracked, so [`Shutdown::wait`]
//! returns only once all of them have finished.

use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

/// Stop trigger and task group shared by a confinement cache and its tasks
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl Shutdown {
    /// Create a coordinator that has not been triggered
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the stop signal. Calling this more than once has no further effect.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            info!("Stopping cache request handler");
        }
        self.token.cancel();
    }

    /// Whether the stop signal has fired
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the stop signal has fired
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }

    /// Number of tracked tasks that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every tracked task to finish
    ///
    /// Does not fire the stop signal on its own; a live worker keeps this
    /// pending until [`trigger`](Self::trigger) is called or the cache is dropped.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Spawn a task that [`wait`](Self::wait) will account for
    pub(crate) fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }
}
