//! Tracking for fire-and-forget cache writes.
//!
//! Strategy handlers store responses as a side effect that must never
//! delay delivery, so writes run on spawned tasks. The counter here lets
//! shutdown (and tests) wait until every outstanding write has landed.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// Counts in-flight background writes.
///
/// Clones share one counter.
#[derive(Clone, Debug, Default)]
pub struct BackgroundWrites {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    active: AtomicUsize,
    notify: Notify,
}

impl BackgroundWrites {
    /// Spawn a tracked background task.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.clone();
        tokio::spawn(async move {
            task.await;
            if inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
                inner.notify.notify_waiters();
            }
        });
    }

    /// Wait until no writes are in flight.
    ///
    /// The permit is taken before the counter is read, so a write that
    /// finishes between the two cannot be missed.
    pub async fn quiesce(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.inner.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_quiesce_waits_for_spawned_tasks() {
        let writes = BackgroundWrites::default();
        let hit = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let hit = hit.clone();
            writes.spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                hit.fetch_add(1, Ordering::SeqCst);
            });
        }

        writes.quiesce().await;
        assert_eq!(hit.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_quiesce_returns_immediately_when_idle() {
        let writes = BackgroundWrites::default();
        writes.quiesce().await;
    }
}
