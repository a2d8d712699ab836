//! Background idle eviction.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::{Persistable, PersistentPageRegistry};

/// Handle to a running sweep task.
///
/// Dropping the handle also stops the task, at its next wake-up.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweep task and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<P: Persistable> PersistentPageRegistry<P> {
    /// Run [`evict_idle`] every `interval` on the current tokio runtime.
    ///
    /// Must be called from within a runtime.
    ///
    /// [`evict_idle`]: PersistentPageRegistry::evict_idle
    pub fn start_sweeper(self: &Arc<Self>, interval: Duration, max_idle: Duration) -> SweeperHandle {
        self.start_sweeper_with(interval, max_idle, |_| {})
    }

    /// Like [`start_sweeper`], reporting each sweep's eviction count.
    ///
    /// [`start_sweeper`]: PersistentPageRegistry::start_sweeper
    pub fn start_sweeper_with<F>(
        self: &Arc<Self>,
        interval: Duration,
        max_idle: Duration,
        on_sweep: F,
    ) -> SweeperHandle
    where
        F: Fn(usize) + Send + 'static,
    {
        let registry = Arc::clone(self);
        let (shutdown, mut stop) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                interval_ms = interval.as_millis() as u64,
                max_idle_secs = max_idle.as_secs(),
                "Page sweeper started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = registry.evict_idle(max_idle);
                        debug!(evicted, live = registry.len(), "Sweep completed");
                        on_sweep(evicted);
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Page sweeper stopped");
        });

        SweeperHandle { shutdown, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::PageId;

    struct Draft;

    impl Persistable for Draft {
        fn assign_identity(&mut self, _id: PageId) {}
    }

    #[tokio::test]
    async fn test_sweeper_evicts_idle_pages() {
        let registry = Arc::new(PersistentPageRegistry::new());
        let id = registry.register(Draft);

        let handle = registry.start_sweeper(Duration::from_millis(10), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!registry.contains(id));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_reports_evictions() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let registry = Arc::new(PersistentPageRegistry::new());
        registry.register(Draft);
        registry.register(Draft);

        let total = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&total);
        let handle = registry.start_sweeper_with(Duration::from_millis(10), Duration::ZERO, move |n| {
            seen.fetch_add(n, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        assert_eq!(total.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sweeper_shutdown() {
        let registry: Arc<PersistentPageRegistry<Draft>> = Arc::new(PersistentPageRegistry::new());
        let handle = registry.start_sweeper(Duration::from_secs(3600), Duration::from_secs(3600));

        handle.shutdown().await;
        assert!(registry.is_empty());
    }
}
