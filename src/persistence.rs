//! Write-through persistence of rotation pointers.
//!
//! Every flush writes the full current snapshot, never a delta. Flushes are
//! serialized and each one captures its snapshot only after acquiring the
//! flush lock, so a stale snapshot can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::registry::RotationRegistry;
use crate::storage::{DurableDocument, StateStore, StorageError};

/// Flush outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistenceHealth {
    /// Failures since the last successful flush.
    pub consecutive_failures: u64,
    /// Failures since the coordinator was created.
    pub total_failures: u64,
}

impl PersistenceHealth {
    pub fn is_healthy(&self) -> bool {
        self.consecutive_failures == 0
    }
}

/// Keeps the durable document consistent with in-memory pointers.
pub struct PersistenceCoordinator {
    store: Arc<dyn StateStore>,
    flush_lock: Mutex<()>,
    consecutive_failures: AtomicU64,
    total_failures: AtomicU64,
}

impl PersistenceCoordinator {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            flush_lock: Mutex::new(()),
            consecutive_failures: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
        }
    }

    /// Load the durable document. An absent document is an empty one.
    pub async fn load(&self) -> Result<DurableDocument, StorageError> {
        let document = self.store.load().await?.unwrap_or_default();
        debug!(rotations = document.len(), "Durable document loaded");
        Ok(document)
    }

    /// Write the registry's current snapshot, replacing prior content.
    pub async fn flush(&self, registry: &RotationRegistry) -> Result<(), StorageError> {
        let _guard = self.flush_lock.lock().await;
        let document = registry.snapshot().await;

        match self.store.save(&document).await {
            Ok(()) => {
                let previous = self.consecutive_failures.swap(0, Ordering::SeqCst);
                if previous > 0 {
                    info!(
                        failed_attempts = previous,
                        "Persistence recovered after failures"
                    );
                }
                debug!(rotations = document.len(), "Flushed rotation state");
                Ok(())
            }
            Err(e) => {
                let consecutive = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                self.total_failures.fetch_add(1, Ordering::SeqCst);
                error!(
                    error = %e,
                    consecutive_failures = consecutive,
                    "Failed to persist rotation state; in-memory state is ahead of storage"
                );
                Err(e)
            }
        }
    }

    pub fn health(&self) -> PersistenceHealth {
        PersistenceHealth {
            consecutive_failures: self.consecutive_failures.load(Ordering::SeqCst),
            total_failures: self.total_failures.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::NoopObserver;
    use crate::rotation::Origin;
    use crate::storage::MemoryStateStore;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_absent_is_empty() {
        let coordinator = PersistenceCoordinator::new(Arc::new(MemoryStateStore::new()));
        let document = coordinator.load().await.unwrap();
        assert!(document.is_empty());
    }

    #[tokio::test]
    async fn test_flush_writes_full_snapshot() {
        let store = Arc::new(MemoryStateStore::new());
        let registry = RotationRegistry::new(store.clone(), Arc::new(NoopObserver));
        registry.load_or_init().await.unwrap();
        registry
            .declare("story", "Story", names(&["Mom", "Dad"]), Origin::Declarative)
            .await
            .unwrap();
        registry
            .declare("dishes", "Dishes", names(&["Al", "Bo"]), Origin::Dynamic)
            .await
            .unwrap();

        let coordinator = PersistenceCoordinator::new(store.clone());
        coordinator.flush(&registry).await.unwrap();

        let stored = store.stored().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.index_of("story"), Some(0));
        assert_eq!(stored.index_of("dishes"), Some(0));
    }

    #[tokio::test]
    async fn test_health_tracks_failures() {
        let store = Arc::new(MemoryStateStore::new());
        let registry = RotationRegistry::new(store.clone(), Arc::new(NoopObserver));
        registry.load_or_init().await.unwrap();

        let coordinator = PersistenceCoordinator::new(store.clone());
        store.set_fail_on_save(true).await;

        assert!(coordinator.flush(&registry).await.is_err());
        assert!(coordinator.flush(&registry).await.is_err());
        assert_eq!(
            coordinator.health(),
            PersistenceHealth {
                consecutive_failures: 2,
                total_failures: 2
            }
        );

        store.set_fail_on_save(false).await;
        coordinator.flush(&registry).await.unwrap();

        let health = coordinator.health();
        assert!(health.is_healthy());
        assert_eq!(health.total_failures, 2);
    }
}
