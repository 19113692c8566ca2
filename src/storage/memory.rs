//! In-memory state store.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DurableDocument, Result, StateStore, StorageError};

/// State store that keeps the document in memory.
///
/// Used for `storage.type: memory` and in tests, where saves and loads can be
/// made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    document: RwLock<Option<DurableDocument>>,
    fail_on_save: RwLock<bool>,
    fail_on_load: RwLock<bool>,
    saves: AtomicUsize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `document`.
    pub fn with_document(document: DurableDocument) -> Self {
        Self {
            document: RwLock::new(Some(document)),
            ..Self::default()
        }
    }

    pub async fn set_fail_on_save(&self, fail: bool) {
        *self.fail_on_save.write().await = fail;
    }

    pub async fn set_fail_on_load(&self, fail: bool) {
        *self.fail_on_load.write().await = fail;
    }

    /// Last successfully saved document.
    pub async fn stored(&self) -> Option<DurableDocument> {
        self.document.read().await.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<DurableDocument>> {
        if *self.fail_on_load.read().await {
            return Err(StorageError::Unavailable("load disabled".to_string()));
        }
        let document = self.document.read().await.clone();
        if let Some(document) = &document {
            document.check_version()?;
        }
        Ok(document)
    }

    async fn save(&self, document: &DurableDocument) -> Result<()> {
        if *self.fail_on_save.read().await {
            return Err(StorageError::Unavailable("save disabled".to_string()));
        }
        *self.document.write().await = Some(document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_save_and_load() {
        let store = MemoryStateStore::new();
        assert!(store.load().await.unwrap().is_none());

        let mut document = DurableDocument::default();
        document.set_index("story", 1);
        store.save(&document).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(document));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_fail_on_save() {
        let store = MemoryStateStore::new();
        store.set_fail_on_save(true).await;

        let result = store.save(&DurableDocument::default()).await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
        assert!(store.stored().await.is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_memory_store_fail_on_load() {
        let store = MemoryStateStore::with_document(DurableDocument::default());
        store.set_fail_on_load(true).await;

        assert!(store.load().await.is_err());
    }
}
