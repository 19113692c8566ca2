//! Filesystem-based state store.
//!
//! Stores the durable document as a single JSON file. Saves write a sibling
//! temp file and rename it over the target so readers never observe a
//! partially written document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{DurableDocument, Result, StateStore};

/// JSON file state store.
#[derive(Debug)]
pub struct FilesystemStateStore {
    path: PathBuf,
}

impl FilesystemStateStore {
    /// Create a new filesystem state store.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

#[async_trait]
impl StateStore for FilesystemStateStore {
    async fn load(&self) -> Result<Option<DurableDocument>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No durable document yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let document: DurableDocument = serde_json::from_slice(&bytes)?;
        document.check_version()?;

        debug!(
            path = %self.path.display(),
            rotations = document.len(),
            "Loaded durable document"
        );
        Ok(Some(document))
    }

    async fn save(&self, document: &DurableDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, &bytes).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(
            path = %self.path.display(),
            rotations = document.len(),
            size = bytes.len(),
            "Saved durable document"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use tempfile::TempDir;

    async fn create_temp_store() -> (FilesystemStateStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesystemStateStore::new(temp_dir.path().join("take_turns"))
            .await
            .unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_load_absent_document() {
        let (store, _temp) = create_temp_store().await;
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _temp) = create_temp_store().await;

        let mut document = DurableDocument::default();
        document.set_index("story", 2);
        document.set_index("dishes", 0);
        store.save(&document).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, document);
    }

    #[tokio::test]
    async fn test_save_replaces_whole_document() {
        let (store, _temp) = create_temp_store().await;

        let mut first = DurableDocument::default();
        first.set_index("story", 2);
        first.set_index("dishes", 1);
        store.save(&first).await.unwrap();

        let mut second = DurableDocument::default();
        second.set_index("story", 0);
        store.save(&second).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.index_of("story"), Some(0));
        assert!(!loaded.contains("dishes"));
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let (store, _temp) = create_temp_store().await;
        store.save(&DurableDocument::default()).await.unwrap();

        assert!(store.path().exists());
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_document() {
        let (store, _temp) = create_temp_store().await;
        fs::write(store.path(), b"{ not json").await.unwrap();

        let result = store.load().await;
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_newer_version_rejected() {
        let (store, _temp) = create_temp_store().await;
        fs::write(store.path(), br#"{ "version": 99, "data": {} }"#)
            .await
            .unwrap();

        let result = store.load().await;
        assert!(matches!(
            result,
            Err(StorageError::UnsupportedVersion { found: 99, .. })
        ));
    }
}
