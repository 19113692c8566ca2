//! Durable storage for rotation pointers.
//!
//! The durable document is loaded and saved as a whole: there are no partial
//! updates. Backends only need to provide atomic whole-document replace.
//!
//! - `FilesystemStateStore`: JSON file, temp file + rename
//! - `MemoryStateStore`: in-process, with failure injection for tests

mod document;
mod filesystem;
mod memory;

pub use document::{DurableDocument, PersistedRotation, STORAGE_KEY, STORAGE_VERSION};
pub use filesystem::FilesystemStateStore;
pub use memory::MemoryStateStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{StorageConfig, StorageType};

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported document version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for state store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Interface for durable document persistence.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the durable document.
    ///
    /// Returns `None` if no document has been saved yet.
    async fn load(&self) -> Result<Option<DurableDocument>>;

    /// Replace the durable document.
    async fn save(&self, document: &DurableDocument) -> Result<()>;
}

/// Initialize the state store based on configuration.
pub async fn init_storage(config: &StorageConfig) -> Result<Arc<dyn StateStore>> {
    match config.storage_type {
        StorageType::Filesystem => {
            info!(path = %config.path.display(), "StateStore: filesystem");
            let store = FilesystemStateStore::new(&config.path).await?;
            Ok(Arc::new(store))
        }
        StorageType::Memory => {
            info!("StateStore: memory (state will not survive restarts)");
            Ok(Arc::new(MemoryStateStore::new()))
        }
    }
}
