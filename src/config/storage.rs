//! Storage configuration types.

use std::path::PathBuf;

use serde::Deserialize;

/// Default location of the durable document.
pub const DEFAULT_STORAGE_PATH: &str = ".storage/take_turns";

/// Storage type discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// JSON document on the local filesystem.
    #[default]
    Filesystem,
    /// In-process only. Pointers are lost on restart.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Path of the durable document (filesystem only).
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::default(),
            path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}
