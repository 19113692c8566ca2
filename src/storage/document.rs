//! Durable document format.
//!
//! ```json
//! { "version": 1, "key": "take_turns", "data": { "story": { "current_index": 1 } } }
//! ```
//!
//! Only pointers are persisted; members and labels always come from live
//! configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Result, StorageError};

/// Current document format version.
pub const STORAGE_VERSION: u32 = 1;
/// Storage key recorded in the document envelope.
pub const STORAGE_KEY: &str = "take_turns";

/// Persisted record for one rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRotation {
    /// Stored as a signed integer so that a hand-edited negative value is
    /// rejected at seed time rather than failing the whole document.
    #[serde(default)]
    pub current_index: i64,
}

impl PersistedRotation {
    pub fn new(current_index: usize) -> Self {
        Self {
            current_index: i64::try_from(current_index).unwrap_or(i64::MAX),
        }
    }

    /// Stored index, or `None` if it cannot be an index.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.current_index).ok()
    }
}

/// Snapshot of every rotation pointer, keyed by rotation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurableDocument {
    pub version: u32,
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default)]
    pub data: BTreeMap<String, PersistedRotation>,
}

fn default_key() -> String {
    STORAGE_KEY.to_string()
}

impl Default for DurableDocument {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION,
            key: default_key(),
            data: BTreeMap::new(),
        }
    }
}

impl DurableDocument {
    /// Stored index for a rotation, if present and non-negative.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.data.get(id).and_then(PersistedRotation::index)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    pub fn set_index(&mut self, id: impl Into<String>, index: usize) {
        self.data.insert(id.into(), PersistedRotation::new(index));
    }

    pub fn remove(&mut self, id: &str) -> Option<PersistedRotation> {
        self.data.remove(id)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reject documents written by a newer format.
    pub fn check_version(&self) -> Result<()> {
        if self.version > STORAGE_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: self.version,
                supported: STORAGE_VERSION,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_wire_shape() {
        let mut document = DurableDocument::default();
        document.set_index("story", 1);

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "version": 1,
                "key": "take_turns",
                "data": { "story": { "current_index": 1 } }
            })
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let document: DurableDocument =
            serde_json::from_str(r#"{ "version": 1, "data": { "story": {} } }"#).unwrap();

        assert_eq!(document.key, STORAGE_KEY);
        assert_eq!(document.index_of("story"), Some(0));
        assert_eq!(document.index_of("other"), None);
    }

    #[test]
    fn test_negative_index_is_not_an_index() {
        let document: DurableDocument = serde_json::from_str(
            r#"{ "version": 1, "data": { "story": { "current_index": -3 } } }"#,
        )
        .unwrap();

        assert!(document.contains("story"));
        assert_eq!(document.index_of("story"), None);
    }

    #[test]
    fn test_newer_version_rejected() {
        let document = DurableDocument {
            version: STORAGE_VERSION + 1,
            ..DurableDocument::default()
        };

        assert!(matches!(
            document.check_version(),
            Err(StorageError::UnsupportedVersion { .. })
        ));
        assert!(DurableDocument::default().check_version().is_ok());
    }
}
