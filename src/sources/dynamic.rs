//! Dynamic source: rotations created, edited and deleted at runtime.
//!
//! Entries arrive as form-style payloads where the member list is a single
//! comma-separated string. Updates are partial: absent fields keep their
//! current value.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::config::{default_label, is_slug};
use crate::error::{Result, RotationError};
use crate::registry::RotationRegistry;
use crate::rotation::{validate_members, Origin, RotationState};

/// Payload for creating an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryRequest {
    /// Rotation id, e.g. `bedtime_story`.
    pub entity_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Comma-separated members, e.g. `Mom, Dad, Grandma`.
    pub people: String,
}

/// Partial update of an existing entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryOptions {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub people: Option<String>,
}

/// Split a comma-separated member list, trimming and dropping blanks.
pub fn parse_people(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`parse_people`], used to prefill edit forms.
pub fn format_people(members: &[String]) -> String {
    members.join(", ")
}

/// Runtime entry lifecycle on top of the registry.
#[derive(Debug, Clone)]
pub struct DynamicSource {
    registry: Arc<RotationRegistry>,
}

impl DynamicSource {
    pub fn new(registry: Arc<RotationRegistry>) -> Self {
        Self { registry }
    }

    /// Create a new entry.
    ///
    /// Fails with `AlreadyConfigured` if a dynamic entry with this id exists
    /// and with `IdentifierCollision` if the id is declared in configuration.
    pub async fn create_entry(&self, request: EntryRequest) -> Result<RotationState> {
        let id = request.entity_id.trim();
        if !is_slug(id) {
            return Err(RotationError::InvalidConfiguration {
                id: id.to_string(),
                reason: "id must contain only lowercase letters, digits and underscores"
                    .to_string(),
            });
        }

        let members = parse_people(&request.people);
        validate_members(id, &members)?;

        let label = match request.name.trim() {
            "" => default_label(id),
            name => name.to_string(),
        };

        let state = self
            .registry
            .declare_new(id, label, members, Origin::Dynamic)
            .await?;
        info!(id = %id, "Dynamic entry created");
        Ok(state)
    }

    /// Merge `options` onto the existing entry and redeclare it.
    pub async fn update_entry(&self, id: &str, options: EntryOptions) -> Result<RotationState> {
        let existing = self.registry.get(id).await?;
        if existing.origin != Origin::Dynamic {
            return Err(RotationError::IdentifierCollision {
                id: id.to_string(),
                existing: existing.origin,
                declared: Origin::Dynamic,
            });
        }

        let label = match options.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => existing.label,
        };

        let members = match options.people.as_deref() {
            Some(people) => {
                let members = parse_people(people);
                validate_members(id, &members)?;
                members
            }
            None => existing.members,
        };

        let state = self
            .registry
            .declare(id, label, members, Origin::Dynamic)
            .await?;
        info!(id = %id, "Dynamic entry updated");
        Ok(state)
    }

    /// Delete an entry and its durable record.
    pub async fn remove_entry(&self, id: &str) -> Result<Option<RotationState>> {
        self.registry.remove_owned(id, Origin::Dynamic).await
    }

    /// Stop tracking an entry in memory, keeping its durable record.
    pub async fn unload_entry(&self, id: &str) -> Result<Option<RotationState>> {
        self.registry.unload_owned(id, Origin::Dynamic).await
    }
}
