//! Rotation model.
//!
//! A [`Rotation`] is an ordered member list plus the pointer to whoever is
//! currently on turn. Reads never hand out the live value: they produce a
//! [`RotationState`] copy.

pub mod engine;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RotationError};

/// Minimum member count accepted by the configuration sources.
///
/// The engine itself only requires a non-empty list.
pub const MIN_MEMBERS: usize = 2;

/// Configuration authority that owns a rotation's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Declared in the static configuration file.
    Declarative,
    /// Created at runtime as a dynamic entry.
    Dynamic,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Declarative => write!(f, "declarative"),
            Origin::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Authoritative in-memory state of one rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    id: String,
    label: String,
    members: Vec<String>,
    current_index: usize,
    origin: Origin,
}

impl Rotation {
    /// Create a rotation pointing at its first member.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        members: Vec<String>,
        origin: Origin,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            members,
            current_index: 0,
            origin,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Member currently on turn, or `None` for an empty rotation.
    pub fn current(&self) -> Option<&str> {
        self.members.get(self.current_index).map(String::as_str)
    }

    /// Immutable value copy of this rotation.
    pub fn state(&self) -> RotationState {
        RotationState {
            id: self.id.clone(),
            label: self.label.clone(),
            members: self.members.clone(),
            current_index: self.current_index,
            current: self.current().map(str::to_string),
            origin: self.origin,
        }
    }
}

/// Snapshot of a rotation as observed by callers and the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationState {
    pub id: String,
    pub label: String,
    pub members: Vec<String>,
    pub current_index: usize,
    pub current: Option<String>,
    pub origin: Origin,
}

/// Check a member list supplied by a configuration source.
///
/// Requires at least [`MIN_MEMBERS`] entries and rejects blank names.
pub fn validate_members(id: &str, members: &[String]) -> Result<()> {
    if members.iter().any(|m| m.trim().is_empty()) {
        return Err(RotationError::InvalidConfiguration {
            id: id.to_string(),
            reason: "member names must not be blank".to_string(),
        });
    }
    if members.len() < MIN_MEMBERS {
        return Err(RotationError::InvalidConfiguration {
            id: id.to_string(),
            reason: format!(
                "need_at_least_two: {} members given, at least {} required",
                members.len(),
                MIN_MEMBERS
            ),
        });
    }
    Ok(())
}
