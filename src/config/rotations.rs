//! Declarative rotation definitions.

use serde::Deserialize;

use crate::error::{Result, RotationError};
use crate::rotation::validate_members;

/// A rotation as written in the configuration file.
///
/// ```yaml
/// rotations:
///   bedtime_story:
///     people: [Mom, Dad, Grandma]
///     name: Bedtime Story Reader
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeclaredRotation {
    /// Members in turn order.
    pub people: Vec<String>,
    /// Display name. Derived from the id when absent.
    #[serde(default)]
    pub name: Option<String>,
}

impl DeclaredRotation {
    /// Display name for this rotation.
    pub fn label(&self, id: &str) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_label(id),
        }
    }

    /// Validate the definition for `id`.
    pub fn validate(&self, id: &str) -> Result<()> {
        if !is_slug(id) {
            return Err(RotationError::InvalidConfiguration {
                id: id.to_string(),
                reason: "id must contain only lowercase letters, digits and underscores"
                    .to_string(),
            });
        }
        validate_members(id, &self.people)
    }
}

/// True if `id` is non-empty lowercase ASCII letters, digits and underscores.
pub fn is_slug(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// `bedtime_story` -> `Bedtime Story`.
pub fn default_label(id: &str) -> String {
    id.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
