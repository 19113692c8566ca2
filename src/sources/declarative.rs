//! Declarative source: rotations listed in the configuration file.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::config::DeclaredRotation;
use crate::error::RotationError;
use crate::registry::RotationRegistry;
use crate::rotation::Origin;

/// Outcome of applying the declarative configuration.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Ids declared or updated.
    pub declared: Vec<String>,
    /// Declarative ids removed because the configuration no longer lists them.
    pub removed: Vec<String>,
    /// Declarations rejected, with the reason.
    pub failed: Vec<(String, RotationError)>,
    /// Ids with a stored pointer that no rotation claims after applying.
    pub undeclared: Vec<String>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Rotations supplied by the static configuration.
#[derive(Debug, Clone, Default)]
pub struct DeclarativeSource {
    rotations: BTreeMap<String, DeclaredRotation>,
}

impl DeclarativeSource {
    pub fn new(rotations: BTreeMap<String, DeclaredRotation>) -> Self {
        Self { rotations }
    }

    /// Declare every configured rotation and drop declarative rotations the
    /// configuration no longer lists.
    ///
    /// A rejected declaration is reported and skipped; the others still
    /// apply.
    pub async fn apply(&self, registry: &RotationRegistry) -> ApplyReport {
        let mut report = ApplyReport::default();

        for (id, declared) in &self.rotations {
            let result = match declared.validate(id) {
                Ok(()) => registry
                    .declare(
                        id,
                        declared.label(id),
                        declared.people.clone(),
                        Origin::Declarative,
                    )
                    .await
                    .map(|_| ()),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => report.declared.push(id.clone()),
                Err(RotationError::PersistenceFailure(e)) => {
                    warn!(id = %id, error = %e, "Rotation declared but not persisted");
                    report.declared.push(id.clone());
                }
                Err(e) => {
                    error!(id = %id, error = %e, "Declarative rotation rejected");
                    report.failed.push((id.clone(), e));
                }
            }
        }

        for state in registry.list().await {
            if state.origin != Origin::Declarative || self.rotations.contains_key(&state.id) {
                continue;
            }
            match registry.remove_owned(&state.id, Origin::Declarative).await {
                Ok(_) => report.removed.push(state.id),
                Err(RotationError::PersistenceFailure(e)) => {
                    warn!(id = %state.id, error = %e, "Rotation removed but not persisted");
                    report.removed.push(state.id);
                }
                Err(e) => {
                    error!(id = %state.id, error = %e, "Failed to remove rotation");
                    report.failed.push((state.id, e));
                }
            }
        }

        report.undeclared = registry.undeclared().await;
        if !report.undeclared.is_empty() {
            warn!(
                ids = ?report.undeclared,
                "Stored pointers without a declared rotation are kept; remove them if stale"
            );
        }

        info!(
            declared = report.declared.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "Declarative configuration applied"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::presentation::NoopObserver;
    use crate::storage::{DurableDocument, MemoryStateStore};

    async fn loaded_registry() -> RotationRegistry {
        let registry = RotationRegistry::new(Arc::new(MemoryStateStore::new()), Arc::new(NoopObserver));
        registry.load_or_init().await.unwrap();
        registry
    }

    fn source(yaml: &str) -> DeclarativeSource {
        DeclarativeSource::new(Config::from_yaml(yaml).unwrap().rotations)
    }

    #[tokio::test]
    async fn test_apply_declares_rotations() {
        let registry = loaded_registry().await;
        let report = source(
            r#"
rotations:
  bedtime_story:
    people: [Mom, Dad, Grandma]
  dishes:
    people: [Al, Bo]
    name: Dish Duty
"#,
        )
        .apply(&registry)
        .await;

        assert!(report.is_clean());
        assert_eq!(report.declared, vec!["bedtime_story", "dishes"]);

        let story = registry.get("bedtime_story").await.unwrap();
        assert_eq!(story.label, "Bedtime Story");
        assert_eq!(story.origin, Origin::Declarative);
        assert_eq!(registry.get("dishes").await.unwrap().label, "Dish Duty");
    }

    #[tokio::test]
    async fn test_invalid_rotation_only_skips_itself() {
        let registry = loaded_registry().await;
        let report = source(
            r#"
rotations:
  lonely:
    people: [Mom]
  story:
    people: [Mom, Dad]
"#,
        )
        .apply(&registry)
        .await;

        assert_eq!(report.declared, vec!["story"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "lonely");
        assert!(matches!(
            report.failed[0].1,
            RotationError::InvalidConfiguration { .. }
        ));
        assert!(registry.get("lonely").await.is_err());
    }

    #[tokio::test]
    async fn test_collision_with_dynamic_rotation() {
        let registry = loaded_registry().await;
        registry
            .declare(
                "story",
                "Story",
                vec!["X".to_string(), "Y".to_string()],
                Origin::Dynamic,
            )
            .await
            .unwrap();

        let report = source("rotations:\n  story:\n    people: [Mom, Dad]\n")
            .apply(&registry)
            .await;

        assert!(matches!(
            report.failed[0].1,
            RotationError::IdentifierCollision { .. }
        ));
        assert_eq!(registry.get("story").await.unwrap().origin, Origin::Dynamic);
    }

    #[tokio::test]
    async fn test_reapply_removes_unlisted_declarative_rotations() {
        let registry = loaded_registry().await;
        registry
            .declare(
                "dishes",
                "Dishes",
                vec!["Al".to_string(), "Bo".to_string()],
                Origin::Dynamic,
            )
            .await
            .unwrap();

        source("rotations:\n  story:\n    people: [Mom, Dad]\n  trash:\n    people: [Al, Bo]\n")
            .apply(&registry)
            .await;
        let report = source("rotations:\n  story:\n    people: [Mom, Dad]\n")
            .apply(&registry)
            .await;

        assert_eq!(report.removed, vec!["trash"]);
        assert!(registry.get("trash").await.is_err());
        // Dynamic rotations are not the declarative source's to remove.
        assert!(registry.get("dishes").await.is_ok());
    }

    #[tokio::test]
    async fn test_reports_stored_ids_no_longer_configured() {
        let mut document = DurableDocument::default();
        document.set_index("story", 1);
        document.set_index("trash", 0);
        let registry = RotationRegistry::new(
            Arc::new(MemoryStateStore::with_document(document)),
            Arc::new(NoopObserver),
        );
        registry.load_or_init().await.unwrap();

        let report = source("rotations:\n  story:\n    people: [Mom, Dad]\n")
            .apply(&registry)
            .await;

        assert!(report.is_clean());
        assert_eq!(report.undeclared, vec!["trash"]);
    }
}
