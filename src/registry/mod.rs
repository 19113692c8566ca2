//! Rotation registry.
//!
//! Single entry point for reading and mutating rotations. Holds at most one
//! [`Rotation`] per id, reconciles declarations from the declarative and
//! dynamic sources, and drives write-through persistence.
//!
//! Mutations are serialized by the registry's write lock. Reads return
//! [`RotationState`] value copies, never references into the live map.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, RotationError};
use crate::persistence::{PersistenceCoordinator, PersistenceHealth};
use crate::presentation::{RotationEvent, RotationObserver};
use crate::rotation::{engine, Origin, Rotation, RotationState};
use crate::storage::{DurableDocument, StateStore};


#[derive(Default)]
struct RegistryState {
    loaded: bool,
    rotations: HashMap<String, Rotation>,
    /// Document as last loaded, minus removed ids. Entries whose rotation is
    /// not declared in this process are carried through every flush.
    seeds: DurableDocument,
}

impl RegistryState {
    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(RotationError::NotInitialized)
        }
    }

    fn known_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rotations.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn not_found(&self, id: &str) -> RotationError {
        RotationError::NotFound {
            id: id.to_string(),
            available: self.known_ids(),
        }
    }

    fn rotation_mut(&mut self, id: &str) -> Result<&mut Rotation> {
        let available = self.known_ids();
        match self.rotations.get_mut(id) {
            Some(rotation) => Ok(rotation),
            None => Err(RotationError::NotFound {
                id: id.to_string(),
                available,
            }),
        }
    }

    /// Ids with a durable record but no declared rotation.
    fn undeclared_ids(&self) -> Vec<String> {
        self.seeds
            .data
            .keys()
            .filter(|id| !self.rotations.contains_key(*id))
            .cloned()
            .collect()
    }

    fn snapshot(&self) -> DurableDocument {
        let mut document = self.seeds.clone();
        for rotation in self.rotations.values() {
            document.set_index(rotation.id(), rotation.current_index());
        }
        document
    }
}

/// Process-wide map of rotation id to rotation state.
///
/// Lifecycle: construct, call [`load_or_init`](Self::load_or_init) once at
/// startup, declare rotations, serve commands, call
/// [`dispose`](Self::dispose) at shutdown.
pub struct RotationRegistry {
    state: RwLock<RegistryState>,
    persistence: PersistenceCoordinator,
    observer: Arc<dyn RotationObserver>,
}

impl RotationRegistry {
    pub fn new(store: Arc<dyn StateStore>, observer: Arc<dyn RotationObserver>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            persistence: PersistenceCoordinator::new(store),
            observer,
        }
    }

    /// Load the durable document and re-derive every declared pointer.
    ///
    /// An absent document is treated as empty. Calling this again with the
    /// same document and declarations yields the same state.
    pub async fn load_or_init(&self) -> Result<()> {
        let document = self.persistence.load().await?;

        let mut registry = self.state.write().await;
        let RegistryState {
            loaded,
            rotations,
            seeds,
        } = &mut *registry;

        for rotation in rotations.values_mut() {
            if engine::reseed(rotation, document.index_of(rotation.id())) {
                debug!(
                    id = %rotation.id(),
                    index = rotation.current_index(),
                    "Pointer re-derived from durable document"
                );
            }
            self.observer
                .notify(&RotationEvent::Changed(rotation.state()));
        }

        *seeds = document;
        *loaded = true;

        info!(
            stored = seeds.len(),
            declared = rotations.len(),
            "Rotation registry loaded"
        );
        Ok(())
    }

    /// Insert or update the rotation for `id`.
    ///
    /// A new rotation starts from its stored pointer if that is still valid
    /// for `members`, else from the first member. Redeclaring an existing
    /// rotation replaces its label and members and repairs the pointer.
    /// Declaring an id owned by the other origin fails with
    /// `IdentifierCollision` and leaves the existing rotation untouched.
    pub async fn declare(
        &self,
        id: &str,
        label: impl Into<String>,
        members: Vec<String>,
        origin: Origin,
    ) -> Result<RotationState> {
        self.declare_with(id, label.into(), members, origin, false)
            .await
    }

    /// Like [`declare`](Self::declare), but fails with `AlreadyConfigured`
    /// if `id` is already declared by the same origin.
    pub async fn declare_new(
        &self,
        id: &str,
        label: impl Into<String>,
        members: Vec<String>,
        origin: Origin,
    ) -> Result<RotationState> {
        self.declare_with(id, label.into(), members, origin, true)
            .await
    }

    async fn declare_with(
        &self,
        id: &str,
        label: String,
        members: Vec<String>,
        origin: Origin,
        exclusive: bool,
    ) -> Result<RotationState> {
        let (state, needs_flush) = {
            let mut registry = self.state.write().await;
            registry.ensure_loaded()?;

            if members.is_empty() {
                return Err(RotationError::InvalidConfiguration {
                    id: id.to_string(),
                    reason: "member list is empty".to_string(),
                });
            }

            let RegistryState {
                rotations, seeds, ..
            } = &mut *registry;

            let (state, needs_flush) = match rotations.get_mut(id) {
                Some(existing) if existing.origin() != origin => {
                    warn!(
                        id = %id,
                        existing = %existing.origin(),
                        declared = %origin,
                        "Identifier collision, declaration rejected"
                    );
                    return Err(RotationError::IdentifierCollision {
                        id: id.to_string(),
                        existing: existing.origin(),
                        declared: origin,
                    });
                }
                Some(_) if exclusive => {
                    return Err(RotationError::AlreadyConfigured { id: id.to_string() });
                }
                Some(existing) => {
                    let moved = engine::reconfigure(existing, label, members);
                    if moved {
                        info!(
                            id = %id,
                            index = existing.current_index(),
                            current = ?existing.current(),
                            "Pointer repaired after member change"
                        );
                    }
                    (existing.state(), moved)
                }
                None => {
                    let stored = seeds.data.get(id).copied();
                    let stored_index = stored.and_then(|record| record.index());

                    let mut rotation = Rotation::new(id, label, members, origin);
                    engine::reseed(&mut rotation, stored_index);

                    let clamped =
                        stored.is_some() && stored_index != Some(rotation.current_index());
                    if clamped {
                        warn!(
                            id = %id,
                            stored = ?stored.map(|record| record.current_index),
                            members = rotation.members().len(),
                            "Stored pointer out of range, starting from first member"
                        );
                    }

                    info!(
                        id = %id,
                        origin = %origin,
                        index = rotation.current_index(),
                        "Rotation declared"
                    );
                    let state = rotation.state();
                    rotations.insert(id.to_string(), rotation);
                    (state, clamped)
                }
            };

            self.observer
                .notify(&RotationEvent::Changed(state.clone()));
            (state, needs_flush)
        };

        if needs_flush {
            self.flush().await?;
        }
        Ok(state)
    }

    /// Delete a rotation and its durable record.
    ///
    /// Returns the removed state, or `None` if `id` was unknown.
    pub async fn remove(&self, id: &str) -> Result<Option<RotationState>> {
        self.remove_with(id, None).await
    }

    /// Delete a rotation owned by `origin`.
    ///
    /// Fails with `IdentifierCollision` if the rotation belongs to the other
    /// origin.
    pub async fn remove_owned(&self, id: &str, origin: Origin) -> Result<Option<RotationState>> {
        self.remove_with(id, Some(origin)).await
    }

    async fn remove_with(&self, id: &str, owner: Option<Origin>) -> Result<Option<RotationState>> {
        let removed = {
            let mut registry = self.state.write().await;
            registry.ensure_loaded()?;

            if let (Some(owner), Some(existing)) = (owner, registry.rotations.get(id)) {
                if existing.origin() != owner {
                    return Err(RotationError::IdentifierCollision {
                        id: id.to_string(),
                        existing: existing.origin(),
                        declared: owner,
                    });
                }
            }

            let removed = registry.rotations.remove(id);
            let had_record = registry.seeds.remove(id).is_some();

            if removed.is_none() && !had_record {
                debug!(id = %id, "Remove of unknown rotation ignored");
                return Ok(None);
            }

            if let Some(rotation) = &removed {
                self.observer.notify(&RotationEvent::Removed {
                    id: id.to_string(),
                    origin: rotation.origin(),
                });
            }
            removed.map(|rotation| rotation.state())
        };

        info!(id = %id, "Rotation removed");
        self.flush().await?;
        Ok(removed)
    }

    /// Drop a rotation from memory but keep its durable record.
    ///
    /// A later declaration of the same id resumes from the kept pointer.
    pub async fn unload(&self, id: &str) -> Result<Option<RotationState>> {
        self.unload_with(id, None).await
    }

    /// Unload a rotation owned by `origin`.
    ///
    /// Fails with `IdentifierCollision` if the rotation belongs to the other
    /// origin.
    pub async fn unload_owned(&self, id: &str, origin: Origin) -> Result<Option<RotationState>> {
        self.unload_with(id, Some(origin)).await
    }

    async fn unload_with(&self, id: &str, owner: Option<Origin>) -> Result<Option<RotationState>> {
        let mut registry = self.state.write().await;
        registry.ensure_loaded()?;

        if let (Some(owner), Some(existing)) = (owner, registry.rotations.get(id)) {
            if existing.origin() != owner {
                return Err(RotationError::IdentifierCollision {
                    id: id.to_string(),
                    existing: existing.origin(),
                    declared: owner,
                });
            }
        }

        let Some(rotation) = registry.rotations.remove(id) else {
            return Ok(None);
        };
        registry
            .seeds
            .set_index(rotation.id(), rotation.current_index());

        self.observer.notify(&RotationEvent::Removed {
            id: id.to_string(),
            origin: rotation.origin(),
        });
        debug!(id = %id, index = rotation.current_index(), "Rotation unloaded");
        Ok(Some(rotation.state()))
    }

    /// Current state of one rotation.
    pub async fn get(&self, id: &str) -> Result<RotationState> {
        let registry = self.state.read().await;
        registry
            .rotations
            .get(id)
            .map(Rotation::state)
            .ok_or_else(|| registry.not_found(id))
    }

    /// Every rotation, ordered by id.
    pub async fn list(&self) -> Vec<RotationState> {
        let registry = self.state.read().await;
        let mut states: Vec<RotationState> =
            registry.rotations.values().map(Rotation::state).collect();
        states.sort_by(|a, b| a.id.cmp(&b.id));
        states
    }

    /// Ids of every declared rotation, sorted.
    pub async fn ids(&self) -> Vec<String> {
        self.state.read().await.known_ids()
    }

    /// Move `id` to its next member and persist.
    pub async fn advance(&self, id: &str) -> Result<RotationState> {
        let (state, moved) = {
            let mut registry = self.state.write().await;
            registry.ensure_loaded()?;

            let rotation = registry.rotation_mut(id)?;
            let before = rotation.current_index();
            engine::advance(rotation)?;

            let state = rotation.state();
            self.observer
                .notify(&RotationEvent::Changed(state.clone()));
            let moved = state_moved(before, &state);
            (state, moved)
        };

        debug!(
            id = %id,
            current = ?state.current,
            index = state.current_index,
            "Advanced rotation"
        );
        if moved {
            self.flush().await?;
        }
        Ok(state)
    }

    /// Point `id` at `member` and persist.
    pub async fn select_member(&self, id: &str, member: &str) -> Result<RotationState> {
        let (state, moved) = {
            let mut registry = self.state.write().await;
            registry.ensure_loaded()?;

            let rotation = registry.rotation_mut(id)?;
            let before = rotation.current_index();
            engine::select_member(rotation, member)?;

            let state = rotation.state();
            self.observer
                .notify(&RotationEvent::Changed(state.clone()));
            let moved = state_moved(before, &state);
            (state, moved)
        };

        debug!(
            id = %id,
            current = ?state.current,
            index = state.current_index,
            "Selected member"
        );
        if moved {
            self.flush().await?;
        }
        Ok(state)
    }

    /// Persist the current snapshot now.
    pub async fn flush(&self) -> Result<()> {
        self.persistence.flush(self).await?;
        Ok(())
    }

    /// Final flush at shutdown.
    pub async fn dispose(&self) -> Result<()> {
        let loaded = self.state.read().await.loaded;
        if !loaded {
            debug!("Registry never loaded, nothing to flush");
            return Ok(());
        }
        self.flush().await?;
        info!("Rotation registry disposed");
        Ok(())
    }

    /// Ids kept in the durable document that no source has declared.
    ///
    /// Their records are carried through every flush until removed.
    pub async fn undeclared(&self) -> Vec<String> {
        self.state.read().await.undeclared_ids()
    }

    /// Document that the next flush would write.
    pub async fn snapshot(&self) -> DurableDocument {
        self.state.read().await.snapshot()
    }

    pub fn persistence_health(&self) -> PersistenceHealth {
        self.persistence.health()
    }
}

fn state_moved(before: usize, state: &RotationState) -> bool {
    before != state.current_index
}

impl fmt::Debug for RotationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationRegistry")
            .field("persistence", &self.persistence.health())
            .finish_non_exhaustive()
    }
}
