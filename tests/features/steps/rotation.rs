//! Rotation step definitions.

use std::sync::Arc;

use cucumber::{given, then, when, World};
use take_turns::commands::{CommandRouter, NextTurnCall, SetPersonCall};
use take_turns::presentation::NoopObserver;
use take_turns::sources::{parse_people, DynamicSource, EntryRequest};
use take_turns::storage::MemoryStateStore;
use take_turns::{Origin, RotationError, RotationRegistry};

/// Test context for rotation scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct RotationWorld {
    store: Arc<MemoryStateStore>,
    registry: Option<Arc<RotationRegistry>>,
    last_error: Option<RotationError>,
}

impl RotationWorld {
    fn new() -> Self {
        Self {
            store: Arc::new(MemoryStateStore::new()),
            registry: None,
            last_error: None,
        }
    }

    fn registry(&self) -> Arc<RotationRegistry> {
        Arc::clone(self.registry.as_ref().expect("Registry not loaded"))
    }

    async fn load(&mut self) {
        let registry = Arc::new(RotationRegistry::new(
            self.store.clone(),
            Arc::new(NoopObserver),
        ));
        registry.load_or_init().await.expect("load should succeed");
        self.registry = Some(registry);
    }

    fn record<T>(&mut self, result: Result<T, RotationError>) {
        self.last_error = result.err();
    }
}

// --- Given steps ---

#[given("an empty durable document")]
async fn given_empty_document(world: &mut RotationWorld) {
    world.store = Arc::new(MemoryStateStore::new());
}

#[given("the registry is loaded")]
async fn given_registry_loaded(world: &mut RotationWorld) {
    world.load().await;
}

#[given("the durable store rejects writes")]
async fn given_store_rejects_writes(world: &mut RotationWorld) {
    world.store.set_fail_on_save(true).await;
}

#[given(expr = "rotation {string} is declared with people {string}")]
async fn given_rotation_declared(world: &mut RotationWorld, id: String, people: String) {
    declare_rotation(world, id, people).await;
}

async fn declare_rotation(world: &mut RotationWorld, id: String, people: String) {
    let result = world
        .registry()
        .declare(&id, id.clone(), parse_people(&people), Origin::Declarative)
        .await;
    world.record(result);
}

// --- When steps ---

#[when(expr = "rotation {string} is redeclared with people {string}")]
async fn when_rotation_redeclared(world: &mut RotationWorld, id: String, people: String) {
    declare_rotation(world, id, people).await;
}

#[when(expr = "the next turn of {string} is taken")]
async fn when_next_turn(world: &mut RotationWorld, id: String) {
    let router = CommandRouter::new(world.registry());
    let result = router
        .next_turn(NextTurnCall {
            entity_id: Some(format!("sensor.{}", id)),
        })
        .await;
    world.record(result);
}

#[when(expr = "{string} is selected in {string}")]
async fn when_person_selected(world: &mut RotationWorld, person: String, id: String) {
    let router = CommandRouter::new(world.registry());
    let result = router
        .set_person(SetPersonCall {
            entity_id: Some(id),
            person: Some(person),
        })
        .await;
    world.record(result);
}

#[when("the process restarts")]
async fn when_process_restarts(world: &mut RotationWorld) {
    if let Some(registry) = world.registry.take() {
        let _ = registry.dispose().await;
    }
    world.load().await;
}

#[when(expr = "a dynamic rotation {string} is created with people {string}")]
async fn when_dynamic_created(world: &mut RotationWorld, id: String, people: String) {
    let source = DynamicSource::new(world.registry());
    let result = source
        .create_entry(EntryRequest {
            entity_id: id,
            name: String::new(),
            people,
        })
        .await;
    world.record(result);
}

// --- Then steps ---

#[then(expr = "the current person of {string} is {string}")]
async fn then_current_person(world: &mut RotationWorld, id: String, person: String) {
    let state = world.registry().get(&id).await.expect("rotation exists");
    assert_eq!(state.current.as_deref(), Some(person.as_str()));
}

#[then(expr = "the stored index of {string} is {int}")]
async fn then_stored_index(world: &mut RotationWorld, id: String, index: usize) {
    let document = world.store.stored().await.expect("document was saved");
    assert_eq!(document.index_of(&id), Some(index));
}

#[then(expr = "the command fails with {string}")]
async fn then_command_fails(world: &mut RotationWorld, kind: String) {
    let error = world.last_error.as_ref().expect("expected an error");
    let matched = match kind.as_str() {
        "not found" => matches!(error, RotationError::NotFound { .. }),
        "member not found" => matches!(error, RotationError::MemberNotFound { .. }),
        "collision" => matches!(error, RotationError::IdentifierCollision { .. }),
        "persistence" => matches!(error, RotationError::PersistenceFailure(_)),
        other => panic!("unknown error kind: {}", other),
    };
    assert!(matched, "expected {}, got {:?}", kind, error);
}
