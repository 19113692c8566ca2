//! Command routing for the `next_turn` and `set_person` services.
//!
//! Service payloads reference a rotation either by its bare id (`story`) or by
//! its display entity id (`sensor.story`). Failures are logged with enough
//! context to diagnose and returned to the caller; none are fatal.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{Result, RotationError};
use crate::presentation::ENTITY_PREFIX;
use crate::registry::RotationRegistry;
use crate::rotation::RotationState;

/// Service name for advancing a rotation.
pub const NEXT_TURN: &str = "next_turn";
/// Service name for selecting a member.
pub const SET_PERSON: &str = "set_person";

/// Payload of `next_turn`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextTurnCall {
    #[serde(default)]
    pub entity_id: Option<String>,
}

/// Payload of `set_person`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetPersonCall {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub person: Option<String>,
}

/// Strip the display prefix from a rotation reference.
pub fn resolve_rotation_id(reference: &str) -> &str {
    let reference = reference.trim();
    reference.strip_prefix(ENTITY_PREFIX).unwrap_or(reference)
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RotationError::InvalidCommand(format!(
            "No {} provided in service call",
            field
        ))),
    }
}

/// Routes service calls to the registry.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    registry: Arc<RotationRegistry>,
}

impl CommandRouter {
    pub fn new(registry: Arc<RotationRegistry>) -> Self {
        Self { registry }
    }

    /// Advance the referenced rotation.
    pub async fn next_turn(&self, call: NextTurnCall) -> Result<RotationState> {
        let result = async {
            let id = resolve_rotation_id(required(&call.entity_id, "entity_id")?);
            self.registry.advance(id).await
        }
        .await;

        report(NEXT_TURN, result)
    }

    /// Select a member of the referenced rotation.
    pub async fn set_person(&self, call: SetPersonCall) -> Result<RotationState> {
        let result = async {
            let id = resolve_rotation_id(required(&call.entity_id, "entity_id")?);
            let person = required(&call.person, "person")?;
            self.registry.select_member(id, person).await
        }
        .await;

        report(SET_PERSON, result)
    }

    /// Dispatch a service call by name with its JSON payload.
    pub async fn dispatch(&self, service: &str, data: Value) -> Result<RotationState> {
        match service {
            NEXT_TURN => self.next_turn(parse_call(service, data)?).await,
            SET_PERSON => self.set_person(parse_call(service, data)?).await,
            other => {
                error!(service = %other, "Unknown service");
                Err(RotationError::InvalidCommand(format!(
                    "Unknown service: {}",
                    other
                )))
            }
        }
    }
}

fn parse_call<T: serde::de::DeserializeOwned>(service: &str, data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| {
        error!(service = %service, error = %e, "Malformed service data");
        RotationError::InvalidCommand(format!("Malformed {} data: {}", service, e))
    })
}

fn report(service: &str, result: Result<RotationState>) -> Result<RotationState> {
    match &result {
        Ok(state) => info!(
            service = %service,
            id = %state.id,
            current = ?state.current,
            index = state.current_index,
            "Service call handled"
        ),
        Err(RotationError::NotFound { id, available }) => error!(
            service = %service,
            id = %id,
            available = ?available,
            "Rotation not found"
        ),
        Err(RotationError::MemberNotFound {
            id,
            member,
            available,
        }) => error!(
            service = %service,
            id = %id,
            person = %member,
            available = ?available,
            "Person not found"
        ),
        Err(RotationError::PersistenceFailure(e)) => warn!(
            service = %service,
            error = %e,
            "Service call applied but state was not persisted"
        ),
        Err(e) => error!(service = %service, error = %e, "Service call failed"),
    }
    result
}
