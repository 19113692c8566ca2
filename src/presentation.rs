//! Display-side observation of rotation state.
//!
//! The registry notifies a [`RotationObserver`] synchronously, while it still
//! holds its write lock, so the display sees each update atomically with the
//! in-memory change and before persistence completes. Observers must not
//! block.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::rotation::{Origin, RotationState};

/// Prefix of the display entity id for a rotation (`sensor.<id>`).
pub const ENTITY_PREFIX: &str = "sensor.";
/// Icon shown for every rotation entity.
pub const ENTITY_ICON: &str = "mdi:account-multiple";

/// Channel capacity for [`BroadcastObserver`].
const CHANNEL_CAPACITY: usize = 256;

/// Notification emitted by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationEvent {
    /// Rotation was declared, mutated or reloaded.
    Changed(RotationState),
    /// Rotation was removed or unloaded.
    Removed { id: String, origin: Origin },
}

impl RotationEvent {
    pub fn id(&self) -> &str {
        match self {
            RotationEvent::Changed(state) => &state.id,
            RotationEvent::Removed { id, .. } => id,
        }
    }
}

/// Capability implemented by display adapters.
pub trait RotationObserver: Send + Sync {
    fn notify(&self, event: &RotationEvent);
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RotationObserver for NoopObserver {
    fn notify(&self, _event: &RotationEvent) {}
}

/// Observer that fans events out over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    sender: broadcast::Sender<RotationEvent>,
}

impl BroadcastObserver {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RotationEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationObserver for BroadcastObserver {
    fn notify(&self, event: &RotationEvent) {
        // No receivers is fine: nobody is displaying yet.
        if self.sender.send(event.clone()).is_err() {
            debug!(id = %event.id(), "No display subscribers");
        }
    }
}

/// Attributes published alongside the sensor state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorAttributes {
    pub people: Vec<String>,
    pub current_index: usize,
    pub friendly_name: String,
    pub icon: &'static str,
}

/// Display projection of a rotation as a sensor entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorView {
    pub entity_id: String,
    /// Member on turn.
    pub state: Option<String>,
    pub attributes: SensorAttributes,
}

impl From<&RotationState> for SensorView {
    fn from(state: &RotationState) -> Self {
        Self {
            entity_id: entity_id(&state.id),
            state: state.current.clone(),
            attributes: SensorAttributes {
                people: state.members.clone(),
                current_index: state.current_index,
                friendly_name: state.label.clone(),
                icon: ENTITY_ICON,
            },
        }
    }
}

/// Display entity id for a rotation id.
pub fn entity_id(rotation_id: &str) -> String {
    format!("{}{}", ENTITY_PREFIX, rotation_id)
}
