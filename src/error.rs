//! Error taxonomy for rotation operations.

use thiserror::Error;

use crate::rotation::Origin;
use crate::storage::StorageError;

/// Errors returned by registry, engine and command operations.
///
/// Configuration-time errors (`InvalidConfiguration`, `IdentifierCollision`,
/// `AlreadyConfigured`) abort only the offending declaration. Command-time
/// errors carry enough context to self-diagnose. `PersistenceFailure` never
/// undoes the in-memory mutation that preceded it.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("Invalid configuration for '{id}': {reason}")]
    InvalidConfiguration { id: String, reason: String },

    #[error("Rotation '{id}' not found. Available rotations: {available:?}")]
    NotFound { id: String, available: Vec<String> },

    #[error("Member '{member}' not found in '{id}'. Available members: {available:?}")]
    MemberNotFound {
        id: String,
        member: String,
        available: Vec<String>,
    },

    #[error("Rotation '{id}' has no members")]
    EmptyRotation { id: String },

    #[error("Failed to persist rotation state: {0}")]
    PersistenceFailure(#[from] StorageError),

    #[error("Rotation '{id}' is owned by the {existing} source and cannot be declared by the {declared} source")]
    IdentifierCollision {
        id: String,
        existing: Origin,
        declared: Origin,
    },

    #[error("Rotation '{id}' is already configured")]
    AlreadyConfigured { id: String },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Rotation registry used before load_or_init")]
    NotInitialized,
}

/// Result type for rotation operations.
pub type Result<T> = std::result::Result<T, RotationError>;
