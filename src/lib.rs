//! Take Turns - rotation state engine
//!
//! Tracks, for many independently configured rotations, which member is
//! currently on turn. Rotations are declared by a declarative source (YAML /
//! environment) or a dynamic source (entries created at runtime), mutated by
//! commands, and their pointers are persisted write-through to a durable
//! document so they survive restarts.

pub mod commands;
pub mod config;
pub mod error;
pub mod persistence;
pub mod presentation;
pub mod registry;
pub mod rotation;
pub mod sources;
pub mod storage;
pub mod utils;

pub use error::{Result, RotationError};
pub use registry::RotationRegistry;
pub use rotation::{Origin, Rotation, RotationState};
