//! Configuration sources that declare rotations.
//!
//! Both sources reconcile through the same [`RotationRegistry::declare`]
//! path, parameterized by [`Origin`](crate::rotation::Origin).
//!
//! [`RotationRegistry::declare`]: crate::registry::RotationRegistry::declare

pub mod declarative;
pub mod dynamic;

pub use declarative::{ApplyReport, DeclarativeSource};
pub use dynamic::{format_people, parse_people, DynamicSource, EntryOptions, EntryRequest};
