//! Cucumber step definitions for rotation behaviour tests.

pub mod rotation;
