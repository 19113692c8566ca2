//! State transitions on a single rotation.
//!
//! These functions are independent of how the rotation was looked up. Each
//! one leaves `current_index` inside `[0, members.len())` whenever the
//! member list is non-empty, and leaves the rotation untouched on error.

use super::Rotation;
use crate::error::{Result, RotationError};

/// Move the pointer to the next member, wrapping to the first.
///
/// Returns the new index.
pub fn advance(rotation: &mut Rotation) -> Result<usize> {
    let len = rotation.members.len();
    if len == 0 {
        return Err(RotationError::EmptyRotation {
            id: rotation.id.clone(),
        });
    }
    rotation.current_index = (rotation.current_index + 1) % len;
    Ok(rotation.current_index)
}

/// Point at the first occurrence of `member`.
///
/// Returns the new index.
pub fn select_member(rotation: &mut Rotation, member: &str) -> Result<usize> {
    let position = rotation
        .members
        .iter()
        .position(|m| m == member)
        .ok_or_else(|| RotationError::MemberNotFound {
            id: rotation.id.clone(),
            member: member.to_string(),
            available: rotation.members.clone(),
        })?;
    rotation.current_index = position;
    Ok(position)
}

/// Relocate the pointer after the member list is redeclared.
///
/// In priority order:
/// 1. the member previously on turn, if still present, keeps the turn;
/// 2. otherwise the numeric position is kept if it still fits;
/// 3. otherwise the pointer resets to the first member.
pub fn repair_index(old_members: &[String], new_members: &[String], old_index: usize) -> usize {
    if let Some(previous) = old_members.get(old_index) {
        if let Some(position) = new_members.iter().position(|m| m == previous) {
            return position;
        }
    }
    if old_index < new_members.len() {
        old_index
    } else {
        0
    }
}

/// Index to start from given a persisted value and the declared list length.
pub fn seed_index(stored: Option<usize>, len: usize) -> usize {
    match stored {
        Some(index) if index < len => index,
        _ => 0,
    }
}

/// Apply a new label and member list, repairing the pointer.
///
/// Returns true when `current_index` moved.
pub fn reconfigure(rotation: &mut Rotation, label: String, members: Vec<String>) -> bool {
    rotation.label = label;
    if rotation.members == members {
        return false;
    }
    let before = rotation.current_index;
    rotation.current_index = repair_index(&rotation.members, &members, before);
    rotation.members = members;
    rotation.current_index != before
}

/// Reset the pointer from a persisted value.
///
/// Returns true when `current_index` moved.
pub(crate) fn reseed(rotation: &mut Rotation, stored: Option<usize>) -> bool {
    let before = rotation.current_index;
    rotation.current_index = seed_index(stored, rotation.members.len());
    rotation.current_index != before
}
