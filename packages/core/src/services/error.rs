//! Service Layer Error Types
//!
//! This module defines the error taxonomy of the board hierarchy engine.
//! Structural violations are reported to the caller and never retried.
//! `StoreFault` is the only variant a caller may reasonably retry.

use crate::db::DatabaseError;
use crate::models::{BoardId, ValidationError};
use thiserror::Error;

/// Board hierarchy errors
#[derive(Error, Debug)]
pub enum BoardServiceError {
    /// Board not found by ID
    #[error("Board not found: {id}")]
    NotFound { id: BoardId },

    /// Parent board referenced by a create or move does not exist
    #[error("Parent board not found: {parent_id}")]
    ParentNotFound { parent_id: BoardId },

    /// A board cannot become its own parent
    #[error("Cannot move board {id} into itself")]
    SelfMove { id: BoardId },

    /// The new parent lies inside the subtree being moved
    #[error("Cannot move board {id} under its own descendant {new_parent_id}")]
    CycleDetected { id: BoardId, new_parent_id: BoardId },

    /// A board would end up deeper than the storage hard cap
    #[error("Depth {depth} exceeds the hard maximum of {max}")]
    DepthExceeded { depth: u32, max: u32 },

    /// A board would end up deeper than the hierarchy policy allows
    #[error("Maximum hierarchy depth of {max} levels exceeded (resulting depth {depth})")]
    MaxHierarchyDepthExceeded { depth: u32, max: u32 },

    /// `parent_id` can only change through a move
    #[error("parent_id of board {id} can only be changed by moving the board")]
    ForbiddenDirectParentEdit { id: BoardId },

    /// Request failed model validation
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Database operation failed
    #[error("Store fault: {0}")]
    StoreFault(#[from] DatabaseError),
}

impl BoardServiceError {
    pub fn not_found(id: BoardId) -> Self {
        Self::NotFound { id }
    }

    pub fn parent_not_found(parent_id: BoardId) -> Self {
        Self::ParentNotFound { parent_id }
    }

    pub fn self_move(id: BoardId) -> Self {
        Self::SelfMove { id }
    }

    pub fn cycle_detected(id: BoardId, new_parent_id: BoardId) -> Self {
        Self::CycleDetected { id, new_parent_id }
    }

    pub fn depth_exceeded(depth: u32, max: u32) -> Self {
        Self::DepthExceeded { depth, max }
    }

    pub fn max_hierarchy_depth_exceeded(depth: u32, max: u32) -> Self {
        Self::MaxHierarchyDepthExceeded { depth, max }
    }

    pub fn forbidden_direct_parent_edit(id: BoardId) -> Self {
        Self::ForbiddenDirectParentEdit { id }
    }

    /// True for policy and structural rule violations (as opposed to missing
    /// records or store faults)
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            Self::SelfMove { .. }
                | Self::CycleDetected { .. }
                | Self::DepthExceeded { .. }
                | Self::MaxHierarchyDepthExceeded { .. }
                | Self::ForbiddenDirectParentEdit { .. }
                | Self::ValidationFailed(_)
        )
    }

    /// True when the referenced board or parent does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ParentNotFound { .. })
    }
}
