//! Depth Policy
//!
//! Business-rule depth cap. The structural mutator checks it inside the write
//! transaction of a policed create or move, against the paths it has just
//! read. It sits below the storage hard cap (`HARD_MAX_DEPTH`); the two limits
//! are checked independently.

use crate::services::{BoardServiceError, POLICY_MAX_DEPTH};

/// Application-facing depth limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthPolicy {
    max_depth: u32,
}

impl Default for DepthPolicy {
    fn default() -> Self {
        Self::new(POLICY_MAX_DEPTH)
    }
}

impl DepthPolicy {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Reject a create under a parent already at or beyond the limit
    pub fn check_create(&self, parent_depth: u32) -> Result<(), BoardServiceError> {
        if parent_depth >= self.max_depth {
            return Err(BoardServiceError::max_hierarchy_depth_exceeded(
                parent_depth + 1,
                self.max_depth,
            ));
        }
        Ok(())
    }

    /// Reject a move that would push any board of the subtree past the limit
    ///
    /// `parent_depth` is `None` for a move to root level. `subtree_height` is
    /// the depth of the deepest descendant relative to the moving board.
    pub fn check_move(
        &self,
        parent_depth: Option<u32>,
        subtree_height: u32,
    ) -> Result<(), BoardServiceError> {
        let new_depth = parent_depth.map(|d| d + 1).unwrap_or(0);
        let deepest = new_depth + subtree_height;
        if deepest > self.max_depth {
            return Err(BoardServiceError::max_hierarchy_depth_exceeded(
                deepest,
                self.max_depth,
            ));
        }
        Ok(())
    }
}
