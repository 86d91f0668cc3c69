//! Data Models
//!
//! This module contains the core data structures used throughout Boardspace:
//!
//! - `Board` - The single entity of the hierarchy
//! - `MaterializedPath` / `Label` - Position of a board in the tree
//! - Parameter and result types for create, update, subtree and stats calls

mod board;
mod path;

pub use board::{
    validate_title, Board, BoardId, BoardStats, BoardUpdate, CreateBoardParams, HierarchyEntry,
    ValidationError, MAX_TITLE_LENGTH,
};
pub use path::{Label, MaterializedPath, PATH_SEPARATOR};
