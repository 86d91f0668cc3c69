//! BoardStore Trait - Read Access to the Board Table
//!
//! The hierarchy query engine only needs reads, so it depends on these traits
//! rather than on a concrete backend. Structural writes are not part of them:
//! they run inside a write transaction through
//! [`BoardWriter`](crate::db::BoardWriter).
//!
//! - [`BoardReads`]: single-statement reads
//! - [`BoardStore`]: reads on a fresh connection, plus [`BoardStore::snapshot`]
//! - [`BoardSnapshot`]: reads that all observe one committed state
//!
//! A query built from several statements (a board and then its descendants,
//! for instance) runs on a snapshot, so a concurrent move cannot split it
//! between the old and the new tree.
//!
//! # Ordering Conventions
//!
//! - Listings (`list_boards`, `get_children`): creation time descending
//! - Subtree listings: depth ascending, then creation time ascending
//!
//! Ties on creation time fall back to insertion order.

use crate::db::DatabaseError;
use crate::models::{Board, BoardId, MaterializedPath};
use async_trait::async_trait;

/// Read-only board persistence operations
///
/// Implementations must be `Send + Sync` so services can share them across
/// tasks behind an `Arc<dyn BoardStore>`.
#[async_trait]
pub trait BoardReads: Send + Sync {
    /// Fetch a single board, `None` if it does not exist
    async fn get_board(&self, id: &BoardId) -> Result<Option<Board>, DatabaseError>;

    /// Every board, newest first
    async fn list_boards(&self) -> Result<Vec<Board>, DatabaseError>;

    /// Direct children of `parent_id` (root boards for `None`), newest first
    async fn get_children(&self, parent_id: Option<&BoardId>) -> Result<Vec<Board>, DatabaseError>;

    /// Strict descendants of `path`, shallowest first
    async fn get_descendants(&self, path: &MaterializedPath) -> Result<Vec<Board>, DatabaseError>;

    /// Number of boards whose `parent_id` is `id`
    async fn count_children(&self, id: &BoardId) -> Result<u64, DatabaseError>;

    /// Number of strict descendants of `path`
    async fn count_descendants(&self, path: &MaterializedPath) -> Result<u64, DatabaseError>;

    /// Deepest depth found among the strict descendants of `path`
    ///
    /// `None` when the board has no descendants.
    async fn max_descendant_depth(
        &self,
        path: &MaterializedPath,
    ) -> Result<Option<u32>, DatabaseError>;

    /// Parent pointer of a board
    ///
    /// Outer `None`: the board does not exist. `Some(None)`: it is a root.
    async fn get_parent_id(&self, id: &BoardId) -> Result<Option<Option<BoardId>>, DatabaseError>;

    /// Boards stored under any of `paths`, shallowest first
    async fn get_boards_by_paths(
        &self,
        paths: &[MaterializedPath],
    ) -> Result<Vec<Board>, DatabaseError>;
}

/// Shared entry point of the read side
#[async_trait]
pub trait BoardStore: BoardReads {
    /// Open a snapshot; every read made through it sees the same state
    async fn snapshot(&self) -> Result<Box<dyn BoardSnapshot>, DatabaseError>;
}

/// Reads pinned to one committed state of the table
#[async_trait]
pub trait BoardSnapshot: BoardReads {
    /// Release the snapshot
    async fn close(self: Box<Self>) -> Result<(), DatabaseError>;
}
