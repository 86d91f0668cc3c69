//! Hierarchy Query Engine
//!
//! Read-only queries over the board tree. Everything here is answered from the
//! materialized paths through a `BoardStore`, and nothing depends on the
//! structural mutator. Queries that take more than one statement run on a
//! store snapshot, so they never mix states from before and after a
//! concurrent move or delete.
//!
//! # Examples
//!
//! ```no_run
//! use boardspace_core::db::{DatabaseService, TursoStore};
//! use boardspace_core::services::HierarchyQueryEngine;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(DatabaseService::new(PathBuf::from("./data/boards.db")).await?);
//! let queries = HierarchyQueryEngine::new(Arc::new(TursoStore::new(db)));
//!
//! for root in queries.list_roots().await? {
//!     let stats = queries.get_stats(&root.id).await?;
//!     println!("{}: {} descendants", root.title, stats.total_descendants);
//! }
//! # Ok(())
//! # }
//! ```

use crate::db::{BoardReads, BoardSnapshot, BoardStore, DatabaseError};
use crate::models::{Board, BoardId, BoardStats, HierarchyEntry, MaterializedPath};
use crate::services::{BoardServiceError, HARD_MAX_DEPTH};
use std::sync::Arc;

/// Read-side service for hierarchy, depth and statistics queries
#[derive(Clone)]
pub struct HierarchyQueryEngine {
    store: Arc<dyn BoardStore>,
}

impl HierarchyQueryEngine {
    pub fn new(store: Arc<dyn BoardStore>) -> Self {
        Self { store }
    }

    pub async fn get_board(&self, id: &BoardId) -> Result<Option<Board>, BoardServiceError> {
        Ok(self.store.get_board(id).await?)
    }

    /// Fetch a board or fail with `NotFound`
    pub async fn require_board(&self, id: &BoardId) -> Result<Board, BoardServiceError> {
        require_in(self.store.as_ref(), id).await
    }

    /// Every board, newest first
    pub async fn list_boards(&self) -> Result<Vec<Board>, BoardServiceError> {
        Ok(self.store.list_boards().await?)
    }

    /// Root boards, newest first
    pub async fn list_roots(&self) -> Result<Vec<Board>, BoardServiceError> {
        self.get_children(None).await
    }

    /// Direct children, newest first (`None` lists the roots)
    ///
    /// An unknown parent simply has no children.
    pub async fn get_children(
        &self,
        parent_id: Option<&BoardId>,
    ) -> Result<Vec<Board>, BoardServiceError> {
        Ok(self.store.get_children(parent_id).await?)
    }

    /// Depth from the stored path; roots are at depth 0
    pub async fn get_depth(&self, id: &BoardId) -> Result<u32, BoardServiceError> {
        Ok(self.require_board(id).await?.depth())
    }

    /// Depth computed by following `parent_id` pointers up to a root
    ///
    /// Always agrees with [`get_depth`](Self::get_depth) on a consistent store.
    /// A chain longer than the hard cap, or a dangling parent pointer, is
    /// reported as a store fault.
    pub async fn get_depth_by_walk(&self, id: &BoardId) -> Result<u32, BoardServiceError> {
        let snapshot = self.store.snapshot().await?;
        let depth = walk_to_root(snapshot.as_ref(), id).await?;
        snapshot.close().await?;
        Ok(depth)
    }

    /// The board (level 0) followed by every descendant
    ///
    /// Ordered by level, then creation time. Levels are relative to the board.
    pub async fn get_subtree(&self, id: &BoardId) -> Result<Vec<HierarchyEntry>, BoardServiceError> {
        let snapshot = self.store.snapshot().await?;
        let root = require_in(snapshot.as_ref(), id).await?;
        let descendants = snapshot.get_descendants(&root.path).await?;
        snapshot.close().await?;

        let root_depth = root.depth();
        let mut entries = Vec::with_capacity(descendants.len() + 1);
        entries.push(HierarchyEntry {
            board: root,
            level: 0,
        });
        entries.extend(descendants.into_iter().map(|board| {
            let level = board.depth().saturating_sub(root_depth);
            HierarchyEntry { board, level }
        }));

        Ok(entries)
    }

    /// Direct and total descendant counts
    pub async fn get_stats(&self, id: &BoardId) -> Result<BoardStats, BoardServiceError> {
        let snapshot = self.store.snapshot().await?;
        let board = require_in(snapshot.as_ref(), id).await?;
        let direct_children = snapshot.count_children(id).await?;
        let total_descendants = snapshot.count_descendants(&board.path).await?;
        snapshot.close().await?;

        Ok(BoardStats {
            direct_children,
            total_descendants,
        })
    }

    /// Depth of the deepest descendant relative to the board (0 for a leaf)
    pub async fn get_subtree_height(&self, id: &BoardId) -> Result<u32, BoardServiceError> {
        let snapshot = self.store.snapshot().await?;
        let board = require_in(snapshot.as_ref(), id).await?;
        let deepest = snapshot.max_descendant_depth(&board.path).await?;
        snapshot.close().await?;

        Ok(deepest
            .map(|d| d.saturating_sub(board.depth()))
            .unwrap_or(0))
    }

    /// Ancestors of a board, root first, excluding the board itself
    pub async fn get_ancestors(&self, id: &BoardId) -> Result<Vec<Board>, BoardServiceError> {
        let snapshot = self.store.snapshot().await?;
        let board = require_in(snapshot.as_ref(), id).await?;

        let labels = board.path.labels();
        let ancestor_paths = (1..labels.len())
            .filter_map(|len| MaterializedPath::from_labels(labels[..len].to_vec()).ok())
            .collect::<Vec<_>>();

        let ancestors = snapshot.get_boards_by_paths(&ancestor_paths).await?;
        snapshot.close().await?;
        Ok(ancestors)
    }
}

async fn require_in<R>(reads: &R, id: &BoardId) -> Result<Board, BoardServiceError>
where
    R: BoardReads + ?Sized,
{
    reads
        .get_board(id)
        .await?
        .ok_or_else(|| BoardServiceError::not_found(*id))
}

async fn walk_to_root(snapshot: &dyn BoardSnapshot, id: &BoardId) -> Result<u32, BoardServiceError> {
    let mut current = match snapshot.get_parent_id(id).await? {
        Some(parent) => parent,
        None => return Err(BoardServiceError::not_found(*id)),
    };

    let mut depth = 0u32;
    while let Some(parent_id) = current {
        depth += 1;
        if depth > HARD_MAX_DEPTH {
            return Err(DatabaseError::corrupt_row(format!(
                "Parent chain of board {} is longer than {} levels",
                id, HARD_MAX_DEPTH
            ))
            .into());
        }

        current = snapshot.get_parent_id(&parent_id).await?.ok_or_else(|| {
            DatabaseError::corrupt_row(format!(
                "Board {} references missing parent {}",
                id, parent_id
            ))
        })?;
    }

    Ok(depth)
}
