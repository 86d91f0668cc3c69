//! Board Operations
//!
//! Application boundary over the board engine. This is the layer the HTTP
//! server calls: it hands its depth policy to the mutator on create and move,
//! turns a `parent_id` in an update into a move, and forwards reads to the
//! hierarchy query engine.
//!
//! # Examples
//!
//! ```no_run
//! use boardspace_core::db::DatabaseService;
//! use boardspace_core::models::{BoardUpdate, CreateBoardParams};
//! use boardspace_core::operations::BoardOperations;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(DatabaseService::new(PathBuf::from("./data/boards.db")).await?);
//! let operations = BoardOperations::new(db);
//!
//! let projects = operations.create_board(CreateBoardParams::root("Projects")).await?;
//! let archive = operations.create_board(CreateBoardParams::root("Archive")).await?;
//!
//! // Re-parent through a regular update
//! operations
//!     .update_board(&projects.id, BoardUpdate::new().with_parent(Some(archive.id)))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::db::{DatabaseService, TursoStore};
use crate::models::{
    Board, BoardId, BoardStats, BoardUpdate, CreateBoardParams, HierarchyEntry,
};
use crate::services::{BoardService, BoardServiceError, DepthPolicy, HierarchyQueryEngine};
use std::sync::Arc;

/// Create / update-or-move / delete entry points plus read accessors
#[derive(Clone)]
pub struct BoardOperations {
    boards: BoardService,
    queries: HierarchyQueryEngine,
    policy: DepthPolicy,
}

impl BoardOperations {
    /// Operations over `db` with the default depth policy
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self::with_policy(db, DepthPolicy::default())
    }

    pub fn with_policy(db: Arc<DatabaseService>, policy: DepthPolicy) -> Self {
        let store = Arc::new(TursoStore::new(Arc::clone(&db)));
        Self {
            boards: BoardService::new(db),
            queries: HierarchyQueryEngine::new(store),
            policy,
        }
    }

    /// The structural mutator, without the depth policy in front of it
    pub fn boards(&self) -> &BoardService {
        &self.boards
    }

    pub fn queries(&self) -> &HierarchyQueryEngine {
        &self.queries
    }

    pub fn policy(&self) -> &DepthPolicy {
        &self.policy
    }

    /// Create a board under the depth policy
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for a blank or overlong title
    /// - `ParentNotFound` if the parent does not exist
    /// - `MaxHierarchyDepthExceeded` if the parent is already at the policy limit
    pub async fn create_board(&self, params: CreateBoardParams) -> Result<Board, BoardServiceError> {
        self.boards.create_within(params, &self.policy).await
    }

    /// Apply an update; a present `parent_id` moves the board
    ///
    /// `parent_id: null` moves the board to root level. Title, description
    /// and the move commit in one transaction, with the depth policy checked
    /// inside it. Returns `None` if the board does not exist.
    pub async fn update_board(
        &self,
        id: &BoardId,
        update: BoardUpdate,
    ) -> Result<Option<Board>, BoardServiceError> {
        self.boards.update_within(id, update, &self.policy).await
    }

    pub async fn delete_board(&self, id: &BoardId) -> Result<bool, BoardServiceError> {
        self.boards.delete(id).await
    }

    pub async fn get_board(&self, id: &BoardId) -> Result<Option<Board>, BoardServiceError> {
        self.queries.get_board(id).await
    }

    pub async fn list_boards(&self) -> Result<Vec<Board>, BoardServiceError> {
        self.queries.list_boards().await
    }

    pub async fn list_roots(&self) -> Result<Vec<Board>, BoardServiceError> {
        self.queries.list_roots().await
    }

    pub async fn get_children(&self, parent_id: &BoardId) -> Result<Vec<Board>, BoardServiceError> {
        self.queries.get_children(Some(parent_id)).await
    }

    pub async fn get_subtree(&self, id: &BoardId) -> Result<Vec<HierarchyEntry>, BoardServiceError> {
        self.queries.get_subtree(id).await
    }

    pub async fn get_depth(&self, id: &BoardId) -> Result<u32, BoardServiceError> {
        self.queries.get_depth(id).await
    }

    pub async fn get_stats(&self, id: &BoardId) -> Result<BoardStats, BoardServiceError> {
        self.queries.get_stats(id).await
    }

    pub async fn get_ancestors(&self, id: &BoardId) -> Result<Vec<Board>, BoardServiceError> {
        self.queries.get_ancestors(id).await
    }
}
