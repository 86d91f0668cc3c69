//! Board Service - Structural Mutator
//!
//! Every write to the board tree goes through this service:
//!
//! - `create` computes the new board's path from its parent
//! - `move_board` re-parents a whole subtree and rewrites its paths
//! - `delete` removes a board together with its subtree
//! - `update` changes display attributes only
//!
//! The `*_within` variants additionally enforce a [`DepthPolicy`]. The policy
//! is checked against paths read inside the write transaction, next to the
//! hard cap, so it holds after every commit even under concurrent writers.
//!
//! # Atomicity
//!
//! Each operation runs in a single `BEGIN IMMEDIATE` transaction, and every
//! path it reads is read inside that transaction. Either all rows change or
//! none do. `update_within` applies the attribute change and the move in the
//! same transaction.
//!
//! # Locking
//!
//! Before the transaction starts, the operation takes the in-process locks of
//! the boards it depends on, in ascending ID order:
//!
//! | Operation | Locked boards          |
//! |-----------|------------------------|
//! | create    | parent (if any)        |
//! | move      | moving board, new parent |
//! | delete    | deleted board          |
//! | update    | updated board (and new parent when moving) |

use crate::db::{BoardLockTable, BoardWriter, DatabaseService, PathMaterializer};
use crate::models::{Board, BoardId, BoardUpdate, CreateBoardParams};
use crate::services::{BoardServiceError, DepthPolicy, HARD_MAX_DEPTH};
use chrono::Utc;
use std::sync::Arc;

/// Structural mutator for the board hierarchy
#[derive(Clone)]
pub struct BoardService {
    db: Arc<DatabaseService>,
    locks: Arc<BoardLockTable>,
}

impl BoardService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self {
            db,
            locks: Arc::new(BoardLockTable::new()),
        }
    }

    /// Create a board under `params.parent_id` (a root when `None`)
    ///
    /// Only the hard cap applies; see [`create_within`](Self::create_within).
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for a blank or overlong title
    /// - `ParentNotFound` if the parent does not exist
    /// - `DepthExceeded` if the new board would sit beyond the hard cap
    pub async fn create(&self, params: CreateBoardParams) -> Result<Board, BoardServiceError> {
        self.create_checked(params, None).await
    }

    /// Create a board, also rejecting it with `MaxHierarchyDepthExceeded` when
    /// the parent is already at the policy limit
    pub async fn create_within(
        &self,
        params: CreateBoardParams,
        policy: &DepthPolicy,
    ) -> Result<Board, BoardServiceError> {
        self.create_checked(params, Some(policy)).await
    }

    async fn create_checked(
        &self,
        params: CreateBoardParams,
        policy: Option<&DepthPolicy>,
    ) -> Result<Board, BoardServiceError> {
        params.validate()?;

        let lock_ids: Vec<BoardId> = params.parent_id.into_iter().collect();
        let _locks = self.locks.lock_all(&lock_ids).await;

        let tx = self.db.begin_write().await?;
        let result = Self::create_in(&BoardWriter::new(&tx), params, policy).await;
        let board = tx.finish(result).await.inspect_err(|e| log_rejection("create", e))?;

        tracing::debug!("Created board {} at depth {}", board.id, board.depth());
        Ok(board)
    }

    async fn create_in(
        writer: &BoardWriter<'_>,
        params: CreateBoardParams,
        policy: Option<&DepthPolicy>,
    ) -> Result<Board, BoardServiceError> {
        let parent_path = match &params.parent_id {
            Some(parent_id) => writer.get_board(parent_id).await?.map(|parent| parent.path),
            None => None,
        };

        if let (Some(policy), Some(parent_path)) = (policy, &parent_path) {
            policy.check_create(parent_path.depth())?;
        }

        let id = BoardId::new();
        let path = PathMaterializer::compute_insert_path(
            params.parent_id.as_ref(),
            parent_path.as_ref(),
            PathMaterializer::label_for(&id),
        )?;

        if path.depth() > HARD_MAX_DEPTH {
            return Err(BoardServiceError::depth_exceeded(path.depth(), HARD_MAX_DEPTH));
        }

        let now = Utc::now();
        let board = Board {
            id,
            parent_id: params.parent_id,
            path,
            title: params.title,
            description: params.description,
            created_by: params.created_by,
            created_at: now,
            updated_at: now,
        };

        writer.insert_board(&board).await?;
        Ok(board)
    }

    /// Move `id` and its whole subtree under `new_parent_id` (to root level
    /// when `None`)
    ///
    /// Returns the moved board with its new path. Only the hard cap applies;
    /// see [`move_within`](Self::move_within).
    ///
    /// # Errors
    ///
    /// - `SelfMove` if `id == new_parent_id`
    /// - `NotFound` if the board or the new parent does not exist
    /// - `CycleDetected` if the new parent is inside the moving subtree
    /// - `DepthExceeded` if any board of the subtree would end up beyond the
    ///   hard cap
    pub async fn move_board(
        &self,
        id: &BoardId,
        new_parent_id: Option<&BoardId>,
    ) -> Result<Board, BoardServiceError> {
        self.move_checked(id, new_parent_id, None).await
    }

    /// Move a subtree, also rejecting it with `MaxHierarchyDepthExceeded` when
    /// any of its boards would end up beyond the policy limit
    pub async fn move_within(
        &self,
        id: &BoardId,
        new_parent_id: Option<&BoardId>,
        policy: &DepthPolicy,
    ) -> Result<Board, BoardServiceError> {
        self.move_checked(id, new_parent_id, Some(policy)).await
    }

    async fn move_checked(
        &self,
        id: &BoardId,
        new_parent_id: Option<&BoardId>,
        policy: Option<&DepthPolicy>,
    ) -> Result<Board, BoardServiceError> {
        let mut lock_ids = vec![*id];
        lock_ids.extend(new_parent_id.copied());
        let _locks = self.locks.lock_all(&lock_ids).await;

        let tx = self.db.begin_write().await?;
        let result = Self::move_in(&BoardWriter::new(&tx), id, new_parent_id, policy).await;
        let (board, rewritten) = tx
            .finish(result)
            .await
            .inspect_err(|e| log_rejection("move", e))?;

        tracing::debug!(
            "Moved board {} under {:?}; rewrote {} paths",
            id,
            new_parent_id,
            rewritten
        );
        Ok(board)
    }

    async fn move_in(
        writer: &BoardWriter<'_>,
        id: &BoardId,
        new_parent_id: Option<&BoardId>,
        policy: Option<&DepthPolicy>,
    ) -> Result<(Board, usize), BoardServiceError> {
        if new_parent_id == Some(id) {
            return Err(BoardServiceError::self_move(*id));
        }

        let board = writer
            .get_board(id)
            .await?
            .ok_or_else(|| BoardServiceError::not_found(*id))?;

        let new_parent_path = match new_parent_id {
            Some(parent_id) => {
                let parent = writer
                    .get_board(parent_id)
                    .await?
                    .ok_or_else(|| BoardServiceError::not_found(*parent_id))?;
                if board.path.is_prefix_of(&parent.path) {
                    return Err(BoardServiceError::cycle_detected(*id, *parent_id));
                }
                Some(parent.path)
            }
            None => None,
        };

        let subtree = writer.get_subtree_paths(&board.path).await?;
        let ancestor_prefix_len = board.path.len() - 1;

        if let Some(policy) = policy {
            let height = subtree
                .iter()
                .map(|(_, path)| path.depth())
                .max()
                .unwrap_or(board.depth())
                .saturating_sub(board.depth());
            policy.check_move(new_parent_path.as_ref().map(|p| p.depth()), height)?;
        }

        let deepest = subtree
            .iter()
            .map(|(_, path)| {
                PathMaterializer::depth_after_move(
                    path,
                    ancestor_prefix_len,
                    new_parent_path.as_ref(),
                )
            })
            .max()
            .unwrap_or(0);
        if deepest > HARD_MAX_DEPTH {
            return Err(BoardServiceError::depth_exceeded(deepest, HARD_MAX_DEPTH));
        }

        let new_paths = PathMaterializer::splice_for_move(
            &subtree,
            ancestor_prefix_len,
            new_parent_path.as_ref(),
        )?;

        let now = Utc::now();
        for (board_id, path) in &new_paths {
            writer.update_path(board_id, path, &now).await?;
        }
        writer.set_parent(id, new_parent_id, &now).await?;

        let moved = writer
            .get_board(id)
            .await?
            .ok_or_else(|| BoardServiceError::not_found(*id))?;
        Ok((moved, new_paths.len()))
    }

    /// Delete a board and its whole subtree
    ///
    /// Returns `false` (and changes nothing) if the board does not exist.
    pub async fn delete(&self, id: &BoardId) -> Result<bool, BoardServiceError> {
        let _locks = self.locks.lock_all(&[*id]).await;

        let tx = self.db.begin_write().await?;
        let result = Self::delete_in(&BoardWriter::new(&tx), id).await;
        let removed = tx.finish(result).await?;

        match removed {
            Some(count) => {
                tracing::debug!("Deleted board {} and {} descendants", id, count - 1);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_in(
        writer: &BoardWriter<'_>,
        id: &BoardId,
    ) -> Result<Option<u64>, BoardServiceError> {
        match writer.get_board(id).await? {
            Some(board) => Ok(Some(writer.delete_subtree(&board.path).await?)),
            None => Ok(None),
        }
    }

    /// Update title and/or description
    ///
    /// Returns `None` if the board does not exist. An update carrying
    /// `parent_id` is rejected: only a move changes the parent.
    pub async fn update(
        &self,
        id: &BoardId,
        update: BoardUpdate,
    ) -> Result<Option<Board>, BoardServiceError> {
        if update.is_structural() {
            let err = BoardServiceError::forbidden_direct_parent_edit(*id);
            log_rejection("update", &err);
            return Err(err);
        }
        update.validate()?;

        let _locks = self.locks.lock_all(&[*id]).await;

        let tx = self.db.begin_write().await?;
        let result = Self::update_in(&BoardWriter::new(&tx), id, &update).await;
        let board = tx.finish(result).await?;

        if board.is_some() && !update.is_empty() {
            tracing::debug!("Updated attributes of board {}", id);
        }
        Ok(board)
    }

    /// Apply an update whose `parent_id`, if present, moves the board
    ///
    /// Attributes and the move commit together: a rejected move leaves the
    /// title and description untouched. Returns `None` if the board does not
    /// exist and no move was requested.
    pub async fn update_within(
        &self,
        id: &BoardId,
        mut update: BoardUpdate,
        policy: &DepthPolicy,
    ) -> Result<Option<Board>, BoardServiceError> {
        update.validate()?;
        let new_parent = update.take_parent();

        let mut lock_ids = vec![*id];
        if let Some(Some(parent_id)) = new_parent {
            lock_ids.push(parent_id);
        }
        let _locks = self.locks.lock_all(&lock_ids).await;

        let tx = self.db.begin_write().await?;
        let result =
            Self::update_and_move_in(&BoardWriter::new(&tx), id, &update, new_parent, policy)
                .await;
        let board = tx
            .finish(result)
            .await
            .inspect_err(|e| log_rejection("update", e))?;

        if board.is_some() {
            tracing::debug!("Updated board {} (moved: {})", id, new_parent.is_some());
        }
        Ok(board)
    }

    async fn update_and_move_in(
        writer: &BoardWriter<'_>,
        id: &BoardId,
        update: &BoardUpdate,
        new_parent: Option<Option<BoardId>>,
        policy: &DepthPolicy,
    ) -> Result<Option<Board>, BoardServiceError> {
        let updated = Self::update_in(writer, id, update).await?;
        match new_parent {
            Some(parent_id) => {
                let (moved, _) = Self::move_in(writer, id, parent_id.as_ref(), Some(policy)).await?;
                Ok(Some(moved))
            }
            None => Ok(updated),
        }
    }

    async fn update_in(
        writer: &BoardWriter<'_>,
        id: &BoardId,
        update: &BoardUpdate,
    ) -> Result<Option<Board>, BoardServiceError> {
        if update.is_empty() {
            return Ok(writer.get_board(id).await?);
        }

        let description = update.description.as_ref().map(|d| d.as_deref());
        let changed = writer
            .update_attributes(id, update.title.as_deref(), description, &Utc::now())
            .await?;
        if !changed {
            return Ok(None);
        }

        Ok(writer.get_board(id).await?)
    }
}

fn log_rejection(operation: &str, err: &BoardServiceError) {
    if err.is_rule_violation() || err.is_not_found() {
        tracing::warn!("Rejected {}: {}", operation, err);
    }
}
