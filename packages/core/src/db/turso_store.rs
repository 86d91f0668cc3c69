//! TursoStore - BoardStore Implementation for Turso/libsql Backend
//!
//! This module implements the `BoardStore` trait on top of `DatabaseService`,
//! and provides `BoardWriter`, the set of statements the structural mutator
//! runs inside a `BEGIN IMMEDIATE` transaction. All read SQL lives in
//! `BoardReader`, whichever connection it runs on.
//!
//! # Design Principles
//!
//! 1. **One SQL source**: reads made by the store and reads made inside a write
//!    transaction share the same query helpers
//! 2. **Row Conversion**: `row_to_board` is the only place rows become `Board`s
//! 3. **Prefix ranges**: descendants are selected with the path range from
//!    `PathMaterializer::descendant_range`, served by the unique path index
//!
//! # Examples
//!
//! ```rust,no_run
//! use boardspace_core::db::{BoardReads, BoardStore, DatabaseService, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/boards.db")).await?);
//!     let store: Arc<dyn BoardStore> = Arc::new(TursoStore::new(db));
//!
//!     let roots = store.get_children(None).await?;
//!     println!("{} root boards", roots.len());
//!     Ok(())
//! }
//! ```

use crate::db::board_store::{BoardReads, BoardSnapshot, BoardStore};
use crate::db::path_materializer::PathMaterializer;
use crate::db::{DatabaseError, DatabaseService, ReadTransaction, WriteTransaction};
use crate::models::{Board, BoardId, MaterializedPath};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use libsql::params::{params_from_iter, IntoParams};
use libsql::{params, Connection, Row};
use std::sync::Arc;

/// Column list matching `row_to_board`
const BOARD_COLUMNS: &str =
    "id, parent_id, path, title, description, created_by, created_at, updated_at";

/// Depth of a row computed from its path (number of separators)
const DEPTH_SQL: &str = "(length(path) - length(replace(path, '.', '')))";

/// Format a timestamp for storage
///
/// Fixed-width RFC3339 with nanoseconds, so text order equals time order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse timestamp from database - handles both SQLite and RFC3339 formats
///
/// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
/// Rows written by this crate use RFC3339: "YYYY-MM-DDTHH:MM:SS.fffffffffZ"
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    Err(DatabaseError::corrupt_row(format!(
        "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
        s
    )))
}

fn parse_board_id(s: &str, column: &str) -> Result<BoardId, DatabaseError> {
    s.parse()
        .map_err(|e| DatabaseError::corrupt_row(format!("Invalid {} '{}': {}", column, s, e)))
}

fn parse_path(s: &str) -> Result<MaterializedPath, DatabaseError> {
    s.parse()
        .map_err(|e| DatabaseError::corrupt_row(format!("Invalid path '{}': {}", s, e)))
}

/// Convert libsql::Row to Board model
///
/// # Row Format
///
/// Expected columns (in order, see `BOARD_COLUMNS`):
/// - id (TEXT)
/// - parent_id (TEXT, nullable)
/// - path (TEXT)
/// - title (TEXT)
/// - description (TEXT, nullable)
/// - created_by (TEXT, nullable)
/// - created_at (TEXT, RFC3339)
/// - updated_at (TEXT, RFC3339)
fn row_to_board(row: &Row) -> Result<Board, DatabaseError> {
    let id: String = row.get(0)?;
    let parent_id: Option<String> = row.get(1)?;
    let path: String = row.get(2)?;
    let title: String = row.get(3)?;
    let description: Option<String> = row.get(4)?;
    let created_by: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(Board {
        id: parse_board_id(&id, "id")?,
        parent_id: parent_id
            .as_deref()
            .map(|p| parse_board_id(p, "parent_id"))
            .transpose()?,
        path: parse_path(&path)?,
        title,
        description,
        created_by,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

async fn collect_boards(mut rows: libsql::Rows) -> Result<Vec<Board>, DatabaseError> {
    let mut boards = Vec::new();
    while let Some(row) = rows.next().await? {
        boards.push(row_to_board(&row)?);
    }
    Ok(boards)
}

async fn fetch_count(
    conn: &Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<u64, DatabaseError> {
    let mut rows = conn.query(sql, params).await?;
    let count: i64 = match rows.next().await? {
        Some(row) => row.get(0)?,
        None => 0,
    };
    Ok(count as u64)
}

async fn fetch_board(conn: &Connection, id: &BoardId) -> Result<Option<Board>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM boards WHERE id = ?", BOARD_COLUMNS),
            params![id.to_string()],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(row_to_board(&row)?)),
        None => Ok(None),
    }
}

/// Read statements over one connection
///
/// Shared by the store (fresh connection per call), snapshots (one read
/// transaction) and the writer (inside `BEGIN IMMEDIATE`).
pub struct BoardReader<'a> {
    conn: &'a Connection,
}

impl<'a> BoardReader<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn get_board(&self, id: &BoardId) -> Result<Option<Board>, DatabaseError> {
        fetch_board(self.conn, id).await
    }

    pub async fn list_boards(&self) -> Result<Vec<Board>, DatabaseError> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {} FROM boards ORDER BY created_at DESC, rowid DESC",
                    BOARD_COLUMNS
                ),
                (),
            )
            .await?;
        collect_boards(rows).await
    }

    pub async fn get_children(
        &self,
        parent_id: Option<&BoardId>,
    ) -> Result<Vec<Board>, DatabaseError> {
        let rows = match parent_id {
            Some(parent_id) => {
                self.conn
                    .query(
                        &format!(
                            "SELECT {} FROM boards WHERE parent_id = ?
                             ORDER BY created_at DESC, rowid DESC",
                            BOARD_COLUMNS
                        ),
                        params![parent_id.to_string()],
                    )
                    .await?
            }
            None => {
                self.conn
                    .query(
                        &format!(
                            "SELECT {} FROM boards WHERE parent_id IS NULL
                             ORDER BY created_at DESC, rowid DESC",
                            BOARD_COLUMNS
                        ),
                        (),
                    )
                    .await?
            }
        };
        collect_boards(rows).await
    }

    pub async fn get_descendants(
        &self,
        path: &MaterializedPath,
    ) -> Result<Vec<Board>, DatabaseError> {
        let (lower, upper) = PathMaterializer::descendant_range(path);
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {} FROM boards WHERE path >= ? AND path < ?
                     ORDER BY {} ASC, created_at ASC, rowid ASC",
                    BOARD_COLUMNS, DEPTH_SQL
                ),
                params![lower, upper],
            )
            .await?;
        collect_boards(rows).await
    }

    pub async fn count_children(&self, id: &BoardId) -> Result<u64, DatabaseError> {
        fetch_count(
            self.conn,
            "SELECT COUNT(*) FROM boards WHERE parent_id = ?",
            params![id.to_string()],
        )
        .await
    }

    pub async fn count_descendants(&self, path: &MaterializedPath) -> Result<u64, DatabaseError> {
        let (lower, upper) = PathMaterializer::descendant_range(path);
        fetch_count(
            self.conn,
            "SELECT COUNT(*) FROM boards WHERE path >= ? AND path < ?",
            params![lower, upper],
        )
        .await
    }

    pub async fn max_descendant_depth(
        &self,
        path: &MaterializedPath,
    ) -> Result<Option<u32>, DatabaseError> {
        let (lower, upper) = PathMaterializer::descendant_range(path);
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT MAX({}) FROM boards WHERE path >= ? AND path < ?",
                    DEPTH_SQL
                ),
                params![lower, upper],
            )
            .await?;

        let max: Option<i64> = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => None,
        };
        Ok(max.map(|depth| depth as u32))
    }

    pub async fn get_parent_id(
        &self,
        id: &BoardId,
    ) -> Result<Option<Option<BoardId>>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT parent_id FROM boards WHERE id = ?",
                params![id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let parent_id: Option<String> = row.get(0)?;
                let parent_id = parent_id
                    .as_deref()
                    .map(|p| parse_board_id(p, "parent_id"))
                    .transpose()?;
                Ok(Some(parent_id))
            }
            None => Ok(None),
        }
    }

    pub async fn get_boards_by_paths(
        &self,
        paths: &[MaterializedPath],
    ) -> Result<Vec<Board>, DatabaseError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; paths.len()].join(", ");
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {} FROM boards WHERE path IN ({}) ORDER BY {} ASC",
                    BOARD_COLUMNS, placeholders, DEPTH_SQL
                ),
                params_from_iter(paths.iter().map(|p| p.to_string()).collect::<Vec<String>>()),
            )
            .await?;
        collect_boards(rows).await
    }
}

/// TursoStore implements BoardStore for the Turso/libsql backend
///
/// Each plain read opens its own connection; `snapshot` pins one.
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }
}

#[async_trait]
impl BoardReads for TursoStore {
    async fn get_board(&self, id: &BoardId) -> Result<Option<Board>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        BoardReader::new(&conn).get_board(id).await
    }

    async fn list_boards(&self) -> Result<Vec<Board>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        BoardReader::new(&conn).list_boards().await
    }

    async fn get_children(&self, parent_id: Option<&BoardId>) -> Result<Vec<Board>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        BoardReader::new(&conn).get_children(parent_id).await
    }

    async fn get_descendants(&self, path: &MaterializedPath) -> Result<Vec<Board>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        BoardReader::new(&conn).get_descendants(path).await
    }

    async fn count_children(&self, id: &BoardId) -> Result<u64, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        BoardReader::new(&conn).count_children(id).await
    }

    async fn count_descendants(&self, path: &MaterializedPath) -> Result<u64, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        BoardReader::new(&conn).count_descendants(path).await
    }

    async fn max_descendant_depth(
        &self,
        path: &MaterializedPath,
    ) -> Result<Option<u32>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        BoardReader::new(&conn).max_descendant_depth(path).await
    }

    async fn get_parent_id(&self, id: &BoardId) -> Result<Option<Option<BoardId>>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        BoardReader::new(&conn).get_parent_id(id).await
    }

    async fn get_boards_by_paths(
        &self,
        paths: &[MaterializedPath],
    ) -> Result<Vec<Board>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        BoardReader::new(&conn).get_boards_by_paths(paths).await
    }
}

#[async_trait]
impl BoardStore for TursoStore {
    async fn snapshot(&self) -> Result<Box<dyn BoardSnapshot>, DatabaseError> {
        let tx = self.db.begin_read().await?;
        Ok(Box::new(TursoSnapshot { tx }))
    }
}

/// Reads running inside one deferred read transaction
pub struct TursoSnapshot {
    tx: ReadTransaction,
}

impl TursoSnapshot {
    fn reader(&self) -> BoardReader<'_> {
        BoardReader::new(self.tx.conn())
    }
}

#[async_trait]
impl BoardReads for TursoSnapshot {
    async fn get_board(&self, id: &BoardId) -> Result<Option<Board>, DatabaseError> {
        self.reader().get_board(id).await
    }

    async fn list_boards(&self) -> Result<Vec<Board>, DatabaseError> {
        self.reader().list_boards().await
    }

    async fn get_children(&self, parent_id: Option<&BoardId>) -> Result<Vec<Board>, DatabaseError> {
        self.reader().get_children(parent_id).await
    }

    async fn get_descendants(&self, path: &MaterializedPath) -> Result<Vec<Board>, DatabaseError> {
        self.reader().get_descendants(path).await
    }

    async fn count_children(&self, id: &BoardId) -> Result<u64, DatabaseError> {
        self.reader().count_children(id).await
    }

    async fn count_descendants(&self, path: &MaterializedPath) -> Result<u64, DatabaseError> {
        self.reader().count_descendants(path).await
    }

    async fn max_descendant_depth(
        &self,
        path: &MaterializedPath,
    ) -> Result<Option<u32>, DatabaseError> {
        self.reader().max_descendant_depth(path).await
    }

    async fn get_parent_id(&self, id: &BoardId) -> Result<Option<Option<BoardId>>, DatabaseError> {
        self.reader().get_parent_id(id).await
    }

    async fn get_boards_by_paths(
        &self,
        paths: &[MaterializedPath],
    ) -> Result<Vec<Board>, DatabaseError> {
        self.reader().get_boards_by_paths(paths).await
    }
}

#[async_trait]
impl BoardSnapshot for TursoSnapshot {
    async fn close(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.close().await
    }
}

/// Statements executed inside a structural write transaction
///
/// Every read made through the writer happens after `BEGIN IMMEDIATE`, so it
/// observes the latest committed state and cannot be invalidated before commit.
pub struct BoardWriter<'a> {
    conn: &'a Connection,
}

impl<'a> BoardWriter<'a> {
    pub fn new(tx: &'a WriteTransaction) -> Self {
        Self { conn: tx.conn() }
    }

    pub async fn get_board(&self, id: &BoardId) -> Result<Option<Board>, DatabaseError> {
        BoardReader::new(self.conn).get_board(id).await
    }

    /// The board at `path` and all of its descendants, with their paths
    ///
    /// Shallowest first, so the moving board itself is the first entry.
    pub async fn get_subtree_paths(
        &self,
        path: &MaterializedPath,
    ) -> Result<Vec<(BoardId, MaterializedPath)>, DatabaseError> {
        let (lower, upper) = PathMaterializer::descendant_range(path);
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT id, path FROM boards
                     WHERE path = ? OR (path >= ? AND path < ?)
                     ORDER BY {} ASC",
                    DEPTH_SQL
                ),
                params![path.to_string(), lower, upper],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            let path: String = row.get(1)?;
            entries.push((parse_board_id(&id, "id")?, parse_path(&path)?));
        }
        Ok(entries)
    }

    pub async fn insert_board(&self, board: &Board) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO boards (id, parent_id, path, title, description, created_by, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    board.id.to_string(),
                    board.parent_id.map(|p| p.to_string()),
                    board.path.to_string(),
                    board.title.clone(),
                    board.description.clone(),
                    board.created_by.clone(),
                    format_timestamp(&board.created_at),
                    format_timestamp(&board.updated_at)
                ],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to insert board {}: {}", board.id, e))
            })?;
        Ok(())
    }

    /// Rewrite one board's path and refresh its `updated_at`
    pub async fn update_path(
        &self,
        id: &BoardId,
        path: &MaterializedPath,
        now: &DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "UPDATE boards SET path = ?, updated_at = ? WHERE id = ?",
                params![path.to_string(), format_timestamp(now), id.to_string()],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to rewrite path of {}: {}", id, e))
            })?;
        Ok(())
    }

    pub async fn set_parent(
        &self,
        id: &BoardId,
        parent_id: Option<&BoardId>,
        now: &DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "UPDATE boards SET parent_id = ?, updated_at = ? WHERE id = ?",
                params![
                    parent_id.map(|p| p.to_string()),
                    format_timestamp(now),
                    id.to_string()
                ],
            )
            .await?;
        Ok(())
    }

    /// Update display attributes; returns false if the board does not exist
    pub async fn update_attributes(
        &self,
        id: &BoardId,
        title: Option<&str>,
        description: Option<Option<&str>>,
        now: &DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute(
                "UPDATE boards SET
                    title = COALESCE(?, title),
                    description = CASE WHEN ? THEN ? ELSE description END,
                    updated_at = ?
                 WHERE id = ?",
                params![
                    title.map(str::to_string),
                    description.is_some() as i64,
                    description.flatten().map(str::to_string),
                    format_timestamp(now),
                    id.to_string()
                ],
            )
            .await?;
        Ok(changed > 0)
    }

    /// Delete the board at `path` and every descendant; returns how many rows
    /// were removed
    pub async fn delete_subtree(&self, path: &MaterializedPath) -> Result<u64, DatabaseError> {
        let (lower, upper) = PathMaterializer::descendant_range(path);

        // Rows removed by the FK cascade are not reported by `execute`
        let count = fetch_count(
            self.conn,
            "SELECT COUNT(*) FROM boards WHERE path = ? OR (path >= ? AND path < ?)",
            params![path.to_string(), lower.clone(), upper.clone()],
        )
        .await?;

        self.conn
            .execute(
                "DELETE FROM boards WHERE path = ? OR (path >= ? AND path < ?)",
                params![path.to_string(), lower, upper],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to delete subtree {}: {}", path, e))
            })?;

        Ok(count)
    }
}
