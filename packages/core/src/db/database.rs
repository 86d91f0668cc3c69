//! Database Connection Management
//!
//! This module provides the core database connection and initialization
//! functionality using libsql/Turso for the board hierarchy.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **WAL mode**: Readers see a consistent snapshot and never block writers
//! - **Foreign keys**: Enabled on every connection (parent deletion cascades)
//! - **Immediate write transactions**: Structural mutations take the write lock
//!   up front, so concurrent writers are serialized instead of failing late
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions.** The 5-second busy
//! timeout lets concurrent operations wait for the write lock instead of failing
//! immediately with `SQLITE_BUSY`.
//!
//! ```no_run
//! # use boardspace_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/boards.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use crate::services::HARD_MAX_DEPTH;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Busy timeout applied to every connection, in milliseconds
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Database service for managing libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use boardspace_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_path = PathBuf::from("/path/to/boards.db");
///     let db_service = DatabaseService::new(db_path).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

/// An open `BEGIN IMMEDIATE` transaction
///
/// Must be finished with [`commit`](Self::commit) or
/// [`rollback`](Self::rollback). Dropping it unfinished closes the connection,
/// which makes SQLite discard the pending changes.
pub struct WriteTransaction {
    conn: libsql::Connection,
}

impl WriteTransaction {
    /// Connection bound to this transaction
    pub fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Commit all changes made in this transaction
    pub async fn commit(self) -> Result<(), DatabaseError> {
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            let _rollback = self.conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::transaction_failed(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }
        Ok(())
    }

    /// Discard all changes made in this transaction
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.conn.execute("ROLLBACK", ()).await.map_err(|e| {
            DatabaseError::transaction_failed(format!("Failed to roll back transaction: {}", e))
        })?;
        Ok(())
    }

    /// Commit on `Ok`, roll back on `Err`
    ///
    /// The original error is returned even if the rollback itself fails.
    pub async fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<DatabaseError>,
    {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::warn!("Rollback after failed operation also failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// An open deferred read transaction
///
/// In WAL mode the first read fixes the snapshot: every later statement on
/// this transaction sees the same committed state, whatever writers commit in
/// between. Finish with [`close`](Self::close); dropping it also ends the
/// transaction, since the connection goes away with it.
pub struct ReadTransaction {
    conn: libsql::Connection,
}

impl ReadTransaction {
    pub fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// End the transaction and release the snapshot
    pub async fn close(self) -> Result<(), DatabaseError> {
        self.conn.execute("COMMIT", ()).await.map_err(|e| {
            DatabaseError::transaction_failed(format!("Failed to end read transaction: {}", e))
        })?;
        Ok(())
    }
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    /// 4. Enable SQLite features (WAL mode, foreign keys)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;

        tracing::debug!("Board database ready at {}", service.db_path.display());

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent: safe to call on an existing database.
    ///
    /// # Schema
    ///
    /// - `boards` table: one row per board, keyed by `id`
    /// - `idx_boards_path` (UNIQUE): prefix-range scans for ancestors/descendants
    /// - `idx_boards_parent`: direct-children lookups
    /// - `idx_boards_created`: creation-time ordering
    ///
    /// The `CHECK` constraint counts path separators, which equals the depth,
    /// so the hard cap also holds at the storage layer.
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS boards (
                    id TEXT PRIMARY KEY,
                    parent_id TEXT,
                    path TEXT NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT,
                    created_by TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    -- Parent deletion cascades to children (no orphans)
                    FOREIGN KEY (parent_id) REFERENCES boards(id) ON DELETE CASCADE,
                    CHECK (length(path) - length(replace(path, '.', '')) <= {})
                )",
                HARD_MAX_DEPTH
            ),
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create boards table: {}", e))
        })?;

        self.create_indexes(&conn).await?;

        Ok(())
    }

    async fn create_indexes(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        let indexes = [
            (
                "idx_boards_path",
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_boards_path ON boards(path)",
            ),
            (
                "idx_boards_parent",
                "CREATE INDEX IF NOT EXISTS idx_boards_parent ON boards(parent_id)",
            ),
            (
                "idx_boards_created",
                "CREATE INDEX IF NOT EXISTS idx_boards_created ON boards(created_at)",
            ),
        ];

        for (name, sql) in indexes {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!(
                    "Failed to create index '{}': {}",
                    name, e
                ))
            })?;
        }

        Ok(())
    }

    /// Get a raw connection to the database
    ///
    /// Prefer `connect_with_timeout()`: a raw connection has neither the busy
    /// timeout nor foreign keys enabled.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout and foreign keys configured
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    /// Open a connection and start a `BEGIN IMMEDIATE` transaction on it
    ///
    /// The write lock is taken here, before any read, so every read made through
    /// the returned transaction observes the latest committed state and no other
    /// writer can interleave until commit or rollback.
    pub async fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::transaction_failed(format!("Failed to begin transaction: {}", e))
        })?;

        Ok(WriteTransaction { conn })
    }

    /// Open a connection and start a deferred read transaction on it
    ///
    /// Used for queries made of several statements that must agree with each
    /// other.
    pub async fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN DEFERRED", ()).await.map_err(|e| {
            DatabaseError::transaction_failed(format!("Failed to begin read transaction: {}", e))
        })?;

        Ok(ReadTransaction { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_new_creates_parent_directory_and_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("boards.db");

        let db = DatabaseService::new(db_path.clone()).await.unwrap();
        assert!(db_path.parent().unwrap().exists());

        let conn = db.connect_with_timeout().await.unwrap();
        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND name = 'idx_boards_path'",
                (),
            )
            .await
            .unwrap();
        assert!(rows.next().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_initialize_schema_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("boards.db");

        DatabaseService::new(db_path.clone()).await.unwrap();
        // Re-opening runs CREATE ... IF NOT EXISTS again
        DatabaseService::new(db_path).await.unwrap();
    }

    #[tokio::test]
    async fn test_storage_layer_rejects_paths_beyond_hard_cap() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("boards.db"))
            .await
            .unwrap();
        let conn = db.connect_with_timeout().await.unwrap();

        let too_deep = vec!["na"; HARD_MAX_DEPTH as usize + 2].join(".");
        let result = conn
            .execute(
                "INSERT INTO boards (id, parent_id, path, title, created_at, updated_at)
                 VALUES ('x', NULL, ?, 'Too deep', '', '')",
                [too_deep.as_str()],
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("boards.db"))
            .await
            .unwrap();

        let tx = db.begin_write().await.unwrap();
        tx.conn()
            .execute(
                "INSERT INTO boards (id, parent_id, path, title, created_at, updated_at)
                 VALUES ('x', NULL, 'nx', 'Temp', '', '')",
                (),
            )
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let conn = db.connect_with_timeout().await.unwrap();
        let mut rows = conn.query("SELECT COUNT(*) FROM boards", ()).await.unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_read_transaction_keeps_its_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("boards.db"))
            .await
            .unwrap();

        let read = db.begin_read().await.unwrap();
        let count_in = |conn: libsql::Connection| async move {
            let mut rows = conn.query("SELECT COUNT(*) FROM boards", ()).await.unwrap();
            rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
        };
        assert_eq!(count_in(read.conn().clone()).await, 0);

        let tx = db.begin_write().await.unwrap();
        tx.conn()
            .execute(
                "INSERT INTO boards (id, parent_id, path, title, created_at, updated_at)
                 VALUES ('x', NULL, 'nx', 'Later', '', '')",
                (),
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        // Still the snapshot taken by the first read
        assert_eq!(count_in(read.conn().clone()).await, 0);
        read.close().await.unwrap();

        let conn = db.connect_with_timeout().await.unwrap();
        assert_eq!(count_in(conn).await, 1);
    }
}
