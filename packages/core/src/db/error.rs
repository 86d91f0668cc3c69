//! Storage Errors
//!
//! Everything that can go wrong below the hierarchy rules: opening the board
//! database, preparing its schema, running statements, and turning stored rows
//! back into boards. Callers above the db layer see these wrapped in
//! `BoardServiceError::StoreFault`.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of the board database itself, never of a hierarchy rule
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The board database file could not be opened
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// The `boards` table or one of its indexes could not be created
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// The directory meant to hold the database could not be created
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// A board statement failed; `context` names the statement and board
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A read snapshot or a structural write transaction failed to begin or end
    #[error("Transaction failed: {context}")]
    TransactionFailed { context: String },

    /// A stored row does not decode into a consistent board (bad id, path or
    /// timestamp, or a broken parent chain)
    #[error("Corrupt board row: {context}")]
    CorruptRow { context: String },
}

impl DatabaseError {
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    pub fn transaction_failed(context: impl Into<String>) -> Self {
        Self::TransactionFailed {
            context: context.into(),
        }
    }

    pub fn corrupt_row(context: impl Into<String>) -> Self {
        Self::CorruptRow {
            context: context.into(),
        }
    }
}
