//! Database Layer
//!
//! This module handles all database interactions using libsql (Turso):
//!
//! - Database initialization and connection management
//! - The `boards` table with its path, parent and creation-time indexes
//! - Read access through the `BoardStore` trait, with snapshots for
//!   multi-statement queries
//! - Transactional structural writes through `BoardWriter`
//! - Path derivation (`PathMaterializer`) and per-board locks
//!
//! # Architecture
//!
//! Each board stores its materialized path (labels from the root down to the
//! board, joined by `.`). Ancestor and descendant queries are prefix-range scans
//! over the unique path index; depth is the number of separators in the path.

mod board_store;
mod database;
mod error;
mod locks;
mod path_materializer;
mod turso_store;

pub use board_store::{BoardReads, BoardSnapshot, BoardStore};
pub use database::{DatabaseService, ReadTransaction, WriteTransaction};
pub use error::DatabaseError;
pub use locks::{BoardLockTable, BoardLocks};
pub use path_materializer::PathMaterializer;
pub use turso_store::{BoardReader, BoardWriter, TursoSnapshot, TursoStore};
