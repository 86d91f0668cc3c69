//! Boardspace Core - Hierarchical Board Engine
//!
//! This crate provides the data model, storage and services for a tree of
//! boards: each board has at most one parent, any number of children, and the
//! whole structure stays acyclic and depth-bounded.
//!
//! # Architecture
//!
//! - **Materialized paths**: every board stores the labels of its ancestors, so
//!   depth, subtree and ancestor queries never walk the tree
//! - **libsql/Turso**: embedded SQLite-compatible database
//! - **Transactional mutations**: create, move, delete and update each run in a
//!   single write transaction
//! - **Two depth limits**: a storage hard cap and a stricter policy cap
//!
//! # Modules
//!
//! - [`models`] - Data structures (Board, MaterializedPath, update types)
//! - [`db`] - Database layer with libsql integration
//! - [`services`] - Structural mutator, hierarchy queries and depth policy
//! - [`operations`] - Application boundary used by the HTTP server

pub mod db;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use operations::BoardOperations;
pub use services::*;
