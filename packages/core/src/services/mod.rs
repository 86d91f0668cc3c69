//! Business Services
//!
//! This module contains the board hierarchy engine:
//!
//! - `BoardService` - Structural mutator (create, move, delete, update)
//! - `HierarchyQueryEngine` - Subtree, depth, stats and listing queries
//! - `DepthPolicy` - Business-rule depth cap applied before create and move
//!
//! Services coordinate between the database layer and application logic,
//! implementing the hierarchy rules inside write transactions.

pub mod board_service;
pub mod depth_policy;
pub mod error;
pub mod hierarchy_query;

pub use board_service::BoardService;
pub use depth_policy::DepthPolicy;
pub use error::BoardServiceError;
pub use hierarchy_query::HierarchyQueryEngine;

/// Storage-level limit on board depth, also enforced by a `CHECK` constraint
pub const HARD_MAX_DEPTH: u32 = 30;

/// Default application-level limit on board depth
pub const POLICY_MAX_DEPTH: u32 = 10;
