//! Board Data Structures
//!
//! This module defines the `Board` record and the parameter types used to
//! create and update boards.
//!
//! # Structural vs. Display Fields
//!
//! - **Structural**: `id`, `parent_id`, `path`. `id` never changes; `parent_id`
//!   and `path` only change through a move.
//! - **Display**: `title`, `description`. Freely updatable.
//!
//! # Examples
//!
//! ```rust
//! use boardspace_core::models::{BoardUpdate, CreateBoardParams};
//!
//! // A root board
//! let params = CreateBoardParams::root("Roadmap");
//!
//! // Rename without touching the hierarchy
//! let update = BoardUpdate::new().with_title("Roadmap 2026");
//! assert!(!update.is_structural());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::MaterializedPath;

/// Maximum title length, in characters
pub const MAX_TITLE_LENGTH: usize = 100;

/// Validation errors for Board operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid board ID format: {0}")]
    InvalidId(String),

    #[error("Invalid materialized path: {0}")]
    InvalidPath(String),

    #[error("Title is too long: {length} characters (max {max})")]
    TitleTooLong { length: usize, max: usize },
}

/// Immutable board identifier (UUID v4)
///
/// Ordering follows the UUID byte order and is the canonical lock order for
/// operations that touch more than one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(Uuid);

impl BoardId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BoardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BoardId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ValidationError::InvalidId(s.to_string()))
    }
}

/// A node in the board hierarchy
///
/// # Fields
///
/// - `id`: Unique identifier, assigned at creation
/// - `parent_id`: Parent board (`None` marks a root)
/// - `path`: Labels from the root down to this board
/// - `title` / `description`: Display attributes
/// - `created_by`: Opaque reference to an external user record
/// - `created_at` / `updated_at`: Timestamps (`updated_at` refreshed on every mutation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub parent_id: Option<BoardId>,
    pub path: MaterializedPath,
    pub title: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    /// Depth in the hierarchy, derived from the path (roots are at depth 0)
    pub fn depth(&self) -> u32 {
        self.path.depth()
    }

    /// Check if this board is a root (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Parameters for creating a board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBoardParams {
    /// Optional parent board; `None` creates a root
    #[serde(default)]
    pub parent_id: Option<BoardId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl CreateBoardParams {
    /// Parameters for a root board with the given title
    pub fn root(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Parameters for a child of `parent_id` with the given title
    pub fn child(parent_id: BoardId, title: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Validate display attributes
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }
}

/// Reject blank or overlong titles
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::MissingField("title".to_string()));
    }
    let length = title.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong {
            length,
            max: MAX_TITLE_LENGTH,
        });
    }
    Ok(())
}

/// Custom deserializer for the double-Option update fields
///
/// Maps three input formats to the double-Option pattern:
/// - Missing field → None (don't update)
/// - null → Some(None) (set to NULL)
/// - "value" → Some(Some("value")) (set to value)
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    // Missing field is handled by #[serde(default)] on the struct field
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial board update
///
/// # Double-Option Pattern for Nullable Fields
///
/// - `None`: Don't change this field
/// - `Some(None)`: Set the field to NULL
/// - `Some(Some(value))`: Set the field to the specified value
///
/// `parent_id` is structural. The plain update path rejects it; only the
/// board operations layer turns it into a move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub description: Option<Option<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<BoardId>>,
}

impl BoardUpdate {
    /// Create a new empty BoardUpdate
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_parent(mut self, parent_id: Option<BoardId>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// True when the update asks for a parent change
    pub fn is_structural(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Check if update contains any changes
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.parent_id.is_none()
    }

    /// Split off the structural part, leaving only display fields behind
    pub fn take_parent(&mut self) -> Option<Option<BoardId>> {
        self.parent_id.take()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }
}

/// One row of a subtree listing
///
/// Serialized flat: the board's fields plus `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    #[serde(flatten)]
    pub board: Board,
    /// Depth relative to the subtree root (the root itself is level 0)
    pub level: u32,
}

/// Descendant counts for a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardStats {
    /// Boards whose `parent_id` is this board
    pub direct_children: u64,
    /// Every board below this one, at any depth
    pub total_descendants: u64,
}
