//! Path Materializer
//!
//! Pure functions that derive materialized paths. No I/O happens here: the
//! structural mutator loads the rows it needs inside its transaction and hands
//! them to these functions.

use crate::db::DatabaseError;
use crate::models::{BoardId, Label, MaterializedPath};
use crate::services::BoardServiceError;

/// Prefix character of every label (keeps labels valid identifiers that never
/// start with a digit)
const LABEL_PREFIX: char = 'n';

/// Derives and rewrites materialized paths
pub struct PathMaterializer;

impl PathMaterializer {
    /// Label for a board: `n` followed by the 32 hex digits of its UUID
    ///
    /// Distinct IDs always produce distinct labels, and a board's label never
    /// changes.
    pub fn label_for(id: &BoardId) -> Label {
        let mut label = String::with_capacity(33);
        label.push(LABEL_PREFIX);
        label.push_str(&id.as_uuid().simple().to_string());
        Label::new_unchecked(label)
    }

    /// Path for a board about to be inserted
    ///
    /// `parent_path` is what the store found for `parent_id`; a parent ID with
    /// no stored path means the parent does not exist.
    pub fn compute_insert_path(
        parent_id: Option<&BoardId>,
        parent_path: Option<&MaterializedPath>,
        own_label: Label,
    ) -> Result<MaterializedPath, BoardServiceError> {
        match (parent_id, parent_path) {
            (None, _) => Ok(MaterializedPath::root(own_label)),
            (Some(_), Some(parent_path)) => Ok(parent_path.child(own_label)),
            (Some(parent_id), None) => Err(BoardServiceError::parent_not_found(*parent_id)),
        }
    }

    /// New paths for a subtree that is being re-parented
    ///
    /// Every path in `old_subtree_paths` starts with the moving board's old path.
    /// The first `old_ancestor_prefix_len` labels (the moving board's old
    /// ancestors) are replaced by `new_parent_path`; the trailing labels, which
    /// start with the moving board's own label, are kept. `None` as the new
    /// parent splices the subtree to root level.
    ///
    /// A path no longer than the prefix is not part of the moving subtree and
    /// is reported as a corrupt row.
    pub fn splice_for_move(
        old_subtree_paths: &[(BoardId, MaterializedPath)],
        old_ancestor_prefix_len: usize,
        new_parent_path: Option<&MaterializedPath>,
    ) -> Result<Vec<(BoardId, MaterializedPath)>, DatabaseError> {
        let new_prefix: &[Label] = new_parent_path.map(|p| p.labels()).unwrap_or(&[]);

        old_subtree_paths
            .iter()
            .map(|(id, old_path)| {
                let tail = old_path.tail(old_ancestor_prefix_len);
                if tail.is_empty() {
                    return Err(DatabaseError::corrupt_row(format!(
                        "Path {} of board {} is outside the moving subtree",
                        old_path, id
                    )));
                }

                let mut labels = Vec::with_capacity(new_prefix.len() + tail.len());
                labels.extend_from_slice(new_prefix);
                labels.extend_from_slice(tail);
                let new_path = MaterializedPath::from_labels(labels).map_err(|e| {
                    DatabaseError::corrupt_row(format!("Invalid spliced path for {}: {}", id, e))
                })?;
                Ok((*id, new_path))
            })
            .collect()
    }

    /// Depth each board would have after the splice, using the same arithmetic
    /// as `splice_for_move` without building the paths
    pub fn depth_after_move(
        old_path: &MaterializedPath,
        old_ancestor_prefix_len: usize,
        new_parent_path: Option<&MaterializedPath>,
    ) -> u32 {
        let new_prefix_len = new_parent_path.map(|p| p.len()).unwrap_or(0);
        let tail_len = old_path.len().saturating_sub(old_ancestor_prefix_len);
        (new_prefix_len + tail_len).saturating_sub(1) as u32
    }

    /// Half-open string range `[lower, upper)` containing the textual form of
    /// every strict descendant of `path`
    ///
    /// Descendants look like `path.xxx`; `/` sorts right after `.`, so
    /// `path/` bounds them from above. Every label character sorts after `/`,
    /// so a sibling whose label merely extends this one falls past the range.
    pub fn descendant_range(path: &MaterializedPath) -> (String, String) {
        let text = path.to_string();
        (format!("{}.", text), format!("{}/", text))
    }
}
