//! Materialized Path Types
//!
//! A board's position in the hierarchy is stored as the ordered list of labels
//! from the root down to (and including) the board itself. Labels are derived
//! from board IDs, so two boards never share a label and a label never changes.
//!
//! # Textual Form
//!
//! Paths are persisted as the labels joined with `.`:
//!
//! ```text
//! n3f0c...e1.n9a41...07.n0b2d...c4
//! ```
//!
//! Labels only contain `[0-9a-z]`, which keeps the separator unambiguous and
//! makes every strict descendant of `P` fall inside the string range
//! `[P + ".", P + "/")` (`/` is the byte right after `.`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::ValidationError;

/// Separator between labels in the textual path form
pub const PATH_SEPARATOR: char = '.';

/// A single path segment contributed by one board
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    /// Wrap an already-validated label string
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Label {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase());
        if !valid {
            return Err(ValidationError::InvalidPath(format!(
                "invalid label '{}'",
                s
            )));
        }
        Ok(Self(s.to_string()))
    }
}

/// Ordered sequence of labels from the root down to a board
///
/// Never empty: a root board's path holds exactly its own label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MaterializedPath {
    labels: Vec<Label>,
}

impl MaterializedPath {
    /// Path of a root board
    pub fn root(label: Label) -> Self {
        Self {
            labels: vec![label],
        }
    }

    /// Path of a direct child of `self`
    pub fn child(&self, label: Label) -> Self {
        let mut labels = self.labels.clone();
        labels.push(label);
        Self { labels }
    }

    /// Build a path from labels, rejecting the empty sequence
    pub fn from_labels(labels: Vec<Label>) -> Result<Self, ValidationError> {
        if labels.is_empty() {
            return Err(ValidationError::InvalidPath(
                "a path needs at least one label".to_string(),
            ));
        }
        Ok(Self { labels })
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Number of labels (depth + 1)
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Never true for a constructed path
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Depth in the hierarchy: `len - 1`, so roots are at depth 0
    pub fn depth(&self) -> u32 {
        (self.labels.len() - 1) as u32
    }

    /// The board's own (last) label
    pub fn own_label(&self) -> &Label {
        // `labels` is never empty (see constructors)
        &self.labels[self.labels.len() - 1]
    }

    /// Path of the parent board, `None` for roots
    pub fn parent(&self) -> Option<MaterializedPath> {
        if self.labels.len() <= 1 {
            return None;
        }
        Some(Self {
            labels: self.labels[..self.labels.len() - 1].to_vec(),
        })
    }

    /// True when `self` equals `other` or is one of its ancestors
    pub fn is_prefix_of(&self, other: &MaterializedPath) -> bool {
        self.labels.len() <= other.labels.len()
            && self.labels.iter().zip(&other.labels).all(|(a, b)| a == b)
    }

    /// True when `self` is an ancestor of `other` (prefix, but not equal)
    pub fn is_strict_prefix_of(&self, other: &MaterializedPath) -> bool {
        self.labels.len() < other.labels.len() && self.is_prefix_of(other)
    }

    /// Labels after the first `prefix_len` labels
    pub fn tail(&self, prefix_len: usize) -> &[Label] {
        let start = prefix_len.min(self.labels.len());
        &self.labels[start..]
    }
}

impl fmt::Display for MaterializedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
            f.write_str(label.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for MaterializedPath {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let labels = s
            .split(PATH_SEPARATOR)
            .map(Label::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_labels(labels)
    }
}

impl TryFrom<String> for MaterializedPath {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MaterializedPath> for String {
    fn from(path: MaterializedPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> Label {
        s.parse().unwrap()
    }

    #[test]
    fn test_display_and_parse_agree() {
        let path = MaterializedPath::root(label("na")).child(label("nb"));
        assert_eq!(path.to_string(), "na.nb");
        assert_eq!("na.nb".parse::<MaterializedPath>().unwrap(), path);
    }

    #[test]
    fn test_depth_is_len_minus_one() {
        let root = MaterializedPath::root(label("na"));
        assert_eq!(root.depth(), 0);
        assert_eq!(root.child(label("nb")).child(label("nc")).depth(), 2);
    }

    #[test]
    fn test_prefix_relations() {
        let a = MaterializedPath::root(label("na"));
        let ab = a.child(label("nb"));
        let ac = a.child(label("nc"));

        assert!(a.is_prefix_of(&a));
        assert!(!a.is_strict_prefix_of(&a));
        assert!(a.is_strict_prefix_of(&ab));
        assert!(!ab.is_prefix_of(&ac));
        assert!(!ab.is_prefix_of(&a));
    }

    #[test]
    fn test_label_prefix_is_not_path_prefix() {
        // "na" is a string prefix of "nab" but not a path ancestor
        let a = MaterializedPath::root(label("na"));
        let ab = MaterializedPath::root(label("nab"));
        assert!(!a.is_prefix_of(&ab));
    }

    #[test]
    fn test_rejects_malformed_paths() {
        assert!("".parse::<MaterializedPath>().is_err());
        assert!("na..nb".parse::<MaterializedPath>().is_err());
        assert!("na.N-B".parse::<MaterializedPath>().is_err());
    }

    #[test]
    fn test_parent_and_own_label() {
        let path: MaterializedPath = "na.nb.nc".parse().unwrap();
        assert_eq!(path.own_label().as_str(), "nc");
        assert_eq!(path.parent().unwrap().to_string(), "na.nb");
        assert!(MaterializedPath::root(label("na")).parent().is_none());
    }
}
