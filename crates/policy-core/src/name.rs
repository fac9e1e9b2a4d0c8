//! # Hierarchical Names
//!
//! Parameter names are dot-separated paths. Each segment is a simple name
//! stored at one level of the tree.

use crate::error::{PolicyError, PolicyResult};

/// Separator between the segments of a hierarchical name.
pub const SEPARATOR: char = '.';

/// Split a hierarchical name into its simple segments.
///
/// # Errors
///
/// Returns [`PolicyError::BadName`] for the empty string and for names with
/// a leading, trailing, or doubled separator.
pub fn split_name(name: &str) -> PolicyResult<Vec<&str>> {
    let segments: Vec<&str> = name.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(PolicyError::BadName(name.to_string()));
    }
    Ok(segments)
}

/// Join a parent name and a child segment. An empty parent yields the child.
pub(crate) fn join_name(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}{SEPARATOR}{child}")
    }
}
