//! # policy-cli: Command-Line Interface for Policy Trees
//!
//! Provides the `policy` binary. Policies and dictionaries are read as
//! JSON or YAML snapshots of their serde form.
//!
//! ## Subcommands
//!
//! - `policy validate <policy> <dictionary>`: Validate a policy, optionally
//!   merging defaults first.
//! - `policy dict check <dictionary>`: Check dictionary integrity.
//! - `policy dict defaults <dictionary>`: Print every declared default.
//!
//! ## Exit Codes
//!
//! `0` on success, `1` when the policy does not conform, `2` for any other
//! failure (unreadable file, malformed dictionary).

pub mod dict;
pub mod snapshot;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use policy_dictionary::Dictionary;

use crate::snapshot::{read_policy, SnapshotLoader};

/// Exit code for a policy that failed validation.
pub const EXIT_INVALID: u8 = 1;
/// Exit code for every other failure.
pub const EXIT_ERROR: u8 = 2;

/// Repository for file references: the explicit directory, else the
/// directory holding `file`.
pub fn reference_root<'a>(explicit: Option<&'a Path>, file: &'a Path) -> Option<&'a Path> {
    explicit.or_else(|| file.parent().filter(|p| !p.as_os_str().is_empty()))
}

/// Read a dictionary snapshot and resolve its file references.
pub fn load_dictionary(
    path: &Path,
    references: Option<&Path>,
    strict: bool,
) -> Result<Dictionary<'static>> {
    let policy = read_policy(path)
        .with_context(|| format!("reading dictionary file \"{}\"", path.display()))?;
    let mut dict = Dictionary::new(policy)
        .with_context(|| format!("{}: does not contain a dictionary", path.display()))?;
    let loaded = dict
        .load_policy_files(&SnapshotLoader, reference_root(references, path), strict)
        .with_context(|| format!("loading dictionary references of \"{}\"", path.display()))?;
    tracing::debug!(path = %path.display(), loaded, "dictionary ready");
    Ok(dict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_root_prefers_explicit() {
        let file = Path::new("/cfg/p.json");
        assert_eq!(reference_root(Some(Path::new("/refs")), file), Some(Path::new("/refs")));
        assert_eq!(reference_root(None, file), Some(Path::new("/cfg")));
        assert_eq!(reference_root(None, Path::new("p.json")), None);
    }

    #[test]
    fn test_load_dictionary_rejects_plain_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.json");
        std::fs::write(&path, r#"{"a": {"int": [1]}}"#).unwrap();
        let err = load_dictionary(&path, None, true).unwrap_err();
        assert!(format!("{err:#}").contains("does not contain a dictionary"));
    }
}
