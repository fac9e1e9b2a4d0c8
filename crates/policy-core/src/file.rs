//! # File References
//!
//! A [`PolicyFile`] is a deferred value: a path to a policy that has not
//! been loaded yet. Resolution is delegated to a [`PolicyLoader`] supplied
//! by the caller, so the tree model stays free of I/O and of any concrete
//! file format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PolicyResult;
use crate::policy::Policy;

/// Upper bound on resolution passes in [`Policy::load_policy_files`].
///
/// A loaded file may itself contain file references; each pass resolves
/// one more level. Self-referencing files would otherwise never settle.
pub const MAX_FILE_PASSES: usize = 16;

/// Reference to a policy file that must be loaded before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyFile {
    path: PathBuf,
}

impl PolicyFile {
    /// Create a reference to the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path as written in the referencing policy.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve the path against a repository directory.
    ///
    /// Absolute paths, and any path when no repository is given, are
    /// returned unchanged.
    pub fn resolve(&self, repository: Option<&Path>) -> PathBuf {
        match repository {
            Some(repo) if self.path.is_relative() => repo.join(&self.path),
            _ => self.path.clone(),
        }
    }
}

impl fmt::Display for PolicyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<file:{}>", self.path.display())
    }
}

/// Source of policy trees for file references.
///
/// Implementations own the file format and the filesystem access. Any
/// closure `Fn(&Path) -> PolicyResult<Policy>` is a loader.
pub trait PolicyLoader {
    /// Load the policy stored at `path`.
    fn load(&self, path: &Path) -> PolicyResult<Policy>;
}

impl<F> PolicyLoader for F
where
    F: Fn(&Path) -> PolicyResult<Policy>,
{
    fn load(&self, path: &Path) -> PolicyResult<Policy> {
        self(path)
    }
}
