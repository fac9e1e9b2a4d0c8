//! # Error Types
//!
//! Errors raised by the policy tree itself. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! Access errors carry the full hierarchical name that was requested, and
//! type errors carry both the expected and the stored kind.

use thiserror::Error;

use crate::value::ValueType;

/// Result alias for policy tree operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Error raised while reading, mutating, or resolving a policy tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The name is empty or contains an empty segment.
    #[error("illegal policy parameter name: {0:?}")]
    BadName(String),

    /// No parameter is stored under the name, or an intermediate segment
    /// is not a sub-policy.
    #[error("policy parameter name not found: {0}")]
    NameNotFound(String),

    /// The stored values have a different kind than the one requested.
    #[error("parameter \"{name}\" has wrong type; expecting {expected}, found {found}")]
    TypeError {
        /// Full name of the parameter.
        name: String,
        /// Kind the caller asked for.
        expected: ValueType,
        /// Kind actually stored.
        found: ValueType,
    },

    /// A value type name could not be parsed.
    #[error("unknown value type name: {0:?}")]
    BadTypeName(String),

    /// An array must hold at least one value.
    #[error("parameter \"{0}\" cannot be set to an empty array")]
    EmptyArray(String),

    /// The loader failed to produce a policy for a file reference.
    #[error("failed to load policy file '{path}': {reason}")]
    FileLoad {
        /// Resolved path handed to the loader.
        path: String,
        /// Loader-supplied reason.
        reason: String,
    },

    /// File references kept producing further references.
    #[error("policy file references still unresolved after {passes} passes")]
    TooManyFilePasses {
        /// Number of resolution passes attempted.
        passes: usize,
    },
}

impl PolicyError {
    /// Build a [`PolicyError::TypeError`] for `name`.
    pub fn type_error(name: impl Into<String>, expected: ValueType, found: ValueType) -> Self {
        Self::TypeError {
            name: name.into(),
            expected,
            found,
        }
    }
}
