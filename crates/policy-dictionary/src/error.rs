//! # Error Types
//!
//! Two families of failure come out of validation:
//!
//! - [`SchemaFault`]: the dictionary itself is malformed. These abort
//!   validation immediately.
//! - [`ValidationError`]: the policy does not conform. These are
//!   accumulated and either handed to the caller's report or returned.
//!
//! [`ValidateError`] is the union returned by the `validate` entry points.
//! [`ErrorMode`] selects whether content errors are collected or raised.

use thiserror::Error;

use policy_core::{PolicyError, ValueType};

use crate::report::ValidationError;

/// A fault in the dictionary, detected while building or walking it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaFault {
    /// The policy has no `definitions` section.
    #[error("no \"definitions\" section found")]
    MissingDefinitions,

    #[error("expected a single \"definitions\" section; found {count}")]
    MultipleDefinitions { count: usize },

    /// A level on the path to `name` has no usable `definitions` section.
    #[error("definition for {name} not found")]
    DefinitionNotFound { name: String },

    /// `segment` of `name` has no definition and no `childDefinition`.
    #[error("parameter name is unknown: {segment} (in {name})")]
    UnknownName { name: String, segment: String },

    /// A non-final segment lacks the nested dictionary needed to go deeper.
    #[error("{name}.dictionary not found")]
    MissingSubDictionary { name: String },

    /// A definition entry that is not a sub-policy.
    #[error("malformed definition for {name}")]
    MalformedDefinition { name: String },

    #[error("unknown type for {name}: \"{type_name}\"")]
    UnknownType { name: String, type_name: String },

    /// `PolicyFile` is not a legal declared type.
    #[error("illegal type for {name}: \"PolicyFile\"; use \"Policy\" instead")]
    IllegalType { name: String },

    /// A definition field holds the wrong kind of value.
    #[error("expected {expected} for \"{field}\" of {name}; found {found} instead")]
    FieldType {
        name: String,
        field: &'static str,
        expected: ValueType,
        found: ValueType,
    },

    /// A second `min` or `max` in one allowed set.
    #[error("{bound} value for {name} ({existing}) already specified; additional value not allowed")]
    DuplicateBound {
        name: String,
        bound: &'static str,
        existing: String,
    },

    /// A bound, enumerated value, or default of the wrong kind.
    #[error("wrong type for {name} {bound} value: expected {expected}, found {found}")]
    BoundType {
        name: String,
        bound: &'static str,
        expected: ValueType,
        found: ValueType,
    },

    /// Constraints on a kind that has no ordering.
    #[error("allowed values are not supported for {name} of type {value_type}")]
    UncomparableType { name: String, value_type: ValueType },

    /// A nested dictionary on a definition that cannot hold sub-policies.
    #[error("\"dictionary\" is not allowed for {name} of type {declared}")]
    DictionaryOnNonPolicy { name: String, declared: ValueType },

    /// Dictionaries nested beyond the supported depth.
    #[error("dictionary nesting deeper than {depth} levels at {prefix}")]
    NestingTooDeep { depth: usize, prefix: String },

    /// A lower-level policy error surfaced while reading the dictionary.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),
}

/// Error returned by `validate`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidateError {
    /// The dictionary is malformed; nothing was validated past the fault.
    #[error("dictionary error: {0}")]
    Schema(#[from] SchemaFault),

    /// The policy does not conform. Only returned under [`ErrorMode::Raise`].
    #[error("{0}")]
    Invalid(ValidationError),
}

impl ValidateError {
    /// The content report, if this is a content failure.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Invalid(ve) => Some(ve),
            Self::Schema(_) => None,
        }
    }

    /// The schema fault, if the dictionary is malformed.
    pub fn schema_fault(&self) -> Option<&SchemaFault> {
        match self {
            Self::Schema(fault) => Some(fault),
            Self::Invalid(_) => None,
        }
    }
}

impl From<PolicyError> for ValidateError {
    fn from(e: PolicyError) -> Self {
        Self::Schema(SchemaFault::Policy(e))
    }
}

/// Where content errors go.
#[derive(Debug)]
pub enum ErrorMode<'e> {
    /// Record into the caller's report. `validate` never returns
    /// [`ValidateError::Invalid`] in this mode.
    Collect(&'e mut ValidationError),
    /// Return [`ValidateError::Invalid`] if anything was recorded.
    Raise,
}

impl ErrorMode<'_> {
    /// Run `check` against the report this mode selects, then apply the
    /// mode's return policy.
    pub(crate) fn run<F>(self, check: F) -> Result<(), ValidateError>
    where
        F: FnOnce(&mut ValidationError) -> Result<(), SchemaFault>,
    {
        match self {
            Self::Collect(errs) => check(errs).map_err(ValidateError::from),
            Self::Raise => {
                let mut errs = ValidationError::new();
                check(&mut errs)?;
                if errs.is_empty() {
                    Ok(())
                } else {
                    Err(ValidateError::Invalid(errs))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ErrorKind;

    #[test]
    fn test_fault_messages() {
        let f = SchemaFault::DuplicateBound {
            name: "x".into(),
            bound: "min",
            existing: "0".into(),
        };
        assert_eq!(
            f.to_string(),
            "min value for x (0) already specified; additional value not allowed"
        );

        let f = SchemaFault::IllegalType { name: "p".into() };
        assert!(f.to_string().contains("use \"Policy\" instead"));
    }

    #[test]
    fn test_policy_error_converts() {
        let e: SchemaFault = PolicyError::BadName("a..b".into()).into();
        assert!(matches!(e, SchemaFault::Policy(PolicyError::BadName(_))));
        let e: ValidateError = PolicyError::NameNotFound("x".into()).into();
        assert!(e.schema_fault().is_some());
    }

    #[test]
    fn test_collect_mode_never_raises_content_errors() {
        let mut report = ValidationError::new();
        let result = ErrorMode::Collect(&mut report).run(|errs| {
            errs.add_error("x", ErrorKind::WrongType);
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(report.param_count(), 1);
    }

    #[test]
    fn test_raise_mode_returns_report() {
        let err = ErrorMode::Raise
            .run(|errs| {
                errs.add_error("x", ErrorKind::WrongType);
                Ok(())
            })
            .unwrap_err();
        let ve = err.validation().unwrap();
        assert!(ve.get_errors("x").contains(ErrorKind::WrongType));

        assert!(ErrorMode::Raise.run(|_| Ok(())).is_ok());
    }

    #[test]
    fn test_faults_propagate_in_both_modes() {
        let mut report = ValidationError::new();
        let err = ErrorMode::Collect(&mut report)
            .run(|_| Err(SchemaFault::MissingDefinitions))
            .unwrap_err();
        assert_eq!(err, ValidateError::Schema(SchemaFault::MissingDefinitions));
    }
}
