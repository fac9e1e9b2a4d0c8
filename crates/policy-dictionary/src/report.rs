//! # Validation Report
//!
//! [`ValidationError`] accumulates content errors across a whole validation
//! run. Entries are keyed by full parameter name and kept in the order the
//! names were first reported; reporting a name again unions its kinds.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::kind::{ErrorKind, ErrorKinds};

/// The kinds reported for one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamErrors {
    /// Full parameter name, including any dictionary prefix.
    pub name: String,
    pub kinds: ErrorKinds,
}

/// Aggregated, per-parameter report of content-validation failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationError {
    entries: Vec<ParamErrors>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ValidationError {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `kind` against `name`. Adding [`ErrorKind::Ok`] is a no-op.
    pub fn add_error(&mut self, name: impl Into<String>, kind: ErrorKind) {
        self.add_errors(name, ErrorKinds::from(kind));
    }

    /// Record every kind in `kinds` against `name`.
    pub fn add_errors(&mut self, name: impl Into<String>, kinds: ErrorKinds) {
        if kinds.is_ok() {
            return;
        }
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].kinds |= kinds,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push(ParamErrors { name, kinds });
            }
        }
    }

    /// Kinds recorded for `name`; `OK` when none.
    pub fn get_errors(&self, name: &str) -> ErrorKinds {
        self.index
            .get(name)
            .map_or(ErrorKinds::OK, |&i| self.entries[i].kinds)
    }

    /// Union of the kinds recorded for every parameter.
    pub fn errors(&self) -> ErrorKinds {
        self.entries
            .iter()
            .fold(ErrorKinds::OK, |acc, e| acc | e.kinds)
    }

    /// Number of parameters with at least one error.
    pub fn param_count(&self) -> usize {
        self.entries.len()
    }

    /// Parameter names in first-reported order.
    pub fn param_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamErrors> + '_ {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold every entry of `other` into this report.
    pub fn merge(&mut self, other: ValidationError) {
        for entry in other.entries {
            self.add_errors(entry.name, entry.kinds);
        }
    }

    /// One line per parameter: `<prefix><name>: <msg>[; <msg>...]`.
    pub fn describe(&self, prefix: &str) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(prefix);
            out.push_str(&entry.name);
            out.push_str(": ");
            out.push_str(&entry.kinds.describe());
            out.push('\n');
        }
        out
    }
}

impl PartialEq for ValidationError {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Validation error: no errors")
        } else {
            write!(f, "Validation error: \n{}", self.describe("  * "))
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let ve = ValidationError::new();
        assert!(ve.is_empty());
        assert_eq!(ve.param_count(), 0);
        assert!(ve.errors().is_ok());
        assert!(ve.get_errors("anything").is_ok());
        assert_eq!(ve.to_string(), "Validation error: no errors");
    }

    #[test]
    fn test_repeat_addition_unions_kinds() {
        let mut ve = ValidationError::new();
        ve.add_error("a", ErrorKind::WrongType);
        ve.add_error("b", ErrorKind::UnknownName);
        ve.add_error("a", ErrorKind::ValueOutOfRange);
        ve.add_error("a", ErrorKind::WrongType);

        assert_eq!(ve.param_count(), 2);
        assert_eq!(ve.param_names(), vec!["a", "b"]);
        let a = ve.get_errors("a");
        assert!(a.contains(ErrorKind::WrongType));
        assert!(a.contains(ErrorKind::ValueOutOfRange));
        assert_eq!(a.len(), 2);
        assert_eq!(ve.errors().len(), 3);
    }

    #[test]
    fn test_adding_ok_records_nothing() {
        let mut ve = ValidationError::new();
        ve.add_error("a", ErrorKind::Ok);
        assert!(ve.is_empty());
    }

    #[test]
    fn test_describe_and_display() {
        let mut ve = ValidationError::new();
        ve.add_error("zeta", ErrorKind::MissingRequired);
        ve.add_error("alpha", ErrorKind::WrongType);
        ve.add_error("alpha", ErrorKind::TooManyValues);

        assert_eq!(
            ve.describe("- "),
            "- zeta: no value available for required parameter\n\
             - alpha: value has the incorrect type; too many values provided for parameter\n"
        );
        assert_eq!(
            ve.to_string(),
            "Validation error: \n  * zeta: no value available for required parameter\n  \
             * alpha: value has the incorrect type; too many values provided for parameter\n"
        );
    }

    #[test]
    fn test_merge() {
        let mut a = ValidationError::new();
        a.add_error("x", ErrorKind::WrongType);
        let mut b = ValidationError::new();
        b.add_error("x", ErrorKind::BadValue);
        b.add_error("y", ErrorKind::NotLoaded);
        a.merge(b);
        assert_eq!(a.param_names(), vec!["x", "y"]);
        assert!(a.get_errors("x").contains(ErrorKind::BadValue));
    }

    #[test]
    fn test_serialize_entries_only() {
        let mut ve = ValidationError::new();
        ve.add_error("p", ErrorKind::WrongType);
        let json = serde_json::to_value(&ve).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"entries": [{"name": "p", "kinds": 1}]})
        );
    }
}
