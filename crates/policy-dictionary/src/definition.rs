//! # Definition
//!
//! One schema rule for a single parameter name, read from an entry under a
//! dictionary's `definitions` section:
//!
//! ```text
//! definitions: {
//!     color: {
//!         type: "string"
//!         minOccurs: 1
//!         maxOccurs: 1
//!         allowed: { value: "red" }
//!         allowed: { value: "green" }
//!     }
//! }
//! ```
//!
//! A [`Definition`] borrows its entry from the dictionary. Everything that
//! can be checked without a policy (type name, occurrence fields, allowed
//! literals) is checked in [`Definition::new`], so a definition that exists
//! is well formed and validation itself only produces content errors. The
//! one exception is the nested dictionary, which is read when a policy
//! value is walked.
//!
//! ## Validation Rules
//!
//! For a parameter holding `c` values, with `minOccurs = k` and
//! `maxOccurs = m`:
//!
//! | Condition | Kind |
//! |-----------|------|
//! | absent, `k > 0` | `MISSING_REQUIRED` |
//! | `m >= 0` and `c > m` | `TOO_MANY_VALUES` |
//! | `c == 1 < k` | `NOT_AN_ARRAY` |
//! | `1 < c < k` | `ARRAY_TOO_SHORT` |
//! | value kind differs from declared type | `WRONG_TYPE` |
//! | value below `min` or above `max` | `VALUE_OUT_OF_RANGE` |
//! | value not among enumerated values | `VALUE_DISALLOWED` |
//! | unresolved file reference | `NOT_LOADED` |

use std::fmt;

use policy_core::{Policy, PolicyError, ValueArray, ValueType};

use crate::dictionary::Dictionary;
use crate::error::{ErrorMode, SchemaFault, ValidateError};
use crate::keys::{
    ALLOWED, DEFAULT, DESCRIPTION, DICTIONARY, DICTIONARY_FILE, MAX, MAX_OCCURS, MIN, MIN_OCCURS,
    TYPE, VALUE,
};
use crate::kind::{ErrorKind, ErrorKinds};
use crate::report::ValidationError;

/// Range and enumeration constraints over one value kind.
#[derive(Debug, Clone, PartialEq)]
struct Constraint<T> {
    min: Option<T>,
    max: Option<T>,
    values: Vec<T>,
}

impl<T: PartialOrd> Constraint<T> {
    fn check(&self, values: &[T]) -> ErrorKinds {
        let mut kinds = ErrorKinds::OK;
        for v in values {
            let below = self.min.as_ref().is_some_and(|min| v < min);
            let above = self.max.as_ref().is_some_and(|max| max < v);
            if below || above {
                kinds |= ErrorKind::ValueOutOfRange;
            }
            if !self.values.is_empty() && !self.values.contains(v) {
                kinds |= ErrorKind::ValueDisallowed;
            }
        }
        kinds
    }
}

/// The `allowed` set, typed by the kind its literals share.
#[derive(Debug, Clone, PartialEq)]
enum Allowed {
    Bool(Constraint<bool>),
    Int(Constraint<i64>),
    Double(Constraint<f64>),
    String(Constraint<String>),
}

impl Allowed {
    fn check(&self, array: &ValueArray) -> ErrorKinds {
        match (self, array) {
            (Self::Bool(c), ValueArray::Bool(vs)) => c.check(vs),
            (Self::Int(c), ValueArray::Int(vs)) => c.check(vs),
            (Self::Double(c), ValueArray::Double(vs)) => c.check(vs),
            (Self::String(c), ValueArray::String(vs)) => c.check(vs),
            // Only reachable for an untyped definition whose literals are of
            // another kind than the value.
            _ => ErrorKinds::from(ErrorKind::BadValue),
        }
    }
}

/// The schema for one parameter name.
#[derive(Debug, Clone)]
pub struct Definition<'d> {
    name: String,
    prefix: String,
    data: &'d Policy,
    value_type: ValueType,
    min_occurs: i64,
    max_occurs: i64,
    allowed: Option<Allowed>,
    wildcard: bool,
    child_definition: bool,
}

impl<'d> Definition<'d> {
    /// Build the definition for `name` from its dictionary entry.
    ///
    /// # Errors
    ///
    /// A [`SchemaFault`] for an unknown or illegal `type`, a field of the
    /// wrong kind, a `dictionary` on a non-policy type, or an `allowed` set
    /// with duplicate bounds or mistyped literals.
    pub fn new(name: impl Into<String>, data: &'d Policy) -> Result<Self, SchemaFault> {
        let name = name.into();
        let value_type = declared_type(&name, data)?;
        let min_occurs = int_field(&name, data, MIN_OCCURS)?.unwrap_or(0);
        let max_occurs = int_field(&name, data, MAX_OCCURS)?.unwrap_or(-1);
        if let Ok(desc) = data.get_array(DESCRIPTION) {
            if desc.value_type() != ValueType::String {
                return Err(field_type(&name, DESCRIPTION, ValueType::String, desc));
            }
        }
        let nests = data.exists(DICTIONARY) || data.exists(DICTIONARY_FILE);
        if nests && !matches!(value_type, ValueType::Policy | ValueType::Undetermined) {
            return Err(SchemaFault::DictionaryOnNonPolicy {
                name,
                declared: value_type,
            });
        }
        let allowed = match data.get_array(ALLOWED) {
            Err(_) => None,
            Ok(ValueArray::Policy(entries)) => build_allowed(&name, value_type, entries)?,
            Ok(other) => return Err(field_type(&name, ALLOWED, ValueType::Policy, other)),
        };
        tracing::trace!(param = %name, value_type = %value_type, min_occurs, max_occurs, "built definition");
        Ok(Self {
            name,
            prefix: String::new(),
            data,
            value_type,
            min_occurs,
            max_occurs,
            allowed,
            wildcard: false,
            child_definition: false,
        })
    }

    /// Set the error-reporting prefix, returning the definition.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix prepended to every parameter name this definition reports.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    /// Declared type; `Undetermined` accepts any kind.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type.as_str()
    }

    pub fn min_occurs(&self) -> i64 {
        self.min_occurs
    }

    /// Maximum number of values; negative means unbounded.
    pub fn max_occurs(&self) -> i64 {
        self.max_occurs
    }

    /// The declared default values, if any.
    pub fn default(&self) -> Option<&'d ValueArray> {
        self.data.get_array(DEFAULT).ok()
    }

    pub fn description(&self) -> Option<&'d str> {
        self.data.get_string(DESCRIPTION).ok()
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn set_wildcard(&mut self, wildcard: bool) {
        self.wildcard = wildcard;
    }

    /// True when this definition came from a `childDefinition` fallback.
    pub fn is_child_definition(&self) -> bool {
        self.child_definition
    }

    pub fn set_child_definition(&mut self, child_definition: bool) {
        self.child_definition = child_definition;
    }

    /// The dictionary entry this definition reads.
    pub fn data(&self) -> &'d Policy {
        self.data
    }

    /// True when the entry holds a loaded nested dictionary.
    pub fn has_sub_dictionary(&self) -> bool {
        self.data.is_policy(DICTIONARY)
    }

    /// The nested dictionary, prefixed with this definition's full name.
    ///
    /// `Ok(None)` when there is none or it is still a file reference.
    pub fn sub_dictionary(&self) -> Result<Option<Dictionary<'d>>, SchemaFault> {
        self.nested_dictionary(&self.name)
    }

    /// Write the declared defaults into `policy` under `name`, replacing
    /// what is there. A no-op without defaults.
    ///
    /// # Errors
    ///
    /// [`SchemaFault::BoundType`] when the defaults are of another kind than
    /// the declared type.
    pub fn set_default_in(&self, policy: &mut Policy, name: &str) -> Result<(), SchemaFault> {
        let Some(defaults) = self.default() else {
            return Ok(());
        };
        if self.value_type != ValueType::Undetermined && defaults.value_type() != self.value_type {
            return Err(SchemaFault::BoundType {
                name: self.full_name(name),
                bound: DEFAULT,
                expected: self.value_type,
                found: defaults.value_type(),
            });
        }
        policy.set_array(name, defaults.clone())?;
        Ok(())
    }

    /// Check the values stored under `name` in `policy` against this
    /// definition.
    ///
    /// With [`ErrorMode::Collect`] content errors go to the caller's report
    /// and only schema faults are returned. With [`ErrorMode::Raise`] any
    /// content error is returned as [`ValidateError::Invalid`].
    pub fn validate(
        &self,
        policy: &Policy,
        name: &str,
        mode: ErrorMode<'_>,
    ) -> Result<(), ValidateError> {
        mode.run(|errs| self.collect(policy, name, errs, 0))
    }

    pub(crate) fn collect(
        &self,
        policy: &Policy,
        name: &str,
        errs: &mut ValidationError,
        depth: usize,
    ) -> Result<(), SchemaFault> {
        let full = self.full_name(name);
        let array = match policy.get_array(name) {
            Ok(array) => array,
            Err(PolicyError::NameNotFound(_)) => {
                if self.min_occurs > 0 {
                    errs.add_error(full, ErrorKind::MissingRequired);
                }
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if let ValueArray::File(_) = array {
            errs.add_error(full, ErrorKind::NotLoaded);
            return Ok(());
        }

        errs.add_errors(
            full.as_str(),
            self.check_count(array.len()) | self.check_values(array),
        );

        if let ValueArray::Policy(policies) = array {
            self.recurse(name, &full, policies, errs, depth)?;
        }
        Ok(())
    }

    fn check_count(&self, count: usize) -> ErrorKinds {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        let mut kinds = ErrorKinds::OK;
        if self.max_occurs >= 0 && count > self.max_occurs {
            kinds |= ErrorKind::TooManyValues;
        }
        if count < self.min_occurs {
            kinds |= match count {
                0 => ErrorKind::MissingRequired,
                1 => ErrorKind::NotAnArray,
                _ => ErrorKind::ArrayTooShort,
            };
        }
        kinds
    }

    fn check_values(&self, array: &ValueArray) -> ErrorKinds {
        if self.value_type != ValueType::Undetermined && self.value_type != array.value_type() {
            return ErrorKinds::from(ErrorKind::WrongType);
        }
        self.allowed
            .as_ref()
            .map_or(ErrorKinds::OK, |allowed| allowed.check(array))
    }

    fn recurse(
        &self,
        name: &str,
        full: &str,
        policies: &[Policy],
        errs: &mut ValidationError,
        depth: usize,
    ) -> Result<(), SchemaFault> {
        let unloaded = self.data.is_file(DICTIONARY)
            || (!self.data.exists(DICTIONARY) && self.data.exists(DICTIONARY_FILE));
        if unloaded {
            errs.add_error(full, ErrorKind::NotLoaded);
            return Ok(());
        }
        let Some(sub) = self.nested_dictionary(name)? else {
            return Ok(());
        };
        for policy in policies {
            sub.collect(policy, errs, depth + 1)?;
        }
        Ok(())
    }

    fn nested_dictionary(&self, name: &str) -> Result<Option<Dictionary<'d>>, SchemaFault> {
        match self.data.get_array(DICTIONARY) {
            Ok(ValueArray::Policy(dicts)) => match dicts.last() {
                Some(dict) => Ok(Some(
                    Dictionary::borrowed(dict)?.with_prefix(format!("{}.", self.full_name(name))),
                )),
                None => Ok(None),
            },
            Ok(ValueArray::File(_)) | Err(_) => Ok(None),
            Ok(other) => Err(field_type(&self.name, DICTIONARY, ValueType::Policy, other)),
        }
    }

    fn full_name(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }
}

fn field_type(name: &str, field: &'static str, expected: ValueType, found: &ValueArray) -> SchemaFault {
    SchemaFault::FieldType {
        name: name.to_string(),
        field,
        expected,
        found: found.value_type(),
    }
}

fn declared_type(name: &str, data: &Policy) -> Result<ValueType, SchemaFault> {
    let type_name = match data.get_array(TYPE) {
        Err(_) => return Ok(ValueType::Undetermined),
        Ok(ValueArray::String(names)) => match names.last() {
            Some(n) => n,
            None => return Ok(ValueType::Undetermined),
        },
        Ok(other) => return Err(field_type(name, TYPE, ValueType::String, other)),
    };
    match type_name.parse::<ValueType>() {
        Ok(ValueType::File) => Err(SchemaFault::IllegalType {
            name: name.to_string(),
        }),
        Ok(ty) => Ok(ty),
        Err(_) => Err(SchemaFault::UnknownType {
            name: name.to_string(),
            type_name: type_name.clone(),
        }),
    }
}

fn int_field(name: &str, data: &Policy, field: &'static str) -> Result<Option<i64>, SchemaFault> {
    match data.get_array(field) {
        Err(_) => Ok(None),
        Ok(ValueArray::Int(values)) => Ok(values.last().copied()),
        Ok(other) => Err(field_type(name, field, ValueType::Int, other)),
    }
}

/// Kind of the first `min`, `max`, or `value` literal in the set.
fn first_literal_kind(entries: &[Policy]) -> Option<ValueType> {
    entries
        .iter()
        .flat_map(|entry| {
            [MIN, MAX, VALUE]
                .into_iter()
                .filter_map(move |key| entry.get_array(key).ok())
        })
        .map(ValueArray::value_type)
        .next()
}

fn build_allowed(
    name: &str,
    declared: ValueType,
    entries: &[Policy],
) -> Result<Option<Allowed>, SchemaFault> {
    let Some(first) = first_literal_kind(entries) else {
        return Ok(None);
    };
    let kind = match declared {
        ValueType::Undetermined => first,
        ty => ty,
    };
    let allowed = match kind {
        ValueType::Bool => Allowed::Bool(gather(name, kind, entries, ValueArray::as_bools)?),
        ValueType::Int => Allowed::Int(gather(name, kind, entries, ValueArray::as_ints)?),
        ValueType::Double => Allowed::Double(gather(name, kind, entries, ValueArray::as_doubles)?),
        ValueType::String => Allowed::String(gather(name, kind, entries, ValueArray::as_strings)?),
        ValueType::Policy | ValueType::File | ValueType::Undetermined => {
            return Err(SchemaFault::UncomparableType {
                name: name.to_string(),
                value_type: kind,
            })
        }
    };
    Ok(Some(allowed))
}

fn gather<T: Clone + fmt::Display>(
    name: &str,
    expected: ValueType,
    entries: &[Policy],
    pick: fn(&ValueArray) -> Option<&[T]>,
) -> Result<Constraint<T>, SchemaFault> {
    let literals = |entry: &Policy, bound: &'static str| -> Result<Vec<T>, SchemaFault> {
        match entry.get_array(bound) {
            Err(_) => Ok(Vec::new()),
            Ok(array) => pick(array)
                .map(<[T]>::to_vec)
                .ok_or_else(|| SchemaFault::BoundType {
                    name: name.to_string(),
                    bound,
                    expected,
                    found: array.value_type(),
                }),
        }
    };

    let mut constraint: Constraint<T> = Constraint {
        min: None,
        max: None,
        values: Vec::new(),
    };
    for entry in entries {
        for (bound, slot) in [(MIN, &mut constraint.min), (MAX, &mut constraint.max)] {
            for v in literals(entry, bound)? {
                if let Some(existing) = slot {
                    return Err(SchemaFault::DuplicateBound {
                        name: name.to_string(),
                        bound,
                        existing: existing.to_string(),
                    });
                }
                *slot = Some(v);
            }
        }
        constraint.values.extend(literals(entry, VALUE)?);
    }
    Ok(constraint)
}
