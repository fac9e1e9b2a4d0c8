//! # Value Model
//!
//! Defines the closed set of value kinds a policy parameter can hold and
//! the homogeneous array container stored under every name.
//!
//! ## Invariant
//!
//! Every name maps to a non-empty [`ValueArray`], and all values in that
//! array share one kind. Scalars are length-1 arrays. The invariant is
//! carried by the type: a `ValueArray` is one typed vector, never a vector
//! of mixed values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PolicyError;
use crate::file::PolicyFile;
use crate::policy::Policy;

/// The kind of value stored under a parameter name.
///
/// `Undetermined` stands for "no value present" when reading a policy and
/// for "any type accepted" when read from a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// No value, or no constraint on the kind.
    Undetermined,
    /// Boolean flag.
    Bool,
    /// Signed integer.
    Int,
    /// Floating-point number.
    Double,
    /// UTF-8 string.
    String,
    /// Nested policy tree.
    Policy,
    /// Unresolved reference to a policy file.
    File,
}

impl ValueType {
    /// Returns every concrete value kind, in declaration order.
    pub fn all_types() -> &'static [ValueType] {
        &[
            Self::Bool,
            Self::Int,
            Self::Double,
            Self::String,
            Self::Policy,
            Self::File,
        ]
    }

    /// Returns the canonical type name used in schemas and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undetermined => "undefined",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Double => "double",
            Self::String => "string",
            Self::Policy => "Policy",
            Self::File => "PolicyFile",
        }
    }

    /// True for the kinds that can be ordered and enumerated.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Double | Self::String)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = PolicyError;

    /// Parse a type name as written in a schema `type` field.
    ///
    /// Accepts the canonical names from [`ValueType::as_str()`] plus a few
    /// common aliases. Matching is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "undefined" => Ok(Self::Undetermined),
            "bool" | "boolean" => Ok(Self::Bool),
            "int" | "integer" => Ok(Self::Int),
            "double" | "float" => Ok(Self::Double),
            "string" => Ok(Self::String),
            "Policy" | "policy" => Ok(Self::Policy),
            "PolicyFile" | "file" => Ok(Self::File),
            other => Err(PolicyError::BadTypeName(other.to_string())),
        }
    }
}

/// A single policy value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Policy(Policy),
    File(PolicyFile),
}

impl Value {
    /// Returns the kind of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Double(_) => ValueType::Double,
            Self::String(_) => ValueType::String,
            Self::Policy(_) => ValueType::Policy,
            Self::File(_) => ValueType::File,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Policy> for Value {
    fn from(v: Policy) -> Self {
        Self::Policy(v)
    }
}

impl From<PolicyFile> for Value {
    fn from(v: PolicyFile) -> Self {
        Self::File(v)
    }
}

/// The non-empty, homogeneous array of values stored under one name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "RawArray")]
pub enum ValueArray {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Double(Vec<f64>),
    String(Vec<String>),
    Policy(Vec<Policy>),
    File(Vec<PolicyFile>),
}

/// Serialized form of a [`ValueArray`], before the non-empty check.
#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RawArray {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Double(Vec<f64>),
    String(Vec<String>),
    Policy(Vec<Policy>),
    File(Vec<PolicyFile>),
}

impl RawArray {
    /// Check the array destined for `name`.
    pub(crate) fn into_array(self, name: &str) -> Result<ValueArray, PolicyError> {
        let array = match self {
            Self::Bool(a) => ValueArray::Bool(a),
            Self::Int(a) => ValueArray::Int(a),
            Self::Double(a) => ValueArray::Double(a),
            Self::String(a) => ValueArray::String(a),
            Self::Policy(a) => ValueArray::Policy(a),
            Self::File(a) => ValueArray::File(a),
        };
        if array.is_empty() {
            return Err(PolicyError::EmptyArray(name.to_string()));
        }
        Ok(array)
    }
}

impl TryFrom<RawArray> for ValueArray {
    type Error = PolicyError;

    fn try_from(raw: RawArray) -> Result<Self, PolicyError> {
        raw.into_array("")
    }
}

impl ValueArray {
    /// Wrap a single value as a length-1 array.
    pub fn single(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Bool(v) => Self::Bool(vec![v]),
            Value::Int(v) => Self::Int(vec![v]),
            Value::Double(v) => Self::Double(vec![v]),
            Value::String(v) => Self::String(vec![v]),
            Value::Policy(v) => Self::Policy(vec![v]),
            Value::File(v) => Self::File(vec![v]),
        }
    }

    /// Build an array from a sequence of values destined for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::EmptyArray`] for an empty sequence and
    /// [`PolicyError::TypeError`] when the values do not share one kind.
    pub fn from_values(
        name: &str,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Self, PolicyError> {
        let mut iter = values.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| PolicyError::EmptyArray(name.to_string()))?;
        let mut array = Self::single(first);
        let expected = array.value_type();
        for value in iter {
            array.push(value).map_err(|rejected| {
                PolicyError::type_error(name, expected, rejected.value_type())
            })?;
        }
        Ok(array)
    }

    /// Append a value of the same kind.
    ///
    /// On a kind mismatch the array is left untouched and the rejected
    /// value is handed back.
    pub fn push(&mut self, value: Value) -> Result<(), Value> {
        match (self, value) {
            (Self::Bool(a), Value::Bool(v)) => a.push(v),
            (Self::Int(a), Value::Int(v)) => a.push(v),
            (Self::Double(a), Value::Double(v)) => a.push(v),
            (Self::String(a), Value::String(v)) => a.push(v),
            (Self::Policy(a), Value::Policy(v)) => a.push(v),
            (Self::File(a), Value::File(v)) => a.push(v),
            (_, rejected) => return Err(rejected),
        }
        Ok(())
    }

    /// Returns the kind shared by every element.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Double(_) => ValueType::Double,
            Self::String(_) => ValueType::String,
            Self::Policy(_) => ValueType::Policy,
            Self::File(_) => ValueType::File,
        }
    }

    /// Number of values (the occurrence count).
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(a) => a.len(),
            Self::Int(a) => a.len(),
            Self::Double(a) => a.len(),
            Self::String(a) => a.len(),
            Self::Policy(a) => a.len(),
            Self::File(a) => a.len(),
        }
    }

    /// True when the array holds no values. Arrays stored in a [`Policy`]
    /// are never empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone out the value at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Self::Bool(a) => a.get(index).copied().map(Value::Bool),
            Self::Int(a) => a.get(index).copied().map(Value::Int),
            Self::Double(a) => a.get(index).copied().map(Value::Double),
            Self::String(a) => a.get(index).cloned().map(Value::String),
            Self::Policy(a) => a.get(index).cloned().map(Value::Policy),
            Self::File(a) => a.get(index).cloned().map(Value::File),
        }
    }

    /// Clone out the last value, which is what scalar getters return.
    pub fn last(&self) -> Option<Value> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Clone out every value in order.
    pub fn values(&self) -> Vec<Value> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    pub fn as_bools(&self) -> Option<&[bool]> {
        match self {
            Self::Bool(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            Self::Int(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_doubles(&self) -> Option<&[f64]> {
        match self {
            Self::Double(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::String(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_policies(&self) -> Option<&[Policy]> {
        match self {
            Self::Policy(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&[PolicyFile]> {
        match self {
            Self::File(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for ValueArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }
        match self {
            Self::Bool(a) => join(f, a),
            Self::Int(a) => join(f, a),
            Self::Double(a) => join(f, a),
            Self::String(a) => {
                for (i, s) in a.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{s:?}")?;
                }
                Ok(())
            }
            Self::Policy(a) => write!(f, "<{} Policy value(s)>", a.len()),
            Self::File(a) => join(f, a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_roundtrip() {
        for ty in ValueType::all_types() {
            let parsed: ValueType = ty.as_str().parse().unwrap();
            assert_eq!(*ty, parsed);
        }
        assert_eq!("undefined".parse::<ValueType>().unwrap(), ValueType::Undetermined);
    }

    #[test]
    fn test_type_name_aliases() {
        assert_eq!("integer".parse::<ValueType>().unwrap(), ValueType::Int);
        assert_eq!("float".parse::<ValueType>().unwrap(), ValueType::Double);
        assert_eq!("policy".parse::<ValueType>().unwrap(), ValueType::Policy);
    }

    #[test]
    fn test_type_name_invalid() {
        assert!(matches!(
            "INT".parse::<ValueType>(),
            Err(PolicyError::BadTypeName(_))
        ));
        assert!("".parse::<ValueType>().is_err());
    }

    #[test]
    fn test_scalar_kinds() {
        assert!(ValueType::Int.is_scalar());
        assert!(ValueType::String.is_scalar());
        assert!(!ValueType::Policy.is_scalar());
        assert!(!ValueType::File.is_scalar());
        assert!(!ValueType::Undetermined.is_scalar());
    }

    #[test]
    fn test_push_same_kind() {
        let mut a = ValueArray::single(1);
        a.push(Value::Int(2)).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.as_ints(), Some(&[1i64, 2][..]));
        assert_eq!(a.last(), Some(Value::Int(2)));
    }

    #[test]
    fn test_push_rejects_other_kind() {
        let mut a = ValueArray::single("x");
        let rejected = a.push(Value::Bool(true)).unwrap_err();
        assert_eq!(rejected, Value::Bool(true));
        assert_eq!(a.len(), 1);
        assert_eq!(a.value_type(), ValueType::String);
    }

    #[test]
    fn test_from_values_errors() {
        let err = ValueArray::from_values("p", Vec::<Value>::new()).unwrap_err();
        assert_eq!(err, PolicyError::EmptyArray("p".into()));

        let err = ValueArray::from_values("p", vec![Value::Int(1), Value::Double(2.0)]).unwrap_err();
        assert_eq!(
            err,
            PolicyError::type_error("p", ValueType::Int, ValueType::Double)
        );
    }

    #[test]
    fn test_deserialize_rejects_empty_array() {
        let err = serde_json::from_str::<ValueArray>(r#"{"int": []}"#).unwrap_err();
        assert!(err.to_string().contains("empty array"), "{err}");
        let array: ValueArray = serde_json::from_str(r#"{"int": [4]}"#).unwrap();
        assert_eq!(array, ValueArray::Int(vec![4]));
    }

    #[test]
    fn test_display() {
        assert_eq!(ValueArray::Int(vec![1, 2, 3]).to_string(), "1, 2, 3");
        assert_eq!(
            ValueArray::String(vec!["a".into(), "b c".into()]).to_string(),
            "\"a\", \"b c\""
        );
    }
}
