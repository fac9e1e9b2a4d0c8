//! # Validation Error Kinds
//!
//! The fixed set of content-validation failures and their messages. Each
//! non-`Ok` kind owns one bit, so several kinds can be reported for the
//! same parameter in an [`ErrorKinds`] set.
//!
//! The kind-to-message mapping is an exhaustive `match` evaluated at
//! compile time. There is no table to populate and nothing to synchronize.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// One kind of content-validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No error.
    Ok,
    /// A value's kind differs from the declared type.
    WrongType,
    /// A required parameter has no value.
    MissingRequired,
    /// A single value where several are required.
    NotAnArray,
    /// Several values, but fewer than required.
    ArrayTooShort,
    TooFewValues,
    /// More values than `maxOccurs` permits.
    TooManyValues,
    WrongOccurrenceCount,
    /// A value outside the enumerated set.
    ValueDisallowed,
    /// A value below the minimum or above the maximum.
    ValueOutOfRange,
    /// A value that cannot be compared against the constraints.
    BadValue,
    /// A parameter with no matching definition.
    UnknownName,
    BadDefinition,
    /// A file reference that was never resolved.
    NotLoaded,
    UnknownError,
}

impl ErrorKind {
    /// Returns all kinds in bit order, `Ok` first.
    pub fn all_kinds() -> &'static [ErrorKind] {
        &[
            Self::Ok,
            Self::WrongType,
            Self::MissingRequired,
            Self::NotAnArray,
            Self::ArrayTooShort,
            Self::TooFewValues,
            Self::TooManyValues,
            Self::WrongOccurrenceCount,
            Self::ValueDisallowed,
            Self::ValueOutOfRange,
            Self::BadValue,
            Self::UnknownName,
            Self::BadDefinition,
            Self::NotLoaded,
            Self::UnknownError,
        ]
    }

    /// The bit this kind occupies in an [`ErrorKinds`] set. `Ok` is 0.
    pub const fn bit(self) -> u16 {
        match self {
            Self::Ok => 0,
            Self::WrongType => 1,
            Self::MissingRequired => 1 << 1,
            Self::NotAnArray => 1 << 2,
            Self::ArrayTooShort => 1 << 3,
            Self::TooFewValues => 1 << 4,
            Self::TooManyValues => 1 << 5,
            Self::WrongOccurrenceCount => 1 << 6,
            Self::ValueDisallowed => 1 << 7,
            Self::ValueOutOfRange => 1 << 8,
            Self::BadValue => 1 << 9,
            Self::UnknownName => 1 << 10,
            Self::BadDefinition => 1 << 11,
            Self::NotLoaded => 1 << 12,
            Self::UnknownError => 1 << 13,
        }
    }

    /// The fixed human-readable message for this kind.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Ok => "",
            Self::WrongType => "value has the incorrect type",
            Self::MissingRequired => "no value available for required parameter",
            Self::NotAnArray => "value is not an array as required",
            Self::ArrayTooShort => "insufficient number of array values",
            Self::TooFewValues => "not enough values for parameter",
            Self::TooManyValues => "too many values provided for parameter",
            Self::WrongOccurrenceCount => "incorrect number of values for parameter",
            Self::ValueDisallowed => "value is not among defined set",
            Self::ValueOutOfRange => "value is out of range",
            Self::BadValue => "illegal value",
            Self::UnknownName => "parameter name is unknown",
            Self::BadDefinition => "malformed definition",
            Self::NotLoaded => {
                "file not loaded -- call Policy.loadPolicyFiles() before validating"
            }
            Self::UnknownError => "unknown error",
        }
    }

    /// The SCREAMING_SNAKE_CASE identifier, matching the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::WrongType => "WRONG_TYPE",
            Self::MissingRequired => "MISSING_REQUIRED",
            Self::NotAnArray => "NOT_AN_ARRAY",
            Self::ArrayTooShort => "ARRAY_TOO_SHORT",
            Self::TooFewValues => "TOO_FEW_VALUES",
            Self::TooManyValues => "TOO_MANY_VALUES",
            Self::WrongOccurrenceCount => "WRONG_OCCURRENCE_COUNT",
            Self::ValueDisallowed => "VALUE_DISALLOWED",
            Self::ValueOutOfRange => "VALUE_OUT_OF_RANGE",
            Self::BadValue => "BAD_VALUE",
            Self::UnknownName => "UNKNOWN_NAME",
            Self::BadDefinition => "BAD_DEFINITION",
            Self::NotLoaded => "NOT_LOADED",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`ErrorKind`]s reported for one parameter.
///
/// The empty set is `OK`.
///
/// Serialized as the raw bits; unknown bits are dropped when read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct ErrorKinds(u16);

impl From<u16> for ErrorKinds {
    fn from(bits: u16) -> Self {
        Self::from_bits(bits)
    }
}

impl From<ErrorKinds> for u16 {
    fn from(kinds: ErrorKinds) -> Self {
        kinds.0
    }
}

impl ErrorKinds {
    /// The empty set.
    pub const OK: Self = Self(0);

    /// Build a set from raw bits, dropping any bit no kind occupies.
    pub fn from_bits(bits: u16) -> Self {
        let known = ErrorKind::all_kinds()
            .iter()
            .fold(0u16, |acc, k| acc | k.bit());
        Self(bits & known)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True when no kind is set.
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// True if `kind` is in the set. `ErrorKind::Ok` is contained only in
    /// the empty set.
    pub const fn contains(self, kind: ErrorKind) -> bool {
        match kind {
            ErrorKind::Ok => self.0 == 0,
            other => self.0 & other.bit() != 0,
        }
    }

    pub fn insert(&mut self, kind: ErrorKind) {
        self.0 |= kind.bit();
    }

    /// Number of kinds in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.is_ok()
    }

    /// The kinds in the set, in bit order.
    pub fn iter(self) -> impl Iterator<Item = ErrorKind> {
        ErrorKind::all_kinds()
            .iter()
            .copied()
            .filter(move |k| *k != ErrorKind::Ok && self.0 & k.bit() != 0)
    }

    /// Messages for every kind in the set, joined with `"; "`.
    pub fn describe(self) -> String {
        if self.is_ok() {
            return ErrorKind::Ok.message().to_string();
        }
        self.iter()
            .map(ErrorKind::message)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl From<ErrorKind> for ErrorKinds {
    fn from(kind: ErrorKind) -> Self {
        Self(kind.bit())
    }
}

impl BitOr for ErrorKinds {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<ErrorKind> for ErrorKinds {
    type Output = Self;

    fn bitor(self, rhs: ErrorKind) -> Self {
        Self(self.0 | rhs.bit())
    }
}

impl BitOrAssign for ErrorKinds {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitOrAssign<ErrorKind> for ErrorKinds {
    fn bitor_assign(&mut self, rhs: ErrorKind) {
        self.0 |= rhs.bit();
    }
}

impl fmt::Display for ErrorKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return f.write_str(ErrorKind::Ok.as_str());
        }
        for (i, kind) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(kind.as_str())?;
        }
        Ok(())
    }
}
