//! # policy-dictionary: Schema Validation for Policy Trees
//!
//! A [`Dictionary`] is a policy whose `definitions` section describes the
//! parameters another policy may hold. Validating a policy against it
//! checks, for every parameter:
//!
//! - that a definition exists for the name,
//! - the number of values against `minOccurs` / `maxOccurs`,
//! - the value kind against the declared `type`,
//! - each value against the `allowed` range and enumeration,
//!
//! and recurses into sub-policies through nested dictionaries. Failures are
//! aggregated per full parameter name in a [`ValidationError`].
//!
//! ## Two Kinds of Failure
//!
//! A malformed dictionary is a [`SchemaFault`] and stops validation. A
//! non-conforming policy produces content errors, which are either
//! collected into the caller's report or returned, as chosen by
//! [`ErrorMode`].
//!
//! ```
//! use policy_core::Policy;
//! use policy_dictionary::{Dictionary, ErrorKind, ErrorMode, ValidationError};
//!
//! let mut schema = Policy::new();
//! schema.set("definitions.retries.type", "int").unwrap();
//! schema.set("definitions.retries.minOccurs", 1).unwrap();
//! let dict = Dictionary::new(schema).unwrap();
//!
//! let mut errs = ValidationError::new();
//! dict.validate(&Policy::new(), ErrorMode::Collect(&mut errs)).unwrap();
//! assert!(errs.get_errors("retries").contains(ErrorKind::MissingRequired));
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `policy-core` within the workspace.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod definition;
pub mod dictionary;
pub mod error;
pub mod keys;
pub mod kind;
pub mod report;

pub use definition::Definition;
pub use dictionary::{Dictionary, MAX_NESTING_DEPTH};
pub use error::{ErrorMode, SchemaFault, ValidateError};
pub use kind::{ErrorKind, ErrorKinds};
pub use report::{ParamErrors, ValidationError};
