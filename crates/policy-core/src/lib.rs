//! # policy-core: Hierarchical Typed Configuration Trees
//!
//! This crate defines the value model that every other crate in the
//! workspace operates on. A [`Policy`] maps simple names to homogeneous,
//! non-empty arrays of values; hierarchical names (`a.b.c`) are resolved by
//! walking nested sub-policies.
//!
//! ## Key Design Principles
//!
//! 1. **Closed value variants.** [`Value`] and [`ValueArray`] are enums over
//!    the six value kinds. Every consumer matches exhaustively, so adding a
//!    kind is a compile error everywhere it matters.
//!
//! 2. **Homogeneous arrays by construction.** A [`ValueArray`] holds one
//!    typed vector, so a name can never map to values of mixed kinds.
//!
//! 3. **Trees, not graphs.** A sub-policy is owned by the array that holds
//!    it. Cycles cannot be expressed.
//!
//! 4. **I/O at the edge.** File references are resolved through the
//!    caller-supplied [`PolicyLoader`]; this crate never touches the
//!    filesystem itself.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `policy-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod file;
pub mod name;
pub mod policy;
pub mod value;

pub use error::{PolicyError, PolicyResult};
pub use file::{PolicyFile, PolicyLoader, MAX_FILE_PASSES};
pub use name::{split_name, SEPARATOR};
pub use policy::{NameScope, Policy};
pub use value::{Value, ValueArray, ValueType};
