//! # Policy Tree
//!
//! A [`Policy`] maps simple names to [`ValueArray`]s. Hierarchical names
//! are resolved by walking sub-policies: `a.b.c` reads `c` from the policy
//! stored under `b`, which is itself stored under `a`.
//!
//! ## Access Rules
//!
//! - Scalar getters return the **last** element of an array.
//! - When a name holds several sub-policies, hierarchical access walks the
//!   last one.
//! - `set` replaces the whole array (erasing its kind); `add` appends and
//!   refuses a different kind.
//! - Missing intermediate segments are created by `set`/`add` as empty
//!   sub-policies.
//!
//! Names are kept in a sorted map, so enumeration order is deterministic.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::error::{PolicyError, PolicyResult};
use crate::file::{PolicyFile, PolicyLoader, MAX_FILE_PASSES};
use crate::name::{join_name, split_name};
use crate::value::{RawArray, Value, ValueArray, ValueType};

/// Key whose presence marks a policy as a dictionary.
const DEFINITIONS_KEY: &str = "definitions";

/// How deep name enumeration reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScope {
    /// Only names stored at this level.
    TopLevel,
    /// Every hierarchical name, descending into all sub-policies.
    Recursive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameFilter {
    All,
    Params,
    Policies,
    Files,
}

impl NameFilter {
    fn accepts(self, ty: ValueType) -> bool {
        match self {
            Self::All => true,
            Self::Params => ty.is_scalar(),
            Self::Policies => ty == ValueType::Policy,
            Self::Files => ty == ValueType::File,
        }
    }
}

/// A hierarchical tree of typed, multi-valued parameters.
///
/// Deserializing checks the same invariants as the mutators: every key is
/// a simple name and every array holds at least one value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, RawArray>")]
pub struct Policy {
    params: BTreeMap<String, ValueArray>,
}

impl Serialize for Policy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.params.serialize(serializer)
    }
}

impl TryFrom<BTreeMap<String, RawArray>> for Policy {
    type Error = PolicyError;

    fn try_from(raw: BTreeMap<String, RawArray>) -> PolicyResult<Self> {
        let mut params = BTreeMap::new();
        for (name, array) in raw {
            if split_name(&name)?.len() != 1 {
                return Err(PolicyError::BadName(name));
            }
            let array = array.into_array(&name)?;
            params.insert(name, array);
        }
        Ok(Self { params })
    }
}

impl Policy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------

    /// Walk to the level holding the last segment of `name`.
    ///
    /// Returns `Ok(None)` when an intermediate segment is missing or is not
    /// a sub-policy.
    fn locate<'a, 'n>(&'a self, name: &'n str) -> PolicyResult<Option<(&'a Policy, &'n str)>> {
        let segments = split_name(name)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(PolicyError::BadName(name.to_string()));
        };
        let mut level = self;
        for segment in parents {
            match level.params.get(*segment) {
                Some(ValueArray::Policy(policies)) => match policies.last() {
                    Some(p) => level = p,
                    None => return Ok(None),
                },
                _ => return Ok(None),
            }
        }
        Ok(Some((level, *leaf)))
    }

    /// Mutable walk to the level holding the last segment of `name`,
    /// creating empty sub-policies for missing intermediate segments.
    fn locate_mut_creating(&mut self, name: &str) -> PolicyResult<(&mut Policy, String)> {
        let segments = split_name(name)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(PolicyError::BadName(name.to_string()));
        };
        let mut level = self;
        let mut walked = String::new();
        for segment in parents {
            walked = join_name(&walked, segment);
            let array = level
                .params
                .entry((*segment).to_string())
                .or_insert_with(|| ValueArray::Policy(vec![Policy::new()]));
            level = match array {
                ValueArray::Policy(policies) => {
                    if policies.is_empty() {
                        policies.push(Policy::new());
                    }
                    match policies.last_mut() {
                        Some(p) => p,
                        None => return Err(PolicyError::NameNotFound(walked)),
                    }
                }
                other => {
                    return Err(PolicyError::type_error(
                        walked,
                        ValueType::Policy,
                        other.value_type(),
                    ))
                }
            };
        }
        Ok((level, (*leaf).to_string()))
    }

    /// Mutable walk without creating anything.
    fn locate_mut(&mut self, name: &str) -> PolicyResult<Option<(&mut Policy, String)>> {
        let segments = split_name(name)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(PolicyError::BadName(name.to_string()));
        };
        let mut level = self;
        for segment in parents {
            level = match level.params.get_mut(*segment) {
                Some(ValueArray::Policy(policies)) => match policies.last_mut() {
                    Some(p) => p,
                    None => return Ok(None),
                },
                _ => return Ok(None),
            };
        }
        Ok(Some((level, (*leaf).to_string())))
    }

    /// The array stored under `name`.
    ///
    /// # Errors
    ///
    /// [`PolicyError::BadName`] for malformed names and
    /// [`PolicyError::NameNotFound`] when nothing is stored there.
    pub fn get_array(&self, name: &str) -> PolicyResult<&ValueArray> {
        self.locate(name)?
            .and_then(|(level, leaf)| level.params.get(leaf))
            .ok_or_else(|| PolicyError::NameNotFound(name.to_string()))
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: ValueType,
        pick: fn(&ValueArray) -> Option<&[T]>,
    ) -> PolicyResult<&'a [T]> {
        let array = self.get_array(name)?;
        pick(array)
            .ok_or_else(|| PolicyError::type_error(name, expected, array.value_type()))
    }

    fn last_of<'a, T>(
        &'a self,
        name: &str,
        expected: ValueType,
        pick: fn(&ValueArray) -> Option<&[T]>,
    ) -> PolicyResult<&'a T> {
        self.typed(name, expected, pick)?
            .last()
            .ok_or_else(|| PolicyError::NameNotFound(name.to_string()))
    }

    /// True if any value is stored under `name`. Malformed names never exist.
    pub fn exists(&self, name: &str) -> bool {
        self.get_array(name).is_ok()
    }

    /// Number of values stored under `name`; 0 when absent.
    pub fn value_count(&self, name: &str) -> usize {
        self.get_array(name).map_or(0, ValueArray::len)
    }

    /// Kind of the values under `name`; `Undetermined` when absent.
    pub fn value_type(&self, name: &str) -> ValueType {
        self.get_array(name)
            .map_or(ValueType::Undetermined, ValueArray::value_type)
    }

    /// Type name of the values under `name`.
    pub fn type_name(&self, name: &str) -> &'static str {
        self.value_type(name).as_str()
    }

    /// True when more than one value is stored under `name`.
    pub fn is_array(&self, name: &str) -> bool {
        self.value_count(name) > 1
    }

    pub fn is_bool(&self, name: &str) -> bool {
        self.value_type(name) == ValueType::Bool
    }

    pub fn is_int(&self, name: &str) -> bool {
        self.value_type(name) == ValueType::Int
    }

    pub fn is_double(&self, name: &str) -> bool {
        self.value_type(name) == ValueType::Double
    }

    pub fn is_string(&self, name: &str) -> bool {
        self.value_type(name) == ValueType::String
    }

    pub fn is_policy(&self, name: &str) -> bool {
        self.value_type(name) == ValueType::Policy
    }

    pub fn is_file(&self, name: &str) -> bool {
        self.value_type(name) == ValueType::File
    }

    /// True if this policy carries a `definitions` section.
    pub fn is_dictionary(&self) -> bool {
        self.exists(DEFINITIONS_KEY)
    }

    /// Last value under `name`, cloned.
    pub fn get_value(&self, name: &str) -> PolicyResult<Value> {
        self.get_array(name)?
            .last()
            .ok_or_else(|| PolicyError::NameNotFound(name.to_string()))
    }

    pub fn get_bool(&self, name: &str) -> PolicyResult<bool> {
        self.last_of(name, ValueType::Bool, ValueArray::as_bools).copied()
    }

    pub fn get_int(&self, name: &str) -> PolicyResult<i64> {
        self.last_of(name, ValueType::Int, ValueArray::as_ints).copied()
    }

    pub fn get_double(&self, name: &str) -> PolicyResult<f64> {
        self.last_of(name, ValueType::Double, ValueArray::as_doubles).copied()
    }

    pub fn get_string(&self, name: &str) -> PolicyResult<&str> {
        self.last_of(name, ValueType::String, ValueArray::as_strings)
            .map(String::as_str)
    }

    pub fn get_policy(&self, name: &str) -> PolicyResult<&Policy> {
        self.last_of(name, ValueType::Policy, ValueArray::as_policies)
    }

    pub fn get_file(&self, name: &str) -> PolicyResult<&PolicyFile> {
        self.last_of(name, ValueType::File, ValueArray::as_files)
    }

    pub fn get_bool_array(&self, name: &str) -> PolicyResult<&[bool]> {
        self.typed(name, ValueType::Bool, ValueArray::as_bools)
    }

    pub fn get_int_array(&self, name: &str) -> PolicyResult<&[i64]> {
        self.typed(name, ValueType::Int, ValueArray::as_ints)
    }

    pub fn get_double_array(&self, name: &str) -> PolicyResult<&[f64]> {
        self.typed(name, ValueType::Double, ValueArray::as_doubles)
    }

    pub fn get_string_array(&self, name: &str) -> PolicyResult<&[String]> {
        self.typed(name, ValueType::String, ValueArray::as_strings)
    }

    pub fn get_policy_array(&self, name: &str) -> PolicyResult<&[Policy]> {
        self.typed(name, ValueType::Policy, ValueArray::as_policies)
    }

    pub fn get_file_array(&self, name: &str) -> PolicyResult<&[PolicyFile]> {
        self.typed(name, ValueType::File, ValueArray::as_files)
    }

    /// Mutable access to the last sub-policy under `name`.
    pub fn get_policy_mut(&mut self, name: &str) -> PolicyResult<&mut Policy> {
        let (level, leaf) = self
            .locate_mut(name)?
            .ok_or_else(|| PolicyError::NameNotFound(name.to_string()))?;
        match level.params.get_mut(&leaf) {
            Some(ValueArray::Policy(policies)) => policies
                .last_mut()
                .ok_or_else(|| PolicyError::NameNotFound(name.to_string())),
            Some(other) => Err(PolicyError::type_error(
                name,
                ValueType::Policy,
                other.value_type(),
            )),
            None => Err(PolicyError::NameNotFound(name.to_string())),
        }
    }

    // -----------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------

    /// Replace everything under `name` with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> PolicyResult<()> {
        self.set_array(name, ValueArray::single(value))
    }

    /// Replace everything under `name` with `array`.
    pub fn set_array(&mut self, name: &str, array: ValueArray) -> PolicyResult<()> {
        if array.is_empty() {
            return Err(PolicyError::EmptyArray(name.to_string()));
        }
        let (level, leaf) = self.locate_mut_creating(name)?;
        level.params.insert(leaf, array);
        Ok(())
    }

    /// Append a value under `name`.
    ///
    /// # Errors
    ///
    /// [`PolicyError::TypeError`] when existing values have another kind.
    pub fn add(&mut self, name: &str, value: impl Into<Value>) -> PolicyResult<()> {
        let value = value.into();
        let (level, leaf) = self.locate_mut_creating(name)?;
        match level.params.get_mut(&leaf) {
            Some(array) => {
                let expected = array.value_type();
                array.push(value).map_err(|rejected| {
                    PolicyError::type_error(name, expected, rejected.value_type())
                })
            }
            None => {
                level.params.insert(leaf, ValueArray::single(value));
                Ok(())
            }
        }
    }

    /// Remove `name` and everything below it. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> PolicyResult<bool> {
        Ok(match self.locate_mut(name)? {
            Some((level, leaf)) => level.params.remove(&leaf).is_some(),
            None => false,
        })
    }

    // -----------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------

    fn collect_names(
        &self,
        parent: &str,
        scope: NameScope,
        filter: NameFilter,
        seen: &mut HashSet<String>,
        out: &mut Vec<String>,
    ) {
        for (name, array) in &self.params {
            let full = join_name(parent, name);
            if filter.accepts(array.value_type()) && seen.insert(full.clone()) {
                out.push(full.clone());
            }
            if scope == NameScope::Recursive {
                if let ValueArray::Policy(policies) = array {
                    for p in policies {
                        p.collect_names(&full, scope, filter, seen, out);
                    }
                }
            }
        }
    }

    fn names_filtered(&self, scope: NameScope, filter: NameFilter) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_names("", scope, filter, &mut seen, &mut out);
        out
    }

    /// All names, of any kind.
    pub fn names(&self, scope: NameScope) -> Vec<String> {
        self.names_filtered(scope, NameFilter::All)
    }

    /// Names holding scalar values (bool, int, double, string).
    pub fn param_names(&self, scope: NameScope) -> Vec<String> {
        self.names_filtered(scope, NameFilter::Params)
    }

    /// Names holding sub-policies.
    pub fn policy_names(&self, scope: NameScope) -> Vec<String> {
        self.names_filtered(scope, NameFilter::Policies)
    }

    /// Names holding unresolved file references.
    pub fn file_names(&self, scope: NameScope) -> Vec<String> {
        self.names_filtered(scope, NameFilter::Files)
    }

    /// Number of names at this level.
    pub fn name_count(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over the names and arrays at this level.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueArray)> + '_ {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    // -----------------------------------------------------------------
    // Defaults and file resolution
    // -----------------------------------------------------------------

    /// Fill in every name from `defaults` that this policy lacks.
    ///
    /// When both sides hold exactly one sub-policy under a name, the merge
    /// continues inside it. Existing values are never overwritten.
    pub fn merge_defaults(&mut self, defaults: &Policy) {
        for (name, theirs) in &defaults.params {
            match self.params.get_mut(name) {
                None => {
                    self.params.insert(name.clone(), theirs.clone());
                }
                Some(ValueArray::Policy(mine)) => {
                    if let (ValueArray::Policy(theirs), [mine]) = (theirs, mine.as_mut_slice()) {
                        if let [theirs] = theirs.as_slice() {
                            mine.merge_defaults(theirs);
                        }
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Replace every file reference in the tree with the policy it names.
    ///
    /// Policies produced by the loader may contain further references;
    /// resolution repeats until nothing is left to load, at most
    /// [`MAX_FILE_PASSES`] times. Relative paths are resolved against
    /// `repository`.
    ///
    /// In strict mode the first load failure is returned. Otherwise the
    /// failure is logged and the reference is left in place, which makes the
    /// parameter fail validation with `NOT_LOADED`.
    ///
    /// Returns the number of files loaded.
    pub fn load_policy_files(
        &mut self,
        loader: &dyn PolicyLoader,
        repository: Option<&Path>,
        strict: bool,
    ) -> PolicyResult<usize> {
        let mut total = 0;
        for _ in 0..MAX_FILE_PASSES {
            let loaded = self.resolve_files_once(loader, repository, strict)?;
            if loaded == 0 {
                return Ok(total);
            }
            total += loaded;
        }
        if self.file_names(NameScope::Recursive).is_empty() {
            Ok(total)
        } else {
            Err(PolicyError::TooManyFilePasses {
                passes: MAX_FILE_PASSES,
            })
        }
    }

    fn resolve_files_once(
        &mut self,
        loader: &dyn PolicyLoader,
        repository: Option<&Path>,
        strict: bool,
    ) -> PolicyResult<usize> {
        let mut loaded = 0;
        for (name, array) in self.params.iter_mut() {
            match array {
                ValueArray::File(files) => match load_all(loader, files, repository) {
                    Ok(policies) => {
                        tracing::debug!(param = %name, count = policies.len(), "resolved policy file reference");
                        loaded += policies.len();
                        *array = ValueArray::Policy(policies);
                    }
                    Err(e) if strict => return Err(e),
                    Err(e) => {
                        tracing::warn!(param = %name, error = %e, "leaving policy file reference unresolved");
                    }
                },
                ValueArray::Policy(policies) => {
                    for p in policies.iter_mut() {
                        loaded += p.resolve_files_once(loader, repository, strict)?;
                    }
                }
                _ => {}
            }
        }
        Ok(loaded)
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        for (name, array) in &self.params {
            match array {
                ValueArray::Policy(policies) => {
                    for p in policies {
                        writeln!(f, "{pad}{name}: {{")?;
                        p.fmt_indented(f, indent + 1)?;
                        writeln!(f, "{pad}}}")?;
                    }
                }
                other => writeln!(f, "{pad}{name}: {other}")?,
            }
        }
        Ok(())
    }
}

fn load_all(
    loader: &dyn PolicyLoader,
    files: &[PolicyFile],
    repository: Option<&Path>,
) -> PolicyResult<Vec<Policy>> {
    files
        .iter()
        .map(|file| loader.load(&file.resolve(repository)))
        .collect()
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Loader backed by an in-memory map of path -> policy.
    struct MapLoader(HashMap<PathBuf, Policy>);

    impl PolicyLoader for MapLoader {
        fn load(&self, path: &Path) -> PolicyResult<Policy> {
            self.0.get(path).cloned().ok_or_else(|| PolicyError::FileLoad {
                path: path.display().to_string(),
                reason: "no such file".to_string(),
            })
        }
    }

    #[test]
    fn test_empty_policy() {
        let p = Policy::new();
        assert!(!p.exists("foo"));
        assert_eq!(p.value_count("foo.bar"), 0);
        assert_eq!(p.value_type("foo"), ValueType::Undetermined);
        assert!(matches!(p.get_value("foo"), Err(PolicyError::NameNotFound(_))));
        assert!(p.is_empty());
    }

    #[test]
    fn test_set_get_and_replace() {
        let mut p = Policy::new();
        p.set("doall", "true").unwrap();
        assert!(p.exists("doall"));
        assert_eq!(p.value_count("doall"), 1);
        assert_eq!(p.get_string("doall").unwrap(), "true");
        assert!(matches!(p.get_int("doall"), Err(PolicyError::TypeError { .. })));
        assert!(matches!(
            p.get_double_array("doall"),
            Err(PolicyError::TypeError { .. })
        ));

        p.set("doall", "duh").unwrap();
        assert_eq!(p.get_string("doall").unwrap(), "duh");

        // set erases kind
        p.set("doall", 5).unwrap();
        assert_eq!(p.get_int("doall").unwrap(), 5);
    }

    #[test]
    fn test_add_appends_and_last_wins() {
        let mut p = Policy::new();
        p.set("doall", "duh").unwrap();
        p.add("doall", "never").unwrap();
        assert_eq!(p.value_count("doall"), 2);
        assert!(p.is_array("doall"));
        assert_eq!(p.get_string("doall").unwrap(), "never");
        assert_eq!(
            p.get_string_array("doall").unwrap(),
            &["duh".to_string(), "never".to_string()]
        );
    }

    #[test]
    fn test_add_rejects_other_kind() {
        let mut p = Policy::new();
        p.set("pbool", true).unwrap();
        p.add("pbool", false).unwrap();
        let err = p.add("pbool", 3).unwrap_err();
        assert_eq!(
            err,
            PolicyError::type_error("pbool", ValueType::Bool, ValueType::Int)
        );
        assert_eq!(p.value_count("pbool"), 2);
    }

    #[test]
    fn test_add_to_absent_name_creates_it() {
        let mut p = Policy::new();
        p.add("x.y", 1.5).unwrap();
        assert_eq!(p.get_double("x.y").unwrap(), 1.5);
    }

    #[test]
    fn test_hierarchical_set_creates_sub_policies() {
        let mut p = Policy::new();
        p.set("transmitter.serializationFormat", "deluxe").unwrap();
        assert!(p.is_policy("transmitter"));
        assert_eq!(
            p.get_string("transmitter.serializationFormat").unwrap(),
            "deluxe"
        );
        assert_eq!(
            p.get_policy("transmitter")
                .unwrap()
                .get_string("serializationFormat")
                .unwrap(),
            "deluxe"
        );
    }

    #[test]
    fn test_hierarchical_set_through_scalar_fails() {
        let mut p = Policy::new();
        p.set("a", 1).unwrap();
        let err = p.set("a.b", 2).unwrap_err();
        assert_eq!(
            err,
            PolicyError::type_error("a", ValueType::Policy, ValueType::Int)
        );
    }

    #[test]
    fn test_hierarchical_get_through_scalar_is_not_found() {
        let mut p = Policy::new();
        p.set("a", 1).unwrap();
        assert!(matches!(p.get_int("a.b"), Err(PolicyError::NameNotFound(_))));
        assert!(!p.exists("a.b"));
    }

    #[test]
    fn test_bad_names_rejected() {
        let mut p = Policy::new();
        assert!(matches!(p.set("a..b", 1), Err(PolicyError::BadName(_))));
        assert!(matches!(p.set("", 1), Err(PolicyError::BadName(_))));
        assert!(!p.exists(".a"));
    }

    #[test]
    fn test_hierarchical_access_walks_last_sub_policy() {
        let mut first = Policy::new();
        first.set("v", 1).unwrap();
        let mut second = Policy::new();
        second.set("v", 2).unwrap();

        let mut p = Policy::new();
        p.set("sub", first).unwrap();
        p.add("sub", second).unwrap();
        assert_eq!(p.value_count("sub"), 2);
        assert_eq!(p.get_int("sub.v").unwrap(), 2);
    }

    #[test]
    fn test_remove() {
        let mut p = Policy::new();
        p.set("a.b", 1).unwrap();
        p.set("a.c", 2).unwrap();
        assert!(p.remove("a.b").unwrap());
        assert!(!p.remove("a.b").unwrap());
        assert!(!p.exists("a.b"));
        assert!(p.exists("a.c"));
        assert!(!p.remove("missing.x").unwrap());
    }

    #[test]
    fn test_set_array_rejects_empty() {
        let mut p = Policy::new();
        let err = p.set_array("x", ValueArray::Int(Vec::new())).unwrap_err();
        assert_eq!(err, PolicyError::EmptyArray("x".into()));
    }

    #[test]
    fn test_names_top_level_and_recursive() {
        let mut p = Policy::new();
        p.set("b", 1).unwrap();
        p.set("a.x", "s").unwrap();
        p.set("a.y.z", true).unwrap();
        p.set("f", PolicyFile::new("x.paf")).unwrap();

        assert_eq!(p.names(NameScope::TopLevel), vec!["a", "b", "f"]);
        assert_eq!(
            p.names(NameScope::Recursive),
            vec!["a", "a.x", "a.y", "a.y.z", "b", "f"]
        );
        assert_eq!(
            p.param_names(NameScope::Recursive),
            vec!["a.x", "a.y.z", "b"]
        );
        assert_eq!(p.policy_names(NameScope::Recursive), vec!["a", "a.y"]);
        assert_eq!(p.file_names(NameScope::TopLevel), vec!["f"]);
        assert_eq!(p.name_count(), 3);
    }

    #[test]
    fn test_recursive_names_dedupe_across_policy_array() {
        let mut one = Policy::new();
        one.set("v", 1).unwrap();
        let mut two = Policy::new();
        two.set("v", 2).unwrap();
        two.set("w", 3).unwrap();

        let mut p = Policy::new();
        p.set("sub", one).unwrap();
        p.add("sub", two).unwrap();
        assert_eq!(
            p.names(NameScope::Recursive),
            vec!["sub", "sub.v", "sub.w"]
        );
    }

    #[test]
    fn test_is_dictionary() {
        let mut p = Policy::new();
        assert!(!p.is_dictionary());
        p.set("definitions.foo.type", "int").unwrap();
        assert!(p.is_dictionary());
    }

    #[test]
    fn test_merge_defaults() {
        let mut defaults = Policy::new();
        defaults.set("a", 1).unwrap();
        defaults.set("b", 2).unwrap();
        defaults.set("sub.x", "dx").unwrap();
        defaults.set("sub.y", "dy").unwrap();

        let mut p = Policy::new();
        p.set("a", 10).unwrap();
        p.set("sub.x", "px").unwrap();
        p.merge_defaults(&defaults);

        assert_eq!(p.get_int("a").unwrap(), 10);
        assert_eq!(p.get_int("b").unwrap(), 2);
        assert_eq!(p.get_string("sub.x").unwrap(), "px");
        assert_eq!(p.get_string("sub.y").unwrap(), "dy");
    }

    #[test]
    fn test_get_policy_mut() {
        let mut p = Policy::new();
        p.set("a.b.c", 1).unwrap();
        p.get_policy_mut("a.b").unwrap().set("d", 2).unwrap();
        assert_eq!(p.get_int("a.b.d").unwrap(), 2);
        assert!(matches!(
            p.get_policy_mut("a.b.c"),
            Err(PolicyError::TypeError { .. })
        ));
    }

    #[test]
    fn test_load_policy_files_resolves_nested_references() {
        let mut inner = Policy::new();
        inner.set("depth", 2).unwrap();
        let mut outer = Policy::new();
        outer.set("depth", 1).unwrap();
        outer.set("next", PolicyFile::new("inner.paf")).unwrap();

        let loader = MapLoader(HashMap::from([
            (PathBuf::from("/repo/outer.paf"), outer),
            (PathBuf::from("/repo/inner.paf"), inner),
        ]));

        let mut p = Policy::new();
        p.set("root", PolicyFile::new("outer.paf")).unwrap();
        let loaded = p
            .load_policy_files(&loader, Some(Path::new("/repo")), true)
            .unwrap();

        assert_eq!(loaded, 2);
        assert_eq!(p.get_int("root.depth").unwrap(), 1);
        assert_eq!(p.get_int("root.next.depth").unwrap(), 2);
        assert!(p.file_names(NameScope::Recursive).is_empty());
    }

    #[test]
    fn test_load_policy_files_strict_fails() {
        let loader = MapLoader(HashMap::new());
        let mut p = Policy::new();
        p.set("missing", PolicyFile::new("nope.paf")).unwrap();
        let err = p.load_policy_files(&loader, None, true).unwrap_err();
        assert!(matches!(err, PolicyError::FileLoad { .. }));
        assert!(p.is_file("missing"));
    }

    #[test]
    fn test_load_policy_files_lenient_leaves_reference() {
        let loader = MapLoader(HashMap::new());
        let mut p = Policy::new();
        p.set("missing", PolicyFile::new("nope.paf")).unwrap();
        assert_eq!(p.load_policy_files(&loader, None, false).unwrap(), 0);
        assert!(p.is_file("missing"));
    }

    #[test]
    fn test_load_policy_files_self_reference_bounded() {
        let mut looping = Policy::new();
        looping.set("again", PolicyFile::new("loop.paf")).unwrap();
        let loader = MapLoader(HashMap::from([(PathBuf::from("loop.paf"), looping)]));

        let mut p = Policy::new();
        p.set("start", PolicyFile::new("loop.paf")).unwrap();
        let err = p.load_policy_files(&loader, None, true).unwrap_err();
        assert_eq!(
            err,
            PolicyError::TooManyFilePasses {
                passes: MAX_FILE_PASSES
            }
        );
    }

    #[test]
    fn test_display_nests_sub_policies() {
        let mut p = Policy::new();
        p.set("a.b", 1).unwrap();
        p.set("c", "x").unwrap();
        assert_eq!(p.to_string(), "a: {\n  b: 1\n}\nc: \"x\"\n");
    }

    #[test]
    fn test_serde_snapshot() {
        let mut p = Policy::new();
        p.set("n", 3).unwrap();
        p.add("n", 4).unwrap();
        p.set("sub.flag", true).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "n": {"int": [3, 4]},
                "sub": {"policy": [{"flag": {"bool": [true]}}]}
            })
        );
        let back: Policy = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_deserialize_rejects_hierarchical_key() {
        let err = serde_json::from_str::<Policy>(r#"{"a.b": {"string": ["x"]}}"#).unwrap_err();
        assert!(err.to_string().contains("illegal policy parameter name"), "{err}");

        let nested = r#"{"a": {"policy": [{"b.c": {"int": [1]}}]}}"#;
        assert!(serde_json::from_str::<Policy>(nested).is_err());
    }

    #[test]
    fn test_deserialize_rejects_empty_name() {
        let err = serde_json::from_str::<Policy>(r#"{"": {"int": [1]}}"#).unwrap_err();
        assert!(err.to_string().contains("illegal policy parameter name"), "{err}");
    }

    #[test]
    fn test_deserialize_rejects_empty_array() {
        let err = serde_json::from_str::<Policy>(r#"{"a": {"int": []}}"#).unwrap_err();
        assert!(err.to_string().contains("\"a\" cannot be set to an empty array"), "{err}");

        let nested = r#"{"s": {"policy": [{"t": {"string": []}}]}}"#;
        assert!(serde_json::from_str::<Policy>(nested).is_err());
    }
}
