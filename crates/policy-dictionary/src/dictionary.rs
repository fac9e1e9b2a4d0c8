//! # Dictionary
//!
//! A dictionary is a [`Policy`] with a `definitions` section. Each entry of
//! that section is one [`Definition`]; an entry for a policy-valued
//! parameter may carry its own nested `dictionary`, which is how schemas
//! describe trees of arbitrary depth.
//!
//! ## Validation
//!
//! [`Dictionary::validate`] looks at the top-level names of the policy only.
//! A name with no definition is reported as `UNKNOWN_NAME`. Sub-policies are
//! checked by their definition, which hands each one to the nested
//! dictionary with the prefix extended by the parameter name, so every
//! reported name is a full hierarchical name. A sub-policy whose definition
//! has no nested dictionary is not inspected further.
//!
//! After the names present, a second pass reports `MISSING_REQUIRED` for
//! every defined name with `minOccurs > 0` that the policy lacks.

use std::borrow::Cow;
use std::path::Path;

use policy_core::{
    split_name, NameScope, Policy, PolicyError, PolicyFile, PolicyLoader, ValueArray, ValueType,
    MAX_FILE_PASSES,
};

use crate::definition::Definition;
use crate::error::{ErrorMode, SchemaFault, ValidateError};
use crate::keys::{
    CHILD_DEFINITION, DEFINITIONS, DICTIONARY, DICTIONARY_FILE, DICTIONARY_FILE_SUFFIX,
};
use crate::kind::ErrorKind;
use crate::report::ValidationError;

/// Deepest chain of nested dictionaries validation will follow.
pub const MAX_NESTING_DEPTH: usize = 64;

/// A schema expressed as a policy.
///
/// The policy is either owned or borrowed; nested dictionaries produced
/// during validation borrow from their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary<'a> {
    policy: Cow<'a, Policy>,
    prefix: String,
}

impl Dictionary<'static> {
    /// Take ownership of a dictionary policy.
    ///
    /// # Errors
    ///
    /// [`SchemaFault::MissingDefinitions`] when `policy` has no `definitions`.
    pub fn new(policy: Policy) -> Result<Self, SchemaFault> {
        Self::from_cow(Cow::Owned(policy))
    }

    /// Wrap a bare `definitions` tree.
    pub fn from_definitions(definitions: Policy) -> Result<Self, SchemaFault> {
        let mut policy = Policy::new();
        policy.set(DEFINITIONS, definitions)?;
        Self::new(policy)
    }
}

impl<'a> Dictionary<'a> {
    /// Borrow a dictionary policy.
    pub fn borrowed(policy: &'a Policy) -> Result<Self, SchemaFault> {
        Self::from_cow(Cow::Borrowed(policy))
    }

    fn from_cow(policy: Cow<'a, Policy>) -> Result<Self, SchemaFault> {
        if !policy.exists(DEFINITIONS) {
            return Err(SchemaFault::MissingDefinitions);
        }
        Ok(Self {
            policy,
            prefix: String::new(),
        })
    }

    /// Detach from any borrowed policy.
    pub fn into_owned(self) -> Dictionary<'static> {
        Dictionary {
            policy: Cow::Owned(self.policy.into_owned()),
            prefix: self.prefix,
        }
    }

    pub fn as_policy(&self) -> &Policy {
        &self.policy
    }

    /// Prefix prepended to every name this dictionary reports.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// The `definitions` section.
    pub fn definitions(&self) -> Result<&Policy, SchemaFault> {
        definitions_of(&self.policy).ok_or(SchemaFault::MissingDefinitions)
    }

    /// Names declared directly under `definitions`.
    pub fn defined_names(&self) -> Result<Vec<String>, SchemaFault> {
        Ok(self.definitions()?.names(NameScope::TopLevel))
    }

    /// Resolve a hierarchical name to its definition.
    ///
    /// Each non-final segment must have a nested `dictionary`. A segment
    /// with no entry under `definitions` falls back to the level's
    /// `childDefinition`, if there is one.
    ///
    /// # Errors
    ///
    /// [`SchemaFault::UnknownName`] for a segment that is not defined,
    /// [`SchemaFault::MissingSubDictionary`] when a non-final segment has
    /// nothing to descend into, and [`SchemaFault::DefinitionNotFound`]
    /// when a level lacks `definitions`.
    pub fn make_def(&self, name: &str) -> Result<Definition<'_>, SchemaFault> {
        let segments = split_name(name)?;
        let mut level: &Policy = &self.policy;
        let mut walked = String::new();
        let mut resolved = None;

        for (i, segment) in segments.iter().enumerate() {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);

            let defs = definitions_of(level).ok_or_else(|| SchemaFault::DefinitionNotFound {
                name: walked.clone(),
            })?;
            let (entry, child) = lookup_entry(level, defs, segment, name, &walked)?;

            if i + 1 < segments.len() {
                level = match entry.get_array(DICTIONARY) {
                    Ok(ValueArray::Policy(dicts)) => dicts.last(),
                    _ => None,
                }
                .ok_or_else(|| SchemaFault::MissingSubDictionary {
                    name: walked.clone(),
                })?;
            }
            resolved = Some((entry, child));
        }

        let (entry, child) = resolved.ok_or_else(|| PolicyError::BadName(name.to_string()))?;
        tracing::trace!(param = %name, child_definition = child, "resolved definition");
        let mut def = Definition::new(name, entry)?.with_prefix(self.prefix.as_str());
        def.set_child_definition(child);
        Ok(def)
    }

    /// True when `name` is defined with a loaded nested dictionary.
    pub fn has_sub_dictionary(&self, name: &str) -> bool {
        self.make_def(name)
            .map(|def| def.has_sub_dictionary())
            .unwrap_or(false)
    }

    /// The nested dictionary defined for `name`.
    pub fn sub_dictionary(&self, name: &str) -> Result<Dictionary<'_>, SchemaFault> {
        self.make_def(name)?
            .sub_dictionary()?
            .ok_or_else(|| SchemaFault::MissingSubDictionary {
                name: name.to_string(),
            })
    }

    /// Check the dictionary's own integrity: exactly one `definitions`
    /// section, and every declared definition (including those of nested
    /// dictionaries) well formed.
    pub fn check(&self) -> Result<(), SchemaFault> {
        self.check_at(0)?;
        tracing::debug!(prefix = %self.prefix, "dictionary check passed");
        Ok(())
    }

    fn check_at(&self, depth: usize) -> Result<(), SchemaFault> {
        self.guard_depth(depth)?;
        let count = match self.policy.get_array(DEFINITIONS) {
            Ok(ValueArray::Policy(defs)) => defs.len(),
            Ok(other) => {
                return Err(SchemaFault::FieldType {
                    name: self.prefix.clone(),
                    field: DEFINITIONS,
                    expected: ValueType::Policy,
                    found: other.value_type(),
                })
            }
            Err(_) => 0,
        };
        match count {
            0 => return Err(SchemaFault::MissingDefinitions),
            1 => {}
            count => return Err(SchemaFault::MultipleDefinitions { count }),
        }
        for name in self.defined_names()? {
            let def = self.make_def(&name)?;
            if let Some(sub) = def.sub_dictionary()? {
                sub.check_at(depth + 1)?;
            }
        }
        Ok(())
    }

    /// Validate `policy` against this dictionary.
    ///
    /// Schema faults are always returned. Content errors go where `mode`
    /// says.
    pub fn validate(&self, policy: &Policy, mode: ErrorMode<'_>) -> Result<(), ValidateError> {
        mode.run(|errs| {
            let before = errs.param_count();
            self.collect(policy, errs, 0)?;
            tracing::debug!(
                prefix = %self.prefix,
                names = policy.name_count(),
                new_errors = errs.param_count() - before,
                "validated policy"
            );
            Ok(())
        })
    }

    pub(crate) fn collect(
        &self,
        policy: &Policy,
        errs: &mut ValidationError,
        depth: usize,
    ) -> Result<(), SchemaFault> {
        self.guard_depth(depth)?;

        for name in policy.names(NameScope::TopLevel) {
            match self.make_def(&name) {
                Ok(def) => def.collect(policy, &name, errs, depth)?,
                Err(SchemaFault::UnknownName { .. }) => {
                    errs.add_error(format!("{}{name}", self.prefix), ErrorKind::UnknownName);
                }
                Err(fault) => return Err(fault),
            }
            tracing::debug!(param = %name, prefix = %self.prefix, errors = errs.param_count(), "validated parameter");
        }

        for name in self.defined_names()? {
            if !policy.exists(&name) {
                self.make_def(&name)?.collect(policy, &name, errs, depth)?;
            }
        }
        Ok(())
    }

    fn guard_depth(&self, depth: usize) -> Result<(), SchemaFault> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(SchemaFault::NestingTooDeep {
                depth: MAX_NESTING_DEPTH,
                prefix: self.prefix.clone(),
            });
        }
        Ok(())
    }

    /// A policy holding every declared default.
    ///
    /// A policy-valued parameter without defaults of its own contributes
    /// the defaults of its nested dictionary, when there are any.
    pub fn defaults(&self) -> Result<Policy, SchemaFault> {
        self.defaults_at(0)
    }

    fn defaults_at(&self, depth: usize) -> Result<Policy, SchemaFault> {
        self.guard_depth(depth)?;
        let mut out = Policy::new();
        for name in self.defined_names()? {
            let def = self.make_def(&name)?;
            def.set_default_in(&mut out, &name)?;
            if out.exists(&name) {
                continue;
            }
            if let Some(sub) = def.sub_dictionary()? {
                let nested = sub.defaults_at(depth + 1)?;
                if !nested.is_empty() {
                    out.set(&name, nested)?;
                }
            }
        }
        Ok(out)
    }

    /// Load every file reference in the dictionary, nested dictionaries
    /// included.
    ///
    /// Each `<x>.dictionaryFile` is first turned into a `<x>.dictionary`
    /// file reference, unless `<x>` already has a `dictionary`. Files may
    /// name further dictionary files; the rewrite and load repeat until
    /// nothing new appears, at most [`MAX_FILE_PASSES`] times.
    ///
    /// Returns the number of files loaded.
    pub fn load_policy_files(
        &mut self,
        loader: &dyn PolicyLoader,
        repository: Option<&Path>,
        strict: bool,
    ) -> Result<usize, SchemaFault> {
        let mut total = 0;
        for _ in 0..MAX_FILE_PASSES {
            let rewritten = self.rewrite_dictionary_files()?;
            total += self
                .policy
                .to_mut()
                .load_policy_files(loader, repository, strict)?;
            if rewritten == 0 {
                tracing::debug!(loaded = total, "dictionary files loaded");
                return Ok(total);
            }
        }
        Err(PolicyError::TooManyFilePasses {
            passes: MAX_FILE_PASSES,
        }
        .into())
    }

    fn rewrite_dictionary_files(&mut self) -> Result<usize, SchemaFault> {
        let mut pending = Vec::new();
        for name in self.policy.names(NameScope::Recursive) {
            let Some(parent) = name.strip_suffix(DICTIONARY_FILE_SUFFIX) else {
                continue;
            };
            let file = match self.policy.get_array(&name)? {
                ValueArray::String(paths) => paths.last().map(PolicyFile::new),
                ValueArray::File(files) => files.last().cloned(),
                other => {
                    return Err(SchemaFault::FieldType {
                        name: parent.to_string(),
                        field: DICTIONARY_FILE,
                        expected: ValueType::String,
                        found: other.value_type(),
                    })
                }
            };
            if let Some(file) = file {
                pending.push((parent.to_string(), file));
            }
        }

        let mut rewritten = 0;
        for (parent, file) in pending {
            let holder = self.policy.to_mut().get_policy_mut(&parent)?;
            if !holder.exists(DICTIONARY) {
                tracing::trace!(param = %parent, file = %file, "queued dictionary file");
                holder.set(DICTIONARY, file)?;
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }
}

/// The last `definitions` sub-policy of a dictionary level.
fn definitions_of(level: &Policy) -> Option<&Policy> {
    match level.get_array(DEFINITIONS) {
        Ok(ValueArray::Policy(defs)) => defs.last(),
        _ => None,
    }
}

fn lookup_entry<'p>(
    level: &'p Policy,
    defs: &'p Policy,
    segment: &str,
    name: &str,
    walked: &str,
) -> Result<(&'p Policy, bool), SchemaFault> {
    let malformed = || SchemaFault::MalformedDefinition {
        name: walked.to_string(),
    };
    match defs.get_array(segment) {
        Ok(ValueArray::Policy(entries)) => entries.last().map(|e| (e, false)).ok_or_else(malformed),
        Ok(_) => Err(malformed()),
        Err(_) => match level.get_array(CHILD_DEFINITION) {
            Ok(ValueArray::Policy(entries)) => {
                entries.last().map(|e| (e, true)).ok_or_else(malformed)
            }
            Ok(_) => Err(malformed()),
            Err(_) => Err(SchemaFault::UnknownName {
                name: name.to_string(),
                segment: segment.to_string(),
            }),
        },
    }
}
