//! Reserved names in a dictionary policy.

/// Section holding one entry per defined parameter.
pub const DEFINITIONS: &str = "definitions";
/// Fallback definition for names without an entry under `definitions`.
pub const CHILD_DEFINITION: &str = "childDefinition";

pub const TYPE: &str = "type";
pub const MIN_OCCURS: &str = "minOccurs";
pub const MAX_OCCURS: &str = "maxOccurs";
pub const DEFAULT: &str = "default";
pub const DESCRIPTION: &str = "description";
pub const ALLOWED: &str = "allowed";

// Fields of one `allowed` entry.
pub const MIN: &str = "min";
pub const MAX: &str = "max";
pub const VALUE: &str = "value";

/// Nested dictionary for a policy-valued parameter.
pub const DICTIONARY: &str = "dictionary";
/// Path to a nested dictionary not yet loaded.
pub const DICTIONARY_FILE: &str = "dictionaryFile";
/// Suffix identifying `dictionaryFile` parameters in a recursive name list.
pub const DICTIONARY_FILE_SUFFIX: &str = ".dictionaryFile";
