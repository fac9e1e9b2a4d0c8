//! # Validate Subcommand
//!
//! Validates a policy snapshot against a dictionary snapshot:
//!
//! 1. read the policy and resolve its file references,
//! 2. merge defaults (from a policy, or from a dictionary's declared
//!    defaults) when `--defaults` is given,
//! 3. read the dictionary and resolve its dictionary files,
//! 4. validate, collecting every content error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use policy_core::Policy;
use policy_dictionary::{Dictionary, ErrorMode, ValidationError};

use crate::snapshot::{read_policy, SnapshotLoader};
use crate::{load_dictionary, reference_root, EXIT_INVALID};

/// Arguments for the `policy validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// The policy to validate.
    pub policy: PathBuf,

    /// The dictionary to validate the policy against.
    pub dictionary: PathBuf,

    /// Merge defaults from FILE first; FILE may be a policy or a dictionary.
    #[arg(short = 'D', long, value_name = "FILE")]
    pub defaults: Option<PathBuf>,

    /// Directory from which to load policy file references.
    #[arg(short = 'l', long, value_name = "DIR")]
    pub load_policy_references: Option<PathBuf>,

    /// Directory from which to load dictionary file references.
    #[arg(short = 'L', long, value_name = "DIR")]
    pub load_dict_references: Option<PathBuf>,

    /// Fail on the first file reference that cannot be loaded.
    #[arg(long)]
    pub strict: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let report = validate_files(args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if report.is_empty() {
        if !args.json {
            println!(
                "Validation succeeded: {} is a valid instance of {}",
                args.policy.display(),
                args.dictionary.display()
            );
        }
        Ok(0)
    } else {
        if !args.json {
            println!("{report}");
        }
        Ok(EXIT_INVALID)
    }
}

/// Run the validation pipeline and return the collected report.
pub fn validate_files(args: &ValidateArgs) -> Result<ValidationError> {
    let mut policy = read_policy(&args.policy)
        .with_context(|| format!("reading policy file \"{}\"", args.policy.display()))?;
    policy
        .load_policy_files(
            &SnapshotLoader,
            reference_root(args.load_policy_references.as_deref(), &args.policy),
            args.strict,
        )
        .with_context(|| format!("loading references of \"{}\"", args.policy.display()))?;

    if let Some(path) = &args.defaults {
        let defaults = read_defaults(path, args.load_dict_references.as_deref(), args.strict)?;
        policy.merge_defaults(&defaults);
        tracing::info!(defaults = %path.display(), "merged defaults into policy");
    }

    let dict = load_dictionary(
        &args.dictionary,
        args.load_dict_references.as_deref(),
        args.strict,
    )?;

    let mut report = ValidationError::new();
    dict.validate(&policy, ErrorMode::Collect(&mut report))
        .with_context(|| {
            format!(
                "validating {} against {}",
                args.policy.display(),
                args.dictionary.display()
            )
        })?;
    tracing::info!(errors = report.param_count(), "validation finished");
    Ok(report)
}

/// A defaults file is used as-is, unless it is a dictionary, in which case
/// its declared defaults are used.
fn read_defaults(path: &Path, references: Option<&Path>, strict: bool) -> Result<Policy> {
    let policy = read_policy(path)
        .with_context(|| format!("reading defaults from \"{}\"", path.display()))?;
    if !policy.is_dictionary() {
        return Ok(policy);
    }
    let dict: Dictionary<'static> = load_dictionary(path, references, strict)?;
    dict.defaults()
        .with_context(|| format!("collecting defaults of \"{}\"", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_dictionary::ErrorKind;

    const DICT: &str = r#"{
        "definitions": {"policy": [{
            "threshold": {"policy": [{
                "type": {"string": ["int"]},
                "minOccurs": {"int": [1]},
                "default": {"int": [3]},
                "allowed": {"policy": [{"min": {"int": [0]}, "max": {"int": [10]}}]}
            }]},
            "output": {"policy": [{
                "type": {"string": ["Policy"]},
                "dictionaryFile": {"string": ["output_dict.json"]}
            }]}
        }]}
    }"#;

    const OUTPUT_DICT: &str = r#"{
        "definitions": {"policy": [{
            "format": {"policy": [{"type": {"string": ["string"]}}]}
        }]}
    }"#;

    fn fixture(policy: &str) -> (tempfile::TempDir, ValidateArgs) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dict.json"), DICT).unwrap();
        std::fs::write(dir.path().join("output_dict.json"), OUTPUT_DICT).unwrap();
        std::fs::write(dir.path().join("policy.json"), policy).unwrap();
        let args = ValidateArgs {
            policy: dir.path().join("policy.json"),
            dictionary: dir.path().join("dict.json"),
            defaults: None,
            load_policy_references: None,
            load_dict_references: None,
            strict: true,
            json: false,
        };
        (dir, args)
    }

    #[test]
    fn test_valid_policy_passes() {
        let (_dir, args) = fixture(
            r#"{"threshold": {"int": [4]}, "output": {"policy": [{"format": {"string": ["fits"]}}]}}"#,
        );
        assert!(validate_files(&args).unwrap().is_empty());
        assert_eq!(run_validate(&args).unwrap(), 0);
    }

    #[test]
    fn test_invalid_policy_reports_errors() {
        let (_dir, args) = fixture(
            r#"{"threshold": {"int": [40]}, "output": {"policy": [{"format": {"int": [1]}}]}}"#,
        );
        let report = validate_files(&args).unwrap();
        assert!(report.get_errors("threshold").contains(ErrorKind::ValueOutOfRange));
        assert!(report.get_errors("output.format").contains(ErrorKind::WrongType));
        assert_eq!(run_validate(&args).unwrap(), EXIT_INVALID);
    }

    #[test]
    fn test_policy_file_references_are_loaded() {
        let (dir, args) = fixture(
            r#"{"threshold": {"int": [1]}, "output": {"file": [{"path": "output.json"}]}}"#,
        );
        std::fs::write(dir.path().join("output.json"), r#"{"format": {"string": ["hdf5"]}}"#)
            .unwrap();
        assert!(validate_files(&args).unwrap().is_empty());
    }

    #[test]
    fn test_defaults_from_dictionary() {
        let (_dir, mut args) = fixture(r#"{}"#);
        let report = validate_files(&args).unwrap();
        assert!(report.get_errors("threshold").contains(ErrorKind::MissingRequired));

        args.defaults = Some(args.dictionary.clone());
        assert!(validate_files(&args).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_snapshot_is_rejected_on_read() {
        let (_dir, args) = fixture(r#"{"output.format": {"int": [1]}}"#);
        let err = validate_files(&args).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("reading policy file"), "{message}");
        assert!(message.contains("illegal policy parameter name"), "{message}");

        let (_dir, args) = fixture(r#"{"threshold": {"int": []}}"#);
        let err = validate_files(&args).unwrap_err();
        assert!(format!("{err:#}").contains("empty array"));
    }

    #[test]
    fn test_unreadable_policy_is_error() {
        let (dir, mut args) = fixture(r#"{}"#);
        args.policy = dir.path().join("missing.json");
        let err = validate_files(&args).unwrap_err();
        assert!(format!("{err:#}").contains("reading policy file"));
    }
}
