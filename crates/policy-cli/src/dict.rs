//! # Dictionary Subcommand
//!
//! Inspects a dictionary without a policy to validate.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::load_dictionary;
use crate::snapshot::{render_policy, SnapshotFormat};

/// Arguments for the `policy dict` subcommand.
#[derive(Args, Debug)]
pub struct DictArgs {
    #[command(subcommand)]
    pub command: DictCommand,
}

#[derive(Subcommand, Debug)]
pub enum DictCommand {
    /// Check that every definition, nested ones included, is well formed.
    Check {
        /// The dictionary to check.
        dictionary: PathBuf,

        /// Directory from which to load dictionary file references.
        #[arg(short = 'L', long, value_name = "DIR")]
        load_dict_references: Option<PathBuf>,

        /// Fail on the first file reference that cannot be loaded.
        #[arg(long)]
        strict: bool,
    },

    /// Print a policy holding every declared default.
    Defaults {
        /// The dictionary to read defaults from.
        dictionary: PathBuf,

        /// Directory from which to load dictionary file references.
        #[arg(short = 'L', long, value_name = "DIR")]
        load_dict_references: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value = "json")]
        format: SnapshotFormat,
    },
}

/// Execute a dictionary subcommand.
pub fn run_dict(args: &DictArgs) -> Result<u8> {
    match &args.command {
        DictCommand::Check {
            dictionary,
            load_dict_references,
            strict,
        } => {
            let dict = load_dictionary(dictionary, load_dict_references.as_deref(), *strict)?;
            dict.check()
                .with_context(|| format!("{}: dictionary check failed", dictionary.display()))?;
            let names = dict.defined_names()?;
            println!("{}: OK ({} definitions)", dictionary.display(), names.len());
            Ok(0)
        }
        DictCommand::Defaults {
            dictionary,
            load_dict_references,
            format,
        } => {
            println!(
                "{}",
                dictionary_defaults(dictionary, load_dict_references.as_deref(), *format)?
            );
            Ok(0)
        }
    }
}

/// Render the defaults declared by the dictionary at `path`.
pub fn dictionary_defaults(
    path: &std::path::Path,
    references: Option<&std::path::Path>,
    format: SnapshotFormat,
) -> Result<String> {
    let dict = load_dictionary(path, references, false)?;
    let defaults = dict
        .defaults()
        .with_context(|| format!("collecting defaults of \"{}\"", path.display()))?;
    render_policy(&defaults, format)
}
