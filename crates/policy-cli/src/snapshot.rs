//! # Policy Snapshots
//!
//! Reads and writes policies in their serde form, as JSON or YAML chosen by
//! file extension. [`SnapshotLoader`] plugs this into file-reference
//! resolution.

use std::path::Path;

use clap::ValueEnum;
use policy_core::{Policy, PolicyError, PolicyLoader};

/// Serialization used for a snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

fn load_error(path: &Path, reason: impl ToString) -> PolicyError {
    PolicyError::FileLoad {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Read the policy snapshot at `path`.
pub fn read_policy(path: &Path) -> Result<Policy, PolicyError> {
    let format = SnapshotFormat::from_path(path)
        .ok_or_else(|| load_error(path, "unsupported snapshot format (expected .json, .yaml or .yml)"))?;
    let text = std::fs::read_to_string(path).map_err(|e| load_error(path, e))?;
    let policy: Policy = match format {
        SnapshotFormat::Json => serde_json::from_str(&text).map_err(|e| load_error(path, e))?,
        SnapshotFormat::Yaml => serde_yaml::from_str(&text).map_err(|e| load_error(path, e))?,
    };
    tracing::debug!(path = %path.display(), names = policy.name_count(), "read policy snapshot");
    Ok(policy)
}

/// Render `policy` in `format`.
pub fn render_policy(policy: &Policy, format: SnapshotFormat) -> anyhow::Result<String> {
    Ok(match format {
        SnapshotFormat::Json => serde_json::to_string_pretty(policy)?,
        SnapshotFormat::Yaml => serde_yaml::to_string(policy)?,
    })
}

/// Resolves file references by reading snapshot files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotLoader;

impl PolicyLoader for SnapshotLoader {
    fn load(&self, path: &Path) -> Result<Policy, PolicyError> {
        read_policy(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Policy {
        let mut p = Policy::new();
        p.set("threshold", 5).unwrap();
        p.set("output.format", "fits").unwrap();
        p
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SnapshotFormat::from_path(Path::new("a.json")), Some(SnapshotFormat::Json));
        assert_eq!(SnapshotFormat::from_path(Path::new("a.yml")), Some(SnapshotFormat::Yaml));
        assert_eq!(SnapshotFormat::from_path(Path::new("a.paf")), None);
    }

    #[test]
    fn test_read_json_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        std::fs::write(&path, r#"{"threshold": {"int": [5]}, "name": {"string": ["x"]}}"#).unwrap();
        let p = read_policy(&path).unwrap();
        assert_eq!(p.get_int("threshold").unwrap(), 5);
        assert_eq!(p.get_string("name").unwrap(), "x");
    }

    #[test]
    fn test_yaml_written_snapshot_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.yaml");
        std::fs::write(&path, render_policy(&sample(), SnapshotFormat::Yaml).unwrap()).unwrap();
        assert_eq!(read_policy(&path).unwrap(), sample());
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_policy(&dir.path().join("p.paf")),
            Err(PolicyError::FileLoad { .. })
        ));
        assert!(matches!(
            SnapshotLoader.load(&dir.path().join("absent.json")),
            Err(PolicyError::FileLoad { .. })
        ));
    }
}
