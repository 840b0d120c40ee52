//! Lock snapshot file (`quay.lock`)
//!
//! ```toml
//! version = 1
//!
//! [[dependency]]
//! coordinate = "serde"
//! version = "1.0.228"
//! checksum = "9a8e94ea..."
//! ```

use crate::core::error::{ConfigError, QuayError, QuayResult, ResultExt};
use crate::lock::{LockedPackage, ResolvedGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const FORMAT_VERSION: u32 = 1;
const HEADER: &str = "# Generated by `cargo quay lock --write`. Do not edit by hand.\n";

/// Committed record of resolved dependency versions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockSnapshot {
  entries: BTreeMap<String, Vec<LockedPackage>>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
  version: u32,
  #[serde(default, rename = "dependency")]
  dependencies: Vec<SnapshotEntry>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
  coordinate: String,
  version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  checksum: Option<String>,
}

impl LockSnapshot {
  pub fn entries(&self) -> &BTreeMap<String, Vec<LockedPackage>> {
    &self.entries
  }

  /// Capture the current resolution as a new snapshot
  pub fn from_resolved(graph: &ResolvedGraph) -> Self {
    Self {
      entries: graph.dependencies().clone(),
    }
  }

  /// Load a snapshot; a missing file is an error, never an empty snapshot
  pub fn load(path: &Path) -> QuayResult<Self> {
    if !path.exists() {
      return Err(QuayError::with_help(
        format!("Lock snapshot not found: {}", path.display()),
        "Create it with `cargo quay lock --write` and commit it",
      ));
    }

    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read lock snapshot {}", path.display()))?;
    Self::parse(&content).with_context(|| format!("Invalid lock snapshot {}", path.display()))
  }

  pub fn parse(content: &str) -> QuayResult<Self> {
    let file: SnapshotFile = toml_edit::de::from_str(content)?;
    if file.version != FORMAT_VERSION {
      return Err(QuayError::Config(ConfigError::InvalidField {
        field: "version".to_string(),
        reason: format!("unsupported lock format {} (expected {})", file.version, FORMAT_VERSION),
      }));
    }

    let mut entries: BTreeMap<String, Vec<LockedPackage>> = BTreeMap::new();
    for entry in file.dependencies {
      semver::Version::parse(&entry.version)
        .with_context(|| format!("Dependency '{}' has version '{}'", entry.coordinate, entry.version))?;
      entries.entry(entry.coordinate).or_default().push(LockedPackage {
        version: entry.version,
        checksum: entry.checksum,
      });
    }
    for versions in entries.values_mut() {
      versions.sort();
      versions.dedup();
    }

    Ok(Self { entries })
  }

  /// Render the snapshot, sorted by coordinate then version
  pub fn render(&self) -> QuayResult<String> {
    let file = SnapshotFile {
      version: FORMAT_VERSION,
      dependencies: self
        .entries
        .iter()
        .flat_map(|(coordinate, versions)| {
          versions.iter().map(move |locked| SnapshotEntry {
            coordinate: coordinate.clone(),
            version: locked.version.clone(),
            checksum: locked.checksum.clone(),
          })
        })
        .collect(),
    };
    let body = toml_edit::ser::to_string_pretty(&file)?;
    Ok(format!("{}{}", HEADER, body))
  }

  pub fn save(&self, path: &Path) -> QuayResult<()> {
    let content = self.render()?;
    fs::write(path, content).with_context(|| format!("Failed to write lock snapshot {}", path.display()))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn graph(entries: &[(&str, &str, Option<&str>)]) -> ResolvedGraph {
    let mut map: BTreeMap<String, Vec<LockedPackage>> = BTreeMap::new();
    for (name, version, checksum) in entries {
      map.entry(name.to_string()).or_default().push(LockedPackage {
        version: version.to_string(),
        checksum: checksum.map(str::to_string),
      });
    }
    ResolvedGraph::new(map)
  }

  #[test]
  fn test_render_and_parse_preserves_entries() {
    let snapshot = LockSnapshot::from_resolved(&graph(&[
      ("serde", "1.0.228", Some("abc")),
      ("itoa", "1.0.15", None),
      ("syn", "2.0.100", None),
      ("syn", "1.0.109", None),
    ]));

    let text = snapshot.render().unwrap();
    assert!(text.starts_with("# Generated by"));
    assert!(text.find("\"itoa\"").unwrap() < text.find("\"serde\"").unwrap());

    let parsed = LockSnapshot::parse(&text).unwrap();
    assert_eq!(parsed, snapshot);
    assert_eq!(parsed.entries()["syn"].len(), 2);
  }

  #[test]
  fn test_parse_rejects_unknown_format_version() {
    let err = LockSnapshot::parse("version = 2\n").unwrap_err();
    assert!(err.to_string().contains("unsupported lock format"));
  }

  #[test]
  fn test_parse_rejects_malformed_version() {
    let text = "version = 1\n\n[[dependency]]\ncoordinate = \"serde\"\nversion = \"latest\"\n";
    assert!(LockSnapshot::parse(text).is_err());
  }

  #[test]
  fn test_load_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = LockSnapshot::load(&dir.path().join("quay.lock")).unwrap_err();
    assert!(err.help_message().unwrap_or_default().contains("lock --write"));
  }

  #[test]
  fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quay.lock");
    let snapshot = LockSnapshot::from_resolved(&graph(&[("anyhow", "1.0.100", Some("sum"))]));
    snapshot.save(&path).unwrap();
    assert_eq!(LockSnapshot::load(&path).unwrap(), snapshot);
  }
}
