use crate::core::error::{QuayResult, ResultExt};
use crate::lock::{LockedPackage, ResolvedGraph};
use cargo_metadata::{MetadataCommand, Package};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Workspace introspection using cargo_metadata
#[derive(Clone)]
pub struct WorkspaceMetadata {
  metadata: cargo_metadata::Metadata,
}

impl WorkspaceMetadata {
  pub fn load(workspace_root: &Path) -> QuayResult<Self> {
    let metadata = MetadataCommand::new()
      .manifest_path(workspace_root.join("Cargo.toml"))
      .exec()?;
    Ok(Self { metadata })
  }

  pub fn workspace_root(&self) -> &Path {
    self.metadata.workspace_root.as_std_path()
  }

  /// Version of the root package, or of the first workspace member
  pub fn package_version(&self) -> Option<String> {
    self
      .metadata
      .root_package()
      .or_else(|| self.metadata.workspace_packages().into_iter().next())
      .map(|pkg| pkg.version.to_string())
  }

  /// Every resolved third-party package, with checksums from Cargo.lock
  ///
  /// Workspace members are local and never part of the graph.
  pub fn resolved_graph(&self) -> QuayResult<ResolvedGraph> {
    let members: HashSet<_> = self.metadata.workspace_members.iter().collect();
    let checksums = self.lockfile_checksums()?;

    let mut dependencies: BTreeMap<String, Vec<LockedPackage>> = BTreeMap::new();
    for package in self.metadata.packages.iter().filter(|p| !members.contains(&p.id)) {
      dependencies
        .entry(package.name.to_string())
        .or_default()
        .push(locked_package(package, &checksums));
    }

    Ok(ResolvedGraph::new(dependencies))
  }

  /// (name, version) -> checksum, read from the workspace Cargo.lock
  fn lockfile_checksums(&self) -> QuayResult<HashMap<(String, String), String>> {
    let lock_path = self.workspace_root().join("Cargo.lock");
    if !lock_path.exists() {
      return Ok(HashMap::new());
    }

    let content =
      fs::read_to_string(&lock_path).with_context(|| format!("Failed to read {}", lock_path.display()))?;
    let doc: toml_edit::DocumentMut = content
      .parse()
      .with_context(|| format!("Failed to parse {}", lock_path.display()))?;

    let mut checksums = HashMap::new();
    if let Some(packages) = doc.get("package").and_then(|p| p.as_array_of_tables()) {
      for table in packages.iter() {
        let field = |key: &str| table.get(key).and_then(|v| v.as_str()).map(str::to_string);
        if let (Some(name), Some(version), Some(checksum)) = (field("name"), field("version"), field("checksum")) {
          checksums.insert((name, version), checksum);
        }
      }
    }

    Ok(checksums)
  }
}

fn locked_package(package: &Package, checksums: &HashMap<(String, String), String>) -> LockedPackage {
  let version = package.version.to_string();
  let checksum = checksums.get(&(package.name.to_string(), version.clone())).cloned();
  LockedPackage { version, checksum }
}
