//! Dependency locking: snapshot file and drift detection
//!
//! A lock snapshot is a committed, exact record of resolved dependency
//! versions. The release pipeline only ever reads it. Re-locking is a separate,
//! explicit action (`cargo quay lock --write`).

pub mod snapshot;
pub mod verify;

pub use snapshot::LockSnapshot;
pub use verify::{Drift, LockVerifier};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One resolved version of a dependency coordinate
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LockedPackage {
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub checksum: Option<String>,
}

/// The dependency set produced by the current resolution
///
/// Keyed by coordinate (crate name). A coordinate may resolve to more than one
/// version; versions are kept sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedGraph {
  dependencies: BTreeMap<String, Vec<LockedPackage>>,
}

impl ResolvedGraph {
  pub fn new(mut dependencies: BTreeMap<String, Vec<LockedPackage>>) -> Self {
    for versions in dependencies.values_mut() {
      versions.sort();
      versions.dedup();
    }
    Self { dependencies }
  }

  pub fn dependencies(&self) -> &BTreeMap<String, Vec<LockedPackage>> {
    &self.dependencies
  }

  pub fn len(&self) -> usize {
    self.dependencies.len()
  }
}
