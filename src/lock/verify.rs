//! Lock verification: compare the resolved graph against the snapshot

use crate::core::error::PipelineError;
use crate::lock::{LockSnapshot, LockedPackage, ResolvedGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One divergent coordinate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Drift {
  /// Resolved but not in the snapshot
  Added {
    coordinate: String,
    versions: Vec<LockedPackage>,
  },
  /// In the snapshot but no longer resolved
  Removed {
    coordinate: String,
    versions: Vec<LockedPackage>,
  },
  /// Resolved at a different version (or checksum) than locked
  Changed {
    coordinate: String,
    locked: Vec<LockedPackage>,
    resolved: Vec<LockedPackage>,
  },
}

impl Drift {
  pub fn coordinate(&self) -> &str {
    match self {
      Drift::Added { coordinate, .. } | Drift::Removed { coordinate, .. } | Drift::Changed { coordinate, .. } => {
        coordinate
      }
    }
  }
}

fn versions(list: &[LockedPackage]) -> String {
  list.iter().map(|p| p.version.as_str()).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Drift {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Drift::Added { coordinate, versions: v } => write!(f, "+ {} {} (not locked)", coordinate, versions(v)),
      Drift::Removed { coordinate, versions: v } => write!(f, "- {} {} (no longer resolved)", coordinate, versions(v)),
      Drift::Changed {
        coordinate,
        locked,
        resolved,
      } => {
        let (locked_v, resolved_v) = (versions(locked), versions(resolved));
        if locked_v == resolved_v {
          write!(f, "~ {} {} (checksum differs)", coordinate, resolved_v)
        } else {
          write!(f, "~ {} {} -> {}", coordinate, locked_v, resolved_v)
        }
      }
    }
  }
}

/// Compares a resolved graph with a lock snapshot
///
/// Read-only: the snapshot is never updated from here.
pub struct LockVerifier<'a> {
  snapshot: &'a LockSnapshot,
}

impl<'a> LockVerifier<'a> {
  pub fn new(snapshot: &'a LockSnapshot) -> Self {
    Self { snapshot }
  }

  /// Every divergent coordinate, sorted by coordinate
  pub fn diff(&self, resolved: &ResolvedGraph) -> Vec<Drift> {
    let locked = self.snapshot.entries();
    let current = resolved.dependencies();

    let coordinates: BTreeSet<&String> = locked.keys().chain(current.keys()).collect();
    let mut drift = Vec::new();

    for coordinate in coordinates {
      match (locked.get(coordinate), current.get(coordinate)) {
        (None, Some(now)) => drift.push(Drift::Added {
          coordinate: coordinate.clone(),
          versions: now.clone(),
        }),
        (Some(was), None) => drift.push(Drift::Removed {
          coordinate: coordinate.clone(),
          versions: was.clone(),
        }),
        (Some(was), Some(now)) if !same_resolution(was, now) => drift.push(Drift::Changed {
          coordinate: coordinate.clone(),
          locked: was.clone(),
          resolved: now.clone(),
        }),
        _ => {}
      }
    }

    drift
  }

  /// Succeeds only when the resolved graph matches the snapshot exactly
  pub fn verify(&self, resolved: &ResolvedGraph) -> Result<(), PipelineError> {
    let drift = self.diff(resolved);
    if drift.is_empty() {
      return Ok(());
    }

    let coordinates: Vec<&str> = drift.iter().map(Drift::coordinate).collect();
    tracing::warn!(?coordinates, "resolved graph diverges from lock snapshot");
    Err(PipelineError::LockMismatch { drift })
  }
}

/// Same versions, and same checksums wherever both sides record one
fn same_resolution(locked: &[LockedPackage], resolved: &[LockedPackage]) -> bool {
  locked.len() == resolved.len()
    && locked.iter().zip(resolved).all(|(a, b)| {
      a.version == b.version
        && match (&a.checksum, &b.checksum) {
          (Some(x), Some(y)) => x == y,
          _ => true,
        }
    })
}
