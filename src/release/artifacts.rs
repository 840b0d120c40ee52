//! Artifact set assembly
//!
//! Build commands for the three members run in parallel and are joined before
//! the quality gate. Outputs are then read and hashed once; the resulting
//! [`ArtifactSet`] is never modified.

use crate::core::config::{ArtifactConfig, ArtifactsConfig};
use crate::core::error::{PipelineError, QuayResult};
use crate::release::version::Version;
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
  Binary,
  Sources,
  Docs,
}

impl ArtifactKind {
  pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Binary, ArtifactKind::Sources, ArtifactKind::Docs];

  /// Remote classifier suffix; the primary binary has none
  pub fn classifier(self) -> Option<&'static str> {
    match self {
      ArtifactKind::Binary => None,
      ArtifactKind::Sources => Some("sources"),
      ArtifactKind::Docs => Some("docs"),
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      ArtifactKind::Binary => "binary",
      ArtifactKind::Sources => "sources",
      ArtifactKind::Docs => "docs",
    }
  }

  fn config(self, artifacts: &ArtifactsConfig) -> &ArtifactConfig {
    match self {
      ArtifactKind::Binary => &artifacts.binary,
      ArtifactKind::Sources => &artifacts.sources,
      ArtifactKind::Docs => &artifacts.docs,
    }
  }
}

impl fmt::Display for ArtifactKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One build output, read into memory and hashed
#[derive(Debug, Clone)]
pub struct Artifact {
  kind: ArtifactKind,
  path: PathBuf,
  bytes: Vec<u8>,
  sha256: String,
}

impl Artifact {
  pub fn new(kind: ArtifactKind, path: PathBuf, bytes: Vec<u8>) -> Self {
    let sha256 = sha256_hex(&bytes);
    Self {
      kind,
      path,
      bytes,
      sha256,
    }
  }

  pub fn kind(&self) -> ArtifactKind {
    self.kind
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn sha256(&self) -> &str {
    &self.sha256
  }

  /// File extension used for the remote name (`jar`, `tar.gz`, ...)
  pub fn extension(&self) -> String {
    let name = self.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    if name.ends_with(".tar.gz") {
      return "tar.gz".to_string();
    }
    self
      .path
      .extension()
      .map(|e| e.to_string_lossy().into_owned())
      .unwrap_or_else(|| "bin".to_string())
  }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  format!("{:x}", hasher.finalize())
}

/// Binary, sources and documentation packages of one release
#[derive(Debug, Clone)]
pub struct ArtifactSet {
  binary: Artifact,
  sources: Artifact,
  docs: Artifact,
}

impl ArtifactSet {
  pub fn new(binary: Artifact, sources: Artifact, docs: Artifact) -> Self {
    Self { binary, sources, docs }
  }

  /// Run the configured build commands, then collect and hash the outputs
  pub fn assemble(root: &Path, config: &ArtifactsConfig, artifact_id: &str, version: &Version) -> QuayResult<Self> {
    ArtifactKind::ALL
      .par_iter()
      .try_for_each(|kind| run_build(root, *kind, kind.config(config)))?;

    let mut members = ArtifactKind::ALL
      .par_iter()
      .map(|kind| -> QuayResult<Artifact> {
        let path = root.join(kind.config(config).expand_path(artifact_id, version));
        let bytes = fs::read(&path).map_err(|e| PipelineError::ArtifactMissing {
          member: kind.to_string(),
          reason: format!("{}: {}", path.display(), e),
        })?;
        tracing::debug!(member = %kind, path = %path.display(), size = bytes.len(), "collected artifact");
        Ok(Artifact::new(*kind, path, bytes))
      })
      .collect::<QuayResult<Vec<_>>>()?
      .into_iter();

    match (members.next(), members.next(), members.next()) {
      (Some(binary), Some(sources), Some(docs)) => Ok(Self::new(binary, sources, docs)),
      _ => Err("artifact set is incomplete".into()),
    }
  }

  /// Members in publish order
  pub fn members(&self) -> [&Artifact; 3] {
    [&self.binary, &self.sources, &self.docs]
  }
}

fn run_build(root: &Path, kind: ArtifactKind, config: &ArtifactConfig) -> QuayResult<()> {
  let Some((program, args)) = config.build.split_first() else {
    return Ok(());
  };

  tracing::info!(member = %kind, command = %config.build.join(" "), "building artifact");
  let output = Command::new(program)
    .args(args)
    .current_dir(root)
    .output()
    .map_err(|e| PipelineError::ArtifactMissing {
      member: kind.to_string(),
      reason: format!("failed to run `{}`: {}", program, e),
    })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(
      PipelineError::ArtifactMissing {
        member: kind.to_string(),
        reason: format!("`{}` exited with {}: {}", config.build.join(" "), output.status, stderr.trim()),
      }
      .into(),
    );
  }

  Ok(())
}
