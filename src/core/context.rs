//! Release context - build once, pass everywhere
//!
//! Every command receives `&ReleaseContext` from main.rs instead of loading
//! quay.toml and cargo metadata on its own.

use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::config::{PipelineConfig, QuayConfig};
use crate::core::error::{QuayError, QuayResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared project-level data for all commands
#[derive(Clone)]
pub struct ReleaseContext {
  /// Project root directory (absolute path)
  pub root: PathBuf,

  /// Cargo metadata, absent for projects without a Cargo.toml
  pub metadata: Option<WorkspaceMetadata>,

  /// quay.toml, absent when no configuration file exists
  pub config: Option<Arc<QuayConfig>>,
}

impl ReleaseContext {
  /// Build the context from a project root.
  ///
  /// A malformed quay.toml is an error. A missing one is not; commands that
  /// need it call [`ReleaseContext::require_config`].
  pub fn build(root: &Path) -> QuayResult<Self> {
    let root = root.to_path_buf();
    let config = if QuayConfig::find_config_path(&root).is_some() {
      Some(Arc::new(QuayConfig::load(&root)?))
    } else {
      None
    };

    let metadata = if root.join("Cargo.toml").exists() {
      Some(WorkspaceMetadata::load(&root)?)
    } else {
      None
    };

    Ok(Self { root, metadata, config })
  }

  /// Get config or error if not found.
  pub fn require_config(&self) -> QuayResult<&Arc<QuayConfig>> {
    self.config.as_ref().ok_or_else(|| {
      QuayError::Config(crate::core::error::ConfigError::NotFound {
        project_root: self.root.clone(),
      })
    })
  }

  /// Get cargo metadata or error if the project has no Cargo.toml
  pub fn require_metadata(&self) -> QuayResult<&WorkspaceMetadata> {
    self.metadata.as_ref().ok_or_else(|| {
      QuayError::with_help(
        format!("No Cargo.toml found in {}", self.root.display()),
        "The resolved dependency graph is read from cargo metadata",
      )
    })
  }

  /// Resolve quay.toml against the process environment
  pub fn pipeline_config(&self, version_override: Option<&str>) -> QuayResult<PipelineConfig> {
    let config = self.require_config()?;
    let package_version = self.metadata.as_ref().and_then(|m| m.package_version());
    let env = |name: &str| std::env::var(name).ok();
    config.resolve(&self.root, version_override, package_version.as_deref(), &env)
  }

  /// Get project root as Path reference (convenience)
  pub fn project_root(&self) -> &Path {
    &self.root
  }
}
