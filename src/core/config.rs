//! quay.toml: discovery, parsing, validation and resolution against the environment

use crate::core::error::{ConfigError, QuayError, QuayResult, ResultExt, ValidationError};
use crate::core::secret::Secret;
use crate::publish::channel::{ChannelRouter, Endpoint};
use crate::quality::rules::RuleSettings;
use crate::release::metadata::{Developer, License, ReleaseMetadata, Scm};
use crate::release::version::{Version, is_path_segment};
use crate::signing::{AgentRef, SigningSources};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for cargo-quay
/// Searched in order: quay.toml, .quay.toml, .cargo/quay.toml, .config/quay.toml
///
/// Secrets never live in this file. It only names the environment variables
/// they are read from; [`QuayConfig::resolve`] turns the two into a
/// [`PipelineConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuayConfig {
  pub project: ProjectConfig,
  #[serde(default)]
  pub lock: LockConfig,
  #[serde(default)]
  pub quality: QualityConfig,
  #[serde(default)]
  pub signing: SigningConfig,
  #[serde(default)]
  pub channels: ChannelsConfig,
  #[serde(default)]
  pub publish: PublishConfig,
  pub artifacts: ArtifactsConfig,
}

/// Project identity and descriptive release metadata
///
/// Descriptive fields default to empty so that a missing field surfaces as
/// incomplete metadata instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
  #[serde(default)]
  pub group: String,
  #[serde(default)]
  pub artifact: String,
  /// Overrides the Cargo package version
  #[serde(default)]
  pub version: Option<String>,
  /// Display name (default: artifact id)
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub license: License,
  #[serde(default)]
  pub developers: Vec<Developer>,
  #[serde(default)]
  pub scm: Scm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
  /// Lock snapshot path, relative to the project root
  #[serde(default = "default_snapshot_path")]
  pub snapshot: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
  PathBuf::from("quay.lock")
}

impl Default for LockConfig {
  fn default() -> Self {
    Self {
      snapshot: default_snapshot_path(),
    }
  }
}

/// Quality gate configuration
///
/// Only the rule-set identity, its properties and suppressions are
/// configurable. Tolerance is not: any violation fails the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
  #[serde(default = "default_ruleset")]
  pub ruleset: String,
  /// Globs selecting the source tree, relative to the project root
  #[serde(default = "default_sources")]
  pub sources: Vec<String>,
  #[serde(default)]
  pub suppressions: Vec<Suppression>,
  #[serde(default = "default_max_line_length")]
  pub max_line_length: usize,
  /// Required first lines of every source file
  #[serde(default)]
  pub header: Option<String>,
  #[serde(default)]
  pub forbidden_patterns: Vec<String>,
}

fn default_ruleset() -> String {
  crate::quality::rules::RULESET_ID.to_string()
}

fn default_sources() -> Vec<String> {
  vec!["src/**/*.rs".to_string()]
}

fn default_max_line_length() -> usize {
  120
}

impl Default for QualityConfig {
  fn default() -> Self {
    Self {
      ruleset: default_ruleset(),
      sources: default_sources(),
      suppressions: Vec::new(),
      max_line_length: default_max_line_length(),
      header: None,
      forbidden_patterns: Vec::new(),
    }
  }
}

/// A rule suppressed for files matching a glob
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suppression {
  /// Rule id, or `*` for every rule
  pub rule: String,
  pub files: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
  /// Environment variable holding the ASCII-armored secret key
  #[serde(default = "default_key_env")]
  pub key_env: String,
  /// Environment variable holding the key passphrase
  #[serde(default = "default_passphrase_env")]
  pub passphrase_env: String,
  /// Fall back to the local keyring / gpg-agent
  #[serde(default)]
  pub agent: bool,
  #[serde(default)]
  pub key_id: Option<String>,
  #[serde(default = "default_gpg_program")]
  pub program: String,
}

fn default_key_env() -> String {
  "QUAY_SIGNING_KEY".to_string()
}

fn default_passphrase_env() -> String {
  "QUAY_SIGNING_PASSWORD".to_string()
}

fn default_gpg_program() -> String {
  "gpg".to_string()
}

impl Default for SigningConfig {
  fn default() -> Self {
    Self {
      key_env: default_key_env(),
      passphrase_env: default_passphrase_env(),
      agent: false,
      key_id: None,
      program: default_gpg_program(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
  /// Trailing markers that make a version a pre-release
  #[serde(default = "default_markers")]
  pub prerelease_markers: Vec<String>,
  #[serde(default = "default_snapshot_endpoint")]
  pub snapshot: EndpointConfig,
  #[serde(default = "default_release_endpoint")]
  pub release: EndpointConfig,
}

/// Repository endpoint; credentials are named, not stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
  pub url: String,
  #[serde(default = "default_username_env")]
  pub username_env: String,
  #[serde(default = "default_password_env")]
  pub password_env: String,
}

fn default_markers() -> Vec<String> {
  vec!["-SNAPSHOT".to_string()]
}

fn default_username_env() -> String {
  "OSSRH_USERNAME".to_string()
}

fn default_password_env() -> String {
  "OSSRH_PASSWORD".to_string()
}

fn default_snapshot_endpoint() -> EndpointConfig {
  EndpointConfig {
    url: "https://oss.sonatype.org/content/repositories/snapshots".to_string(),
    username_env: default_username_env(),
    password_env: default_password_env(),
  }
}

fn default_release_endpoint() -> EndpointConfig {
  EndpointConfig {
    url: "https://oss.sonatype.org/service/local/staging/deploy/maven2".to_string(),
    username_env: default_username_env(),
    password_env: default_password_env(),
  }
}

impl Default for ChannelsConfig {
  fn default() -> Self {
    Self {
      prerelease_markers: default_markers(),
      snapshot: default_snapshot_endpoint(),
      release: default_release_endpoint(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
  /// Per-request timeout for repository uploads
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  60
}

impl Default for PublishConfig {
  fn default() -> Self {
    Self {
      timeout_secs: default_timeout_secs(),
    }
  }
}

/// The three members of the artifact set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
  pub binary: ArtifactConfig,
  pub sources: ArtifactConfig,
  pub docs: ArtifactConfig,
}

/// One build output
///
/// `path` may contain `{artifact}` and `{version}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
  pub path: String,
  /// Command (argv) producing the output; run from the project root
  #[serde(default)]
  pub build: Vec<String>,
}

impl ArtifactConfig {
  /// Output path with placeholders expanded, relative to the project root
  pub fn expand_path(&self, artifact: &str, version: &Version) -> PathBuf {
    PathBuf::from(
      self
        .path
        .replace("{artifact}", artifact)
        .replace("{version}", version.as_str()),
    )
  }
}

/// Everything the pipeline needs, with secrets already resolved
///
/// Built once before a run and passed in explicitly. Required and optional
/// inputs are separate fields; nothing is read from the environment later.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
  pub root: PathBuf,
  pub version: Version,
  pub metadata: ReleaseMetadata,
  pub lock_snapshot: PathBuf,
  pub quality: RuleSettings,
  pub signing: SigningSources,
  pub router: ChannelRouter,
  pub artifacts: ArtifactsConfig,
  pub timeout: Duration,
}

impl QuayConfig {
  /// Find config file in search order: quay.toml, .quay.toml, .cargo/quay.toml, .config/quay.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("quay.toml"),
      path.join(".quay.toml"),
      path.join(".cargo").join("quay.toml"),
      path.join(".config").join("quay.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from quay.toml (searches multiple locations)
  pub fn load(path: &Path) -> QuayResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      QuayError::Config(ConfigError::NotFound {
        project_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;

    Ok(config)
  }

  /// Parse and validate config text
  pub fn parse(content: &str) -> QuayResult<Self> {
    let config: QuayConfig = toml_edit::de::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Validate settings that do not depend on the environment
  pub fn validate(&self) -> QuayResult<()> {
    // Empty values are reported later as incomplete metadata
    let group = &self.project.group;
    if !group.is_empty() && !group.split('.').all(is_path_segment) {
      return Err(invalid(
        "project.group",
        format!("'{}' is not a dotted list of path segments", group),
      ));
    }

    let artifact = &self.project.artifact;
    if !artifact.is_empty() && !is_path_segment(artifact) {
      return Err(invalid(
        "project.artifact",
        format!("'{}' must be a single path segment", artifact),
      ));
    }

    if self.quality.ruleset != crate::quality::rules::RULESET_ID {
      return Err(invalid(
        "quality.ruleset",
        format!(
          "unknown rule set '{}' (available: {})",
          self.quality.ruleset,
          crate::quality::rules::RULESET_ID
        ),
      ));
    }

    if self.quality.max_line_length == 0 {
      return Err(invalid("quality.max_line_length", "must be greater than zero"));
    }

    if self.quality.sources.is_empty() {
      return Err(invalid("quality.sources", "at least one glob is required"));
    }

    for pattern in &self.quality.sources {
      glob::Pattern::new(pattern).with_context(|| format!("quality.sources entry '{}'", pattern))?;
    }

    for suppression in &self.quality.suppressions {
      glob::Pattern::new(&suppression.files)
        .with_context(|| format!("suppression for rule '{}'", suppression.rule))?;
      if suppression.rule != "*" && !crate::quality::rules::RULE_IDS.contains(&suppression.rule.as_str()) {
        return Err(invalid(
          "quality.suppressions",
          format!("unknown rule '{}'", suppression.rule),
        ));
      }
    }

    for pattern in &self.quality.forbidden_patterns {
      regex::Regex::new(pattern).with_context(|| format!("quality.forbidden_patterns entry '{}'", pattern))?;
    }

    if self.channels.prerelease_markers.is_empty() || self.channels.prerelease_markers.iter().any(|m| m.is_empty()) {
      return Err(invalid("channels.prerelease_markers", "markers must be non-empty"));
    }

    for (name, endpoint) in [("channels.snapshot", &self.channels.snapshot), ("channels.release", &self.channels.release)] {
      if endpoint.url.trim().is_empty() {
        return Err(QuayError::Config(ConfigError::MissingField {
          field: format!("{}.url", name),
        }));
      }
    }

    if self.publish.timeout_secs == 0 {
      return Err(invalid("publish.timeout_secs", "must be greater than zero"));
    }

    for (name, artifact) in [
      ("artifacts.binary", &self.artifacts.binary),
      ("artifacts.sources", &self.artifacts.sources),
      ("artifacts.docs", &self.artifacts.docs),
    ] {
      if artifact.path.trim().is_empty() {
        return Err(QuayError::Config(ConfigError::MissingField {
          field: format!("{}.path", name),
        }));
      }
    }

    Ok(())
  }

  /// Resolve into a [`PipelineConfig`]
  ///
  /// Version precedence: `version_override` (CLI), then `project.version`,
  /// then `package_version` (the Cargo package). `env` looks up secrets by
  /// variable name; empty values count as unset.
  pub fn resolve(
    &self,
    root: &Path,
    version_override: Option<&str>,
    package_version: Option<&str>,
    env: &dyn Fn(&str) -> Option<String>,
  ) -> QuayResult<PipelineConfig> {
    let raw_version = version_override
      .map(str::to_string)
      .or_else(|| self.project.version.clone())
      .or_else(|| package_version.map(str::to_string))
      .ok_or_else(|| {
        QuayError::Validation(ValidationError::InvalidVersion {
          version: String::new(),
        })
      })?;
    let version = Version::new(raw_version)?;

    let lookup = |name: &str| env(name).filter(|v| !v.is_empty()).map(Secret::new);

    let signing = SigningSources {
      key_env: self.signing.key_env.clone(),
      passphrase_env: self.signing.passphrase_env.clone(),
      key: lookup(&self.signing.key_env),
      passphrase: lookup(&self.signing.passphrase_env),
      program: self.signing.program.clone(),
      agent: self.signing.agent.then(|| AgentRef {
        program: self.signing.program.clone(),
        key_id: self.signing.key_id.clone(),
      }),
    };

    let endpoint = |cfg: &EndpointConfig| Endpoint {
      url: cfg.url.trim_end_matches('/').to_string(),
      username_env: cfg.username_env.clone(),
      password_env: cfg.password_env.clone(),
      username: lookup(&cfg.username_env),
      password: lookup(&cfg.password_env),
    };

    let router = ChannelRouter::new(
      self.channels.prerelease_markers.clone(),
      endpoint(&self.channels.snapshot),
      endpoint(&self.channels.release),
    );

    let metadata = ReleaseMetadata {
      group: self.project.group.clone(),
      artifact: self.project.artifact.clone(),
      version: version.as_str().to_string(),
      name: self.project.name.clone().unwrap_or_else(|| self.project.artifact.clone()),
      description: self.project.description.clone(),
      url: self.project.url.clone(),
      license: self.project.license.clone(),
      developers: self.project.developers.clone(),
      scm: self.project.scm.clone(),
    };

    Ok(PipelineConfig {
      root: root.to_path_buf(),
      version,
      metadata,
      lock_snapshot: root.join(&self.lock.snapshot),
      quality: RuleSettings::from_config(&self.quality)?,
      signing,
      router,
      artifacts: self.artifacts.clone(),
      timeout: Duration::from_secs(self.publish.timeout_secs),
    })
  }
}

fn invalid(field: &str, reason: impl Into<String>) -> QuayError {
  QuayError::Config(ConfigError::InvalidField {
    field: field.to_string(),
    reason: reason.into(),
  })
}
