//! Error types for cargo-quay with contextual messages and exit codes
//!
//! Every pipeline failure kind maps to its own exit code so automation can
//! branch on the outcome class (lock drift vs. quality violation vs. credential
//! absence vs. network failure).

use crate::lock::Drift;
use crate::quality::Violation;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for cargo-quay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (I/O, cargo metadata)
  System = 2,
  /// Validation failure (incomplete release metadata)
  Validation = 3,
  LockMismatch = 10,
  QualityGate = 11,
  NoSigningCredential = 12,
  MissingRepositoryCredentials = 13,
  Upload = 14,
  Signing = 15,
  ArtifactMissing = 16,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cargo-quay
#[derive(Debug)]
pub enum QuayError {
  /// Configuration errors
  Config(ConfigError),

  /// Terminal release pipeline failures
  Pipeline(PipelineError),

  /// Validation errors (release metadata)
  Validation(ValidationError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl QuayError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    QuayError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    QuayError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      QuayError::Message { message, context, help } => QuayError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      QuayError::Io(e) => QuayError::Message {
        message: ctx_str,
        context: Some(format!("I/O error: {}", e)),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      QuayError::Config(_) => ExitCode::User,
      QuayError::Pipeline(e) => e.exit_code(),
      QuayError::Validation(_) => ExitCode::Validation,
      QuayError::Io(_) => ExitCode::System,
      QuayError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      QuayError::Config(e) => e.help_message(),
      QuayError::Pipeline(e) => e.help_message(),
      QuayError::Validation(e) => e.help_message(),
      QuayError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }

  /// The pipeline failure carried by this error, if any
  pub fn as_pipeline(&self) -> Option<&PipelineError> {
    match self {
      QuayError::Pipeline(e) => Some(e),
      _ => None,
    }
  }
}

impl fmt::Display for QuayError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      QuayError::Config(e) => write!(f, "{}", e),
      QuayError::Pipeline(e) => write!(f, "{}", e),
      QuayError::Validation(e) => write!(f, "{}", e),
      QuayError::Io(e) => write!(f, "I/O error: {}", e),
      QuayError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for QuayError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      QuayError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for QuayError {
  fn from(err: io::Error) -> Self {
    QuayError::Io(err)
  }
}

impl From<String> for QuayError {
  fn from(msg: String) -> Self {
    QuayError::message(msg)
  }
}

impl From<&str> for QuayError {
  fn from(msg: &str) -> Self {
    QuayError::message(msg)
  }
}

impl From<PipelineError> for QuayError {
  fn from(err: PipelineError) -> Self {
    QuayError::Pipeline(err)
  }
}

impl From<toml_edit::TomlError> for QuayError {
  fn from(err: toml_edit::TomlError) -> Self {
    QuayError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for QuayError {
  fn from(err: toml_edit::de::Error) -> Self {
    QuayError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for QuayError {
  fn from(err: toml_edit::ser::Error) -> Self {
    QuayError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<cargo_metadata::Error> for QuayError {
  fn from(err: cargo_metadata::Error) -> Self {
    QuayError::with_help(
      format!("Cargo metadata error: {}", err),
      "Run the command from a directory containing a Cargo.toml",
    )
  }
}

impl From<serde_json::Error> for QuayError {
  fn from(err: serde_json::Error) -> Self {
    QuayError::message(format!("JSON error: {}", err))
  }
}

impl From<reqwest::Error> for QuayError {
  fn from(err: reqwest::Error) -> Self {
    QuayError::message(format!("HTTP client error: {}", err))
  }
}

impl From<semver::Error> for QuayError {
  fn from(err: semver::Error) -> Self {
    QuayError::message(format!("Version parse error: {}", err))
  }
}

impl From<glob::PatternError> for QuayError {
  fn from(err: glob::PatternError) -> Self {
    QuayError::message(format!("Invalid glob pattern: {}", err))
  }
}

impl From<glob::GlobError> for QuayError {
  fn from(err: glob::GlobError) -> Self {
    QuayError::message(format!("Failed to read source path: {}", err))
  }
}

impl From<regex::Error> for QuayError {
  fn from(err: regex::Error) -> Self {
    QuayError::message(format!("Invalid regular expression: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for QuayError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    QuayError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Convert anyhow::Error to QuayError
impl From<anyhow::Error> for QuayError {
  fn from(err: anyhow::Error) -> Self {
    QuayError::message(err.to_string())
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// quay.toml not found
  NotFound { project_root: PathBuf },

  /// Missing required field
  MissingField { field: String },

  /// Field present but not acceptable
  InvalidField { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create quay.toml with at least a [project] and [artifacts] section.".to_string())
      }
      ConfigError::MissingField { field } => Some(format!("Add `{}` to quay.toml.", field)),
      ConfigError::InvalidField { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { project_root } => {
        write!(
          f,
          "No cargo-quay configuration found.\nSearched quay.toml, .quay.toml, .cargo/quay.toml, .config/quay.toml under {}",
          project_root.display()
        )
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field in config: {}", field)
      }
      ConfigError::InvalidField { field, reason } => {
        write!(f, "Invalid value for {}: {}", field, reason)
      }
    }
  }
}

/// Validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// Release metadata has empty required fields
  IncompleteMetadata { fields: Vec<String> },

  /// Version identifier is empty or malformed
  InvalidVersion { version: String },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::IncompleteMetadata { .. } => {
        Some("Fill in every field of the [project] section in quay.toml.".to_string())
      }
      ValidationError::InvalidVersion { .. } => {
        Some("Pass --version, set project.version, or give the Cargo package a version.".to_string())
      }
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::IncompleteMetadata { fields } => {
        write!(f, "Release metadata is incomplete, empty fields: {}", fields.join(", "))
      }
      ValidationError::InvalidVersion { version } => {
        write!(f, "Invalid version identifier: '{}'", version)
      }
    }
  }
}

/// Terminal failures of the release pipeline, one per failure class
#[derive(Debug)]
pub enum PipelineError {
  /// Resolved dependencies diverge from the lock snapshot
  LockMismatch { drift: Vec<Drift> },

  /// Static analysis found at least one violation
  QualityGateFailure { violations: Vec<Violation> },

  /// Neither in-memory key material nor an agent is available
  NoSigningCredential { checked: Vec<String> },

  /// The selected publish target has no credentials
  MissingRepositoryCredentials { channel: String, missing: Vec<String> },

  /// A member of the artifact set (or the metadata document) failed to upload
  UploadFailure {
    member: String,
    target: String,
    reason: String,
  },

  /// Producing a detached signature failed
  SigningFailure { member: String, reason: String },

  /// A build output could not be produced or read
  ArtifactMissing { member: String, reason: String },
}

impl PipelineError {
  /// Exit code for this failure class
  pub fn exit_code(&self) -> ExitCode {
    match self {
      PipelineError::LockMismatch { .. } => ExitCode::LockMismatch,
      PipelineError::QualityGateFailure { .. } => ExitCode::QualityGate,
      PipelineError::NoSigningCredential { .. } => ExitCode::NoSigningCredential,
      PipelineError::MissingRepositoryCredentials { .. } => ExitCode::MissingRepositoryCredentials,
      PipelineError::UploadFailure { .. } => ExitCode::Upload,
      PipelineError::SigningFailure { .. } => ExitCode::Signing,
      PipelineError::ArtifactMissing { .. } => ExitCode::ArtifactMissing,
    }
  }

  /// Stable kind name, used in JSON output and state reporting
  pub fn kind(&self) -> &'static str {
    match self {
      PipelineError::LockMismatch { .. } => "LockMismatch",
      PipelineError::QualityGateFailure { .. } => "QualityGateFailure",
      PipelineError::NoSigningCredential { .. } => "NoSigningCredential",
      PipelineError::MissingRepositoryCredentials { .. } => "MissingRepositoryCredentials",
      PipelineError::UploadFailure { .. } => "UploadFailure",
      PipelineError::SigningFailure { .. } => "SigningFailure",
      PipelineError::ArtifactMissing { .. } => "ArtifactMissing",
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      PipelineError::LockMismatch { .. } => {
        Some("Review the drift, then re-lock explicitly with `cargo quay lock --write`.".to_string())
      }
      PipelineError::QualityGateFailure { .. } => {
        Some("Fix every violation or add a suppression in [quality] of quay.toml.".to_string())
      }
      PipelineError::NoSigningCredential { checked } => Some(format!(
        "Export {} or enable `[signing] agent = true`.",
        checked.join(" and ")
      )),
      PipelineError::MissingRepositoryCredentials { missing, .. } => {
        Some(format!("Export {} before publishing.", missing.join(" and ")))
      }
      PipelineError::UploadFailure { .. } => {
        Some("Nothing was retried. Check the repository state before re-running the release.".to_string())
      }
      PipelineError::SigningFailure { .. } => Some("Check that gpg is installed and the key can sign.".to_string()),
      PipelineError::ArtifactMissing { .. } => Some("Check the [artifacts] paths and build commands.".to_string()),
    }
  }
}

impl fmt::Display for PipelineError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PipelineError::LockMismatch { drift } => {
        write!(f, "Dependency lock mismatch ({} coordinate(s) diverge)", drift.len())?;
        for d in drift {
          write!(f, "\n  {}", d)?;
        }
        Ok(())
      }
      PipelineError::QualityGateFailure { violations } => {
        write!(f, "Quality gate failed with {} violation(s)", violations.len())?;
        for v in violations {
          write!(f, "\n  {}: [{}] {}", v.location(), v.rule, v.message)?;
        }
        Ok(())
      }
      PipelineError::NoSigningCredential { checked } => {
        write!(f, "No signing credential available (checked: {})", checked.join(", "))
      }
      PipelineError::MissingRepositoryCredentials { channel, missing } => {
        write!(
          f,
          "Missing repository credentials for the {} channel: {}",
          channel,
          missing.join(", ")
        )
      }
      PipelineError::UploadFailure { member, target, reason } => {
        write!(f, "Upload of {} to {} failed: {}", member, target, reason)
      }
      PipelineError::SigningFailure { member, reason } => {
        write!(f, "Signing {} failed: {}", member, reason)
      }
      PipelineError::ArtifactMissing { member, reason } => {
        write!(f, "Artifact {} unavailable: {}", member, reason)
      }
    }
  }
}

/// Result type alias for cargo-quay
pub type QuayResult<T> = Result<T, QuayError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> QuayResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> QuayResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<QuayError>,
{
  fn context(self, ctx: impl Into<String>) -> QuayResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> QuayResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &QuayError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
