//! Version identifier of a release

use crate::core::error::{QuayError, QuayResult, ValidationError};
use serde::Serialize;
use std::fmt;

/// Version identifier of the artifact being released
///
/// Supplied before the run starts and never changed afterwards. Semver is not
/// required; classification only looks at trailing markers. The identifier is
/// also a remote path segment, so `.`, `..` and separators are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
  pub fn new(raw: impl Into<String>) -> QuayResult<Self> {
    let raw = raw.into();
    if !is_path_segment(&raw) {
      return Err(QuayError::Validation(ValidationError::InvalidVersion { version: raw }));
    }
    Ok(Self(raw))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

/// A single, non-traversing component of a remote path
pub fn is_path_segment(value: &str) -> bool {
  !value.is_empty()
    && value != "."
    && value != ".."
    && !value.chars().any(|c| c.is_whitespace() || c.is_control() || c == '/' || c == '\\')
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
