//! Descriptive release metadata published next to the artifact set

use crate::core::error::{QuayError, QuayResult, ValidationError};
use serde::{Deserialize, Serialize};

/// Metadata document for one release
///
/// Built once from configuration and never changed. Every field must be
/// non-empty before anything is published; see [`ReleaseMetadata::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
  pub group: String,
  pub artifact: String,
  pub version: String,
  pub name: String,
  pub description: String,
  pub url: String,
  pub license: License,
  pub developers: Vec<Developer>,
  pub scm: Scm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub url: String,
  #[serde(default = "default_distribution")]
  pub distribution: String,
}

fn default_distribution() -> String {
  "repo".to_string()
}

impl Default for License {
  fn default() -> Self {
    Self {
      name: String::new(),
      url: String::new(),
      distribution: default_distribution(),
    }
  }
}

/// Author / contact identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Developer {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
}

/// Source-control coordinates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scm {
  #[serde(default)]
  pub connection: String,
  #[serde(default)]
  pub developer_connection: String,
  #[serde(default)]
  pub url: String,
}

impl ReleaseMetadata {
  /// Names of every required field that is empty, in document order
  pub fn missing_fields(&self) -> Vec<String> {
    let mut missing = Vec::new();
    let mut require = |field: &str, value: &str| {
      if value.trim().is_empty() {
        missing.push(field.to_string());
      }
    };

    require("group", &self.group);
    require("artifact", &self.artifact);
    require("version", &self.version);
    require("name", &self.name);
    require("description", &self.description);
    require("url", &self.url);
    require("license.name", &self.license.name);
    require("license.url", &self.license.url);
    require("license.distribution", &self.license.distribution);
    for (i, dev) in self.developers.iter().enumerate() {
      require(&format!("developers[{}].name", i), &dev.name);
      require(&format!("developers[{}].email", i), &dev.email);
    }
    require("scm.connection", &self.scm.connection);
    require("scm.developer_connection", &self.scm.developer_connection);
    require("scm.url", &self.scm.url);

    if self.developers.is_empty() {
      missing.push("developers".to_string());
    }
    missing
  }

  pub fn validate(&self) -> QuayResult<()> {
    let fields = self.missing_fields();
    if fields.is_empty() {
      Ok(())
    } else {
      Err(QuayError::Validation(ValidationError::IncompleteMetadata { fields }))
    }
  }

  /// Remote file name of the metadata document
  pub fn file_name(&self) -> String {
    format!("{}-{}.json", self.artifact, self.version)
  }

  pub fn to_json(&self) -> QuayResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(self)?;
    bytes.push(b'\n');
    Ok(bytes)
  }

  pub fn from_json(bytes: &[u8]) -> QuayResult<Self> {
    Ok(serde_json::from_slice(bytes)?)
  }
}
