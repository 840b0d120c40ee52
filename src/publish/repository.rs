//! Remote repository access: Maven 2 layout over HTTP or a local directory

use crate::core::error::{QuayError, QuayResult, ResultExt};
use crate::publish::channel::{PublishTarget, RepositoryCredentials};
use crate::release::{Artifact, ReleaseMetadata};
use crate::utils::local_repository_path;
use reqwest::blocking::Client;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Storage behind a publish target
///
/// Paths are relative to the target URL and use forward slashes. A single
/// call either stores the whole file or fails; nothing is retried.
pub trait Repository: Send + Sync {
  fn put(&self, path: &str, bytes: &[u8]) -> QuayResult<()>;

  fn get(&self, path: &str) -> QuayResult<Vec<u8>>;

  /// Absolute location of `path`, for reporting
  fn location(&self, path: &str) -> String;
}

/// Open the repository a target points at
pub fn open(target: &PublishTarget, timeout: Duration) -> QuayResult<Box<dyn Repository>> {
  match local_repository_path(&target.url) {
    Some(root) => Ok(Box::new(FileRepository::new(root))),
    None => Ok(Box::new(HttpRepository::new(&target.url, target.credentials.clone(), timeout)?)),
  }
}

/// Remote names for one release: `{group as path}/{artifact}/{version}/...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLayout {
  group: String,
  artifact: String,
  version: String,
  metadata_file: String,
}

impl RemoteLayout {
  pub fn new(metadata: &ReleaseMetadata) -> Self {
    Self {
      group: metadata.group.clone(),
      artifact: metadata.artifact.clone(),
      version: metadata.version.clone(),
      metadata_file: metadata.file_name(),
    }
  }

  pub fn directory(&self) -> String {
    format!("{}/{}/{}", self.group.replace('.', "/"), self.artifact, self.version)
  }

  pub fn artifact_path(&self, artifact: &Artifact) -> String {
    let classifier = artifact.kind().classifier().map(|c| format!("-{}", c)).unwrap_or_default();
    format!(
      "{}/{}-{}{}.{}",
      self.directory(),
      self.artifact,
      self.version,
      classifier,
      artifact.extension()
    )
  }

  pub fn metadata_path(&self) -> String {
    format!("{}/{}", self.directory(), self.metadata_file)
  }
}

/// HTTP(S) repository accepting `PUT` with basic authentication
pub struct HttpRepository {
  client: Client,
  base_url: String,
  credentials: RepositoryCredentials,
}

impl HttpRepository {
  pub fn new(base_url: &str, credentials: RepositoryCredentials, timeout: Duration) -> QuayResult<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(concat!("cargo-quay/", env!("CARGO_PKG_VERSION")))
      .build()
      .context("Failed to create HTTP client")?;

    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      credentials,
    })
  }
}

impl Repository for HttpRepository {
  fn put(&self, path: &str, bytes: &[u8]) -> QuayResult<()> {
    let url = self.location(path);
    let response = self
      .client
      .put(&url)
      .basic_auth(self.credentials.username.expose(), Some(self.credentials.password.expose()))
      .body(bytes.to_vec())
      .send()?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().unwrap_or_default();
      return Err(QuayError::message(format!(
        "HTTP {}: {}",
        status,
        body.chars().take(200).collect::<String>()
      )));
    }
    Ok(())
  }

  fn get(&self, path: &str) -> QuayResult<Vec<u8>> {
    let url = self.location(path);
    let response = self
      .client
      .get(&url)
      .basic_auth(self.credentials.username.expose(), Some(self.credentials.password.expose()))
      .send()
      .with_context(|| format!("Failed to fetch {}", url))?;

    let status = response.status();
    if !status.is_success() {
      return Err(QuayError::message(format!("Failed to fetch {}: HTTP {}", url, status)));
    }
    Ok(response.bytes()?.to_vec())
  }

  fn location(&self, path: &str) -> String {
    format!("{}/{}", self.base_url, path)
  }
}

/// Repository rooted at a local directory (`file://` URLs and plain paths)
pub struct FileRepository {
  root: PathBuf,
}

impl FileRepository {
  pub fn new(root: PathBuf) -> Self {
    Self { root }
  }

  fn resolve(&self, path: &str) -> PathBuf {
    path.split('/').fold(self.root.clone(), |acc, part| acc.join(part))
  }
}

impl Repository for FileRepository {
  fn put(&self, path: &str, bytes: &[u8]) -> QuayResult<()> {
    let dest = self.resolve(path);
    if let Some(parent) = dest.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&dest, bytes).with_context(|| format!("Failed to write {}", dest.display()))?;
    Ok(())
  }

  fn get(&self, path: &str) -> QuayResult<Vec<u8>> {
    let src = self.resolve(path);
    fs::read(&src).with_context(|| format!("Failed to read {}", src.display()))
  }

  fn location(&self, path: &str) -> String {
    self.resolve(path).display().to_string()
  }
}
