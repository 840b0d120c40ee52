//! Channel routing and publishing (stage 4 of the release pipeline)
//!
//! From the pipeline's point of view a publish is all-or-nothing: the first
//! failed upload ends it, and success is only reported once every file of
//! every member and the metadata document are stored.

pub mod channel;
pub mod repository;

pub use channel::{Channel, PublishTarget};
pub use repository::{RemoteLayout, Repository};

use crate::core::error::{PipelineError, QuayResult};
use crate::release::artifacts::sha256_hex;
use crate::release::{ArtifactSet, ReleaseMetadata};
use crate::ui::progress::UploadProgress;

/// Artifact set and metadata document with their detached signatures
pub struct SignedRelease {
  pub artifacts: ArtifactSet,
  /// One signature per member, in [`ArtifactSet::members`] order
  pub signatures: [Vec<u8>; 3],
  pub metadata: ReleaseMetadata,
  pub metadata_document: Vec<u8>,
  pub metadata_signature: Vec<u8>,
}

/// One file to store
#[derive(Debug, Clone)]
pub struct UploadFile {
  /// Artifact member (or `metadata`) the file belongs to
  pub member: String,
  pub path: String,
  pub bytes: Vec<u8>,
}

/// Every file of a release in upload order
///
/// Each member is followed by its `.asc` and `.sha256` siblings; the metadata
/// document and its siblings come last.
pub fn upload_plan(layout: &RemoteLayout, release: &SignedRelease) -> Vec<UploadFile> {
  let mut files = Vec::new();
  let mut push = |member: &str, path: String, bytes: &[u8], signature: &[u8]| {
    let siblings = [
      (format!("{}.asc", path), signature.to_vec()),
      (format!("{}.sha256", path), sha256_hex(bytes).into_bytes()),
    ];
    files.push(UploadFile {
      member: member.to_string(),
      path,
      bytes: bytes.to_vec(),
    });
    for (path, bytes) in siblings {
      files.push(UploadFile {
        member: member.to_string(),
        path,
        bytes,
      });
    }
  };

  for (artifact, signature) in release.artifacts.members().into_iter().zip(&release.signatures) {
    push(
      artifact.kind().as_str(),
      layout.artifact_path(artifact),
      artifact.bytes(),
      signature,
    );
  }
  push(
    "metadata",
    layout.metadata_path(),
    &release.metadata_document,
    &release.metadata_signature,
  );

  files
}

/// Store every file in order, stopping at the first failure
///
/// Returns the location of each stored file.
pub fn upload_all(
  repository: &dyn Repository,
  files: &[UploadFile],
  mut progress: Option<&mut UploadProgress>,
) -> Result<Vec<String>, PipelineError> {
  let mut stored = Vec::with_capacity(files.len());

  for file in files {
    let location = repository.location(&file.path);
    tracing::debug!(member = %file.member, %location, size = file.bytes.len(), "uploading");

    repository
      .put(&file.path, &file.bytes)
      .map_err(|e| PipelineError::UploadFailure {
        member: file.member.clone(),
        target: location.clone(),
        reason: e.to_string(),
      })?;

    if let Some(bar) = progress.as_deref_mut() {
      bar.inc();
    }
    stored.push(location);
  }

  Ok(stored)
}

/// Read back a published metadata document
pub fn fetch_metadata(repository: &dyn Repository, layout: &RemoteLayout) -> QuayResult<ReleaseMetadata> {
  let bytes = repository.get(&layout.metadata_path())?;
  ReleaseMetadata::from_json(&bytes)
}
