//! Release pipeline: lock check, quality gate, signing, routing and publish
//!
//! Stages run strictly in order and the first failure is terminal:
//!
//! ```text
//! INIT -> LOCK_CHECKED -> GATE_PASSED -> SIGNED -> PUBLISHED
//!   \________\_______________\____________\______-> FAILED(kind)
//! ```
//!
//! Artifact builds run after the lock check and are joined before the gate.
//! Nothing is uploaded until every earlier stage has passed, and a failed
//! upload fails the whole publish.

use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::config::PipelineConfig;
use crate::core::error::{PipelineError, QuayError, QuayResult};
use crate::lock::{LockSnapshot, LockVerifier, ResolvedGraph};
use crate::publish::{self, Channel, PublishTarget, RemoteLayout, Repository, SignedRelease};
use crate::quality::QualityGate;
use crate::release::{Artifact, ArtifactKind, ArtifactSet};
use crate::signing::{GpgSigner, Signer, SigningCredential, SigningKeyResolver, SigningMode};
use crate::ui::progress::UploadProgress;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Where a run currently stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
  Init,
  LockChecked,
  GatePassed,
  Signed,
  Published,
  /// Terminal failure, carrying the failure kind
  Failed(String),
}

impl fmt::Display for PipelineState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PipelineState::Init => write!(f, "INIT"),
      PipelineState::LockChecked => write!(f, "LOCK_CHECKED"),
      PipelineState::GatePassed => write!(f, "GATE_PASSED"),
      PipelineState::Signed => write!(f, "SIGNED"),
      PipelineState::Published => write!(f, "PUBLISHED"),
      PipelineState::Failed(kind) => write!(f, "FAILED({})", kind),
    }
  }
}

/// External collaborators of a run
///
/// The resolved graph, the signing program and the remote repository are the
/// only things the pipeline does not compute itself.
pub trait Backend {
  fn resolved_graph(&self) -> QuayResult<ResolvedGraph>;

  fn signer(&self, credential: &SigningCredential) -> QuayResult<Box<dyn Signer>>;

  fn repository(&self, target: &PublishTarget, timeout: Duration) -> QuayResult<Box<dyn Repository>>;
}

/// Cargo metadata, system gpg and HTTP / directory repositories
pub struct SystemBackend<'a> {
  workspace: &'a WorkspaceMetadata,
}

impl<'a> SystemBackend<'a> {
  pub fn new(workspace: &'a WorkspaceMetadata) -> Self {
    Self { workspace }
  }
}

impl Backend for SystemBackend<'_> {
  fn resolved_graph(&self) -> QuayResult<ResolvedGraph> {
    self.workspace.resolved_graph()
  }

  fn signer(&self, credential: &SigningCredential) -> QuayResult<Box<dyn Signer>> {
    Ok(Box::new(GpgSigner::new(credential)?))
  }

  fn repository(&self, target: &PublishTarget, timeout: Duration) -> QuayResult<Box<dyn Repository>> {
    publish::repository::open(target, timeout)
  }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct PublishReceipt {
  pub group: String,
  pub artifact: String,
  pub version: String,
  pub channel: Channel,
  pub target: String,
  pub signing: SigningMode,
  pub artifacts: Vec<ReceiptArtifact>,
  /// Location of every stored file, in upload order
  pub uploaded: Vec<String>,
  pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptArtifact {
  pub member: ArtifactKind,
  pub path: String,
  pub sha256: String,
}

/// One release attempt
pub struct Pipeline<B: Backend> {
  config: PipelineConfig,
  backend: B,
  state: PipelineState,
  history: Vec<PipelineState>,
  progress: bool,
}

impl<B: Backend> Pipeline<B> {
  /// Create a pipeline for a resolved configuration
  ///
  /// Release metadata is checked here, so an incomplete document fails before
  /// any stage runs.
  pub fn new(config: PipelineConfig, backend: B) -> QuayResult<Self> {
    config.metadata.validate()?;
    Ok(Self {
      config,
      backend,
      state: PipelineState::Init,
      history: vec![PipelineState::Init],
      progress: false,
    })
  }

  /// Draw an upload progress bar on stderr
  pub fn with_progress(mut self, enabled: bool) -> Self {
    self.progress = enabled;
    self
  }

  pub fn state(&self) -> &PipelineState {
    &self.state
  }

  /// Every state entered so far, starting with INIT
  pub fn history(&self) -> &[PipelineState] {
    &self.history
  }

  /// Run every stage once
  pub fn run(&mut self) -> QuayResult<PublishReceipt> {
    if self.state != PipelineState::Init {
      return Err(QuayError::message(format!("Pipeline already ran (state {})", self.state)));
    }

    let result = self.execute();
    if let Err(err) = &result {
      let kind = err.as_pipeline().map(PipelineError::kind).unwrap_or("Error");
      tracing::error!(state = %self.state, kind, "release pipeline failed");
      self.advance(PipelineState::Failed(kind.to_string()));
    }
    result
  }

  fn advance(&mut self, next: PipelineState) {
    tracing::info!(from = %self.state, to = %next, "pipeline transition");
    self.state = next.clone();
    self.history.push(next);
  }

  fn execute(&mut self) -> QuayResult<PublishReceipt> {
    self.check_lock()?;
    self.advance(PipelineState::LockChecked);

    let artifacts = ArtifactSet::assemble(
      &self.config.root,
      &self.config.artifacts,
      &self.config.metadata.artifact,
      &self.config.version,
    )?;

    let report = QualityGate::new(self.config.quality.clone()).evaluate(&self.config.root)?;
    tracing::info!(files = report.files_checked, suppressed = report.suppressed, "quality gate passed");
    self.advance(PipelineState::GatePassed);

    let credential = SigningKeyResolver::resolve(&self.config.signing)?;
    let signed = self.sign(&credential, artifacts)?;
    self.advance(PipelineState::Signed);

    let receipt = self.publish(signed, credential.mode())?;
    self.advance(PipelineState::Published);
    Ok(receipt)
  }

  fn check_lock(&self) -> QuayResult<()> {
    let snapshot = LockSnapshot::load(&self.config.lock_snapshot)?;
    let resolved = self.backend.resolved_graph()?;
    LockVerifier::new(&snapshot).verify(&resolved)?;
    tracing::info!(dependencies = resolved.len(), "resolved graph matches lock snapshot");
    Ok(())
  }

  fn sign(&self, credential: &SigningCredential, artifacts: ArtifactSet) -> QuayResult<SignedRelease> {
    let signer = self.backend.signer(credential).map_err(|e| PipelineError::SigningFailure {
      member: "signing key".to_string(),
      reason: e.to_string(),
    })?;

    let sign = |member: &str, data: &[u8]| {
      signer.sign(data).map_err(|e| PipelineError::SigningFailure {
        member: member.to_string(),
        reason: e.to_string(),
      })
    };

    let sign_artifact = |artifact: &Artifact| {
      tracing::debug!(member = %artifact.kind(), path = %artifact.path().display(), "signing artifact");
      sign(artifact.kind().as_str(), artifact.bytes())
    };

    let [binary, sources, docs] = artifacts.members();
    let signatures = [sign_artifact(binary)?, sign_artifact(sources)?, sign_artifact(docs)?];

    let metadata = self.config.metadata.clone();
    let metadata_document = metadata.to_json()?;
    let metadata_signature = sign("metadata", &metadata_document)?;

    Ok(SignedRelease {
      artifacts,
      signatures,
      metadata,
      metadata_document,
      metadata_signature,
    })
  }

  fn publish(&self, release: SignedRelease, signing: SigningMode) -> QuayResult<PublishReceipt> {
    // Routing precedes the first network call
    let target = self.config.router.route(&self.config.version)?;
    tracing::info!(channel = %target.channel, url = %target.url, "publish target selected");

    let repository = self.backend.repository(&target, self.config.timeout)?;
    let layout = RemoteLayout::new(&release.metadata);
    let files = publish::upload_plan(&layout, &release);

    let mut bar = self
      .progress
      .then(|| UploadProgress::new(files.len(), format!("Publishing to {}", target.channel)));
    let uploaded = publish::upload_all(repository.as_ref(), &files, bar.as_mut())?;

    let artifacts = release
      .artifacts
      .members()
      .into_iter()
      .map(|a| ReceiptArtifact {
        member: a.kind(),
        path: layout.artifact_path(a),
        sha256: a.sha256().to_string(),
      })
      .collect();

    Ok(PublishReceipt {
      group: release.metadata.group.clone(),
      artifact: release.metadata.artifact.clone(),
      version: release.metadata.version.clone(),
      channel: target.channel,
      target: target.url,
      signing,
      artifacts,
      uploaded,
      published_at: Utc::now(),
    })
  }
}
