//! Quality gate: zero-tolerance evaluation of the source tree

use crate::core::error::{ConfigError, PipelineError, QuayError, QuayResult, ResultExt};
use crate::quality::engine::{QualityAnalysis, QualityEngine, QualityReport, SourceFile};
use crate::quality::rules::{self, RULESET_ID, RuleSettings};
use crate::utils::path_to_slash;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runs the `quay-1` rule set over the configured source tree
///
/// Holds no results between calls: every [`QualityGate::evaluate`] re-reads
/// the tree and re-runs every rule.
pub struct QualityGate {
  engine: QualityEngine,
  settings: RuleSettings,
}

impl QualityGate {
  pub fn new(settings: RuleSettings) -> Self {
    Self {
      engine: rules::ruleset(),
      settings,
    }
  }

  /// Registered rules, in registration order
  pub fn rules(&self) -> &[Arc<dyn QualityAnalysis>] {
    self.engine.analyses()
  }

  /// Source files matched by the `sources` globs, sorted and deduplicated
  pub fn discover(&self, root: &Path) -> QuayResult<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&root.to_string_lossy());
    let mut found = BTreeSet::new();

    for pattern in &self.settings.sources {
      let full = format!("{}/{}", base.trim_end_matches('/'), pattern);
      for entry in glob::glob(&full)? {
        let path = entry?;
        if path.is_file() {
          found.insert(path);
        }
      }
    }

    Ok(found.into_iter().collect())
  }

  /// Evaluate the tree and return the full report, pass or fail
  ///
  /// A tree with no matching source files is an error, never a pass.
  pub fn report(&self, root: &Path) -> QuayResult<QualityReport> {
    let paths = self.discover(root)?;
    if paths.is_empty() {
      return Err(QuayError::Config(ConfigError::InvalidField {
        field: "quality.sources".to_string(),
        reason: format!(
          "{} matched no files under {}",
          self.settings.sources.join(", "),
          root.display()
        ),
      }));
    }
    tracing::debug!(files = paths.len(), ruleset = RULESET_ID, "running quality rules");

    let files = paths
      .par_iter()
      .map(|path| -> QuayResult<SourceFile> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let relative = path.strip_prefix(root).unwrap_or(path);
        Ok(SourceFile {
          path: path_to_slash(relative),
          content: String::from_utf8_lossy(&bytes).into_owned(),
        })
      })
      .collect::<QuayResult<Vec<_>>>()?;

    Ok(self.engine.run(RULESET_ID, &files, &self.settings))
  }

  /// Gate decision: any violation, of any severity, is a failure
  pub fn evaluate(&self, root: &Path) -> QuayResult<QualityReport> {
    let report = self.report(root)?;
    if report.passed() {
      Ok(report)
    } else {
      Err(
        PipelineError::QualityGateFailure {
          violations: report.violations,
        }
        .into(),
      )
    }
  }
}
