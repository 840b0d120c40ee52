//! Static analysis engine with trait-based extensibility
//!
//! Read the source tree once, run every registered analysis over every file.
//! All analyses are compiled into the binary.

use crate::quality::rules::RuleSettings;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Severity level for quality violations
///
/// Informational only: the quality gate fails on any violation regardless of
/// severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Warning,
  Error,
}

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
  /// Id of the rule that fired
  pub rule: String,
  pub severity: Severity,
  /// Project-relative path with forward slashes
  pub file: String,
  /// 1-based line, absent for file-level findings
  #[serde(skip_serializing_if = "Option::is_none")]
  pub line: Option<usize>,
  pub message: String,
}

impl Violation {
  /// Create an error-level violation
  pub fn error(rule: &str, file: &str, line: Option<usize>, message: impl Into<String>) -> Self {
    Self {
      rule: rule.to_string(),
      severity: Severity::Error,
      file: file.to_string(),
      line,
      message: message.into(),
    }
  }

  /// Create a warning-level violation
  pub fn warning(rule: &str, file: &str, line: Option<usize>, message: impl Into<String>) -> Self {
    Self {
      severity: Severity::Warning,
      ..Self::error(rule, file, line, message)
    }
  }

  /// `file:line`, or just `file`
  pub fn location(&self) -> String {
    match self.line {
      Some(line) => format!("{}:{}", self.file, line),
      None => self.file.clone(),
    }
  }
}

/// A source file handed to the analyses
#[derive(Debug, Clone)]
pub struct SourceFile {
  /// Project-relative path with forward slashes
  pub path: String,
  pub content: String,
}

/// Quality analysis trait
///
/// Analyses are stateless and run concurrently over different files.
pub trait QualityAnalysis: Send + Sync {
  /// Stable rule id (kebab-case)
  fn id(&self) -> &'static str;

  /// Human-readable description
  fn description(&self) -> &'static str;

  /// Check one file
  fn check(&self, file: &SourceFile, settings: &RuleSettings) -> Vec<Violation>;
}

/// Quality analysis engine
pub struct QualityEngine {
  analyses: Vec<Arc<dyn QualityAnalysis>>,
}

impl QualityEngine {
  /// Create a new empty engine
  pub fn new() -> Self {
    Self { analyses: Vec::new() }
  }

  /// Register an analysis with the engine
  pub fn register(&mut self, analysis: Arc<dyn QualityAnalysis>) {
    self.analyses.push(analysis);
  }

  /// Get all registered analyses
  pub fn analyses(&self) -> &[Arc<dyn QualityAnalysis>] {
    &self.analyses
  }

  /// Run every analysis over every file, dropping suppressed findings
  ///
  /// Files are checked in parallel; the result is sorted by file, line and
  /// rule so reports are deterministic.
  pub fn run(&self, ruleset: &str, files: &[SourceFile], settings: &RuleSettings) -> QualityReport {
    let (mut violations, suppressed) = files
      .par_iter()
      .map(|file| {
        let mut kept = Vec::new();
        let mut suppressed = 0usize;
        for analysis in &self.analyses {
          for violation in analysis.check(file, settings) {
            if settings.is_suppressed(&violation.rule, &file.path) {
              suppressed += 1;
            } else {
              kept.push(violation);
            }
          }
        }
        (kept, suppressed)
      })
      .reduce(
        || (Vec::new(), 0),
        |(mut a, sa), (b, sb)| {
          a.extend(b);
          (a, sa + sb)
        },
      );

    violations.sort_by(|a, b| {
      (a.file.as_str(), a.line, a.rule.as_str()).cmp(&(b.file.as_str(), b.line, b.rule.as_str()))
    });

    QualityReport {
      ruleset: ruleset.to_string(),
      files_checked: files.len(),
      suppressed,
      violations,
    }
  }
}

impl Default for QualityEngine {
  fn default() -> Self {
    Self::new()
  }
}

/// Unified quality report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
  pub ruleset: String,
  pub files_checked: usize,
  /// Findings dropped by suppressions
  pub suppressed: usize,
  pub violations: Vec<Violation>,
}

impl QualityReport {
  /// Zero tolerance: passes only with no violations at all
  pub fn passed(&self) -> bool {
    self.violations.is_empty()
  }

  /// Count violations by severity: (errors, warnings)
  pub fn count_violations(&self) -> (usize, usize) {
    let errors = self.violations.iter().filter(|v| v.severity == Severity::Error).count();
    (errors, self.violations.len() - errors)
  }
}
