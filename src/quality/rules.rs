//! Built-in rule set `quay-1`
//!
//! Rule ids are stable across releases of this tool. A change in rule
//! semantics gets a new rule-set id instead of silently altering `quay-1`.

use crate::core::config::QualityConfig;
use crate::core::error::QuayResult;
use crate::quality::engine::{QualityAnalysis, QualityEngine, SourceFile, Violation};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Identity of the built-in rule set
pub const RULESET_ID: &str = "quay-1";

/// Every rule id in `quay-1`
pub const RULE_IDS: &[&str] = &[
  "line-length",
  "trailing-whitespace",
  "tab-character",
  "final-newline",
  "todo-comment",
  "file-header",
  "forbidden-pattern",
];

/// Rule properties and suppressions, compiled from [`QualityConfig`]
#[derive(Debug, Clone)]
pub struct RuleSettings {
  pub sources: Vec<String>,
  pub max_line_length: usize,
  pub header: Option<String>,
  pub forbidden_patterns: Vec<Regex>,
  suppressions: Vec<(String, glob::Pattern)>,
}

impl RuleSettings {
  pub fn from_config(config: &QualityConfig) -> QuayResult<Self> {
    let forbidden_patterns = config
      .forbidden_patterns
      .iter()
      .map(|p| Regex::new(p))
      .collect::<Result<Vec<_>, _>>()?;
    let suppressions = config
      .suppressions
      .iter()
      .map(|s| Ok((s.rule.clone(), glob::Pattern::new(&s.files)?)))
      .collect::<QuayResult<Vec<_>>>()?;

    Ok(Self {
      sources: config.sources.clone(),
      max_line_length: config.max_line_length,
      header: config.header.clone(),
      forbidden_patterns,
      suppressions,
    })
  }

  /// Whether `rule` is suppressed for the project-relative `path`
  pub fn is_suppressed(&self, rule: &str, path: &str) -> bool {
    self
      .suppressions
      .iter()
      .any(|(r, pattern)| (r == "*" || r == rule) && pattern.matches(path))
  }
}

/// Engine with every `quay-1` rule registered
pub fn ruleset() -> QualityEngine {
  let mut engine = QualityEngine::new();
  engine.register(Arc::new(LineLength));
  engine.register(Arc::new(TrailingWhitespace));
  engine.register(Arc::new(TabCharacter));
  engine.register(Arc::new(FinalNewline));
  engine.register(Arc::new(TodoComment));
  engine.register(Arc::new(FileHeader));
  engine.register(Arc::new(ForbiddenPattern));
  engine
}

fn numbered(content: &str) -> impl Iterator<Item = (usize, &str)> {
  content.lines().enumerate().map(|(i, line)| (i + 1, line))
}

struct LineLength;

impl QualityAnalysis for LineLength {
  fn id(&self) -> &'static str {
    "line-length"
  }

  fn description(&self) -> &'static str {
    "Lines must not exceed the configured maximum length"
  }

  fn check(&self, file: &SourceFile, settings: &RuleSettings) -> Vec<Violation> {
    numbered(&file.content)
      .filter_map(|(n, line)| {
        let len = line.chars().count();
        (len > settings.max_line_length).then(|| {
          Violation::error(
            self.id(),
            &file.path,
            Some(n),
            format!("Line is longer than {} characters (found {})", settings.max_line_length, len),
          )
        })
      })
      .collect()
  }
}

struct TrailingWhitespace;

impl QualityAnalysis for TrailingWhitespace {
  fn id(&self) -> &'static str {
    "trailing-whitespace"
  }

  fn description(&self) -> &'static str {
    "Lines must not end in whitespace"
  }

  fn check(&self, file: &SourceFile, _settings: &RuleSettings) -> Vec<Violation> {
    numbered(&file.content)
      .filter(|(_, line)| line.ends_with([' ', '\t']))
      .map(|(n, _)| Violation::error(self.id(), &file.path, Some(n), "Line has trailing whitespace"))
      .collect()
  }
}

struct TabCharacter;

impl QualityAnalysis for TabCharacter {
  fn id(&self) -> &'static str {
    "tab-character"
  }

  fn description(&self) -> &'static str {
    "Files must not contain tab characters"
  }

  fn check(&self, file: &SourceFile, _settings: &RuleSettings) -> Vec<Violation> {
    numbered(&file.content)
      .filter_map(|(n, line)| {
        line.find('\t').map(|col| {
          Violation::error(
            self.id(),
            &file.path,
            Some(n),
            format!("Line contains a tab character (column {})", col + 1),
          )
        })
      })
      .collect()
  }
}

struct FinalNewline;

impl QualityAnalysis for FinalNewline {
  fn id(&self) -> &'static str {
    "final-newline"
  }

  fn description(&self) -> &'static str {
    "Files must end with a newline"
  }

  fn check(&self, file: &SourceFile, _settings: &RuleSettings) -> Vec<Violation> {
    if file.content.is_empty() || file.content.ends_with('\n') {
      Vec::new()
    } else {
      vec![Violation::error(self.id(), &file.path, None, "File does not end with a newline")]
    }
  }
}

static TODO: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?://|/\*).*?\bTODO\b(\([^)]*\))?").expect("TODO pattern is valid")
});

struct TodoComment;

impl QualityAnalysis for TodoComment {
  fn id(&self) -> &'static str {
    "todo-comment"
  }

  fn description(&self) -> &'static str {
    "TODO comments must name an owner, e.g. TODO(alice)"
  }

  fn check(&self, file: &SourceFile, _settings: &RuleSettings) -> Vec<Violation> {
    numbered(&file.content)
      .filter_map(|(n, line)| {
        let caps = TODO.captures(line)?;
        let owned = caps.get(1).is_some_and(|owner| owner.as_str().len() > 2);
        (!owned).then(|| Violation::warning(self.id(), &file.path, Some(n), "TODO comment without an owner"))
      })
      .collect()
  }
}

struct FileHeader;

impl QualityAnalysis for FileHeader {
  fn id(&self) -> &'static str {
    "file-header"
  }

  fn description(&self) -> &'static str {
    "Files must start with the configured header"
  }

  fn check(&self, file: &SourceFile, settings: &RuleSettings) -> Vec<Violation> {
    match &settings.header {
      Some(header) if !file.content.starts_with(header.as_str()) => {
        vec![Violation::error(self.id(), &file.path, Some(1), "Missing or altered file header")]
      }
      _ => Vec::new(),
    }
  }
}

struct ForbiddenPattern;

impl QualityAnalysis for ForbiddenPattern {
  fn id(&self) -> &'static str {
    "forbidden-pattern"
  }

  fn description(&self) -> &'static str {
    "Lines must not match any configured forbidden pattern"
  }

  fn check(&self, file: &SourceFile, settings: &RuleSettings) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (n, line) in numbered(&file.content) {
      for pattern in &settings.forbidden_patterns {
        if pattern.is_match(line) {
          violations.push(Violation::error(
            self.id(),
            &file.path,
            Some(n),
            format!("Line matches forbidden pattern `{}`", pattern.as_str()),
          ));
        }
      }
    }
    violations
  }
}
