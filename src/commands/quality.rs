//! Quality gate command
//!
//! Runs the gate on its own, exactly as the release pipeline would.

use crate::core::context::ReleaseContext;
use crate::core::error::{ExitCode, QuayResult};
use crate::quality::rules::RuleSettings;
use crate::quality::{QualityGate, QualityReport, Severity};
use serde::Serialize;

#[derive(Serialize)]
struct RuleOutput {
  id: &'static str,
  description: &'static str,
}

/// Run the quality gate
pub fn run_quality(ctx: &ReleaseContext, rules: bool, json: bool) -> QuayResult<()> {
  let config = ctx.require_config()?;
  let gate = QualityGate::new(RuleSettings::from_config(&config.quality)?);

  if rules {
    return print_rules(&gate, json);
  }
  let report = gate.report(ctx.project_root())?;

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    print_human_readable(&report);
  }

  if !report.passed() {
    std::process::exit(ExitCode::QualityGate.as_i32());
  }

  Ok(())
}

fn print_rules(gate: &QualityGate, json: bool) -> QuayResult<()> {
  let rules: Vec<RuleOutput> = gate
    .rules()
    .iter()
    .map(|rule| RuleOutput {
      id: rule.id(),
      description: rule.description(),
    })
    .collect();

  if json {
    println!("{}", serde_json::to_string_pretty(&rules)?);
    return Ok(());
  }

  println!("📏 Rule set {} ({} rules)
", crate::quality::rules::RULESET_ID, rules.len());
  for rule in &rules {
    println!("   {:<20} {}", rule.id, rule.description);
  }
  Ok(())
}

fn print_human_readable(report: &QualityReport) {
  println!("🔍 Running rule set {} over {} file(s)...\n", report.ruleset, report.files_checked);

  for violation in &report.violations {
    let icon = match violation.severity {
      Severity::Error => "❌",
      Severity::Warning => "⚠️ ",
    };
    println!(
      "   {} {} [{}] {}",
      icon,
      violation.location(),
      violation.rule,
      violation.message
    );
  }
  if !report.violations.is_empty() {
    println!();
  }

  let (errors, warnings) = report.count_violations();
  println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
  println!(
    "Summary: {} errors, {} warnings, {} suppressed",
    errors, warnings, report.suppressed
  );

  if report.passed() {
    println!("\n✨ Quality gate passed!");
  } else {
    println!("\n❌ Quality gate failed. Warnings count as failures: fix or suppress every violation.");
  }
}
