//! Integration tests for `cargo quay quality`

use crate::helpers::{TestProject, run_cargo_quay, run_cargo_quay_ok, stderr, stdout};
use anyhow::Result;

#[test]
fn test_clean_tree_passes() -> Result<()> {
  let project = TestProject::new("0.3.0")?;

  let output = run_cargo_quay_ok(&project.path, &["quality"], &[])?;
  assert!(stdout(&output).contains("Quality gate passed"));

  Ok(())
}

#[test]
fn test_rules_listing_describes_every_rule() -> Result<()> {
  let project = TestProject::new("0.3.0")?;

  let output = run_cargo_quay_ok(&project.path, &["quality", "--rules", "--json"], &[])?;
  let rules: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  let rules = rules.as_array().expect("rules array");
  assert_eq!(rules.len(), 7);
  assert_eq!(rules[0]["id"], "line-length");
  assert!(rules.iter().all(|r| !r["description"].as_str().unwrap_or_default().is_empty()));

  Ok(())
}

#[test]
fn test_sources_matching_nothing_is_an_error() -> Result<()> {
  let project = TestProject::new("0.3.0")?;
  project.write_config("\n[quality]\nsources = [\"scr/**/*.rs\"]\n")?;

  let output = run_cargo_quay(&project.path, &["quality"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("quality.sources"));

  Ok(())
}

#[test]
fn test_any_violation_fails_with_quality_gate_code() -> Result<()> {
  let project = TestProject::new("0.3.0")?;
  project.write_file("src/lib.rs", "pub fn days_in_week() -> u32 {\n\t7\n}\n")?;

  let output = run_cargo_quay(&project.path, &["quality", "--json"], &[])?;
  assert_eq!(output.status.code(), Some(11));

  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["ruleset"], "quay-1");
  let violations = report["violations"].as_array().expect("violations array");
  assert_eq!(violations.len(), 1);
  assert_eq!(violations[0]["rule"], "tab-character");
  assert_eq!(violations[0]["file"], "src/lib.rs");
  assert_eq!(violations[0]["line"], 2);

  Ok(())
}

#[test]
fn test_warnings_also_fail_the_gate() -> Result<()> {
  let project = TestProject::new("0.3.0")?;
  project.write_file("src/lib.rs", "// TODO handle leap weeks\npub fn days_in_week() -> u32 {\n  7\n}\n")?;

  let output = run_cargo_quay(&project.path, &["quality"], &[])?;
  assert_eq!(output.status.code(), Some(11));
  assert!(stdout(&output).contains("0 errors, 1 warnings"));

  Ok(())
}

#[test]
fn test_suppressed_rule_passes() -> Result<()> {
  let project = TestProject::new("0.3.0")?;
  project.write_file("src/generated/table.rs", "pub const DAYS: [u32; 1] = [7];   \n")?;
  project.write_config("\n[[quality.suppressions]]\nrule = \"trailing-whitespace\"\nfiles = \"src/generated/**\"\n")?;

  let output = run_cargo_quay_ok(&project.path, &["quality", "--json"], &[])?;
  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["suppressed"], 1);
  assert_eq!(report["files_checked"], 2);

  Ok(())
}
