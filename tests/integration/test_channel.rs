//! Integration tests for `cargo quay channel` and `cargo quay metadata`

use crate::helpers::{TestProject, run_cargo_quay, run_cargo_quay_ok, stdout};
use anyhow::Result;

const CREDENTIALS: &[(&str, &str)] = &[("OSSRH_USERNAME", "deployer"), ("OSSRH_PASSWORD", "hunter2")];

fn channel_json(project: &TestProject, version: &str, env: &[(&str, &str)]) -> Result<serde_json::Value> {
  let output = run_cargo_quay_ok(&project.path, &["channel", "--version", version, "--json"], env)?;
  Ok(serde_json::from_str(&stdout(&output))?)
}

#[test]
fn test_snapshot_and_stable_versions_route_apart() -> Result<()> {
  let project = TestProject::new("2.1.0")?;

  let snapshot = channel_json(&project, "2.1.0-SNAPSHOT", CREDENTIALS)?;
  assert_eq!(snapshot["channel"], "snapshot");
  assert!(snapshot["target"].as_str().unwrap_or_default().ends_with("repo/snapshots"));
  assert_eq!(snapshot["credentials"], true);

  let stable = channel_json(&project, "2.1.0", CREDENTIALS)?;
  assert_eq!(stable["channel"], "release");
  assert!(stable["target"].as_str().unwrap_or_default().ends_with("repo/staging"));

  Ok(())
}

#[test]
fn test_marker_must_be_trailing() -> Result<()> {
  let project = TestProject::new("2.1.0")?;

  let output = channel_json(&project, "2.1.0-SNAPSHOT-hotfix", CREDENTIALS)?;
  assert_eq!(output["channel"], "release");

  Ok(())
}

#[test]
fn test_missing_credentials_are_named_not_leaked() -> Result<()> {
  let project = TestProject::new("2.1.0")?;

  let output = channel_json(&project, "2.1.0", &[("OSSRH_USERNAME", "deployer")])?;
  assert_eq!(output["credentials"], false);
  assert_eq!(output["missing"], serde_json::json!(["OSSRH_PASSWORD"]));
  assert!(!output.to_string().contains("deployer"));

  Ok(())
}

#[test]
fn test_metadata_shows_project_document() -> Result<()> {
  let project = TestProject::new("2.1.0")?;

  let output = run_cargo_quay_ok(&project.path, &["metadata", "--json"], &[])?;
  let document: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(document["group"], "org.calql");
  assert_eq!(document["version"], "2.1.0");
  assert_eq!(document["license"]["distribution"], "repo");

  Ok(())
}

#[test]
fn test_incomplete_metadata_is_a_validation_failure() -> Result<()> {
  let project = TestProject::new("2.1.0")?;
  let config = project.read_file("quay.toml")?;
  project.write_file("quay.toml", &config.replace("description = \"Queries for calendars.\"\n", ""))?;

  let output = run_cargo_quay(&project.path, &["metadata"], &[])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stdout(&output).contains("Empty fields: description"));

  Ok(())
}
