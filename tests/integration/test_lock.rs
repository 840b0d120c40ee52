//! Integration tests for `cargo quay lock`

use crate::helpers::{TestProject, run_cargo_quay, run_cargo_quay_ok, stdout};
use anyhow::Result;

#[test]
fn test_lock_write_then_verify() -> Result<()> {
  let project = TestProject::new("0.3.0")?;

  run_cargo_quay_ok(&project.path, &["lock", "--write"], &[])?;
  assert!(project.file_exists("quay.lock"));
  let snapshot = project.read_file("quay.lock")?;
  assert!(snapshot.starts_with("# Generated by `cargo quay lock --write`"));
  assert!(snapshot.contains("version = 1"));

  let output = run_cargo_quay_ok(&project.path, &["lock"], &[])?;
  assert!(stdout(&output).contains("matches the resolved graph"));

  Ok(())
}

#[test]
fn test_missing_snapshot_is_not_treated_as_empty() -> Result<()> {
  let project = TestProject::new("0.3.0")?;

  let output = run_cargo_quay(&project.path, &["lock"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(!project.file_exists("quay.lock"));

  Ok(())
}

#[test]
fn test_drift_exits_with_lock_mismatch() -> Result<()> {
  let project = TestProject::new("0.3.0")?;
  project.write_file(
    "quay.lock",
    "version = 1\n\n[[dependency]]\ncoordinate = \"serde\"\nversion = \"1.0.228\"\n",
  )?;

  let output = run_cargo_quay(&project.path, &["lock", "--json"], &[])?;
  assert_eq!(output.status.code(), Some(10));

  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["written"], false);
  let drift = report["drift"].as_array().expect("drift array");
  assert_eq!(drift.len(), 1);
  assert_eq!(drift[0]["kind"], "removed");
  assert_eq!(drift[0]["coordinate"], "serde");

  Ok(())
}

#[test]
fn test_snapshot_path_follows_config() -> Result<()> {
  let project = TestProject::new("0.3.0")?;
  project.write_config("\n[lock]\nsnapshot = \"locks/release.lock\"\n")?;
  std::fs::create_dir_all(project.path.join("locks"))?;

  run_cargo_quay_ok(&project.path, &["lock", "--write"], &[])?;
  assert!(project.file_exists("locks/release.lock"));
  assert!(!project.file_exists("quay.lock"));

  Ok(())
}
