//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Environment variables that would leak credentials from the host into a test
const SCRUBBED_ENV: &[&str] = &[
  "QUAY_SIGNING_KEY",
  "QUAY_SIGNING_PASSWORD",
  "OSSRH_USERNAME",
  "OSSRH_PASSWORD",
  "RUST_LOG",
];

/// A releasable project: Cargo package, quay.toml, sources and built artifacts
pub struct TestProject {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestProject {
  /// Create a project at `version` whose metadata, sources and artifacts are all valid
  pub fn new(version: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    std::fs::write(
      path.join("Cargo.toml"),
      format!(
        r#"[package]
name = "calql-query"
version = "{}"
edition = "2021"

[workspace]
"#,
        version
      ),
    )?;

    std::fs::create_dir_all(path.join("src"))?;
    std::fs::write(
      path.join("src/lib.rs"),
      "//! Queries for calendars\n\npub fn days_in_week() -> u32 {\n  7\n}\n",
    )?;

    let project = Self { _root: root, path };
    project.write_config("")?;
    project.build_artifacts(version)?;
    Ok(project)
  }

  /// Write quay.toml, appending `extra` TOML
  pub fn write_config(&self, extra: &str) -> Result<()> {
    let config = format!(
      r#"[project]
group = "org.calql"
artifact = "calql-query"
description = "Queries for calendars."
url = "https://github.com/dmikurube/calql-java"
license = {{ name = "The Apache License, Version 2.0", url = "https://www.apache.org/licenses/LICENSE-2.0.txt" }}
developers = [{{ name = "Dai MIKURUBE", email = "dmikurube@acm.org" }}]
scm = {{ connection = "scm:git:git://github.com/dmikurube/calql-java.git", developer_connection = "scm:git:git@github.com:dmikurube/calql-java.git", url = "https://github.com/dmikurube/calql-java" }}

[channels]
snapshot = {{ url = "{root}/repo/snapshots" }}
release = {{ url = "{root}/repo/staging" }}

[artifacts]
binary = {{ path = "out/{{artifact}}-{{version}}.jar" }}
sources = {{ path = "out/{{artifact}}-{{version}}-sources.jar" }}
docs = {{ path = "out/{{artifact}}-{{version}}-docs.jar" }}
{extra}
"#,
      root = self.path.display(),
      extra = extra
    );
    std::fs::write(self.path.join("quay.toml"), config)?;
    Ok(())
  }

  /// Place the three build outputs for `version` under out/
  pub fn build_artifacts(&self, version: &str) -> Result<()> {
    std::fs::create_dir_all(self.path.join("out"))?;
    for suffix in ["", "-sources", "-docs"] {
      std::fs::write(
        self.path.join(format!("out/calql-query-{}{}.jar", version, suffix)),
        format!("PK calql-query{}", suffix),
      )?;
    }
    Ok(())
  }

  /// Install a stand-in signing program that prints a fixed armored signature
  #[cfg(unix)]
  pub fn install_fake_gpg(&self) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let script = self.path.join("fake-gpg");
    std::fs::write(
      &script,
      "#!/bin/sh\ncat <<'SIG'\n-----BEGIN PGP SIGNATURE-----\n\nZmFrZQ==\n-----END PGP SIGNATURE-----\nSIG\n",
    )?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;
    Ok(script)
  }

  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let full = self.path.join(path);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run cargo-quay, returning the output whatever the exit status
pub fn run_cargo_quay(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  let cargo_quay_bin = env!("CARGO_BIN_EXE_cargo-quay");

  let mut cmd = Command::new(cargo_quay_bin);
  cmd.current_dir(cwd).arg("quay").args(args);
  for name in SCRUBBED_ENV {
    cmd.env_remove(name);
  }
  cmd.envs(env.iter().copied());

  cmd.output().context("Failed to run cargo-quay")
}

/// Run cargo-quay and fail unless it exits successfully
pub fn run_cargo_quay_ok(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  let output = run_cargo_quay(cwd, args, env)?;
  if !output.status.success() {
    anyhow::bail!(
      "cargo-quay command failed: cargo quay {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }
  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).into_owned()
}
