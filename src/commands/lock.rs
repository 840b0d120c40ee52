//! Lock command: verify the resolved graph, or re-lock explicitly

use crate::core::context::ReleaseContext;
use crate::core::error::{ExitCode, QuayResult};
use crate::lock::{LockSnapshot, LockVerifier};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct LockOutput<'a> {
  snapshot: String,
  written: bool,
  dependencies: usize,
  drift: &'a [crate::lock::Drift],
}

/// Verify against the snapshot, or with `write` replace it
pub fn run_lock(ctx: &ReleaseContext, write: bool, json: bool) -> QuayResult<()> {
  let workspace = ctx.require_metadata()?;
  let resolved = workspace.resolved_graph()?;
  let path = snapshot_path(ctx);
  let display = path.strip_prefix(ctx.project_root()).unwrap_or(&path).display().to_string();

  if write {
    LockSnapshot::from_resolved(&resolved).save(&path)?;
    if json {
      let output = LockOutput {
        snapshot: display,
        written: true,
        dependencies: resolved.len(),
        drift: &[],
      };
      println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
      println!("🔒 Wrote {} ({} coordinate(s))", display, resolved.len());
    }
    return Ok(());
  }

  let snapshot = LockSnapshot::load(&path)?;
  let drift = LockVerifier::new(&snapshot).diff(&resolved);

  if json {
    let output = LockOutput {
      snapshot: display,
      written: false,
      dependencies: resolved.len(),
      drift: &drift,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
  } else if drift.is_empty() {
    println!("✅ {} matches the resolved graph ({} coordinate(s))", display, resolved.len());
  } else {
    println!("❌ {} diverges from the resolved graph:\n", display);
    for d in &drift {
      println!("   {}", d);
    }
    println!("\n💡 Re-lock with `cargo quay lock --write` once the change is intended.");
  }

  if !drift.is_empty() {
    std::process::exit(ExitCode::LockMismatch.as_i32());
  }

  Ok(())
}

fn snapshot_path(ctx: &ReleaseContext) -> PathBuf {
  let relative = ctx
    .config
    .as_ref()
    .map(|c| c.lock.snapshot.clone())
    .unwrap_or_else(|| PathBuf::from("quay.lock"));
  ctx.project_root().join(relative)
}
