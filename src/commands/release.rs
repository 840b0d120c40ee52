//! Release command: run the full pipeline
//!
//! Exit status is 0 only when the run reaches PUBLISHED; every failure kind
//! has its own exit code.

use crate::core::context::ReleaseContext;
use crate::core::error::{QuayError, QuayResult};
use crate::pipeline::{Pipeline, PublishReceipt, SystemBackend};
use serde_json::json;
use std::time::Duration;

/// Run the release pipeline
pub fn run_release(ctx: &ReleaseContext, version: Option<String>, timeout: Option<u64>, json: bool) -> QuayResult<()> {
  let mut config = ctx.pipeline_config(version.as_deref())?;
  if let Some(secs) = timeout {
    if secs == 0 {
      return Err(QuayError::message("--timeout must be greater than zero"));
    }
    config.timeout = Duration::from_secs(secs);
  }

  let workspace = ctx.require_metadata()?;
  let coordinates = format!(
    "{}:{}:{}",
    config.metadata.group, config.metadata.artifact, config.metadata.version
  );

  let mut pipeline = Pipeline::new(config, SystemBackend::new(workspace))?.with_progress(!json);
  if !json {
    println!("🚀 Releasing {}\n", coordinates);
  }

  match pipeline.run() {
    Ok(receipt) => {
      if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
      } else {
        print_receipt(&receipt);
      }
      Ok(())
    }
    Err(err) => {
      if json {
        let failure = json!({
          "state": pipeline.state().to_string(),
          "kind": err.as_pipeline().map(|e| e.kind()),
          "exit_code": err.exit_code().as_i32(),
          "message": err.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&failure)?);
      } else {
        let reached: Vec<String> = pipeline.history().iter().map(|s| s.to_string()).collect();
        println!("⛔ Pipeline stopped: {}", reached.join(" → "));
      }
      Err(err)
    }
  }
}

fn print_receipt(receipt: &PublishReceipt) {
  println!("✅ Published to the {} channel", receipt.channel);
  println!("   Target:  {}", receipt.target);
  println!("   Signing: {}", receipt.signing);
  println!();
  for artifact in &receipt.artifacts {
    println!("   📦 {:<8} {}", artifact.member.as_str(), artifact.path);
    println!("      sha256 {}", artifact.sha256);
  }
  println!();
  println!(
    "✨ {} file(s) uploaded at {}",
    receipt.uploaded.len(),
    receipt.published_at.to_rfc3339()
  );
}
