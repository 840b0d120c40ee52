//! Channel command: show where a version would be published

use crate::core::context::ReleaseContext;
use crate::core::error::{PipelineError, QuayResult};
use crate::publish::Channel;
use serde::Serialize;

#[derive(Serialize)]
struct ChannelOutput {
  version: String,
  channel: Channel,
  target: String,
  credentials: bool,
  missing: Vec<String>,
}

/// Classify the version and report the target, without publishing
pub fn run_channel(ctx: &ReleaseContext, version: Option<String>, json: bool) -> QuayResult<()> {
  let config = ctx.pipeline_config(version.as_deref())?;
  let channel = config.router.classify(&config.version);
  let endpoint = config.router.endpoint(channel);

  let missing = match config.router.route(&config.version) {
    Ok(_) => Vec::new(),
    Err(PipelineError::MissingRepositoryCredentials { missing, .. }) => missing,
    Err(other) => return Err(other.into()),
  };

  let output = ChannelOutput {
    version: config.version.to_string(),
    channel,
    target: endpoint.url.clone(),
    credentials: missing.is_empty(),
    missing,
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&output)?);
    return Ok(());
  }

  println!("📦 {} → {} channel", output.version, output.channel);
  println!("   Target: {}", output.target);
  if output.credentials {
    println!("   Credentials: ✅ {} / {}", endpoint.username_env, endpoint.password_env);
  } else {
    println!("   Credentials: ❌ missing {}", output.missing.join(", "));
  }

  Ok(())
}
