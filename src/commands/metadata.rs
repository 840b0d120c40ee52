//! Metadata command: show the release metadata document, or read back the
//! published one and compare

use crate::core::context::ReleaseContext;
use crate::core::error::{QuayError, QuayResult};
use crate::publish::{self, RemoteLayout};
use crate::release::ReleaseMetadata;

/// Print the local document, or with `fetch` the published one
pub fn run_metadata(ctx: &ReleaseContext, version: Option<String>, fetch: bool, json: bool) -> QuayResult<()> {
  let config = ctx.pipeline_config(version.as_deref())?;
  let local = &config.metadata;

  if !fetch {
    if json {
      println!("{}", serde_json::to_string_pretty(local)?);
    } else {
      print_metadata(local);
    }
    return local.validate();
  }

  let target = config.router.route(&config.version)?;
  let repository = publish::repository::open(&target, config.timeout)?;
  let layout = RemoteLayout::new(local);
  let published = publish::fetch_metadata(repository.as_ref(), &layout)?;
  let differences = differing_fields(local, &published);

  if json {
    println!("{}", serde_json::to_string_pretty(&published)?);
  } else {
    println!("🌐 {}\n", repository.location(&layout.metadata_path()));
    print_metadata(&published);
    if differences.is_empty() {
      println!("\n✅ Published metadata matches quay.toml");
    } else {
      println!("\n⚠️  Published metadata differs in: {}", differences.join(", "));
    }
  }

  if differences.is_empty() {
    Ok(())
  } else {
    Err(QuayError::with_help(
      format!("Published metadata differs from quay.toml in: {}", differences.join(", ")),
      "A published release cannot be changed; publish a new version instead",
    ))
  }
}

fn differing_fields(local: &ReleaseMetadata, published: &ReleaseMetadata) -> Vec<&'static str> {
  let mut fields = Vec::new();
  if local.name != published.name {
    fields.push("name");
  }
  if local.description != published.description {
    fields.push("description");
  }
  if local.url != published.url {
    fields.push("url");
  }
  if local.license != published.license {
    fields.push("license");
  }
  if local.developers != published.developers {
    fields.push("developers");
  }
  if local.scm != published.scm {
    fields.push("scm");
  }
  fields
}

fn print_metadata(metadata: &ReleaseMetadata) {
  println!("📋 {}:{}:{}", metadata.group, metadata.artifact, metadata.version);
  println!("   Name:        {}", metadata.name);
  println!("   Description: {}", metadata.description);
  println!("   URL:         {}", metadata.url);
  println!("   License:     {} ({})", metadata.license.name, metadata.license.url);
  for dev in &metadata.developers {
    println!("   Developer:   {} <{}>", dev.name, dev.email);
  }
  println!("   SCM:         {}", metadata.scm.url);

  let missing = metadata.missing_fields();
  if !missing.is_empty() {
    println!("\n⚠️  Empty fields: {}", missing.join(", "));
  }
}
