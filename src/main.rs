mod cargo;
mod commands;
mod core;
mod lock;
mod pipeline;
mod publish;
mod quality;
mod release;
mod signing;
mod ui;
mod utils;

use clap::{ArgAction, Parser, Subcommand};
use core::error::{QuayError, print_error};
use tracing_subscriber::EnvFilter;

/// Lock-checked, quality-gated, signed publishing with channel routing
#[derive(Parser)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(styles = get_styles())]
enum CargoCli {
  Quay(QuayCli),
}

#[derive(Parser)]
#[command(name = "quay")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct QuayCli {
  /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Verify, gate, sign and publish the artifact set
  Release {
    /// Version to release (default: project.version, then the Cargo package version)
    #[arg(long)]
    version: Option<String>,
    /// Per-request upload timeout in seconds (default: publish.timeout_secs)
    #[arg(long)]
    timeout: Option<u64>,
    /// Output the receipt (or failure) as JSON
    #[arg(long)]
    json: bool,
  },

  /// Compare the resolved dependency graph with the lock snapshot
  Lock {
    /// Re-lock: write a fresh snapshot from the resolved graph
    #[arg(long)]
    write: bool,
    /// Output drift in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Run the quality gate over the source tree
  Quality {
    /// List the rules of the rule set instead of running them
    #[arg(long)]
    rules: bool,
    /// Output the report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Show which channel and target a version routes to
  Channel {
    /// Version to classify
    #[arg(long)]
    version: Option<String>,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Show the release metadata document
  Metadata {
    /// Version to describe
    #[arg(long)]
    version: Option<String>,
    /// Read back the published document and compare it with quay.toml
    #[arg(long)]
    fetch: bool,
    /// Output the document as JSON
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  let yellow = anstyle::Color::Ansi(anstyle::AnsiColor::Yellow);
  let green = anstyle::Color::Ansi(anstyle::AnsiColor::Green);
  let red = anstyle::Color::Ansi(anstyle::AnsiColor::Red);

  clap::builder::Styles::styled()
    .usage(anstyle::Style::new().bold().underline().fg_color(Some(yellow)))
    .header(anstyle::Style::new().bold().underline().fg_color(Some(yellow)))
    .literal(anstyle::Style::new().fg_color(Some(green)))
    .invalid(anstyle::Style::new().bold().fg_color(Some(red)))
    .error(anstyle::Style::new().bold().fg_color(Some(red)))
    .valid(anstyle::Style::new().bold().underline().fg_color(Some(green)))
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_tracing(verbose: u8) {
  let level = match verbose {
    0 => "cargo_quay=info",
    1 => "cargo_quay=debug",
    _ => "cargo_quay=trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

fn main() {
  let CargoCli::Quay(cli) = CargoCli::parse();
  init_tracing(cli.verbose);

  let project_root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(QuayError::from(e).context("Failed to get current directory")),
  };

  // Build once; every command borrows it
  let ctx = match core::context::ReleaseContext::build(&project_root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Release { version, timeout, json } => commands::run_release(&ctx, version, timeout, json),
    Commands::Lock { write, json } => commands::run_lock(&ctx, write, json),
    Commands::Quality { rules, json } => commands::run_quality(&ctx, rules, json),
    Commands::Channel { version, json } => commands::run_channel(&ctx, version, json),
    Commands::Metadata { version, fetch, json } => commands::run_metadata(&ctx, version, fetch, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: QuayError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
