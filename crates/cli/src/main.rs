use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

/// cipherbuild - Build pipeline for the encrypted SQLite amalgamation and
/// its Python binding artifacts.
#[derive(Parser)]
#[command(name = "cipherbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the full build pipeline
  Run {
    /// Path to a TOML configuration file (built-in defaults if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Working directory for source trees and build output
    #[arg(short = 'w', long)]
    work_dir: Option<PathBuf>,

    /// Hard per-stage timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Remove previous source trees and collected artifacts first
    #[arg(long)]
    clean: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show the stages the pipeline would execute (dry-run)
  Plan {
    /// Path to a TOML configuration file (built-in defaults if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Working directory for source trees and build output
    #[arg(short = 'w', long)]
    work_dir: Option<PathBuf>,
  },

  /// Check that the required build toolchain is available
  Doctor {
    /// Path to a TOML configuration file (built-in defaults if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
  tracing_subscriber::fmt().with_env_filter(filter).without_time().init();

  match cli.command {
    Commands::Run {
      config,
      work_dir,
      timeout,
      clean,
      json,
    } => cmd::cmd_run(config.as_deref(), work_dir.as_deref(), timeout, clean, json),
    Commands::Plan { config, work_dir } => cmd::cmd_plan(config.as_deref(), work_dir.as_deref()),
    Commands::Doctor { config } => cmd::cmd_doctor(config.as_deref()),
  }
}
