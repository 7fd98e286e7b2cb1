//! Implementation of the `cipherbuild run` command.
//!
//! Runs the full pipeline: fetches the engine and binding trees, compiles
//! and verifies the encrypted amalgamation, stages it into the binding,
//! builds the extension module, and vendors the artifacts.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;

use cipherbuild_lib::pipeline::{self, PipelineOptions};

use crate::output;

/// Execute the run command.
///
/// Prints a per-stage summary on success (or the JSON run report in
/// `--json` mode). Any stage failure aborts the pipeline and surfaces the
/// failing stage's diagnostics; the process then exits non-zero.
pub fn cmd_run(
  config: Option<&Path>,
  work_dir: Option<&Path>,
  timeout: Option<u64>,
  clean: bool,
  json: bool,
) -> Result<()> {
  let config = super::load_config(config)?;

  let mut options = PipelineOptions::default();
  if let Some(secs) = timeout {
    options.stage_timeout = Duration::from_secs(secs);
  }
  options.clean = clean;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

  let started = Instant::now();
  let report = rt
    .block_on(pipeline::run(&config, work_dir, &options))
    .context("Pipeline failed")?;
  let elapsed = started.elapsed();

  info!(stages = report.stages.len(), ?elapsed, "pipeline finished");

  if json {
    return output::print_json(&report);
  }

  println!();
  output::print_success(&format!("Pipeline complete in {}", output::format_duration(elapsed)));

  for stage in &report.stages {
    output::print_stat(
      &stage.stage.to_string(),
      &format!("{} ({})", stage.detail, output::format_duration(stage.duration)),
    );
  }

  if let Some(commit) = &report.engine_commit {
    output::print_stat("engine commit", commit);
  }
  if let Some(commit) = &report.binding_commit {
    output::print_stat("binding commit", commit);
  }
  if let Some(hash) = &report.amalgamation_source_hash {
    output::print_stat("sqlite3.c sha256", &hash.to_string());
  }
  output::print_stat("artifacts", &report.artifacts.len().to_string());

  Ok(())
}
