//! Implementation of the `cipherbuild plan` command.
//!
//! Resolves the configuration and working directory, then prints the
//! stages the pipeline would execute without touching the filesystem.

use std::path::Path;

use anyhow::Result;

use cipherbuild_lib::pipeline;

use crate::output::symbols;

/// Execute the plan command.
pub fn cmd_plan(config: Option<&Path>, work_dir: Option<&Path>) -> Result<()> {
  let config = super::load_config(config)?;

  let stages = pipeline::plan(&config, work_dir)?;

  println!("Pipeline plan ({} stages):", stages.len());
  for (index, stage) in stages.iter().enumerate() {
    println!("  {}. {} {} {}", index + 1, stage.stage, symbols::ARROW, stage.detail);
  }

  Ok(())
}
