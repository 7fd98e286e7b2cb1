mod doctor;
mod plan;
mod run;

use std::path::Path;

use anyhow::Result;
use cipherbuild_lib::config::PipelineConfig;

pub use doctor::cmd_doctor;
pub use plan::cmd_plan;
pub use run::cmd_run;

/// Load the pipeline configuration, falling back to the built-in defaults
/// when no file is given.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
  match path {
    Some(path) => Ok(PipelineConfig::load(path)?),
    None => Ok(PipelineConfig::default()),
  }
}
