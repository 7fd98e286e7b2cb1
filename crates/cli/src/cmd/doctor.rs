//! Implementation of the `cipherbuild doctor` command.
//!
//! Probes for the external toolchain the pipeline shells out to, so a
//! missing compiler or interpreter is reported before any source is
//! fetched.

use std::path::Path;

use anyhow::{Result, bail};

use cipherbuild_lib::toolchain;

use crate::output;

/// Execute the doctor command.
pub fn cmd_doctor(config: Option<&Path>) -> Result<()> {
  let config = super::load_config(config)?;

  let probes = toolchain::preflight(&config.binding.python);

  for probe in &probes {
    if probe.ok {
      output::print_success(&format!("{}: {}", probe.name, probe.detail));
    } else {
      output::print_error(&format!("{}: {}", probe.name, probe.detail));
    }
  }

  if !toolchain::all_ok(&probes) {
    bail!("toolchain preflight failed");
  }

  Ok(())
}
