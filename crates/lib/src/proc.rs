//! Build-tool execution.
//!
//! All stages invoke external tools (`./configure`, `make`, `setup.py`)
//! through [`run_tool`], which captures output, applies a hard timeout,
//! and classifies failures so callers can distinguish a missing toolchain
//! program from a tool that ran and rejected its input.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::consts;

/// Errors that can occur while running a build tool.
#[derive(Debug, Error)]
pub enum ProcError {
  /// The program could not be found. Operators fix this by installing
  /// the toolchain package, not by changing build flags.
  #[error("'{program}' not found; is the build toolchain installed?")]
  ToolMissing { program: String },

  /// The program could not be spawned for another reason.
  #[error("failed to spawn '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited non-zero. Carries the tool's own
  /// diagnostics verbatim.
  #[error("'{program}' failed with exit code {code:?}: {stderr}")]
  ToolFailed {
    program: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The program exceeded the stage timeout and was killed.
  #[error("'{program}' exceeded the {}s stage timeout", .timeout.as_secs())]
  Timeout { program: String, timeout: Duration },
}

/// Captured output of a successful tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
  pub stdout: String,
  pub stderr: String,
}

/// Run a build tool to completion, capturing its output.
///
/// The parent environment is inherited (the toolchain lives on PATH); only
/// locale and timestamp variables are pinned so tool output and embedded
/// timestamps are reproducible across runs.
///
/// # Arguments
///
/// * `program` - The program to run; relative paths resolve against `cwd`
/// * `args` - Arguments passed verbatim
/// * `cwd` - Working directory of the child process
/// * `timeout` - Hard limit; the child is killed when it elapses
pub async fn run_tool(
  program: &str,
  args: &[String],
  cwd: &Path,
  timeout: Duration,
) -> Result<ToolOutput, ProcError> {
  info!(program, cwd = %cwd.display(), "running tool");

  let mut command = Command::new(program);
  command
    .args(args)
    .current_dir(cwd)
    .stdin(Stdio::null())
    .kill_on_drop(true)
    .env("LANG", "C")
    .env("LC_ALL", "C")
    .env("SOURCE_DATE_EPOCH", consts::BUILD_EPOCH);

  let result = tokio::time::timeout(timeout, command.output()).await.map_err(|_| {
    ProcError::Timeout {
      program: program.to_string(),
      timeout,
    }
  })?;

  let output = result.map_err(|e| {
    if e.kind() == std::io::ErrorKind::NotFound {
      ProcError::ToolMissing {
        program: program.to_string(),
      }
    } else {
      ProcError::Spawn {
        program: program.to_string(),
        source: e,
      }
    }
  })?;

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

  if !output.status.success() {
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "tool stdout");
    }

    return Err(ProcError::ToolFailed {
      program: program.to_string(),
      code: output.status.code(),
      stderr,
    });
  }

  if !stdout.is_empty() {
    debug!(stdout = %stdout, "tool output");
  }

  Ok(ToolOutput { stdout, stderr })
}
