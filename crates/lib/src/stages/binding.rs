//! Binding compilation.
//!
//! Runs the binding project's standard build step, compiling the extension
//! module against the amalgamated engine source staged by the previous
//! stage. Output lands in platform/version-tagged `build/lib.*`
//! directories that the collect stage discovers by pattern.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::proc::{ProcError, run_tool};

/// Errors that can occur while building the binding.
#[derive(Debug, Error)]
pub enum BindingError {
  /// The binding build ran and failed.
  #[error("binding build failed (exit code {code:?}): {stderr}")]
  BuildFailed { code: Option<i32>, stderr: String },

  /// A build tool was missing or could not run at all.
  #[error(transparent)]
  Toolchain(ProcError),
}

/// Compile the binding extension module.
pub async fn build(python: &str, binding_dir: &Path, timeout: Duration) -> Result<(), BindingError> {
  info!(dir = %binding_dir.display(), "building binding extension");

  let args = vec!["setup.py".to_string(), "build".to_string()];
  match run_tool(python, &args, binding_dir, timeout).await {
    Ok(_) => Ok(()),
    Err(ProcError::ToolFailed { code, stderr, .. }) => Err(BindingError::BuildFailed { code, stderr }),
    Err(e) => Err(BindingError::Toolchain(e)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[tokio::test]
  #[cfg(unix)]
  async fn failed_build_carries_diagnostics() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let fake = temp.path().join("fake-python");
    std::fs::write(&fake, "#!/bin/sh\necho 'missing sqlite3.c' >&2\nexit 1\n").unwrap();
    std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

    let result = build("./fake-python", temp.path(), Duration::from_secs(10)).await;

    match result {
      Err(BindingError::BuildFailed { code, stderr }) => {
        assert_eq!(code, Some(1));
        assert!(stderr.contains("missing sqlite3.c"));
      }
      other => panic!("expected BuildFailed, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn missing_python_is_a_toolchain_error() {
    let temp = TempDir::new().unwrap();

    let result = build("definitely-not-python", temp.path(), Duration::from_secs(10)).await;

    assert!(matches!(result, Err(BindingError::Toolchain(ProcError::ToolMissing { .. }))));
  }
}
