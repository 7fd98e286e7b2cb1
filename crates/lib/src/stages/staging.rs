//! Amalgamation staging.
//!
//! The binding project's build tooling reads the amalgamated pair from
//! more than one location: its own amalgamation step reads the top-level
//! slot, while the in-place source-amalgamation build mode expects the
//! files to already sit inside the native-module subpackage. The slots are
//! configuration, not code: adding a build mode means adding a slot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::proc::{ProcError, run_tool};
use crate::util::fs::{FsError, copy_into, ensure_dir};

/// Errors that can occur while staging the amalgamation.
#[derive(Debug, Error)]
pub enum StagingError {
  /// No staging slots are configured.
  #[error("no staging slots configured for the amalgamation")]
  NoSlots,

  /// Copying the pair into a slot failed.
  #[error(transparent)]
  Fs(#[from] FsError),

  /// The binding's own amalgamation step failed.
  #[error("binding amalgamation step failed (exit code {code:?}): {stderr}")]
  BuildAmalgamationFailed { code: Option<i32>, stderr: String },

  /// A build tool was missing or could not run at all.
  #[error(transparent)]
  Toolchain(ProcError),
}

/// Publish the amalgamated pair into every staging slot.
///
/// Slots are created if absent. Returns the paths of all published copies.
pub fn publish(
  source: &Path,
  header: &Path,
  slots: &[PathBuf],
) -> Result<Vec<PathBuf>, StagingError> {
  if slots.is_empty() {
    return Err(StagingError::NoSlots);
  }

  let mut published = Vec::with_capacity(slots.len() * 2);
  for slot in slots {
    ensure_dir(slot)?;
    published.push(copy_into(source, slot)?);
    published.push(copy_into(header, slot)?);
    debug!(slot = %slot.display(), "published amalgamation pair");
  }

  info!(slots = slots.len(), "amalgamation published to staging slots");
  Ok(published)
}

/// Run the binding's own amalgamation step, which regenerates its combined
/// source from the files just published.
pub async fn build_amalgamation(
  python: &str,
  binding_dir: &Path,
  timeout: Duration,
) -> Result<(), StagingError> {
  info!(dir = %binding_dir.display(), "regenerating binding amalgamation");

  let args = vec!["setup.py".to_string(), "build_amalgamation".to_string()];
  match run_tool(python, &args, binding_dir, timeout).await {
    Ok(_) => Ok(()),
    Err(ProcError::ToolFailed { code, stderr, .. }) => {
      Err(StagingError::BuildAmalgamationFailed { code, stderr })
    }
    Err(e) => Err(StagingError::Toolchain(e)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn write_pair(dir: &Path) -> (PathBuf, PathBuf) {
    let source = dir.join("sqlite3.c");
    let header = dir.join("sqlite3.h");
    std::fs::write(&source, "#ifdef SQLITE_HAS_CODEC\n#endif\n").unwrap();
    std::fs::write(&header, "#define SQLITE_VERSION \"3.0\"\n").unwrap();
    (source, header)
  }

  #[test]
  fn publishes_the_pair_to_every_slot() {
    let temp = TempDir::new().unwrap();
    let (source, header) = write_pair(temp.path());
    let slots = vec![
      temp.path().join("amalgamation"),
      temp.path().join("src/python3/sqlcipher"),
    ];

    let published = publish(&source, &header, &slots).unwrap();

    assert_eq!(published.len(), 4);
    for slot in &slots {
      assert!(slot.join("sqlite3.c").exists());
      assert!(slot.join("sqlite3.h").exists());
    }
  }

  #[test]
  fn creates_nested_slots() {
    let temp = TempDir::new().unwrap();
    let (source, header) = write_pair(temp.path());
    let slots = vec![temp.path().join("a/b/c/slot")];

    publish(&source, &header, &slots).unwrap();

    assert!(slots[0].join("sqlite3.c").exists());
  }

  #[test]
  fn rejects_an_empty_slot_list() {
    let temp = TempDir::new().unwrap();
    let (source, header) = write_pair(temp.path());

    let result = publish(&source, &header, &[]);

    assert!(matches!(result, Err(StagingError::NoSlots)));
  }

  #[test]
  fn missing_pair_fails() {
    let temp = TempDir::new().unwrap();
    let slots = vec![temp.path().join("slot")];

    let result = publish(&temp.path().join("sqlite3.c"), &temp.path().join("sqlite3.h"), &slots);

    assert!(matches!(result, Err(StagingError::Fs(_))));
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn failed_amalgamation_step_carries_diagnostics() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let fake = temp.path().join("fake-python");
    std::fs::write(&fake, "#!/bin/sh\necho 'no amalgamation sources' >&2\nexit 2\n").unwrap();
    std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

    let result = build_amalgamation("./fake-python", temp.path(), Duration::from_secs(10)).await;

    match result {
      Err(StagingError::BuildAmalgamationFailed { code, stderr }) => {
        assert_eq!(code, Some(2));
        assert!(stderr.contains("no amalgamation sources"));
      }
      other => panic!("expected BuildAmalgamationFailed, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn missing_python_is_a_toolchain_error() {
    let temp = TempDir::new().unwrap();

    let result = build_amalgamation("definitely-not-python", temp.path(), Duration::from_secs(10)).await;

    assert!(matches!(result, Err(StagingError::Toolchain(ProcError::ToolMissing { .. }))));
  }
}
