//! Artifact collection.
//!
//! The binding's build output directory name embeds the target platform
//! and language runtime version (e.g. `lib.linux-x86_64-cpython-311`), so
//! it is discovered by pattern, never assumed. Several directories can
//! exist at once (one per runtime version); artifacts are collected from
//! all of them. An empty match is a loud failure: a silent empty copy
//! would only surface later, when the consuming project fails to import
//! the module.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::consts;
use crate::util::fs::{FsError, copy_into, ensure_dir};

/// Errors that can occur while collecting artifacts.
#[derive(Debug, Error)]
pub enum CollectError {
  /// No tagged build output directories exist.
  #[error("expected build output not found: no 'lib.*' directories under '{root}'")]
  NoBuildOutput { root: PathBuf },

  /// The build output exists but holds no matching artifacts.
  #[error("no '{subpackage}' artifacts matching extensions {extensions:?} were produced")]
  NoArtifacts {
    subpackage: String,
    extensions: Vec<String>,
  },

  /// Failed to enumerate a build output directory.
  #[error("failed to read build output directory '{path}': {source}")]
  ReadDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Copying an artifact failed.
  #[error(transparent)]
  Fs(#[from] FsError),
}

/// Discover the platform/version-tagged build output directories.
pub fn discover_build_dirs(build_root: &Path) -> Result<Vec<PathBuf>, CollectError> {
  let entries = match std::fs::read_dir(build_root) {
    Ok(entries) => entries,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      return Err(CollectError::NoBuildOutput {
        root: build_root.to_path_buf(),
      });
    }
    Err(e) => {
      return Err(CollectError::ReadDir {
        path: build_root.to_path_buf(),
        source: e,
      });
    }
  };

  let mut dirs = Vec::new();
  for entry in entries {
    let entry = entry.map_err(|e| CollectError::ReadDir {
      path: build_root.to_path_buf(),
      source: e,
    })?;

    let is_tagged = entry
      .file_name()
      .to_str()
      .is_some_and(|name| name.starts_with(consts::BUILD_DIR_PREFIX));
    if is_tagged && entry.path().is_dir() {
      dirs.push(entry.path());
    }
  }

  // Stable order keeps reports and logs comparable across runs.
  dirs.sort();

  if dirs.is_empty() {
    return Err(CollectError::NoBuildOutput {
      root: build_root.to_path_buf(),
    });
  }

  debug!(count = dirs.len(), "discovered build output directories");
  Ok(dirs)
}

/// Copy matching artifacts from every build output directory into `dest`.
///
/// The full match list is computed before the destination is created, so a
/// zero-match failure leaves no empty vendored directory behind.
pub fn collect_artifacts(
  build_dirs: &[PathBuf],
  subpackage: &str,
  extensions: &[String],
  dest: &Path,
) -> Result<Vec<PathBuf>, CollectError> {
  let mut matches = Vec::new();

  for dir in build_dirs {
    let package_dir = dir.join(subpackage);
    if !package_dir.is_dir() {
      debug!(dir = %package_dir.display(), "build output has no subpackage directory");
      continue;
    }

    for entry in WalkDir::new(&package_dir).min_depth(1).max_depth(1) {
      let entry = entry.map_err(|e| CollectError::ReadDir {
        path: package_dir.clone(),
        source: e.into(),
      })?;

      if entry.file_type().is_file() && matches_extension(entry.path(), extensions) {
        matches.push(entry.path().to_path_buf());
      }
    }
  }

  if matches.is_empty() {
    return Err(CollectError::NoArtifacts {
      subpackage: subpackage.to_string(),
      extensions: extensions.to_vec(),
    });
  }

  ensure_dir(dest)?;

  let mut collected = Vec::with_capacity(matches.len());
  for file in &matches {
    collected.push(copy_into(file, dest)?);
  }

  info!(count = collected.len(), dest = %dest.display(), "artifacts collected");
  Ok(collected)
}

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn extensions() -> Vec<String> {
    vec!["py".to_string(), "so".to_string()]
  }

  fn fake_build_output(root: &Path, tag: &str, files: &[&str]) -> PathBuf {
    let dir = root.join(format!("lib.{}", tag)).join("pysqlcipher3");
    std::fs::create_dir_all(&dir).unwrap();
    for file in files {
      std::fs::write(dir.join(file), *file).unwrap();
    }
    root.join(format!("lib.{}", tag))
  }

  #[test]
  fn discovers_tagged_directories_only() {
    let temp = TempDir::new().unwrap();
    fake_build_output(temp.path(), "linux-x86_64-cpython-311", &[]);
    std::fs::create_dir(temp.path().join("temp.linux")).unwrap();
    std::fs::write(temp.path().join("lib.notadir"), "file").unwrap();

    let dirs = discover_build_dirs(temp.path()).unwrap();

    assert_eq!(dirs, vec![temp.path().join("lib.linux-x86_64-cpython-311")]);
  }

  #[test]
  fn missing_build_root_fails_loudly() {
    let temp = TempDir::new().unwrap();

    let result = discover_build_dirs(&temp.path().join("build"));

    assert!(matches!(result, Err(CollectError::NoBuildOutput { .. })));
  }

  #[test]
  fn empty_build_root_fails_loudly() {
    let temp = TempDir::new().unwrap();

    let result = discover_build_dirs(temp.path());

    assert!(matches!(result, Err(CollectError::NoBuildOutput { .. })));
  }

  #[test]
  fn collects_from_all_build_directories() {
    let temp = TempDir::new().unwrap();
    let a = fake_build_output(
      temp.path(),
      "linux-x86_64-cpython-310",
      &["__init__.py", "_sqlite3.cpython-310-x86_64-linux-gnu.so"],
    );
    let b = fake_build_output(temp.path(), "linux-x86_64-cpython-311", &["dbapi2.py"]);
    let dest = temp.path().join("vendored");

    let collected = collect_artifacts(&[a, b], "pysqlcipher3", &extensions(), &dest).unwrap();

    assert_eq!(collected.len(), 3);
    assert!(dest.join("__init__.py").exists());
    assert!(dest.join("_sqlite3.cpython-310-x86_64-linux-gnu.so").exists());
    assert!(dest.join("dbapi2.py").exists());
  }

  #[test]
  fn ignores_files_with_other_extensions() {
    let temp = TempDir::new().unwrap();
    let dir = fake_build_output(
      temp.path(),
      "linux-x86_64-cpython-311",
      &["dbapi2.py", "notes.txt", "module.o"],
    );
    let dest = temp.path().join("vendored");

    let collected = collect_artifacts(&[dir], "pysqlcipher3", &extensions(), &dest).unwrap();

    assert_eq!(collected, vec![dest.join("dbapi2.py")]);
  }

  #[test]
  fn zero_matches_fails_and_leaves_no_destination() {
    let temp = TempDir::new().unwrap();
    let dir = fake_build_output(temp.path(), "linux-x86_64-cpython-311", &["notes.txt"]);
    let dest = temp.path().join("vendored");

    let result = collect_artifacts(&[dir], "pysqlcipher3", &extensions(), &dest);

    assert!(matches!(result, Err(CollectError::NoArtifacts { .. })));
    assert!(!dest.exists(), "destination must not be created on an empty match");
  }

  #[test]
  fn missing_subpackage_directory_counts_as_zero_matches() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("lib.linux-x86_64-cpython-311");
    std::fs::create_dir_all(&dir).unwrap();

    let result = collect_artifacts(&[dir], "pysqlcipher3", &extensions(), &temp.path().join("vendored"));

    assert!(matches!(result, Err(CollectError::NoArtifacts { .. })));
  }
}
