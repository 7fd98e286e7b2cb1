//! Small filesystem helpers shared by the staging and collect stages.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from the filesystem helpers.
#[derive(Debug, Error)]
pub enum FsError {
  /// Failed to create a directory.
  #[error("failed to create directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Failed to copy a file.
  #[error("failed to copy '{from}' to '{to}': {source}")]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Create a directory and all of its parents.
pub fn ensure_dir(path: &Path) -> Result<(), FsError> {
  std::fs::create_dir_all(path).map_err(|e| FsError::CreateDir {
    path: path.to_path_buf(),
    source: e,
  })
}

/// Copy a file into a directory, keeping its file name.
///
/// Returns the destination path of the copy.
pub fn copy_into(file: &Path, dir: &Path) -> Result<PathBuf, FsError> {
  let name = file.file_name().ok_or_else(|| FsError::Copy {
    from: file.to_path_buf(),
    to: dir.to_path_buf(),
    source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name"),
  })?;

  let dest = dir.join(name);
  std::fs::copy(file, &dest).map_err(|e| FsError::Copy {
    from: file.to_path_buf(),
    to: dest.clone(),
    source: e,
  })?;

  Ok(dest)
}
