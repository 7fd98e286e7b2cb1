//! Working-directory resolution and filesystem layout.
//!
//! Every pipeline invocation operates inside one working directory. The
//! directory is picked with the following precedence:
//!
//! 1. explicit override (CLI flag)
//! 2. the `CIPHERBUILD_WORK_DIR` environment variable
//! 3. the configured `work_dir`
//!
//! [`Layout`] derives every concrete path the stages touch from the
//! resolved working directory, so path conventions live in one place.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::PipelineConfig;
use crate::consts;

/// Errors that can occur while resolving the working directory.
#[derive(Debug, Error)]
pub enum WorkDirError {
  /// Failed to canonicalize an existing directory.
  #[error("failed to resolve working directory '{path}': {source}")]
  Canonicalize {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The current directory is unavailable for resolving a relative path.
  #[error("failed to determine current directory: {0}")]
  CurrentDir(#[source] std::io::Error),
}

/// The resolved working directory of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct WorkDir {
  root: PathBuf,
}

impl WorkDir {
  /// Resolve the working directory from override, environment, and config.
  pub fn resolve(overridden: Option<&Path>, configured: &Path) -> Result<Self, WorkDirError> {
    let picked = match overridden {
      Some(path) => path.to_path_buf(),
      None => match std::env::var(consts::WORK_DIR_ENV) {
        Ok(value) => PathBuf::from(value),
        Err(_) => configured.to_path_buf(),
      },
    };

    Ok(Self {
      root: absolutize(&picked)?,
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}

/// Make a path absolute without requiring it to exist yet.
///
/// Existing paths are canonicalized; a not-yet-created work dir is joined
/// onto the current directory so the pipeline can create it later.
fn absolutize(path: &Path) -> Result<PathBuf, WorkDirError> {
  if path.exists() {
    return dunce::canonicalize(path).map_err(|e| WorkDirError::Canonicalize {
      path: path.to_path_buf(),
      source: e,
    });
  }

  if path.is_absolute() {
    return Ok(path.to_path_buf());
  }

  let current = std::env::current_dir().map_err(WorkDirError::CurrentDir)?;
  Ok(current.join(path))
}

/// Concrete filesystem layout of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct Layout {
  /// Engine source tree.
  pub engine_dir: PathBuf,

  /// Binding source tree.
  pub binding_dir: PathBuf,

  /// Staging slots inside the binding tree, in config order.
  pub staging_slots: Vec<PathBuf>,

  /// Root of the binding's build output (`<binding>/build`).
  pub build_root: PathBuf,

  /// Destination for vendored artifacts.
  pub collect_dest: PathBuf,
}

impl Layout {
  pub fn new(work: &WorkDir, config: &PipelineConfig) -> Self {
    let binding_dir = work.root().join(&config.binding.dir);

    Self {
      engine_dir: work.root().join(&config.engine.dir),
      staging_slots: config
        .binding
        .staging_slots
        .iter()
        .map(|slot| binding_dir.join(slot))
        .collect(),
      build_root: binding_dir.join("build"),
      collect_dest: work.root().join(&config.collect.dest),
      binding_dir,
    }
  }

  /// Path of the amalgamated engine source after the engine stage.
  pub fn amalgamation_source(&self) -> PathBuf {
    self.engine_dir.join(consts::AMALGAMATION_SOURCE)
  }

  /// Path of the amalgamated engine header after the engine stage.
  pub fn amalgamation_header(&self) -> PathBuf {
    self.engine_dir.join(consts::AMALGAMATION_HEADER)
  }
}
