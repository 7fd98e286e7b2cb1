//! Source acquisition.
//!
//! Materializes the engine and binding source trees with shallow (depth 1)
//! clones of a pinned branch. Acquisition is not idempotent-safe to
//! partially retry: a pre-existing destination is removed before cloning,
//! and a failed clone removes its partial tree, so a half-cloned tree is
//! never reused.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Shallow clone depth. The trees are read-only build inputs; history
/// beyond the tip only costs transfer time.
const CLONE_DEPTH: NonZeroU32 = NonZeroU32::MIN;

/// Errors that can occur during source acquisition.
#[derive(Debug, Error)]
pub enum AcquireError {
  /// Failed to remove a stale source tree before cloning.
  #[error("failed to remove stale source tree '{path}': {source}")]
  RemoveExisting {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The configured branch is not a valid ref name.
  #[error("invalid branch name '{branch}': {source}")]
  BranchName {
    branch: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to clone a repository (network, auth, or missing ref).
  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to check out the cloned worktree.
  #[error("failed to check out worktree for '{url}': {source}")]
  Checkout {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to resolve the checked-out commit.
  #[error("failed to resolve HEAD after cloning '{url}': {message}")]
  ResolveHead { url: String, message: String },

  /// The blocking fetch task was interrupted.
  #[error("fetch task for '{name}' was interrupted: {message}")]
  Interrupted { name: String, message: String },
}

/// A materialized source tree.
#[derive(Debug, Clone)]
pub struct FetchedSource {
  /// Local path of the checked-out tree.
  pub path: PathBuf,

  /// The commit hash that was checked out.
  pub commit: String,
}

/// Fetch one source tree.
///
/// # Arguments
///
/// * `name` - Short name used in logs and errors ("engine", "binding")
/// * `url` - The git URL to clone
/// * `branch` - Branch or tag to check out
/// * `dest` - Destination directory inside the working directory
pub async fn fetch_source(
  name: &str,
  url: &str,
  branch: &str,
  dest: &Path,
) -> Result<FetchedSource, AcquireError> {
  let task_name = name.to_string();
  let task_url = url.to_string();
  let task_branch = branch.to_string();
  let task_dest = dest.to_path_buf();

  tokio::task::spawn_blocking(move || fetch_blocking(&task_name, &task_url, &task_branch, &task_dest))
    .await
    .map_err(|e| AcquireError::Interrupted {
      name: name.to_string(),
      message: e.to_string(),
    })?
}

fn fetch_blocking(name: &str, url: &str, branch: &str, dest: &Path) -> Result<FetchedSource, AcquireError> {
  if dest.exists() {
    debug!(name, path = %dest.display(), "removing stale source tree");
    std::fs::remove_dir_all(dest).map_err(|e| AcquireError::RemoveExisting {
      path: dest.to_path_buf(),
      source: e,
    })?;
  }

  info!(name, url, branch, path = %dest.display(), "cloning repository");

  let repo = match clone_repo(url, branch, dest) {
    Ok(repo) => repo,
    Err(e) => {
      // Never leave a half-cloned tree behind for a re-run to pick up.
      if dest.exists() {
        if let Err(cleanup) = std::fs::remove_dir_all(dest) {
          warn!(name, path = %dest.display(), error = %cleanup, "failed to remove partial clone");
        }
      }
      return Err(e);
    }
  };

  let commit = resolve_head(&repo, url)?;
  debug!(name, commit = %commit, "resolved revision");

  Ok(FetchedSource {
    path: dest.to_path_buf(),
    commit,
  })
}

/// Shallow-clone a repository branch to the specified path.
fn clone_repo(url: &str, branch: &str, dest: &Path) -> Result<gix::Repository, AcquireError> {
  let mut prepared = gix::prepare_clone(url, dest)
    .map_err(|e| AcquireError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?
    .with_shallow(gix::remote::fetch::Shallow::DepthAtRemote(CLONE_DEPTH))
    .with_ref_name(Some(branch))
    .map_err(|e| AcquireError::BranchName {
      branch: branch.to_string(),
      source: Box::new(e),
    })?;

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| AcquireError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  let (repo, _outcome) = checkout
    .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| AcquireError::Checkout {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  Ok(repo)
}

/// Resolve the checked-out HEAD to a commit hash.
fn resolve_head(repo: &gix::Repository, url: &str) -> Result<String, AcquireError> {
  let mut head = repo.head().map_err(|e| AcquireError::ResolveHead {
    url: url.to_string(),
    message: e.to_string(),
  })?;

  let commit = head.peel_to_commit().map_err(|e| AcquireError::ResolveHead {
    url: url.to_string(),
    message: e.to_string(),
  })?;

  Ok(commit.id.to_string())
}
