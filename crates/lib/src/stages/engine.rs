//! Engine compilation and amalgamation.
//!
//! Configures the encrypted engine tree with the codec define and crypto
//! linker flags, builds the amalgamation target, and verifies the produced
//! `sqlite3.c` actually carries the codec compile guard. Without the guard
//! the engine silently lacks encryption support, so its absence fails the
//! stage before anything downstream consumes the pair.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::config::EngineConfig;
use crate::consts;
use crate::proc::{ProcError, run_tool};
use crate::util::hash::{ContentHash, hash_file};

/// Errors that can occur while compiling the engine.
#[derive(Debug, Error)]
pub enum EngineError {
  /// The source tree has no configure script.
  #[error("configure script not found at '{0}'; was the engine tree fetched?")]
  ConfigureMissing(PathBuf),

  /// The configure step ran and rejected the build flags. Operators fix
  /// this by changing flags, not by installing packages.
  #[error("configure rejected the build flags (exit code {code:?}): {stderr}")]
  ConfigureFailed { code: Option<i32>, stderr: String },

  /// The amalgamation build target failed.
  #[error("amalgamation target '{target}' failed (exit code {code:?}): {stderr}")]
  AmalgamationFailed {
    target: String,
    code: Option<i32>,
    stderr: String,
  },

  /// A build tool was missing or could not run at all.
  #[error(transparent)]
  Toolchain(ProcError),

  /// An expected amalgamation output file was not produced.
  #[error("expected amalgamation output missing: {0}")]
  OutputMissing(PathBuf),

  /// The amalgamation was built without the encryption codec.
  #[error("'{0}' lacks the encryption codec guard; the codec flag was dropped")]
  CodecGuardMissing(PathBuf),

  /// Failed to read an amalgamation output file.
  #[error("failed to read amalgamation output '{path}': {source}")]
  ReadOutput {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// The amalgamated source pair produced by the engine stage.
#[derive(Debug, Clone)]
pub struct EngineOutput {
  /// Path of the amalgamated source (`sqlite3.c`).
  pub source: PathBuf,

  /// Path of the amalgamated header (`sqlite3.h`).
  pub header: PathBuf,

  /// Content hash of the source, for cross-run determinism checks.
  pub source_hash: ContentHash,

  /// Content hash of the header.
  pub header_hash: ContentHash,
}

/// Configure the engine tree and build its amalgamation.
pub async fn compile(
  config: &EngineConfig,
  engine_dir: &Path,
  timeout: Duration,
) -> Result<EngineOutput, EngineError> {
  let configure = engine_dir.join("configure");
  if !configure.exists() {
    return Err(EngineError::ConfigureMissing(configure));
  }

  info!(dir = %engine_dir.display(), "configuring engine");
  let args = configure_args(config);
  match run_tool("./configure", &args, engine_dir, timeout).await {
    Ok(_) => {}
    Err(ProcError::ToolFailed { code, stderr, .. }) => {
      return Err(EngineError::ConfigureFailed { code, stderr });
    }
    Err(e) => return Err(EngineError::Toolchain(e)),
  }

  info!(target = %config.amalgamation_target, "building amalgamation");
  match run_tool("make", std::slice::from_ref(&config.amalgamation_target), engine_dir, timeout).await {
    Ok(_) => {}
    Err(ProcError::ToolFailed { code, stderr, .. }) => {
      return Err(EngineError::AmalgamationFailed {
        target: config.amalgamation_target.clone(),
        code,
        stderr,
      });
    }
    Err(e) => return Err(EngineError::Toolchain(e)),
  }

  let source = engine_dir.join(consts::AMALGAMATION_SOURCE);
  let header = engine_dir.join(consts::AMALGAMATION_HEADER);
  for path in [&source, &header] {
    if !path.exists() {
      return Err(EngineError::OutputMissing(path.clone()));
    }
  }

  verify_codec_guard(&source).await?;

  let source_hash = read_hash(&source)?;
  let header_hash = read_hash(&header)?;
  info!(source_hash = %source_hash, "amalgamation ready");

  Ok(EngineOutput {
    source,
    header,
    source_hash,
    header_hash,
  })
}

/// Assemble the configure arguments, folding compile and linker flags into
/// the `CFLAGS=`/`LDFLAGS=` arguments the configure script expects.
fn configure_args(config: &EngineConfig) -> Vec<String> {
  let mut args = config.configure_args.clone();

  if !config.cflags.is_empty() {
    args.push(format!("CFLAGS={}", config.cflags.join(" ")));
  }

  if !config.ldflags.is_empty() {
    args.push(format!("LDFLAGS={}", config.ldflags.join(" ")));
  }

  args
}

/// Verify the amalgamated source carries the codec compile guard.
pub async fn verify_codec_guard(source: &Path) -> Result<(), EngineError> {
  let bytes = tokio::fs::read(source).await.map_err(|e| EngineError::ReadOutput {
    path: source.to_path_buf(),
    source: e,
  })?;

  let guard = consts::CODEC_GUARD.as_bytes();
  if !bytes.windows(guard.len()).any(|window| window == guard) {
    return Err(EngineError::CodecGuardMissing(source.to_path_buf()));
  }

  Ok(())
}

fn read_hash(path: &Path) -> Result<ContentHash, EngineError> {
  hash_file(path).map_err(|e| EngineError::ReadOutput {
    path: path.to_path_buf(),
    source: e,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  const TIMEOUT: Duration = Duration::from_secs(10);

  #[test]
  fn configure_args_fold_flags() {
    let config = EngineConfig::default();

    let args = configure_args(&config);

    assert_eq!(
      args,
      vec![
        "--enable-tempstore=yes",
        "CFLAGS=-DSQLITE_HAS_CODEC",
        "LDFLAGS=-lcrypto -lsqlite3",
      ]
    );
  }

  #[test]
  fn configure_args_skip_empty_flag_groups() {
    let config = EngineConfig {
      configure_args: vec![],
      cflags: vec![],
      ldflags: vec![],
      ..EngineConfig::default()
    };

    assert!(configure_args(&config).is_empty());
  }

  #[tokio::test]
  async fn missing_configure_script_fails_early() {
    let temp = TempDir::new().unwrap();

    let result = compile(&EngineConfig::default(), temp.path(), TIMEOUT).await;

    assert!(matches!(result, Err(EngineError::ConfigureMissing(_))));
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn rejected_flags_are_a_configure_error() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let configure = temp.path().join("configure");
    std::fs::write(&configure, "#!/bin/sh\necho 'unrecognized option' >&2\nexit 7\n").unwrap();
    std::fs::set_permissions(&configure, std::fs::Permissions::from_mode(0o755)).unwrap();

    let result = compile(&EngineConfig::default(), temp.path(), TIMEOUT).await;

    match result {
      Err(EngineError::ConfigureFailed { code, stderr }) => {
        assert_eq!(code, Some(7));
        assert!(stderr.contains("unrecognized option"));
      }
      other => panic!("expected ConfigureFailed, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn codec_guard_present_passes() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("sqlite3.c");
    std::fs::write(&source, "#ifdef SQLITE_HAS_CODEC\nint codec = 1;\n#endif\n").unwrap();

    verify_codec_guard(&source).await.unwrap();
  }

  #[tokio::test]
  async fn codec_guard_absent_fails() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("sqlite3.c");
    std::fs::write(&source, "int main(void) { return 0; }\n").unwrap();

    let result = verify_codec_guard(&source).await;

    assert!(matches!(result, Err(EngineError::CodecGuardMissing(_))));
  }
}
