//! Pipeline configuration.
//!
//! Configuration is optional: the built-in defaults describe the canonical
//! SQLCipher + pysqlcipher3 layout, and a TOML file can override any subset
//! of fields. All layout paths are relative to the working directory so a
//! single config works in any disposable build environment.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::consts;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Failed to read the config file.
  #[error("failed to read config file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Failed to parse the config file as TOML.
  #[error("failed to parse config file '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  /// The staging slot list is empty.
  #[error("binding.staging_slots must name at least one staging directory")]
  NoStagingSlots,

  /// The artifact extension list is empty.
  #[error("collect.extensions must name at least one artifact extension")]
  NoExtensions,

  /// A layout path escapes the working directory.
  #[error("layout path '{0}' must be relative to the working directory")]
  AbsoluteLayoutPath(PathBuf),

  /// The codec define is missing from the engine compile flags.
  #[error("engine.cflags is missing the encryption codec define ({0})")]
  MissingCodecDefine(&'static str),
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// Working directory holding the source trees and build output.
  pub work_dir: PathBuf,

  /// Encrypted database engine to compile and amalgamate.
  pub engine: EngineConfig,

  /// Language binding project to stitch the amalgamation into.
  pub binding: BindingConfig,

  /// Where the built binding artifacts are vendored.
  pub collect: CollectConfig,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      work_dir: PathBuf::from("."),
      engine: EngineConfig::default(),
      binding: BindingConfig::default(),
      collect: CollectConfig::default(),
    }
  }
}

/// Engine source and build settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Git URL of the engine repository.
  pub url: String,

  /// Branch (or tag) to fetch.
  pub branch: String,

  /// Directory the engine tree is cloned into, relative to the work dir.
  pub dir: PathBuf,

  /// Arguments passed to the engine's `./configure` step.
  pub configure_args: Vec<String>,

  /// Compile flags, joined into a single `CFLAGS=` configure argument.
  /// Must contain the encryption codec define; without it the engine
  /// silently builds without encryption support.
  pub cflags: Vec<String>,

  /// Linker flags, joined into a single `LDFLAGS=` configure argument.
  pub ldflags: Vec<String>,

  /// Make target producing the amalgamated source.
  pub amalgamation_target: String,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      url: "https://github.com/sqlcipher/sqlcipher.git".to_string(),
      branch: "master".to_string(),
      dir: PathBuf::from("sqlcipher"),
      configure_args: vec!["--enable-tempstore=yes".to_string()],
      cflags: vec![format!("-D{}", consts::CODEC_GUARD)],
      ldflags: vec!["-lcrypto".to_string(), "-lsqlite3".to_string()],
      amalgamation_target: consts::AMALGAMATION_SOURCE.to_string(),
    }
  }
}

/// Binding source and build settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
  /// Git URL of the binding repository.
  pub url: String,

  /// Branch (or tag) to fetch.
  pub branch: String,

  /// Directory the binding tree is cloned into, relative to the work dir.
  pub dir: PathBuf,

  /// Python interpreter driving the binding's `setup.py` steps.
  pub python: String,

  /// Staging slots the amalgamation pair is published into, relative to
  /// the binding directory. The binding's build tooling searches each of
  /// these independently; skipping one produces a build that fails or
  /// silently links against a stale system-installed engine.
  pub staging_slots: Vec<PathBuf>,

  /// Name of the binding's Python subpackage inside the build output.
  pub subpackage: String,
}

impl Default for BindingConfig {
  fn default() -> Self {
    Self {
      url: "https://github.com/rigglemania/pysqlcipher3.git".to_string(),
      branch: "master".to_string(),
      dir: PathBuf::from("pysqlcipher3"),
      python: "python3".to_string(),
      staging_slots: vec![
        PathBuf::from("amalgamation"),
        PathBuf::from("src/python3/sqlcipher"),
      ],
      subpackage: "pysqlcipher3".to_string(),
    }
  }
}

/// Artifact collection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
  /// Destination the vendored artifacts are copied into, relative to the
  /// work dir.
  pub dest: PathBuf,

  /// File extensions collected from the build output (interpreted source
  /// and compiled binary extensions).
  pub extensions: Vec<String>,
}

impl Default for CollectConfig {
  fn default() -> Self {
    Self {
      dest: PathBuf::from("src/pysqlcipher3"),
      extensions: vec!["py".to_string(), "so".to_string()],
    }
  }
}

impl PipelineConfig {
  /// Load configuration from a TOML file, layering it over the defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;

    toml::from_str(&text).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: e,
    })
  }

  /// Validate the configuration before any stage runs.
  ///
  /// The codec define is checked here rather than after the engine build:
  /// omitting it produces an engine that silently lacks encryption, so a
  /// config without it must never start fetching sources.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.binding.staging_slots.is_empty() {
      return Err(ConfigError::NoStagingSlots);
    }

    if self.collect.extensions.is_empty() {
      return Err(ConfigError::NoExtensions);
    }

    for path in self.layout_paths() {
      if path.is_absolute() {
        return Err(ConfigError::AbsoluteLayoutPath(path.to_path_buf()));
      }
    }

    if !self.engine.cflags.iter().any(|f| f.contains(consts::CODEC_GUARD)) {
      return Err(ConfigError::MissingCodecDefine(consts::CODEC_GUARD));
    }

    Ok(())
  }

  /// All configured paths that must stay inside the working directory.
  fn layout_paths(&self) -> impl Iterator<Item = &Path> {
    [self.engine.dir.as_path(), self.binding.dir.as_path(), self.collect.dest.as_path()]
      .into_iter()
      .chain(self.binding.staging_slots.iter().map(PathBuf::as_path))
  }
}
