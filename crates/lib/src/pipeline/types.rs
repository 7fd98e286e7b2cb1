//! Types for pipeline orchestration.
//!
//! Defines the stage identifiers, the run report, the pipeline options,
//! and the top-level error taxonomy. Every error category is fatal: the
//! pipeline aborts on the first failure and the only recovery strategy is
//! a clean re-run.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::stages::acquire::AcquireError;
use crate::stages::binding::BindingError;
use crate::stages::collect::CollectError;
use crate::stages::engine::EngineError;
use crate::stages::staging::StagingError;
use crate::util::hash::ContentHash;
use crate::workdir::WorkDirError;

/// Identifies one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
  FetchEngine,
  FetchBinding,
  CompileEngine,
  StageAmalgamation,
  BuildBinding,
  CollectArtifacts,
}

impl StageKind {
  /// All stages in execution order.
  pub const ALL: [StageKind; 6] = [
    StageKind::FetchEngine,
    StageKind::FetchBinding,
    StageKind::CompileEngine,
    StageKind::StageAmalgamation,
    StageKind::BuildBinding,
    StageKind::CollectArtifacts,
  ];
}

impl std::fmt::Display for StageKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      StageKind::FetchEngine => "fetch-engine",
      StageKind::FetchBinding => "fetch-binding",
      StageKind::CompileEngine => "compile-engine",
      StageKind::StageAmalgamation => "stage-amalgamation",
      StageKind::BuildBinding => "build-binding",
      StageKind::CollectArtifacts => "collect-artifacts",
    };
    write!(f, "{}", name)
  }
}

/// One completed stage in a run report.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
  pub stage: StageKind,
  pub duration: Duration,
  pub detail: String,
}

/// Report of one successful pipeline run.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
  /// Completed stages in execution order.
  pub stages: Vec<StageReport>,

  /// Commit hash the engine tree was checked out at.
  pub engine_commit: Option<String>,

  /// Commit hash the binding tree was checked out at.
  pub binding_commit: Option<String>,

  /// Content hash of the amalgamated source. Two clean runs against the
  /// same upstream revisions must report the same hash.
  pub amalgamation_source_hash: Option<ContentHash>,

  /// Content hash of the amalgamated header.
  pub amalgamation_header_hash: Option<ContentHash>,

  /// Vendored artifact paths.
  pub artifacts: Vec<PathBuf>,
}

/// One stage of a dry-run plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStage {
  pub stage: StageKind,
  pub detail: String,
}

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
  /// Hard timeout applied to each tool invocation within a stage.
  pub stage_timeout: Duration,

  /// Remove previous source trees and collected artifacts before running.
  pub clean: bool,
}

impl Default for PipelineOptions {
  fn default() -> Self {
    Self {
      stage_timeout: Duration::from_secs(30 * 60),
      clean: false,
    }
  }
}

/// Errors that can occur during a pipeline run.
///
/// The variants mirror the operational error categories: configuration,
/// acquisition, toolchain/build, and artifact discovery, so the exit
/// message tells operators whether to fix flags, install packages, or
/// check the network.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// Configuration failed to load or validate.
  #[error("configuration error: {0}")]
  Config(#[from] ConfigError),

  /// The working directory could not be resolved.
  #[error("working directory error: {0}")]
  WorkDir(#[from] WorkDirError),

  /// Preparing or cleaning the working directory failed.
  #[error("failed to prepare working directory '{path}': {source}")]
  Prepare {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Source acquisition failed.
  #[error("source acquisition failed: {0}")]
  Acquire(#[from] AcquireError),

  /// Engine configure/amalgamation failed.
  #[error("engine build failed: {0}")]
  Engine(#[from] EngineError),

  /// Amalgamation staging failed.
  #[error("amalgamation staging failed: {0}")]
  Staging(#[from] StagingError),

  /// Binding build failed.
  #[error("binding build failed: {0}")]
  Binding(#[from] BindingError),

  /// Artifact collection failed.
  #[error("artifact collection failed: {0}")]
  Collect(#[from] CollectError),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stage_order_is_fixed() {
    assert_eq!(StageKind::ALL.len(), 6);
    assert_eq!(StageKind::ALL[0], StageKind::FetchEngine);
    assert_eq!(StageKind::ALL[5], StageKind::CollectArtifacts);
  }

  #[test]
  fn stage_display_names() {
    assert_eq!(StageKind::FetchEngine.to_string(), "fetch-engine");
    assert_eq!(StageKind::StageAmalgamation.to_string(), "stage-amalgamation");
    assert_eq!(StageKind::CollectArtifacts.to_string(), "collect-artifacts");
  }

  #[test]
  fn default_options() {
    let options = PipelineOptions::default();

    assert_eq!(options.stage_timeout, Duration::from_secs(1800));
    assert!(!options.clean);
  }

  #[test]
  fn report_serializes_to_json() {
    let report = RunReport {
      stages: vec![StageReport {
        stage: StageKind::FetchEngine,
        duration: Duration::from_secs(2),
        detail: "https://example.com/repo.git @ abc123".to_string(),
      }],
      engine_commit: Some("abc123".to_string()),
      ..RunReport::default()
    };

    let json = serde_json::to_string(&report).unwrap();

    assert!(json.contains("\"fetch-engine\""));
    assert!(json.contains("abc123"));
  }
}
