//! Sequential pipeline orchestration.
//!
//! Each stage's filesystem output is the next stage's required input, so
//! execution is strictly sequential and aborts on the first failure:
//!
//! 1. Fetch the engine and binding source trees (shallow, pinned branch)
//! 2. Configure and amalgamate the encrypted engine
//! 3. Publish the pair into the binding's staging slots and regenerate
//!    its combined source
//! 4. Build the binding extension module
//! 5. Discover the tagged build output and vendor the artifacts

pub mod types;

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::config::PipelineConfig;
use crate::stages::{acquire, binding, collect, engine, staging};
use crate::workdir::{Layout, WorkDir};

pub use types::{PipelineError, PipelineOptions, PlannedStage, RunReport, StageKind, StageReport};

/// Run the full pipeline.
///
/// Validates the configuration, resolves the working directory (an
/// explicit `work_dir` overrides environment and config), then executes
/// the five stages in order. Returns the run report on success; any stage
/// failure aborts the run.
pub async fn run(
  config: &PipelineConfig,
  work_dir: Option<&Path>,
  options: &PipelineOptions,
) -> Result<RunReport, PipelineError> {
  config.validate()?;

  let work = WorkDir::resolve(work_dir, &config.work_dir)?;
  let layout = Layout::new(&work, config);

  if options.clean {
    clean(&layout)?;
  }

  std::fs::create_dir_all(work.root()).map_err(|e| PipelineError::Prepare {
    path: work.root().to_path_buf(),
    source: e,
  })?;

  info!(root = %work.root().display(), "starting pipeline");
  let mut report = RunReport::default();

  let started = Instant::now();
  let engine_tree =
    acquire::fetch_source("engine", &config.engine.url, &config.engine.branch, &layout.engine_dir).await?;
  report.engine_commit = Some(engine_tree.commit.clone());
  push_stage(
    &mut report,
    StageKind::FetchEngine,
    started,
    format!("{} @ {}", config.engine.url, engine_tree.commit),
  );

  let started = Instant::now();
  let binding_tree = acquire::fetch_source(
    "binding",
    &config.binding.url,
    &config.binding.branch,
    &layout.binding_dir,
  )
  .await?;
  report.binding_commit = Some(binding_tree.commit.clone());
  push_stage(
    &mut report,
    StageKind::FetchBinding,
    started,
    format!("{} @ {}", config.binding.url, binding_tree.commit),
  );

  let started = Instant::now();
  let output = engine::compile(&config.engine, &layout.engine_dir, options.stage_timeout).await?;
  report.amalgamation_source_hash = Some(output.source_hash.clone());
  report.amalgamation_header_hash = Some(output.header_hash.clone());
  push_stage(
    &mut report,
    StageKind::CompileEngine,
    started,
    format!("sqlite3.c sha256 {}", output.source_hash),
  );

  let started = Instant::now();
  let published = staging::publish(&output.source, &output.header, &layout.staging_slots)?;
  staging::build_amalgamation(&config.binding.python, &layout.binding_dir, options.stage_timeout).await?;
  push_stage(
    &mut report,
    StageKind::StageAmalgamation,
    started,
    format!("{} copies across {} slots", published.len(), layout.staging_slots.len()),
  );

  let started = Instant::now();
  binding::build(&config.binding.python, &layout.binding_dir, options.stage_timeout).await?;
  push_stage(
    &mut report,
    StageKind::BuildBinding,
    started,
    format!("{} setup.py build", config.binding.python),
  );

  let started = Instant::now();
  let build_dirs = collect::discover_build_dirs(&layout.build_root)?;
  let artifacts = collect::collect_artifacts(
    &build_dirs,
    &config.binding.subpackage,
    &config.collect.extensions,
    &layout.collect_dest,
  )?;
  push_stage(
    &mut report,
    StageKind::CollectArtifacts,
    started,
    format!("{} artifacts from {} build dirs", artifacts.len(), build_dirs.len()),
  );
  report.artifacts = artifacts;

  info!(stages = report.stages.len(), "pipeline complete");
  Ok(report)
}

/// Resolve the stages the pipeline would execute, without side effects.
pub fn plan(config: &PipelineConfig, work_dir: Option<&Path>) -> Result<Vec<PlannedStage>, PipelineError> {
  config.validate()?;

  let work = WorkDir::resolve(work_dir, &config.work_dir)?;
  let layout = Layout::new(&work, config);

  let slots = layout
    .staging_slots
    .iter()
    .map(|slot| slot.display().to_string())
    .collect::<Vec<_>>()
    .join(", ");

  Ok(vec![
    PlannedStage {
      stage: StageKind::FetchEngine,
      detail: format!(
        "clone {} ({}, depth 1) into {}",
        config.engine.url,
        config.engine.branch,
        layout.engine_dir.display()
      ),
    },
    PlannedStage {
      stage: StageKind::FetchBinding,
      detail: format!(
        "clone {} ({}, depth 1) into {}",
        config.binding.url,
        config.binding.branch,
        layout.binding_dir.display()
      ),
    },
    PlannedStage {
      stage: StageKind::CompileEngine,
      detail: format!(
        "./configure {} && make {}",
        config.engine.configure_args.join(" "),
        config.engine.amalgamation_target
      ),
    },
    PlannedStage {
      stage: StageKind::StageAmalgamation,
      detail: format!(
        "publish sqlite3.c/sqlite3.h to [{}], then {} setup.py build_amalgamation",
        slots, config.binding.python
      ),
    },
    PlannedStage {
      stage: StageKind::BuildBinding,
      detail: format!("{} setup.py build", config.binding.python),
    },
    PlannedStage {
      stage: StageKind::CollectArtifacts,
      detail: format!(
        "copy {}/{}/*.{{{}}} into {}",
        layout.build_root.join("lib.*").display(),
        config.binding.subpackage,
        config.collect.extensions.join(","),
        layout.collect_dest.display()
      ),
    },
  ])
}

/// Remove the previous run's source trees and collected artifacts.
fn clean(layout: &Layout) -> Result<(), PipelineError> {
  for dir in [&layout.engine_dir, &layout.binding_dir, &layout.collect_dest] {
    match std::fs::remove_dir_all(dir) {
      Ok(()) => info!(dir = %dir.display(), "removed previous tree"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => {
        return Err(PipelineError::Prepare {
          path: dir.to_path_buf(),
          source: e,
        });
      }
    }
  }

  Ok(())
}

fn push_stage(report: &mut RunReport, stage: StageKind, started: Instant, detail: String) {
  let duration = started.elapsed();
  info!(stage = %stage, ?duration, "stage complete");
  report.stages.push(StageReport {
    stage,
    duration,
    detail,
  });
}
