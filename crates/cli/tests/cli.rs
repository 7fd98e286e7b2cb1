//! Integration tests for the `cipherbuild` binary.
//!
//! These exercise the CLI surface without network access or a build
//! toolchain: help output, dry-run planning, configuration errors, and
//! the doctor's exit status.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

/// Get a Command for the cipherbuild binary.
fn cipherbuild() -> Command {
  let mut cmd = cargo_bin_cmd!("cipherbuild");
  cmd.env_remove("CIPHERBUILD_WORK_DIR");
  cmd
}

#[test]
fn help_lists_subcommands() {
  cipherbuild()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("run"))
    .stdout(predicate::str::contains("plan"))
    .stdout(predicate::str::contains("doctor"));
}

#[test]
fn plan_prints_every_stage() {
  let temp = tempfile::TempDir::new().unwrap();

  cipherbuild()
    .current_dir(temp.path())
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("fetch-engine"))
    .stdout(predicate::str::contains("fetch-binding"))
    .stdout(predicate::str::contains("compile-engine"))
    .stdout(predicate::str::contains("stage-amalgamation"))
    .stdout(predicate::str::contains("build-binding"))
    .stdout(predicate::str::contains("collect-artifacts"));
}

#[test]
fn plan_has_no_side_effects() {
  let temp = tempfile::TempDir::new().unwrap();

  cipherbuild().current_dir(temp.path()).arg("plan").assert().success();

  assert_eq!(
    std::fs::read_dir(temp.path()).unwrap().count(),
    0,
    "plan must not create anything in the working directory"
  );
}

#[test]
fn plan_rejects_a_missing_config_file() {
  cipherbuild()
    .args(["plan", "--config", "/nonexistent/cipherbuild.toml"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("read config"));
}

#[test]
fn run_rejects_malformed_config() {
  let temp = tempfile::TempDir::new().unwrap();
  std::fs::write(temp.path().join("cipherbuild.toml"), "[engine\nbranch =").unwrap();

  cipherbuild()
    .current_dir(temp.path())
    .args(["run", "--config", "cipherbuild.toml"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("parse config"));
}

#[test]
fn run_rejects_config_without_codec_define() {
  let temp = tempfile::TempDir::new().unwrap();
  std::fs::write(
    temp.path().join("cipherbuild.toml"),
    "[engine]\ncflags = [\"-O2\"]\n",
  )
  .unwrap();

  cipherbuild()
    .current_dir(temp.path())
    .args(["run", "--config", "cipherbuild.toml"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("codec"));
}

#[test]
#[cfg(unix)]
fn doctor_fails_without_a_toolchain() {
  cipherbuild()
    .env("PATH", "")
    .arg("doctor")
    .assert()
    .failure()
    .stderr(predicate::str::contains("preflight"));
}
