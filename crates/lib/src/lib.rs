//! cipherbuild-lib: Core logic for the encrypted-SQLite build pipeline
//!
//! This crate provides the building blocks of the pipeline:
//! - `config`: TOML-backed pipeline configuration with built-in defaults
//! - `workdir`: resolved filesystem layout for one pipeline invocation
//! - `stages`: the five pipeline stages (fetch, compile, stage, build, collect)
//! - `pipeline`: sequential orchestration, error taxonomy, and run reports
//! - `toolchain`: preflight probes for the external build toolchain

pub mod config;
pub mod consts;
pub mod pipeline;
pub mod proc;
pub mod stages;
pub mod toolchain;
pub mod util;
pub mod workdir;
