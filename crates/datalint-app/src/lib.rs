//! Application layer for datalint.
//!
//! This crate wires the pure domain, settings, discovery, module installation, and rule
//! evaluation into use cases the CLI calls. It owns no process concerns: engines, fetchers,
//! and cancellation are injected.

#![forbid(unsafe_code)]

mod config;
mod init;
mod lint;
mod render;

pub use config::{LoadedConfig, find_config, load_config};
pub use init::{InitOutcome, SCAFFOLD, run_init};
pub use lint::{LintOutput, LintParams, exit_code, lint_with_config, run_lint};
pub use render::{OutputFormat, render_json, render_outputs, render_text};
