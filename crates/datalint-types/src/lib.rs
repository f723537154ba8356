//! Stable DTOs and IDs used across the datalint workspace.
//!
//! This crate is intentionally boring:
//! - the ordered severity [`Level`]
//! - findings, per-rule outcomes, and per-file results
//! - the emitted report envelope
//! - canonical relative path handling
//! - TOML to JSON value conversion

#![forbid(unsafe_code)]

pub mod ids;
pub mod level;
pub mod path;
pub mod report;
pub mod result;
pub mod value;

pub use level::{Level, UnknownLevel};
pub use path::RepoPath;
pub use report::{FileReport, LevelCounts, LintReport, ToolMeta, Verdict};
pub use result::{EvaluationOutcome, FileResult, Finding};
pub use value::{json_from_toml, json_map_from_toml};
