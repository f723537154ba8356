//! Pure datalint core (no I/O).
//!
//! - [`reference`]: parse module declarations into pinned, content-addressed references
//! - [`policy`]: the effective configuration consumed by the rest of the pipeline
//! - [`combine`]: classify evaluation results by severity and decide pass/fail
//! - [`model`]: targets and lint files produced by discovery
//! - [`context`]: the per-run context (cancellation and tracing span) handed to each component

#![forbid(unsafe_code)]

pub mod combine;
pub mod context;
pub mod model;
pub mod policy;
pub mod reference;

mod fingerprint;

pub use combine::{CombinedReport, classify_file, combine, effective_level};
pub use context::{CancelToken, Cancelled, RunContext};
pub use model::{LintFile, Target};
pub use policy::{
    EffectiveConfig, InvalidThreshold, LintFileSpec, ModuleSpec, SeverityPolicy, TargetSpec,
    parse_threshold,
};
pub use reference::{ArchiveKey, ModuleReference, ReferenceError, parse_reference};
