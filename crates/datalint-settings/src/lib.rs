//! Config parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::{DatalintConfigV1, EngineConfig, LintFileConfig, ModuleConfig, TargetConfig};
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `datalint.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<DatalintConfigV1> {
    let cfg: DatalintConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config used by the pipeline.
///
/// The threshold is validated first; an invalid one surfaces as
/// [`datalint_domain::InvalidThreshold`] in the error chain.
pub fn resolve_config(
    cfg: DatalintConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
