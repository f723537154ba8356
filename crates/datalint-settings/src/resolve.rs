use crate::model::{DatalintConfigV1, LintFileConfig, ModuleConfig, TargetConfig};
use anyhow::Context;
use datalint_domain::policy::{
    EffectiveConfig, LintFileSpec, ModuleSpec, SeverityPolicy, TargetSpec, parse_threshold,
};
use datalint_domain::parse_reference;
use datalint_types::Level;
use globset::Glob;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    /// Threshold from the command line; wins over the config file.
    pub error_level: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
}

pub fn resolve_config(
    cfg: DatalintConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let threshold = parse_threshold(
        overrides
            .error_level
            .as_deref()
            .or(cfg.error_level.as_deref()),
    )?;

    let mut effective = EffectiveConfig {
        severity: SeverityPolicy {
            threshold,
            ..SeverityPolicy::default()
        },
        ..EffectiveConfig::default()
    };

    if let Some(dirs) = cfg.ignored_dirs {
        effective.ignored_dirs = dirs;
    }
    if let Some(engine) = cfg.engine {
        if engine.command.is_empty() {
            anyhow::bail!("engine.command must name a program");
        }
        effective.engine_command = engine.command;
    }

    for (index, target) in cfg.targets.into_iter().enumerate() {
        let spec = resolve_target(target).with_context(|| format!("targets[{index}]"))?;
        effective.targets.push(spec);
    }

    Ok(ResolvedConfig { effective })
}

fn resolve_target(target: TargetConfig) -> anyhow::Result<TargetSpec> {
    if target.data_files.is_empty() {
        anyhow::bail!("data_files must not be empty");
    }
    if target.lint_files.is_empty() && target.modules.is_empty() {
        anyhow::bail!("at least one of lint_files or modules is required");
    }
    validate_globs("data_files", &target.data_files)?;

    let lint_files = target
        .lint_files
        .into_iter()
        .map(resolve_lint_file)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let modules = target
        .modules
        .into_iter()
        .map(resolve_module)
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(TargetSpec {
        data_files: target.data_files,
        lint_files,
        modules,
    })
}

fn resolve_lint_file(lf: LintFileConfig) -> anyhow::Result<LintFileSpec> {
    validate_globs("lint_files", std::slice::from_ref(&lf.path))?;
    let level = parse_level(lf.level.as_deref())
        .with_context(|| format!("invalid level for lint file {}", lf.path))?;
    Ok(LintFileSpec {
        pattern: lf.path,
        config: into_map(lf.config),
        level,
    })
}

fn resolve_module(m: ModuleConfig) -> anyhow::Result<ModuleSpec> {
    let reference = parse_reference(&m.path)?;
    Glob::new(&reference.path)
        .with_context(|| format!("invalid module path glob: {}", reference.path))?;
    let level = parse_level(m.level.as_deref())
        .with_context(|| format!("invalid level for module {}", reference.id))?;
    Ok(ModuleSpec {
        reference,
        config: into_map(m.config),
        level,
    })
}

fn parse_level(level: Option<&str>) -> anyhow::Result<Option<Level>> {
    Ok(level.map(str::parse::<Level>).transpose()?)
}

fn validate_globs(field: &str, patterns: &[String]) -> anyhow::Result<()> {
    for pattern in patterns {
        let body = pattern.strip_prefix('!').unwrap_or(pattern);
        Glob::new(body).with_context(|| format!("invalid {field} glob: {pattern}"))?;
    }
    Ok(())
}

fn into_map(config: BTreeMap<String, Value>) -> Map<String, Value> {
    config.into_iter().collect()
}
