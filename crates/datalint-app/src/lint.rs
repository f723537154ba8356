use crate::config::{LoadedConfig, load_config};
use crate::render::OutputFormat;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use datalint_domain::{RunContext, combine};
use datalint_eval::{ImportChain, RuleEngine, evaluate_targets};
use datalint_modules::{Fetcher, install_modules};
use datalint_repo::{DiscoverOptions, FileFilter, discover_targets};
use datalint_types::ids::{SCHEMA_REPORT_V1, TOOL_NAME};
use datalint_types::{FileResult, LintReport, RepoPath, ToolMeta};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Inputs of one lint run.
#[derive(Clone, Debug, Default)]
pub struct LintParams {
    /// Threshold override; unset or blank falls back to the config, then `error`.
    pub error_level: Option<String>,
    /// Module cache base directory.
    pub root_dir: Utf8PathBuf,
    /// Explicit config file. Searched in `work_dir` when unset.
    pub config_file_path: Option<Utf8PathBuf>,
    /// Directory relative paths on the command line are resolved against.
    pub work_dir: Utf8PathBuf,
    /// Restrict evaluation to these data files. Empty means all.
    pub file_paths: Vec<Utf8PathBuf>,
    pub outputs: Vec<OutputFormat>,
    /// Render output even when nothing failed.
    pub output_success: bool,
}

#[derive(Clone, Debug)]
pub struct LintOutput {
    /// Unclassified results keyed by data file.
    pub results: BTreeMap<RepoPath, FileResult>,
    pub report: LintReport,
    /// True when any file exceeds the threshold.
    pub failed: bool,
}

/// Load the configuration from `params` and lint with it.
pub fn run_lint<E, F>(
    params: &LintParams,
    engine: &E,
    fetcher: &F,
    ctx: &RunContext,
) -> anyhow::Result<LintOutput>
where
    E: RuleEngine + ?Sized,
    F: Fetcher + ?Sized,
{
    let loaded = load_config(
        &params.work_dir,
        params.config_file_path.as_deref(),
        params.error_level.as_deref(),
    )?;
    lint_with_config(&loaded, params, engine, fetcher, ctx)
}

/// Lint with an already loaded configuration.
///
/// Split from [`run_lint`] so callers can build the engine from the configuration first.
pub fn lint_with_config<E, F>(
    loaded: &LoadedConfig,
    params: &LintParams,
    engine: &E,
    fetcher: &F,
    ctx: &RunContext,
) -> anyhow::Result<LintOutput>
where
    E: RuleEngine + ?Sized,
    F: Fetcher + ?Sized,
{
    let started_at = OffsetDateTime::now_utc();
    let effective = &loaded.effective;
    tracing::info!(
        parent: &ctx.span,
        config = %loaded.path,
        targets = effective.targets.len(),
        threshold = %effective.severity.threshold,
        "lint started"
    );

    let installed = install_modules(
        effective.installable_modules(),
        &params.root_dir,
        fetcher,
        ctx,
    )
    .context("install modules")?;
    tracing::debug!(
        parent: &ctx.span,
        fetched = installed.fetched.len(),
        cached = installed.cached.len(),
        "modules ready"
    );

    let filter = (!params.file_paths.is_empty()).then(|| {
        let absolute: Vec<Utf8PathBuf> = params
            .file_paths
            .iter()
            .map(|p| absolutize(&params.work_dir, p))
            .collect();
        FileFilter::new(&loaded.dir, &absolute)
    });
    let targets = discover_targets(
        &effective.targets,
        &DiscoverOptions {
            config_dir: &loaded.dir,
            module_base: &params.root_dir,
            ignored_dirs: &effective.ignored_dirs,
            file_filter: filter.as_ref(),
        },
    )
    .context("discover targets")?;

    let imports = ImportChain::standard(&params.root_dir);
    let results = evaluate_targets(&targets, &loaded.dir, engine, &imports, ctx)
        .context("evaluate rules")?;

    let combined = combine(results.values().cloned(), &effective.severity);
    let finished_at = OffsetDateTime::now_utc();
    tracing::info!(
        parent: &ctx.span,
        files = combined.files.len(),
        verdict = ?combined.verdict,
        "lint finished"
    );

    let report = LintReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at,
        finished_at,
        error_level: effective.severity.threshold,
        default_level: effective.severity.default_level,
        verdict: combined.verdict,
        counts: combined.counts,
        files: combined.files,
    };

    Ok(LintOutput {
        results,
        report,
        failed: combined.failed,
    })
}

fn absolutize(work_dir: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    }
}

/// Map a run result to a process exit code: 0 = pass/warn, 2 = fail.
pub fn exit_code(failed: bool) -> i32 {
    if failed { 2 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(false), 0);
        assert_eq!(exit_code(true), 2);
    }

    #[test]
    fn absolutize_keeps_absolute_paths() {
        let work = Utf8Path::new("/work");
        assert_eq!(absolutize(work, Utf8Path::new("a.json")), "/work/a.json");
        assert_eq!(absolutize(work, Utf8Path::new("/x/a.json")), "/x/a.json");
    }
}
