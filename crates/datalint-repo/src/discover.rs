use crate::filter::FileFilter;
use crate::pattern::PatternSet;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use datalint_domain::policy::{LintFileSpec, ModuleSpec, TargetSpec};
use datalint_domain::{LintFile, Target};
use datalint_types::RepoPath;
use std::collections::BTreeSet;
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Clone, Copy, Debug)]
pub struct DiscoverOptions<'a> {
    /// Directory holding the config file; local globs are relative to it.
    pub config_dir: &'a Utf8Path,
    /// Module cache base directory.
    pub module_base: &'a Utf8Path,
    pub ignored_dirs: &'a [String],
    pub file_filter: Option<&'a FileFilter>,
}

/// Resolve every target spec into concrete lint files and data files.
///
/// Output order follows declaration order; files within one pattern are sorted.
pub fn discover_targets(
    specs: &[TargetSpec],
    opts: &DiscoverOptions<'_>,
) -> anyhow::Result<Vec<Target>> {
    let local = list_files(opts.config_dir, opts.ignored_dirs)
        .with_context(|| format!("list files under {}", opts.config_dir))?;

    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            discover_target(spec, &local, opts).with_context(|| format!("targets[{index}]"))
        })
        .collect()
}

fn discover_target(
    spec: &TargetSpec,
    local: &[String],
    opts: &DiscoverOptions<'_>,
) -> anyhow::Result<Target> {
    let data_set = PatternSet::new(&spec.data_files).context("compile data_files globs")?;
    let data_files = local
        .iter()
        .filter(|rel| data_set.is_match(rel))
        .map(RepoPath::new)
        .filter(|p| opts.file_filter.is_none_or(|f| f.contains(p)))
        .collect();

    let mut lint_files = local_lint_files(&spec.lint_files, local, opts.config_dir)?;
    let mut seen: BTreeSet<String> = lint_files.iter().map(|lf| lf.key.clone()).collect();
    for lint_file in module_lint_files(&spec.modules, opts)? {
        if seen.insert(lint_file.key.clone()) {
            lint_files.push(lint_file);
        }
    }

    Ok(Target {
        lint_files,
        data_files,
    })
}

fn local_lint_files(
    specs: &[LintFileSpec],
    local: &[String],
    config_dir: &Utf8Path,
) -> anyhow::Result<Vec<LintFile>> {
    let negations: Vec<&str> = specs
        .iter()
        .map(|s| s.pattern.as_str())
        .filter(|p| p.starts_with('!'))
        .collect();

    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    for spec in specs.iter().filter(|s| !s.pattern.starts_with('!')) {
        let mut patterns = vec![spec.pattern.as_str()];
        patterns.extend(negations.iter().copied());
        let set = PatternSet::new(&patterns)
            .with_context(|| format!("compile lint_files glob {}", spec.pattern))?;

        for rel in local.iter().filter(|rel| set.is_match(rel)) {
            if !seen.insert(rel.clone()) {
                continue;
            }
            out.push(LintFile {
                key: rel.clone(),
                path: config_dir.join(rel),
                config: spec.config.clone(),
                level: spec.level,
            });
        }
    }
    Ok(out)
}

fn module_lint_files(
    specs: &[ModuleSpec],
    opts: &DiscoverOptions<'_>,
) -> anyhow::Result<Vec<LintFile>> {
    let mut out = Vec::new();
    for spec in specs.iter().filter(|s| !s.reference.excluded) {
        let reference = &spec.reference;
        let dir = reference.install_dir(opts.module_base);
        if !dir.is_dir() {
            anyhow::bail!("module {} is not installed at {}", reference.id, dir);
        }

        // exclusions apply to the same archive only
        let mut patterns = vec![reference.path.clone()];
        patterns.extend(
            specs
                .iter()
                .map(|s| &s.reference)
                .filter(|r| r.excluded && r.install_dir(opts.module_base) == dir)
                .map(|r| format!("!{}", r.path)),
        );
        let set = PatternSet::new(&patterns)
            .with_context(|| format!("compile module glob {}", reference.path))?;

        let files = list_files(&dir, opts.ignored_dirs)
            .with_context(|| format!("list module files under {dir}"))?;
        for rel in files.iter().filter(|rel| set.is_match(rel)) {
            out.push(LintFile {
                key: format!(
                    "{}/{}/{}/{}",
                    reference.owner(),
                    reference.repo(),
                    reference.git_ref(),
                    rel
                ),
                path: dir.join(rel),
                config: spec.config.clone(),
                level: spec.level,
            });
        }
    }
    Ok(out)
}

/// All regular files under `root` as sorted, forward-slash relative paths.
///
/// Directories whose name is in `ignored_dirs` are not descended into.
pub fn list_files(root: &Utf8Path, ignored_dirs: &[String]) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| {
        e.depth() == 0
            || !e.file_type().is_dir()
            || !ignored_dirs
                .iter()
                .any(|d| e.file_name().to_str() == Some(d.as_str()))
    }) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(abs) = pathbuf_to_utf8(entry.into_path()) else {
            continue;
        };
        let rel = abs.strip_prefix(root).unwrap_or(&abs);
        out.push(rel.as_str().replace('\\', "/"));
    }

    // Stable order.
    out.sort();
    out.dedup();
    Ok(out)
}

fn pathbuf_to_utf8(path: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).ok()
}
