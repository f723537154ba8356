use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use datalint_domain::{EffectiveConfig, parse_threshold};
use datalint_settings::{Overrides, parse_config_toml, resolve_config};
use datalint_types::ids::CONFIG_FILE_NAMES;

/// A resolved configuration and where it came from.
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub path: Utf8PathBuf,
    /// Directory holding the config file; local globs and data paths are relative to it.
    pub dir: Utf8PathBuf,
    pub effective: EffectiveConfig,
}

/// First well-known config file present in `work_dir`.
pub fn find_config(work_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| work_dir.join(name))
        .find(|path| path.is_file())
}

/// Locate, parse, and resolve the configuration.
///
/// `error_level` overrides the configured threshold and is validated before the file is read.
pub fn load_config(
    work_dir: &Utf8Path,
    explicit: Option<&Utf8Path>,
    error_level: Option<&str>,
) -> anyhow::Result<LoadedConfig> {
    let error_level = error_level.filter(|s| !s.trim().is_empty());
    parse_threshold(error_level)?;

    let path = match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => work_dir.join(p),
        None => find_config(work_dir).with_context(|| {
            format!(
                "no configuration file found in {work_dir} (looked for {})",
                CONFIG_FILE_NAMES.join(", ")
            )
        })?,
    };

    let text =
        std::fs::read_to_string(&path).with_context(|| format!("read config: {path}"))?;
    let cfg = parse_config_toml(&text).with_context(|| format!("parse config: {path}"))?;
    let resolved = resolve_config(
        cfg,
        Overrides {
            error_level: error_level.map(str::to_string),
        },
    )
    .context("resolve config")?;

    let dir = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .map(Utf8Path::to_path_buf)
        .unwrap_or_else(|| work_dir.to_path_buf());

    Ok(LoadedConfig {
        path,
        dir,
        effective: resolved.effective,
    })
}
