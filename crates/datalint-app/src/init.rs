use crate::config::find_config;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use datalint_types::ids::CONFIG_FILE_NAMES;

/// Configuration written by `datalint init`.
pub const SCAFFOLD: &str = r#"# datalint configuration.
#
# Findings at or above error_level fail the run (debug < info < warn < error).
# error_level = "error"

[[targets]]
data_files = ["**/*.json", "**/*.yaml", "**/*.toml"]

[[targets.lint_files]]
path = "lint/*.jsonnet"
# config = { key = "value" }

# Rules from a GitHub repository, pinned to a full commit hash:
# [[targets.modules]]
# path = "github.com/<owner>/<repo>/<path>@<40-hex commit>:<tag>"
"#;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    Created(Utf8PathBuf),
    /// A config file was already present; nothing was written.
    Exists(Utf8PathBuf),
}

/// Write [`SCAFFOLD`] to `dir/datalint.toml` unless a config file already exists there.
pub fn run_init(dir: &Utf8Path) -> anyhow::Result<InitOutcome> {
    if let Some(existing) = find_config(dir) {
        return Ok(InitOutcome::Exists(existing));
    }
    std::fs::create_dir_all(dir).with_context(|| format!("create directory: {dir}"))?;
    let path = dir.join(CONFIG_FILE_NAMES[0]);
    std::fs::write(&path, SCAFFOLD).with_context(|| format!("write config: {path}"))?;
    Ok(InitOutcome::Created(path))
}
