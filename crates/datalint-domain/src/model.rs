use camino::{Utf8Path, Utf8PathBuf};
use datalint_types::{Level, RepoPath, ids};
use serde_json::{Map, Value};

/// A rule file selected for a target.
#[derive(Clone, Debug, PartialEq)]
pub struct LintFile {
    /// Local files: path relative to the config directory. Module files: their slash path.
    pub key: String,
    pub path: Utf8PathBuf,
    pub config: Map<String, Value>,
    /// Level applied to this rule's unleveled findings.
    pub level: Option<Level>,
}

impl LintFile {
    /// Combine rules see every data file of the target at once.
    pub fn is_combine(&self) -> bool {
        is_combine_path(&self.path)
    }
}

pub fn is_combine_path(path: &Utf8Path) -> bool {
    path.file_stem()
        .is_some_and(|stem| stem.ends_with(ids::COMBINE_SUFFIX))
}

/// The unit of evaluation: every lint file runs against every data file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Target {
    pub lint_files: Vec<LintFile>,
    pub data_files: Vec<RepoPath>,
}
