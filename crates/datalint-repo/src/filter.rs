use camino::Utf8Path;
use datalint_types::RepoPath;
use std::collections::BTreeSet;

/// Explicit data file selection from the command line.
#[derive(Clone, Debug, Default)]
pub struct FileFilter {
    paths: BTreeSet<RepoPath>,
}

impl FileFilter {
    /// Absolute paths under `config_dir` are made relative to it; relative paths are taken as
    /// already relative to it.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: &Utf8Path, paths: &[P]) -> Self {
        Self {
            paths: paths
                .iter()
                .map(|p| RepoPath::relative_to(config_dir, p.as_ref()))
                .collect(),
        }
    }

    pub fn contains(&self, path: &RepoPath) -> bool {
        self.paths.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
