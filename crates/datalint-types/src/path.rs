use camino::{Utf8Path, Utf8PathBuf};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canonical relative path used as the key of data files in results and reports.
///
/// Normalization rules:
/// - always forward slashes (`/`)
/// - no leading `./`, no trailing `/`
/// - empty input becomes `.`
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct RepoPath(String);

impl Default for RepoPath {
    fn default() -> Self {
        RepoPath::new(".")
    }
}

impl RepoPath {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        let mut v = s.as_ref().replace('\\', "/");
        while let Some(rest) = v.strip_prefix("./") {
            v = rest.to_string();
        }
        while v.len() > 1 && v.ends_with('/') {
            v.pop();
        }
        if v.is_empty() {
            v = ".".to_string();
        }
        Self(v)
    }

    /// Express `path` relative to `base`.
    ///
    /// Relative inputs are taken as already relative to `base`. Absolute inputs outside
    /// `base` are kept as-is so they never collide with in-tree paths.
    pub fn relative_to(base: &Utf8Path, path: &Utf8Path) -> Self {
        if path.is_relative() {
            return RepoPath::new(path.as_str());
        }
        match path.strip_prefix(base) {
            Ok(rel) => RepoPath::new(rel.as_str()),
            Err(_) => RepoPath::new(path.as_str()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute location of this path below `base`.
    pub fn under(&self, base: &Utf8Path) -> Utf8PathBuf {
        let p = Utf8Path::new(self.as_str());
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            base.join(p)
        }
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Utf8Path> for RepoPath {
    fn from(value: &Utf8Path) -> Self {
        RepoPath::new(value.as_str())
    }
}

impl From<Utf8PathBuf> for RepoPath {
    fn from(value: Utf8PathBuf) -> Self {
        RepoPath::new(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_prefixes() {
        assert_eq!(RepoPath::new("./data/a.json").as_str(), "data/a.json");
        assert_eq!(RepoPath::new("././a.json").as_str(), "a.json");
        assert_eq!(RepoPath::new("data\\b.json").as_str(), "data/b.json");
        assert_eq!(RepoPath::new("data/").as_str(), "data");
        assert_eq!(RepoPath::new("").as_str(), ".");
    }

    #[test]
    fn relative_to_strips_base_for_absolute_inputs() {
        let base = Utf8Path::new("/work/repo");
        assert_eq!(
            RepoPath::relative_to(base, Utf8Path::new("/work/repo/data/a.json")).as_str(),
            "data/a.json"
        );
        assert_eq!(
            RepoPath::relative_to(base, Utf8Path::new("data/a.json")).as_str(),
            "data/a.json"
        );
        assert_eq!(
            RepoPath::relative_to(base, Utf8Path::new("/elsewhere/a.json")).as_str(),
            "/elsewhere/a.json"
        );
    }

    #[test]
    fn under_joins_relative_paths_only() {
        let base = Utf8Path::new("/work");
        assert_eq!(RepoPath::new("a/b.json").under(base), "/work/a/b.json");
        assert_eq!(RepoPath::new("/abs/b.json").under(base), "/abs/b.json");
    }
}
