//! Module declaration parsing.
//!
//! A declaration has the shape `[!]<host>/<owner>/<repo>/<path>@<ref>[:<tag>]`, where `ref` is a
//! full 40-character commit hash so the content it names can never change underneath a cache.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// The only archive host modules can be fetched from.
pub const SUPPORTED_HOST: &str = "github.com";

const COMMIT_HASH_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("malformed module reference {line:?}: {reason}")]
    Malformed { line: String, reason: String },

    #[error(
        "invalid ref {git_ref:?} in module reference {line:?}: a full 40-character commit hash is required"
    )]
    InvalidRef { line: String, git_ref: String },
}

impl ReferenceError {
    fn malformed(line: &str, reason: impl Into<String>) -> Self {
        ReferenceError::Malformed {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

/// Identifies one installable archive: everything in a reference except the in-module path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchiveKey {
    pub host: String,
    pub owner: String,
    pub repo: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl ArchiveKey {
    /// `<base>/<host>/<owner>/<repo>/<ref>`. The tag is informational and never part of the
    /// location.
    pub fn install_dir(&self, base: &Utf8Path) -> Utf8PathBuf {
        base.join(&self.host)
            .join(&self.owner)
            .join(&self.repo)
            .join(&self.git_ref)
    }
}

impl std::fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.host, self.owner, self.repo, self.git_ref
        )?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReference {
    /// Declaration text, trimmed and without the exclusion marker.
    pub id: String,
    #[serde(flatten)]
    pub archive: ArchiveKey,
    /// Path inside the module; may be a glob.
    pub path: String,
    /// `owner/repo/ref/path`, the dedup and storage key.
    pub slash_path: String,
    #[serde(default)]
    pub excluded: bool,
}

impl ModuleReference {
    pub fn host(&self) -> &str {
        &self.archive.host
    }

    pub fn owner(&self) -> &str {
        &self.archive.owner
    }

    pub fn repo(&self) -> &str {
        &self.archive.repo
    }

    pub fn git_ref(&self) -> &str {
        &self.archive.git_ref
    }

    pub fn tag(&self) -> Option<&str> {
        self.archive.tag.as_deref()
    }

    pub fn archive_key(&self) -> &ArchiveKey {
        &self.archive
    }

    pub fn install_dir(&self, base: &Utf8Path) -> Utf8PathBuf {
        self.archive.install_dir(base)
    }
}

/// Parse one module declaration line.
pub fn parse_reference(line: &str) -> Result<ModuleReference, ReferenceError> {
    let trimmed = line.trim();
    let (excluded, body) = match trimmed.strip_prefix('!') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };

    let segments: Vec<&str> = body.splitn(4, '/').collect();
    let [host, owner, repo, rest] = segments.as_slice() else {
        return Err(ReferenceError::malformed(
            line,
            "expected <host>/<owner>/<repo>/<path>@<ref>",
        ));
    };

    if *host != SUPPORTED_HOST {
        return Err(ReferenceError::malformed(
            line,
            format!("unsupported host {host:?}, only {SUPPORTED_HOST} is supported"),
        ));
    }
    if owner.is_empty() {
        return Err(ReferenceError::malformed(line, "owner is empty"));
    }
    if repo.is_empty() {
        return Err(ReferenceError::malformed(line, "repository is empty"));
    }
    for name in [owner, repo] {
        if !is_name_segment(name) {
            return Err(ReferenceError::malformed(
                line,
                format!("invalid owner or repository name {name:?}"),
            ));
        }
    }

    let Some((path, ref_and_tag)) = rest.split_once('@') else {
        return Err(ReferenceError::malformed(line, "missing @<ref>"));
    };
    if path.is_empty() {
        return Err(ReferenceError::malformed(line, "module path is empty"));
    }

    let (git_ref, tag) = match ref_and_tag.split_once(':') {
        Some((r, t)) => (r, Some(t).filter(|t| !t.is_empty())),
        None => (ref_and_tag, None),
    };
    if !is_commit_hash(git_ref) {
        return Err(ReferenceError::InvalidRef {
            line: line.to_string(),
            git_ref: git_ref.to_string(),
        });
    }

    Ok(ModuleReference {
        id: body.to_string(),
        archive: ArchiveKey {
            host: (*host).to_string(),
            owner: (*owner).to_string(),
            repo: (*repo).to_string(),
            git_ref: git_ref.to_string(),
            tag: tag.map(str::to_string),
        },
        path: path.to_string(),
        slash_path: format!("{owner}/{repo}/{git_ref}/{path}"),
        excluded,
    })
}

/// Owner and repository names become cache directories.
fn is_name_segment(s: &str) -> bool {
    s != "."
        && s != ".."
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

fn is_commit_hash(s: &str) -> bool {
    s.len() == COMMIT_HASH_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
