//! Shared test utilities for the datalint workspace.
//!
//! This crate exists because `xtask` needs `normalize_nondeterministic` at
//! runtime (not behind `#[cfg(test)]`), and because the engine and fetcher
//! fakes are used by the integration tests of several crates.

use camino::{Utf8Path, Utf8PathBuf};
use datalint_domain::{ArchiveKey, RunContext};
use datalint_eval::{EngineError, ImportContext, RuleEngine};
use datalint_modules::{FetchError, Fetcher};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Normalize non-deterministic JSON fields for golden-file comparison.
///
/// `tool.version` is replaced with `"__VERSION__"` only when the *root* object
/// looks like a report envelope (`schema`, `tool`, `verdict`, `files`).
/// Timestamp keys (`started_at`, `finished_at`) are normalized at any depth.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_envelope = obj.contains_key("schema")
            && obj.contains_key("tool")
            && obj.contains_key("verdict")
            && obj.contains_key("files");
        if is_envelope
            && let Some(tool) = obj.get_mut("tool")
            && let Some(tool_obj) = tool.as_object_mut()
            && tool_obj.contains_key("version")
        {
            tool_obj.insert(
                "version".to_string(),
                Value::String("__VERSION__".to_string()),
            );
        }
    }
    normalize_timestamps_recursive(&mut value);
    value
}

fn normalize_timestamps_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["started_at", "finished_at"] {
                if map.contains_key(key) {
                    map.insert(key.to_string(), Value::String("__TIMESTAMP__".to_string()));
                }
            }
            for val in map.values_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        _ => {}
    }
}

pub fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
}

pub fn write_file(path: &Utf8Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, contents).expect("write file");
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TarKind {
    Dir,
    File,
    Symlink,
}

/// One entry of an in-memory tarball. Paths are written verbatim, unsafe ones included.
#[derive(Clone, Debug)]
pub struct TarEntry {
    path: String,
    kind: TarKind,
    body: String,
}

impl TarEntry {
    pub fn dir(path: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: TarKind::Dir,
            body: String::new(),
        }
    }

    pub fn file(path: &str, contents: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: TarKind::File,
            body: contents.to_string(),
        }
    }

    pub fn symlink(path: &str, target: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: TarKind::Symlink,
            body: target.to_string(),
        }
    }
}

/// Build a gzip'd tarball.
pub fn gzip_tarball(entries: &[TarEntry]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for entry in entries {
        let mut header = tar::Header::new_old();
        let raw = header.as_old_mut();
        raw.name[..entry.path.len()].copy_from_slice(entry.path.as_bytes());
        let data: &[u8] = match entry.kind {
            TarKind::Dir => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                &[]
            }
            TarKind::File => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(0o644);
                entry.body.as_bytes()
            }
            TarKind::Symlink => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_mode(0o777);
                header.as_old_mut().linkname[..entry.body.len()]
                    .copy_from_slice(entry.body.as_bytes());
                &[]
            }
        };
        header.set_size(data.len() as u64);
        header.set_cksum();
        builder.append(&header, data).expect("append tar entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// Serves one fixed archive (or fails) and counts calls.
#[derive(Debug)]
pub struct CountingFetcher {
    archive: Option<Vec<u8>>,
    calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn with_archive(entries: Vec<TarEntry>) -> Self {
        Self {
            archive: Some(gzip_tarball(&entries)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            archive: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for CountingFetcher {
    fn fetch(&self, key: &ArchiveKey, _ctx: &RunContext) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.archive.clone().ok_or_else(|| FetchError::Status {
            url: format!("fake://{key}"),
            status: 404,
        })
    }
}

/// A rule engine driven by a closure over `(rule source, top-level argument)`.
///
/// The program is the rule source text; parsing never fails.
pub struct FnEngine<F> {
    eval: F,
}

impl<F> FnEngine<F>
where
    F: Fn(&str, &Value) -> Result<String, String> + Send + Sync,
{
    pub fn new(eval: F) -> Self {
        Self { eval }
    }
}

impl<F> RuleEngine for FnEngine<F>
where
    F: Fn(&str, &Value) -> Result<String, String> + Send + Sync,
{
    type Program = String;

    fn parse(&self, _path: &Utf8Path, source: &str) -> Result<String, EngineError> {
        Ok(source.to_string())
    }

    fn evaluate(
        &self,
        program: &String,
        tla: &str,
        _imports: &ImportContext<'_>,
    ) -> Result<String, EngineError> {
        let tla: Value =
            serde_json::from_str(tla).map_err(|e| EngineError::Evaluate(e.to_string()))?;
        (self.eval)(program.as_str(), &tla).map_err(EngineError::Evaluate)
    }
}
