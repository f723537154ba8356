use crate::archive::{ArchiveError, extract_tarball};
use crate::fetch::{FetchError, Fetcher};
use camino::{Utf8Path, Utf8PathBuf};
use datalint_domain::{ArchiveKey, Cancelled, ModuleReference, RunContext};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

#[derive(Debug, thiserror::Error)]
pub enum InstallCause {
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("extraction failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug)]
pub struct InstallFailure {
    pub archive: ArchiveKey,
    pub install_dir: Utf8PathBuf,
    pub cause: InstallCause,
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("failed to install {} module archive(s): {}", .failures.len(), summarize(.failures))]
    Failed { failures: Vec<InstallFailure> },
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

fn summarize(failures: &[InstallFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.archive, f.cause))
        .collect::<Vec<_>>()
        .join("; ")
}

/// What an install pass did, per unique install directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstallSummary {
    pub fetched: Vec<Utf8PathBuf>,
    pub cached: Vec<Utf8PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InstallState {
    Fetched,
    Cached,
}

/// Make every non-excluded reference available under `base`.
///
/// References sharing an install directory are installed once. Distinct directories are
/// installed in parallel. All failures are reported together.
pub fn install_modules<'a, I, F>(
    references: I,
    base: &Utf8Path,
    fetcher: &F,
    ctx: &RunContext,
) -> Result<InstallSummary, InstallError>
where
    I: IntoIterator<Item = &'a ModuleReference>,
    F: Fetcher + ?Sized,
{
    let mut plan: BTreeMap<Utf8PathBuf, ArchiveKey> = BTreeMap::new();
    for reference in references.into_iter().filter(|r| !r.excluded) {
        plan.entry(reference.install_dir(base))
            .or_insert_with(|| reference.archive_key().clone());
    }
    ctx.cancel.check()?;
    tracing::debug!(parent: &ctx.span, archives = plan.len(), %base, "installing modules");

    let results: Vec<(Utf8PathBuf, ArchiveKey, Result<InstallState, InstallCause>)> = plan
        .into_par_iter()
        .map(|(dir, key)| {
            let result = install_one(&dir, &key, base, fetcher, ctx);
            (dir, key, result)
        })
        .collect();

    if ctx.cancel.is_cancelled() {
        return Err(InstallError::Cancelled(Cancelled));
    }

    let mut summary = InstallSummary::default();
    let mut failures = Vec::new();
    for (dir, key, result) in results {
        match result {
            Ok(InstallState::Fetched) => summary.fetched.push(dir),
            Ok(InstallState::Cached) => summary.cached.push(dir),
            Err(cause) => {
                tracing::warn!(
                    parent: &ctx.span,
                    archive = %key,
                    error = %cause,
                    "module install failed"
                );
                failures.push(InstallFailure {
                    archive: key,
                    install_dir: dir,
                    cause,
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(summary)
    } else {
        Err(InstallError::Failed { failures })
    }
}

fn install_one<F>(
    dir: &Utf8Path,
    key: &ArchiveKey,
    base: &Utf8Path,
    fetcher: &F,
    ctx: &RunContext,
) -> Result<InstallState, InstallCause>
where
    F: Fetcher + ?Sized,
{
    if dir.is_dir() {
        tracing::debug!(parent: &ctx.span, archive = %key, "module cache hit");
        return Ok(InstallState::Cached);
    }

    let lock = acquire_path_lock(dir);
    let result = {
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        install_locked(dir, key, base, fetcher, ctx)
    };
    release_path_lock(dir, lock);
    result
}

fn install_locked<F>(
    dir: &Utf8Path,
    key: &ArchiveKey,
    base: &Utf8Path,
    fetcher: &F,
    ctx: &RunContext,
) -> Result<InstallState, InstallCause>
where
    F: Fetcher + ?Sized,
{
    if dir.is_dir() {
        return Ok(InstallState::Cached);
    }

    fs::create_dir_all(base)?;
    let staging = tempfile::Builder::new()
        .prefix(".datalint-install-")
        .tempdir_in(base)?;

    let bytes = fetcher.fetch(key, ctx)?;
    let archive_path = staging.path().join("archive.tar.gz");
    fs::write(&archive_path, &bytes)?;
    let tree = staging.path().join("tree");
    let files = extract_tarball(&archive_path, &tree)?;

    if let Some(parent) = dir.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(&tree, dir) {
        Ok(()) => {
            tracing::info!(parent: &ctx.span, archive = %key, files, "module installed");
            Ok(InstallState::Fetched)
        }
        // another process finished the same install first
        Err(_) if dir.is_dir() => Ok(InstallState::Cached),
        Err(err) => Err(err.into()),
    }
}

type LockTable = HashMap<Utf8PathBuf, Arc<Mutex<()>>>;

/// Process-wide table of per-directory install locks, shared by every installer in the process.
///
/// Entries live only while some installer holds them.
fn lock_table() -> MutexGuard<'static, LockTable> {
    static LOCKS: OnceLock<Mutex<LockTable>> = OnceLock::new();
    LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn acquire_path_lock(dir: &Utf8Path) -> Arc<Mutex<()>> {
    Arc::clone(lock_table().entry(dir.to_path_buf()).or_default())
}

fn release_path_lock(dir: &Utf8Path, lock: Arc<Mutex<()>>) {
    let mut table = lock_table();
    drop(lock);
    // clones are only handed out under the table lock, so a count of one is final
    if table.get(dir).is_some_and(|entry| Arc::strong_count(entry) == 1) {
        table.remove(dir);
    }
}
