//! Module installation into the content-addressed cache.
//!
//! The cache location of a module is derived from its immutable commit reference, so the presence
//! of the directory *is* the cache hit and nothing is ever invalidated.

#![forbid(unsafe_code)]

mod archive;
mod fetch;
mod install;
mod retry;

pub use archive::{ArchiveError, extract_tarball};
pub use fetch::{FetchError, Fetcher, GITHUB_API_BASE, HttpFetcher};
pub use install::{InstallCause, InstallError, InstallFailure, InstallSummary, install_modules};
pub use retry::RetryPolicy;
