//! Filesystem adapters: discover the data files and rule files of each configured target.

#![forbid(unsafe_code)]

mod discover;
mod filter;
mod pattern;

pub use discover::{DiscoverOptions, discover_targets, list_files};
pub use filter::FileFilter;
pub use pattern::PatternSet;
