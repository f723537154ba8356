use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid archive entry: {0}")]
    InvalidEntry(String),
    #[error("unsupported archive entry type: {0}")]
    UnsupportedEntry(String),
}

/// Extract a gzip'd tarball into `dest`, dropping the single top-level directory every
/// repository archive carries (`<owner>-<repo>-<sha>/`).
///
/// Absolute paths, `..` components, and link entries are rejected. Returns the number of files
/// written.
pub fn extract_tarball(archive_path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let file = File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    fs::create_dir_all(dest)?;

    let mut written = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_type = entry.header().entry_type();
        if entry_type.is_pax_global_extensions() || entry_type.is_pax_local_extensions() {
            continue;
        }

        let raw = entry.path_bytes();
        let display = String::from_utf8_lossy(&raw).into_owned();
        let components = normalized_components(Path::new(&display))?;
        // the top-level directory itself, or anything shallower
        let Some((_, rest)) = components.split_first() else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let out_path = dest.join(rest.iter().collect::<PathBuf>());

        if entry_type.is_dir() {
            fs::create_dir_all(&out_path)?;
        } else if entry_type.is_file() {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            entry.unpack(&out_path)?;
            written += 1;
        } else {
            return Err(ArchiveError::UnsupportedEntry(display));
        }
    }
    Ok(written)
}

fn normalized_components(path: &Path) -> Result<Vec<String>, ArchiveError> {
    let invalid = || ArchiveError::InvalidEntry(path.display().to_string());
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                let text = part.to_str().ok_or_else(invalid)?;
                components.push(text.to_string());
            }
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                return Err(invalid());
            }
        }
    }
    Ok(components)
}
