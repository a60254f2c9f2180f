use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::error::{BatchError, TranscodeError};
use crate::format::is_supported_input;

/// Collect the supported image files sitting directly in `folder`.
///
/// Symlinks count as the file they point to. Directories and dangling links
/// are skipped, and nothing is sorted: the order is whatever the directory
/// listing yields.
pub fn collect_files(folder: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if is_supported_input(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

/// Size of the file at `path` in bytes.
pub fn file_size(path: &Path) -> Result<u64, TranscodeError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| TranscodeError::Read {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Write `data` to `path` through a temporary file in the same directory,
/// so readers never see a half-written image.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), TranscodeError> {
    let write_err = |source: std::io::Error| TranscodeError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(data).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
