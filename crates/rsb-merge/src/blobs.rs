//! Blob-directory union with byte-level collision checks.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{MergeError, MergeResult};

/// Counts from merging one source's blob directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlobStats {
    pub copied: usize,
    pub deduplicated: usize,
}

impl std::ops::AddAssign for BlobStats {
    fn add_assign(&mut self, rhs: Self) {
        self.copied += rhs.copied;
        self.deduplicated += rhs.deduplicated;
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> MergeError + '_ {
    move |source| MergeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Files directly inside `dir`, sorted by name.
fn blob_files(dir: &Path) -> MergeResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            MergeError::Io {
                path,
                source: e.into(),
            }
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Copy every blob of `source_dir` missing from `output_dir`.
///
/// A name already present must hold identical bytes; otherwise the merge
/// fails with [`MergeError::BlobConflict`] naming `bundle`.
pub fn merge_blobs(source_dir: &Path, output_dir: &Path, bundle: &Path) -> MergeResult<BlobStats> {
    std::fs::create_dir_all(output_dir).map_err(io_err(output_dir))?;

    let mut stats = BlobStats::default();
    for path in blob_files(source_dir)? {
        let Some(name) = path.file_name() else {
            continue;
        };
        let target = output_dir.join(name);
        if target.exists() {
            if !same_contents(&path, &target)? {
                return Err(MergeError::BlobConflict {
                    name: name.to_string_lossy().into_owned(),
                    bundle: bundle.to_path_buf(),
                });
            }
            stats.deduplicated += 1;
        } else {
            std::fs::copy(&path, &target).map_err(io_err(&target))?;
            stats.copied += 1;
        }
    }
    debug!(
        source = %source_dir.display(),
        copied = stats.copied,
        deduplicated = stats.deduplicated,
        "merged blobs"
    );
    Ok(stats)
}

fn same_contents(a: &Path, b: &Path) -> MergeResult<bool> {
    let len_a = std::fs::metadata(a).map_err(io_err(a))?.len();
    let len_b = std::fs::metadata(b).map_err(io_err(b))?.len();
    if len_a != len_b {
        return Ok(false);
    }
    let bytes_a = std::fs::read(a).map_err(io_err(a))?;
    let bytes_b = std::fs::read(b).map_err(io_err(b))?;
    Ok(bytes_a == bytes_b)
}

/// Recursively copy the bundle at `from` to the new directory `to`.
pub fn copy_tree(from: &Path, to: &Path) -> MergeResult<usize> {
    let mut files = 0;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            MergeError::Io {
                path,
                source: e.into(),
            }
        })?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(io_err(&target))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target).map_err(io_err(&target))?;
            files += 1;
        }
    }
    debug!(from = %from.display(), to = %to.display(), files, "copied base bundle");
    Ok(files)
}
