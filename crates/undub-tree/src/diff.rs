//! Files present in one tree but missing from its twin
//!
//! Independent of stitching: compares two dubs by relative path so missing or
//! extra containers can be spotted before a run.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Result, TreeError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueFile {
    pub path: PathBuf,
    /// Path relative to the tree root
    pub relative: PathBuf,
    pub size: u64,
}

/// Files under `first` whose relative path does not exist under `second`,
/// smallest first
pub fn unique_files(first: &Path, second: &Path) -> Result<Vec<UniqueFile>> {
    let mut unique = Vec::new();

    for entry in WalkDir::new(first).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(first)
            .unwrap_or(entry.path())
            .to_path_buf();
        if second.join(&relative).exists() {
            continue;
        }
        let size = entry
            .metadata()
            .map_err(|e| TreeError::Io {
                path: entry.path().to_path_buf(),
                source: e.into(),
            })?
            .len();
        unique.push(UniqueFile {
            path: entry.into_path(),
            relative,
            size,
        });
    }

    // Stable: equal sizes keep walk order
    unique.sort_by_key(|f| f.size);
    tracing::debug!(
        "{} files under {} missing from {}",
        unique.len(),
        first.display(),
        second.display()
    );
    Ok(unique)
}
