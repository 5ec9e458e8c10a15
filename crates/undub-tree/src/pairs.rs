//! Source lookup by file name
//!
//! The two dubs do not always share a directory layout, so a target file is
//! matched to a source file by name alone, wherever it sits in the source tree.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::Result;

/// File name → first path carrying it, over a whole tree
#[derive(Debug, Default)]
pub struct SourceIndex {
    by_name: HashMap<OsString, PathBuf>,
}

impl SourceIndex {
    /// Index every regular file under `root`. Walk order is by file name, so
    /// the first of several same-named files wins deterministically.
    pub fn build(root: &Path) -> Result<Self> {
        let mut by_name: HashMap<OsString, PathBuf> = HashMap::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_os_string();
            match by_name.entry(name) {
                Entry::Occupied(first) => tracing::debug!(
                    "Duplicate source name {}, keeping {}",
                    entry.path().display(),
                    first.get().display()
                ),
                Entry::Vacant(slot) => {
                    slot.insert(entry.into_path());
                }
            }
        }
        tracing::debug!("Indexed {} source files under {}", by_name.len(), root.display());
        Ok(Self { by_name })
    }

    pub fn find(&self, name: &OsStr) -> Option<&Path> {
        self.by_name.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
