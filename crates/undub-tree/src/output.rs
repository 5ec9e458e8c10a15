//! Writing stitched containers under the output root

use std::path::{Path, PathBuf};

use crate::{Result, TreeError};

/// Create a directory and its parents
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| TreeError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write `bytes` to `<output_root>/<relative>`, creating directories as needed
pub fn write_output(output_root: &Path, relative: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let dest = output_root.join(relative);
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    std::fs::write(&dest, bytes).map_err(|source| TreeError::Io {
        path: dest.clone(),
        source,
    })?;
    tracing::debug!("Wrote {} ({} bytes)", dest.display(), bytes.len());
    Ok(dest)
}
