//! Loading container files from disk

use std::path::Path;

use crate::error::PathError;

/// Whether `path` carries the container extension (case-sensitive)
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}

/// Read a whole container file after checking it is a regular `.<extension>` file
pub fn read_container(path: &Path, extension: &str) -> Result<Vec<u8>, PathError> {
    if !path.exists() {
        return Err(PathError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(PathError::NotAFile(path.to_path_buf()));
    }
    if !has_extension(path, extension) {
        return Err(PathError::WrongExtension {
            path: path.to_path_buf(),
            expected: extension.to_string(),
        });
    }

    let data = std::fs::read(path).map_err(|source| PathError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Read {} ({} bytes)", path.display(), data.len());
    Ok(data)
}
