//! Path validation
//!
//! Maps a filename taken off the wire to a path inside the server root.

use std::path::{Path, PathBuf};

use crate::error::TransferError;

/// Keep only the final component of `filename` and join it onto `root`.
///
/// Rejects names with no usable final component (`""`, `"."`, `".."`, `"/"`).
pub fn resolve_filename(root: &Path, filename: &str) -> Result<PathBuf, TransferError> {
    let name = Path::new(filename)
        .file_name()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| TransferError::InvalidFilename(filename.to_string()))?;
    Ok(root.join(name))
}

/// The bare file name the peer should see for a local path.
pub fn wire_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
