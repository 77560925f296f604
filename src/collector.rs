//! Recursive discovery of source files.

use crate::error::EtlResult;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collects the absolute paths of all files under `root` whose extension is
/// `extension` (without the dot), in directory traversal order.
///
/// A missing or empty root yields an empty list.
pub fn collect_files(root: &Path, extension: &str) -> EtlResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let root = std::path::absolute(root)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == extension)
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
