//! Clean logic
//!
//! Removes what a build generated inside the project's build directory.
//! Anything else in that directory is left alone.

use std::path::Path;

use crate::core::builder::BuildLayout;
use crate::error::FilesystemError;

/// Result of clean operation
#[derive(Debug, Default)]
pub struct CleanResult {
    /// Entries that were removed
    pub removed: Vec<String>,
    /// Entries that didn't exist (skipped)
    pub skipped: Vec<String>,
}

/// Remove generated build output under `build_dir`
pub fn clean_build_dir(build_dir: &Path) -> Result<CleanResult, FilesystemError> {
    let mut result = CleanResult::default();
    let layout = BuildLayout::new(build_dir);

    for path in layout.generated() {
        let name = path
            .strip_prefix(build_dir)
            .unwrap_or(path)
            .display()
            .to_string();
        if path.is_dir() {
            std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;
            result.removed.push(name);
        } else if path.is_file() {
            std::fs::remove_file(path).map_err(|e| FilesystemError::RemoveDir {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;
            result.removed.push(name);
        } else {
            result.skipped.push(name);
        }
    }

    Ok(result)
}

/// Check if a build directory has any build output
pub fn has_build_artifacts(build_dir: &Path) -> bool {
    BuildLayout::new(build_dir)
        .generated()
        .iter()
        .any(|p| p.exists())
}
