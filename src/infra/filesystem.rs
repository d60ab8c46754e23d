//! Filesystem operations
//!
//! Handles file and directory operations for the build tree.

use std::path::{Component, Path, PathBuf};

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Remove a file if it exists
pub fn remove_file(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| FilesystemError::RemoveFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// Leading `..` components of a relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Write content to a file, creating parent directories
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    write_bytes(path, content.as_bytes())
}

/// Write raw bytes to a file, creating parent directories
pub fn write_bytes(path: &Path, content: &[u8]) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read raw bytes from a file
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, FilesystemError> {
    std::fs::read(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Copy a file, creating the destination's parent directories
pub fn copy_file(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| FilesystemError::CopyFile {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            error: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("res/anim/fadein.xml");
        write_file(&path, "<set/>").unwrap();
        assert_eq!(read_file(&path).unwrap(), "<set/>");
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.bin");
        let to = temp.path().join("deep/nested/b.bin");
        write_bytes(&from, &[1, 2, 3]).unwrap();
        copy_file(&from, &to).unwrap();
        assert_eq!(read_bytes(&to).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_copy_missing_file_reports_both_paths() {
        let temp = TempDir::new().unwrap();
        let err = copy_file(&temp.path().join("missing"), &temp.path().join("out")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing"));
        assert!(msg.contains("out"));
    }

    #[test]
    fn test_remove_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("drawable/ya.jpg");
        write_bytes(&path, &[0xFF]).unwrap();
        remove_file(&path).unwrap();
        assert!(!path.exists());
        assert!(remove_file(&path).is_ok());
    }

    #[test]
    fn test_normalize_resolves_parent_components() {
        assert_eq!(
            normalize(Path::new("/work/app/youngandroidproject/../build/./deploy")),
            PathBuf::from("/work/app/build/deploy")
        );
        assert_eq!(normalize(Path::new("./youngandroidproject/../src")), PathBuf::from("src"));
        assert_eq!(normalize(Path::new("../shared/assets")), PathBuf::from("../shared/assets"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn test_remove_missing_dir_is_ok() {
        let temp = TempDir::new().unwrap();
        assert!(remove_dir_all(&temp.path().join("nope")).is_ok());
    }
}
