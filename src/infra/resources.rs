//! Runtime resource materialization
//!
//! Build inputs shipped with the server (runtime jars, the component catalog,
//! host packaging tools, the default icon) are addressed by logical paths such
//! as `files/kawa.jar`. The cache copies each one into a private temporary
//! directory on first use and hands out that same file for the rest of the
//! process lifetime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tempfile::TempDir;
use thiserror::Error;

use crate::infra::filesystem;

/// Resource lookup errors
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No file backs the logical path
    #[error("Resource '{logical}' not found at '{path}'")]
    NotFound { logical: String, path: PathBuf },

    /// Copying the resource out failed
    #[error("Failed to materialize resource '{logical}': {error}")]
    Materialize { logical: String, error: String },

    /// The private temporary directory could not be created or removed
    #[error("Resource cache directory error: {error}")]
    TempDir { error: String },
}

/// Process-wide cache of materialized runtime resources
#[derive(Debug)]
pub struct ResourceCache {
    root: PathBuf,
    temp: TempDir,
    entries: Mutex<HashMap<String, PathBuf>>,
    materialized: AtomicUsize,
}

impl ResourceCache {
    /// Create a cache serving resources from `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let temp = tempfile::Builder::new()
            .prefix("yailbuild-res")
            .tempdir()
            .map_err(|e| ResourceError::TempDir {
                error: e.to_string(),
            })?;
        Ok(Self {
            root: root.into(),
            temp,
            entries: Mutex::new(HashMap::new()),
            materialized: AtomicUsize::new(0),
        })
    }

    /// Root directory the logical paths are relative to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a resource exists, without materializing it
    pub fn exists(&self, logical: &str) -> bool {
        self.source_path(logical).is_file()
    }

    /// Resolve a logical path to a materialized file.
    ///
    /// The first call copies the resource out; later calls return the same path.
    pub fn get(&self, logical: &str) -> Result<PathBuf, ResourceError> {
        let key = normalize(logical).to_string();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = entries.get(&key) {
            return Ok(path.clone());
        }

        let source = self.source_path(&key);
        if !source.is_file() {
            return Err(ResourceError::NotFound {
                logical: key,
                path: source,
            });
        }

        let n = self.materialized.fetch_add(1, Ordering::SeqCst);
        let file_name = source.file_name().map_or_else(
            || std::ffi::OsString::from("resource"),
            std::ffi::OsStr::to_os_string,
        );
        let target = self.temp.path().join(n.to_string()).join(file_name);
        filesystem::copy_file(&source, &target).map_err(|e| ResourceError::Materialize {
            logical: key.clone(),
            error: e.to_string(),
        })?;
        make_executable(&target).map_err(|e| ResourceError::Materialize {
            logical: key.clone(),
            error: e.to_string(),
        })?;

        tracing::debug!(resource = %key, path = %target.display(), "Materialized resource");
        entries.insert(key, target.clone());
        Ok(target)
    }

    /// Read a text resource straight from the resource root
    pub fn read_to_string(&self, logical: &str) -> Result<String, ResourceError> {
        let source = self.source_path(logical);
        filesystem::read_file(&source).map_err(|_| ResourceError::NotFound {
            logical: normalize(logical).to_string(),
            path: source,
        })
    }

    /// Number of resources copied out so far
    pub fn materialized_count(&self) -> usize {
        self.materialized.load(Ordering::SeqCst)
    }

    /// Remove every materialized file
    pub fn cleanup(self) -> Result<(), ResourceError> {
        self.temp.close().map_err(|e| ResourceError::TempDir {
            error: e.to_string(),
        })
    }

    fn source_path(&self, logical: &str) -> PathBuf {
        self.root.join(normalize(logical))
    }
}

fn normalize(logical: &str) -> &str {
    logical.trim_start_matches('/')
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
