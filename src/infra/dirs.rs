//! Platform-specific directory management
//!
//! Provides platform-specific paths for the config file and the dex cache.
//! Follows XDG Base Directory Specification on Linux and standard locations on macOS.
//!
//! Environment variables can override default directories:
//! - `YAILBUILD_CACHE_DIR` - Override cache directory
//! - `YAILBUILD_CONFIG_DIR` - Override config directory

use std::env;
use std::path::PathBuf;

/// Environment variable names for directory overrides
pub const ENV_CACHE_DIR: &str = "YAILBUILD_CACHE_DIR";
pub const ENV_CONFIG_DIR: &str = "YAILBUILD_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "yailbuild";

const DEX_CACHE_SUBDIR: &str = "dex-cache";

/// Platform-specific directory provider
#[derive(Debug, Clone)]
pub struct BuildDirs {
    cache_dir: PathBuf,
    config_dir: PathBuf,
}

impl BuildDirs {
    /// Create a new `BuildDirs` instance
    ///
    /// Checks environment variables first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache_dir: Self::resolve(ENV_CACHE_DIR, dirs::cache_dir, ".cache"),
            config_dir: Self::resolve(ENV_CONFIG_DIR, dirs::config_dir, ".config"),
        }
    }

    /// Get the cache directory path
    ///
    /// - Linux: `$XDG_CACHE_HOME/yailbuild` or `~/.cache/yailbuild`
    /// - macOS: `~/Library/Caches/yailbuild`
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone()
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/yailbuild` or `~/.config/yailbuild`
    /// - macOS: `~/Library/Application Support/yailbuild`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Default directory for pre-dexed library jars
    #[must_use]
    pub fn dex_cache_dir(&self) -> PathBuf {
        self.cache_dir.join(DEX_CACHE_SUBDIR)
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    fn resolve(var: &str, platform: fn() -> Option<PathBuf>, home_fallback: &str) -> PathBuf {
        if let Ok(path) = env::var(var) {
            return PathBuf::from(path);
        }

        platform().map(|p| p.join(APP_NAME)).unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(home_fallback)
                .join(APP_NAME)
        })
    }
}

impl Default for BuildDirs {
    fn default() -> Self {
        Self::new()
    }
}
