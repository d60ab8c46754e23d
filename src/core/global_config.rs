//! Global configuration management
//!
//! Reads and manages build server settings from `config.toml` in the config
//! directory: where runtime resources live, memory limits, dex splitting,
//! tool timeouts and the robot controller identity.

use crate::config::defaults;
use crate::infra::dirs::BuildDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to write config file
    #[error("Failed to write config file '{path}': {error}")]
    WriteError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for the build server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Runtime resource settings
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Memory limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Dex merge settings
    #[serde(default)]
    pub dex: DexConfig,

    /// Per-tool timeouts
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Robot controller identity
    #[serde(default)]
    pub robot: RobotConfig,
}

/// Runtime resource configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory containing `files/` and `tools/`
    pub files_dir: Option<PathBuf>,

    /// Java installation used for `java`, `jarsigner` and `javac`
    pub java_home: Option<PathBuf>,
}

/// Memory limits, in MB
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Heap for one child JVM
    pub child_process_ram_mb: Option<u32>,

    /// Total memory shared by concurrent child JVMs
    pub memory_budget_mb: Option<u32>,
}

/// Dex merge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DexConfig {
    /// Library jars folded into the first dex container
    pub first_dex_cap: Option<usize>,

    /// Library jar names needed at startup, in load order
    #[serde(default)]
    pub startup_libraries: Vec<String>,

    /// Pre-dex cache directory
    pub cache: Option<PathBuf>,
}

/// Tool timeouts, in seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// YAIL compiler and `javac`
    pub compile: Option<u64>,

    /// Dex merger
    pub dex: Option<u64>,

    /// `aapt` packaging and sealing
    pub package: Option<u64>,

    /// `jarsigner` and `zipalign`
    pub sign: Option<u64>,
}

/// Robot controller release identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Application package
    pub package: Option<String>,

    /// Version code
    pub version_code: Option<String>,

    /// Version name
    pub version_name: Option<String>,

    /// Minimum SDK level
    pub min_sdk: Option<String>,

    /// Target SDK level
    pub target_sdk: Option<String>,
}

/// Resolved robot controller identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotIdentity {
    pub package: String,
    pub version_code: String,
    pub version_name: String,
    pub min_sdk: String,
    pub target_sdk: String,
}

impl Default for RobotIdentity {
    fn default() -> Self {
        RobotConfig::default().identity()
    }
}

impl RobotConfig {
    /// Fill unset fields from the built-in release identity
    pub fn identity(&self) -> RobotIdentity {
        let pick = |v: &Option<String>, d: &str| v.clone().unwrap_or_else(|| d.to_string());
        RobotIdentity {
            package: pick(&self.package, defaults::ROBOT_PACKAGE),
            version_code: pick(&self.version_code, defaults::ROBOT_VERSION_CODE),
            version_name: pick(&self.version_name, defaults::ROBOT_VERSION_NAME),
            min_sdk: pick(&self.min_sdk, defaults::ROBOT_MIN_SDK),
            target_sdk: pick(&self.target_sdk, defaults::ROBOT_TARGET_SDK),
        }
    }
}

/// Resolved tool timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolTimeouts {
    pub compile: Duration,
    pub dex: Duration,
    pub package: Duration,
    pub sign: Duration,
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        TimeoutsConfig::default().resolve()
    }
}

impl TimeoutsConfig {
    /// Fill unset timeouts from defaults
    pub fn resolve(&self) -> ToolTimeouts {
        let secs = |v: Option<u64>, d: u64| Duration::from_secs(v.unwrap_or(d));
        ToolTimeouts {
            compile: secs(self.compile, defaults::COMPILE_TIMEOUT_SECS),
            dex: secs(self.dex, defaults::COMPILE_TIMEOUT_SECS),
            package: secs(self.package, defaults::PACKAGE_TIMEOUT_SECS),
            sign: secs(self.sign, defaults::SIGN_TIMEOUT_SECS),
        }
    }
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// If the config file doesn't exist, returns default configuration.
    /// If the config file exists but is invalid, returns an error.
    pub fn load(dirs: &BuildDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Save global configuration to a specific path
    ///
    /// Creates parent directories if they don't exist.
    pub fn save_to_path(&self, path: &Path) -> Result<(), GlobalConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GlobalConfigError::WriteError {
                path: parent.display().to_string(),
                error: e.to_string(),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        fs::write(path, content).map_err(|e| GlobalConfigError::WriteError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// A configuration with every default written out, for `config init`
    #[must_use]
    pub fn populated() -> Self {
        let robot = RobotIdentity::default();
        Self {
            runtime: RuntimeConfig {
                files_dir: Some(PathBuf::from(".")),
                java_home: None,
            },
            limits: LimitsConfig {
                child_process_ram_mb: Some(defaults::CHILD_PROCESS_RAM_MB),
                memory_budget_mb: Some(defaults::MEMORY_BUDGET_MB),
            },
            dex: DexConfig {
                first_dex_cap: Some(defaults::FIRST_DEX_LIBRARY_CAP),
                startup_libraries: Vec::new(),
                cache: None,
            },
            timeouts: TimeoutsConfig {
                compile: Some(defaults::COMPILE_TIMEOUT_SECS),
                dex: Some(defaults::COMPILE_TIMEOUT_SECS),
                package: Some(defaults::PACKAGE_TIMEOUT_SECS),
                sign: Some(defaults::SIGN_TIMEOUT_SECS),
            },
            robot: RobotConfig {
                package: Some(robot.package),
                version_code: Some(robot.version_code),
                version_name: Some(robot.version_name),
                min_sdk: Some(robot.min_sdk),
                target_sdk: Some(robot.target_sdk),
            },
        }
    }

    /// Effective runtime files directory
    #[must_use]
    pub fn files_dir(&self) -> PathBuf {
        self.runtime
            .files_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Effective per-child JVM heap
    #[must_use]
    pub fn child_process_ram_mb(&self) -> u32 {
        self.limits
            .child_process_ram_mb
            .unwrap_or(defaults::CHILD_PROCESS_RAM_MB)
    }

    /// Effective memory budget for concurrent child JVMs
    #[must_use]
    pub fn memory_budget_mb(&self) -> u32 {
        self.limits
            .memory_budget_mb
            .unwrap_or(defaults::MEMORY_BUDGET_MB)
    }

    /// Effective first dex container library cap
    #[must_use]
    pub fn first_dex_cap(&self) -> usize {
        self.dex
            .first_dex_cap
            .unwrap_or(defaults::FIRST_DEX_LIBRARY_CAP)
    }
}
