//! Build tool discovery
//!
//! Java tools (`java`, `jarsigner`, `javac`) come from the configured Java
//! home or `PATH`. The Android packaging tools (`aapt`, `zipalign`) ship with
//! the server as runtime resources, one build per host family.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Tool discovery errors
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// A Java tool is in none of the searched locations
    #[error("Cannot find '{tool}' (searched {} and PATH)", searched.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    JavaToolNotFound { tool: String, searched: Vec<PathBuf> },

    /// No packaging tools are shipped for this host
    #[error("Cannot run {tool} on OS {os}")]
    UnsupportedHost { tool: String, os: String },
}

/// Host operating system family
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostFamily {
    /// Linux
    Linux,
    /// macOS
    Mac,
    /// Windows
    Windows,
    /// Anything else
    Unsupported(String),
}

impl fmt::Display for HostFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostFamily::Linux => write!(f, "linux"),
            HostFamily::Mac => write!(f, "mac"),
            HostFamily::Windows => write!(f, "windows"),
            HostFamily::Unsupported(os) => write!(f, "{os}"),
        }
    }
}

impl HostFamily {
    /// Detect the current host
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value to a host family
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => HostFamily::Linux,
            "macos" => HostFamily::Mac,
            "windows" => HostFamily::Windows,
            other => HostFamily::Unsupported(other.to_string()),
        }
    }

    /// Logical resource path of this host's `aapt`
    pub fn aapt_resource(&self) -> Result<String, ToolchainError> {
        self.tool_resource("aapt")
    }

    /// Logical resource path of this host's `zipalign`
    pub fn zipalign_resource(&self) -> Result<String, ToolchainError> {
        self.tool_resource("zipalign")
    }

    fn tool_resource(&self, tool: &str) -> Result<String, ToolchainError> {
        match self {
            HostFamily::Unsupported(os) => Err(ToolchainError::UnsupportedHost {
                tool: tool.to_uppercase(),
                os: os.clone(),
            }),
            family => Ok(format!("tools/{family}/{tool}")),
        }
    }

    fn executable_name(&self, tool: &str) -> String {
        match self {
            HostFamily::Windows => format!("{tool}.exe"),
            _ => tool.to_string(),
        }
    }
}

/// Locates host tools for one build server
#[derive(Debug, Clone)]
pub struct Toolchain {
    host: HostFamily,
    java_home: Option<PathBuf>,
}

impl Toolchain {
    /// Create a toolchain for `host`, preferring tools under `java_home`
    pub fn new(host: HostFamily, java_home: Option<PathBuf>) -> Self {
        Self { host, java_home }
    }

    /// Toolchain for the current host, using `java_home` or `$JAVA_HOME`
    pub fn detect(java_home: Option<PathBuf>) -> Self {
        let java_home = java_home.or_else(|| std::env::var_os("JAVA_HOME").map(PathBuf::from));
        Self::new(HostFamily::detect(), java_home)
    }

    /// Host family
    pub fn host(&self) -> &HostFamily {
        &self.host
    }

    /// Configured Java home, if any
    pub fn java_home(&self) -> Option<&Path> {
        self.java_home.as_deref()
    }

    /// Path of the `java` launcher
    pub fn java(&self) -> Result<PathBuf, ToolchainError> {
        self.java_tool("java")
    }

    /// Path of `jarsigner`
    pub fn jarsigner(&self) -> Result<PathBuf, ToolchainError> {
        self.java_tool("jarsigner")
    }

    /// Path of `javac`
    pub fn javac(&self) -> Result<PathBuf, ToolchainError> {
        self.java_tool("javac")
    }

    /// Find a Java tool in `<home>/bin`, then `<home>/../bin` (a JRE inside
    /// a JDK), then on `PATH`.
    fn java_tool(&self, tool: &str) -> Result<PathBuf, ToolchainError> {
        let exe = self.host.executable_name(tool);
        let mut searched = Vec::new();

        if let Some(home) = &self.java_home {
            for candidate in [home.join("bin").join(&exe), home.join("..").join("bin").join(&exe)] {
                if candidate.is_file() {
                    return Ok(candidate);
                }
                searched.push(candidate);
            }
        }

        which::which(&exe).map_err(|_| ToolchainError::JavaToolNotFound {
            tool: tool.to_string(),
            searched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_host_family_from_os() {
        assert_eq!(HostFamily::from_os("linux"), HostFamily::Linux);
        assert_eq!(HostFamily::from_os("macos"), HostFamily::Mac);
        assert_eq!(HostFamily::from_os("windows"), HostFamily::Windows);
        assert_eq!(
            HostFamily::from_os("freebsd"),
            HostFamily::Unsupported("freebsd".to_string())
        );
    }

    #[test]
    fn test_packaging_tool_resources() {
        assert_eq!(HostFamily::Linux.aapt_resource().unwrap(), "tools/linux/aapt");
        assert_eq!(HostFamily::Mac.zipalign_resource().unwrap(), "tools/mac/zipalign");
        assert_eq!(HostFamily::Windows.aapt_resource().unwrap(), "tools/windows/aapt");
        let err = HostFamily::Unsupported("plan9".into())
            .zipalign_resource()
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot run ZIPALIGN on OS plan9");
    }

    #[test]
    fn test_java_tool_in_home_bin() {
        let home = TempDir::new().unwrap();
        std::fs::create_dir_all(home.path().join("bin")).unwrap();
        std::fs::write(home.path().join("bin/jarsigner"), "").unwrap();

        let tc = Toolchain::new(HostFamily::Linux, Some(home.path().to_path_buf()));
        assert_eq!(tc.jarsigner().unwrap(), home.path().join("bin/jarsigner"));
    }

    #[test]
    fn test_java_tool_in_parent_bin() {
        let jdk = TempDir::new().unwrap();
        let jre = jdk.path().join("jre");
        std::fs::create_dir_all(&jre).unwrap();
        std::fs::create_dir_all(jdk.path().join("bin")).unwrap();
        std::fs::write(jdk.path().join("bin/javac.exe"), "").unwrap();

        let tc = Toolchain::new(HostFamily::Windows, Some(jre.clone()));
        assert_eq!(tc.javac().unwrap(), jre.join("..").join("bin").join("javac.exe"));
    }

    #[test]
    fn test_missing_java_tool_lists_searched_paths() {
        let home = TempDir::new().unwrap();
        let tc = Toolchain::new(HostFamily::Linux, Some(home.path().to_path_buf()));
        let err = tc.java_tool("yailbuild-no-such-tool").unwrap_err();
        match err {
            ToolchainError::JavaToolNotFound { tool, searched } => {
                assert_eq!(tool, "yailbuild-no-such-tool");
                assert_eq!(searched.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
