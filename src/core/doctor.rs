//! Doctor command logic
//!
//! Checks that a build server host can run every stage: Java tools, the
//! runtime resources and the host's packaging tools.

use std::path::Path;

use crate::config::paths;
use crate::core::global_config::GlobalConfig;
use crate::infra::resources::ResourceCache;
use crate::infra::toolchain::Toolchain;

/// Runtime resources every build reads
pub const REQUIRED_RESOURCES: [&str; 9] = [
    paths::KAWA_RUNTIME,
    paths::ACRA_RUNTIME,
    paths::SIMPLE_ANDROID_RUNTIME_JAR,
    paths::ANDROID_RUNTIME,
    paths::DX_JAR,
    paths::YAIL_RUNTIME,
    paths::COMP_BUILD_INFO,
    paths::DEFAULT_ICON,
    paths::ROBOT_KEYSTORE,
];

/// Result of a single dependency check
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckResult {
    /// Name of the dependency being checked
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Version if available
    pub version: Option<String>,
    /// Error message if check failed
    pub error: Option<String>,
    /// Suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Whether this is a required or optional dependency
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, version: Option<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            version,
            error: None,
            suggestion: None,
            required,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            version: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall doctor report
#[derive(Debug, Default, serde::Serialize)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Configuration issues found
    pub config_issues: Vec<String>,
}

impl DoctorReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result
    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    /// Add a configuration issue
    pub fn add_config_issue(&mut self, issue: String) {
        self.config_issues.push(issue);
    }

    /// Check if all required checks passed
    pub fn all_required_passed(&self) -> bool {
        self.checks
            .iter()
            .filter(|c| c.required)
            .all(|c| c.passed)
    }

    /// Check if all checks passed (including optional)
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed) && self.config_issues.is_empty()
    }

    /// Count passed checks
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Count failed checks
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get all failed required checks
    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .collect()
    }
}

/// Version reported by `<tool> -version`.
///
/// Java tools print their version on stderr.
pub fn tool_version(tool: &Path) -> Option<String> {
    std::process::Command::new(tool)
        .arg("-version")
        .output()
        .ok()
        .and_then(|output| {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            extract_version(&format!("{stdout}{stderr}"))
        })
}

/// Extract version string from command output
fn extract_version(output: &str) -> Option<String> {
    // "1.8.0_292", "17.0.2", "11"
    let version_regex = regex::Regex::new(r#"(\d+(?:\.\d+)*(?:_\d+)?)"#).ok()?;
    version_regex
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check one Java tool
pub fn check_java_tool(name: &str, found: Result<std::path::PathBuf, String>) -> CheckResult {
    match found {
        Ok(path) => CheckResult::pass(name, tool_version(&path), true),
        Err(e) => CheckResult::fail(
            name,
            &e,
            Some("Install a JDK and set [runtime] java_home or JAVA_HOME"),
            true,
        ),
    }
}

/// Check that a runtime resource is present
pub fn check_resource(resources: &ResourceCache, logical: &str, required: bool) -> CheckResult {
    if resources.exists(logical) {
        CheckResult::pass(logical, None, required)
    } else {
        CheckResult::fail(
            logical,
            &format!("Not found under {}", resources.root().display()),
            Some("Point [runtime] files_dir at the build server's runtime files"),
            required,
        )
    }
}

/// Check the packaging tools shipped for this host
pub fn check_host_tools(toolchain: &Toolchain, resources: &ResourceCache) -> Vec<CheckResult> {
    [
        ("aapt", toolchain.host().aapt_resource()),
        ("zipalign", toolchain.host().zipalign_resource()),
    ]
    .into_iter()
    .map(|(name, logical)| match logical {
        Ok(logical) => check_resource(resources, &logical, true),
        Err(e) => CheckResult::fail(name, &e.to_string(), None, true),
    })
    .collect()
}

/// Inconsistencies in the configuration
pub fn check_config(config: &GlobalConfig) -> Vec<String> {
    let mut issues = Vec::new();
    let files_dir = config.files_dir();
    if !files_dir.join(paths::RUNTIME_FILES_DIR).is_dir() {
        issues.push(format!(
            "Runtime files directory '{}' has no '{}' subdirectory",
            files_dir.display(),
            paths::RUNTIME_FILES_DIR
        ));
    }
    if config.child_process_ram_mb() > config.memory_budget_mb() {
        issues.push(format!(
            "child_process_ram_mb ({}) exceeds memory_budget_mb ({}); builds will run one tool at a time",
            config.child_process_ram_mb(),
            config.memory_budget_mb()
        ));
    }
    let concurrent = config.memory_budget_mb() / config.child_process_ram_mb().max(1);
    let cpus = num_cpus::get();
    if concurrent as usize > cpus {
        issues.push(format!(
            "memory_budget_mb allows {concurrent} concurrent compiler JVMs but this host has {cpus} CPUs"
        ));
    }
    if config.first_dex_cap() == 0 {
        issues.push("first_dex_cap is 0; every library goes to the second dex container".to_string());
    }
    issues
}

/// Run all doctor checks
pub fn run_doctor(config: &GlobalConfig, toolchain: &Toolchain, resources: &ResourceCache) -> DoctorReport {
    let mut report = DoctorReport::new();

    report.add_check(check_java_tool("java", toolchain.java().map_err(|e| e.to_string())));
    report.add_check(check_java_tool("jarsigner", toolchain.jarsigner().map_err(|e| e.to_string())));
    report.add_check(check_java_tool("javac", toolchain.javac().map_err(|e| e.to_string())));

    for logical in REQUIRED_RESOURCES {
        // Only robot controller builds need the debug keystore.
        report.add_check(check_resource(resources, logical, logical != paths::ROBOT_KEYSTORE));
    }
    for check in check_host_tools(toolchain, resources) {
        report.add_check(check);
    }

    for issue in check_config(config) {
        report.add_config_issue(issue);
    }

    report
}
