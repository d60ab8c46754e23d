//! CLI command for `yailbuild doctor`
//!
//! Checks the Java tools, runtime files and host packaging tools a build
//! needs, and reports configuration issues.

use anyhow::Result;

use crate::cli::output::{is_json, is_quiet, print_detail, print_info, print_success, print_warning, status};
use crate::core::doctor::{run_doctor, CheckResult};
use crate::core::global_config::GlobalConfig;
use crate::infra::resources::ResourceCache;
use crate::infra::toolchain::Toolchain;

/// Execute the doctor command
pub fn execute(config: &GlobalConfig) -> Result<()> {
    let toolchain = Toolchain::detect(config.runtime.java_home.clone());
    let resources = ResourceCache::new(config.files_dir())?;
    let report = run_doctor(config, &toolchain, &resources);
    let failed_required = report.failed_required();

    if is_json() {
        let result = serde_json::json!({
            "status": if report.all_passed() {
                "success"
            } else if failed_required.is_empty() {
                "warning"
            } else {
                "error"
            },
            "host": toolchain.host().to_string(),
            "report": report,
            "passed_count": report.passed_count(),
            "total_count": report.checks.len(),
        });
        println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
    } else if is_quiet() {
        for check in &failed_required {
            eprintln!("{} Missing required: {}", status::ERROR, check.name);
        }
    } else {
        print_info(&format!(
            "Checking build host ({}, runtime files in {})",
            toolchain.host(),
            resources.root().display()
        ));
        println!();
        for check in &report.checks {
            print_check(check);
        }

        if !report.config_issues.is_empty() {
            println!();
            print_warning("Configuration issues:");
            for issue in &report.config_issues {
                print_detail(&format!("• {issue}"));
            }
        }

        println!();
        let passed = report.passed_count();
        let total = report.checks.len();
        if report.all_passed() {
            print_success(&format!("All checks passed ({passed}/{total})"));
        } else if failed_required.is_empty() {
            print_warning(&format!(
                "{passed}/{total} checks passed (only robot controller builds are affected)"
            ));
        } else {
            println!("{} {passed}/{total} checks passed", status::ERROR);
        }
    }

    if !failed_required.is_empty() {
        anyhow::bail!(
            "{} required check(s) failed. Run 'yailbuild doctor' for details.",
            failed_required.len()
        );
    }
    Ok(())
}

fn print_check(check: &CheckResult) {
    let optional = if check.required { "" } else { " [optional]" };
    if check.passed {
        let version = check
            .version
            .as_ref()
            .map(|v| format!(" ({v})"))
            .unwrap_or_default();
        println!("  {} {}{version}{optional}", status::SUCCESS, check.name);
        return;
    }

    println!("  {} {}{optional}", status::ERROR, check.name);
    if let Some(error) = &check.error {
        print_detail(&format!("Error: {error}"));
    }
    if let Some(suggestion) = &check.suggestion {
        print_detail(&format!("Suggestion: {suggestion}"));
    }
}
