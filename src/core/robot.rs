//! Robot controller build extras
//!
//! Robot controller builds bundle the robotics platform's resources, assets
//! and native libraries, and compile `R` classes for the platform packages.

use std::path::{Path, PathBuf};

use crate::config::{defaults, paths};
use crate::error::{BuildError, Stage};
use crate::infra::filesystem;
use crate::infra::process::CommandSpec;
use crate::infra::resources::ResourceCache;

/// Packages that need a generated `R` class
pub const R_PACKAGES: [&str; 5] = [
    "com.google.blocks",
    "com.qualcomm.ftccommon",
    "com.qualcomm.hardware",
    "com.qualcomm.robotcore",
    "org.firstinspires.inspection",
];

/// Directory inside `libs/` copied verbatim into the archive
const APK_LIB_DIR: &str = "lib";

/// Entries of a comma-separated bundle list
pub fn parse_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Copy the bundled resources into `res_dir`
pub fn copy_resources(resources: &ResourceCache, res_dir: &Path) -> Result<usize, BuildError> {
    copy_listed(resources, paths::ROBOT_RES_LIST, paths::ROBOT_RES_DIR, res_dir, |_| Ok(()))
}

/// Copy the bundled assets into the project's assets directory
pub fn copy_assets(resources: &ResourceCache, assets_dir: &Path) -> Result<usize, BuildError> {
    filesystem::create_dir_all(assets_dir).map_err(|e| BuildError::stage(Stage::Resources, e))?;
    copy_listed(resources, paths::ROBOT_ASSETS_LIST, paths::ROBOT_ASSETS_DIR, assets_dir, |_| Ok(()))
}

/// Copy the bundled native libraries into `libs/lib/<abi>/`.
///
/// Every entry must live under one of the supported ABI directories.
pub fn copy_native_libs(resources: &ResourceCache, libs_dir: &Path) -> Result<usize, BuildError> {
    copy_listed(
        resources,
        paths::ROBOT_LIBS_LIST,
        paths::ROBOT_LIBS_DIR,
        &libs_dir.join(APK_LIB_DIR),
        |entry| {
            let supported = [paths::ARMEABI_DIR_NAME, paths::ARMEABI_V7A_DIR_NAME]
                .iter()
                .any(|abi| entry.starts_with(&format!("{abi}/")));
            if supported {
                Ok(())
            } else {
                Err(format!(
                    "library {entry} does not belong in {} or {}",
                    paths::ARMEABI_DIR_NAME,
                    paths::ARMEABI_V7A_DIR_NAME
                ))
            }
        },
    )
}

fn copy_listed(
    resources: &ResourceCache,
    list: &str,
    source_dir: &str,
    target_dir: &Path,
    check: impl Fn(&str) -> Result<(), String>,
) -> Result<usize, BuildError> {
    let fail = |e: String| BuildError::stage(Stage::Resources, e);
    let entries = parse_list(&resources.read_to_string(list).map_err(|e| fail(e.to_string()))?);
    for entry in &entries {
        check(entry).map_err(fail)?;
        let source = resources
            .get(&format!("{source_dir}/{entry}"))
            .map_err(|e| fail(e.to_string()))?;
        filesystem::copy_file(&source, &target_dir.join(entry)).map_err(|e| fail(e.to_string()))?;
    }
    tracing::debug!(list, n = entries.len(), "Copied robot controller files");
    Ok(entries.len())
}

/// Where `aapt` writes the `R` class for `package`
pub fn r_java_path(gen_dir: &Path, package: &str) -> PathBuf {
    package
        .split('.')
        .fold(gen_dir.to_path_buf(), |dir, part| dir.join(part))
        .join("R.java")
}

/// Inputs of `R` class generation
#[derive(Debug, Clone)]
pub struct RJavaInputs<'a> {
    pub android_jar: &'a Path,
    pub res_dir: &'a Path,
    pub manifest: &'a Path,
    pub gen_dir: &'a Path,
}

/// `aapt package -m` generating the `R` class for `package`
pub fn r_java_command(aapt: &Path, inputs: &RJavaInputs<'_>, package: &str) -> CommandSpec {
    CommandSpec::new(aapt)
        .arg("package")
        .arg("-f")
        .arg("-m")
        .arg("-I")
        .arg(inputs.android_jar)
        .arg("-S")
        .arg(inputs.res_dir)
        .arg("-M")
        .arg(inputs.manifest)
        .arg("-J")
        .arg(inputs.gen_dir)
        .arg("--custom-package")
        .arg(package)
}

/// `javac` compiling generated sources into `classes_dir`
pub fn javac_command(javac: &Path, classes_dir: &Path, sources: &[PathBuf]) -> CommandSpec {
    CommandSpec::new(javac)
        .arg("-d")
        .arg(classes_dir)
        .arg("-source")
        .arg(defaults::JAVAC_LANGUAGE_LEVEL)
        .arg("-target")
        .arg(defaults::JAVAC_LANGUAGE_LEVEL)
        .args(sources.iter().map(|p| p.as_os_str().to_os_string()))
}
