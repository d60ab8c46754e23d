//! Packaging, signing and alignment commands
//!
//! Resources are packaged into an intermediate archive, the dex containers
//! are added to a copy of it, and the result is signed and zip-aligned in
//! place.

use std::path::{Path, PathBuf};

use crate::config::{defaults, paths};
use crate::infra::process::CommandSpec;
use crate::infra::resources::{ResourceCache, ResourceError};

/// Inputs of the resource packaging step
#[derive(Debug, Clone)]
pub struct PackageInputs<'a> {
    pub manifest: &'a Path,
    pub res_dir: &'a Path,
    pub assets_dir: &'a Path,
    pub android_jar: &'a Path,
    /// The intermediate `.ap_` archive
    pub output: &'a Path,
    pub libs_dir: &'a Path,
}

/// `aapt package` producing the intermediate archive
pub fn aapt_package_command(aapt: &Path, inputs: &PackageInputs<'_>) -> CommandSpec {
    CommandSpec::new(aapt)
        .arg("package")
        .arg("-v")
        .arg("-f")
        .arg("-M")
        .arg(inputs.manifest)
        .arg("-S")
        .arg(inputs.res_dir)
        .arg("-A")
        .arg(inputs.assets_dir)
        .arg("-I")
        .arg(inputs.android_jar)
        .arg("-F")
        .arg(inputs.output)
        .arg(inputs.libs_dir)
}

/// `aapt add` placing dex containers at the archive root.
///
/// Runs from the directory holding the containers so entries keep their
/// bare names.
pub fn seal_command(aapt: &Path, apk: &Path, dex_dir: &Path, dex_files: &[&str]) -> CommandSpec {
    CommandSpec::new(aapt)
        .arg("add")
        .arg("-k")
        .arg(apk)
        .args(dex_files.iter().map(|name| dex_dir.join(name).into_os_string()))
        .cwd(dex_dir)
}

/// Keystore and alias used to sign the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub keystore: PathBuf,
    pub alias: &'static str,
}

impl SigningKey {
    /// The caller's keystore for normal builds, the bundled debug keystore
    /// for robot controller builds
    pub fn select(
        robot: bool,
        user_keystore: &Path,
        resources: &ResourceCache,
    ) -> Result<Self, ResourceError> {
        if robot {
            Ok(Self {
                keystore: resources.get(paths::ROBOT_KEYSTORE)?,
                alias: defaults::ROBOT_KEY_ALIAS,
            })
        } else {
            Ok(Self {
                keystore: user_keystore.to_path_buf(),
                alias: defaults::KEY_ALIAS,
            })
        }
    }
}

/// `jarsigner` signing the archive in place
pub fn jarsigner_command(jarsigner: &Path, key: &SigningKey, apk: &Path) -> CommandSpec {
    CommandSpec::new(jarsigner)
        .arg("-digestalg")
        .arg("SHA1")
        .arg("-sigalg")
        .arg("MD5withRSA")
        .arg("-keystore")
        .arg(&key.keystore)
        .arg("-storepass")
        .arg(defaults::KEYSTORE_PASSWORD)
        .arg(apk)
        .arg(key.alias)
}

/// `zipalign` writing an aligned copy of `apk` to `aligned`
pub fn zipalign_command(zipalign: &Path, apk: &Path, aligned: &Path) -> CommandSpec {
    CommandSpec::new(zipalign)
        .arg("-f")
        .arg(defaults::ZIP_ALIGNMENT)
        .arg(apk)
        .arg(aligned)
}
