//! Native library and component asset insertion

use std::path::{Path, PathBuf};

use crate::config::paths;
use crate::core::requirements::RequirementMap;
use crate::core::resolver::{ComponentFiles, ComponentOrigin};
use crate::error::{BuildError, Stage};
use crate::infra::filesystem;

/// ABI directory and bare file name for a declared native library.
///
/// Names ending in `-v7a` belong to `armeabi-v7a` and lose the suffix.
pub fn abi_target(library: &str) -> (&'static str, &str) {
    match library.strip_suffix(paths::ARMEABI_V7A_SUFFIX) {
        Some(name) => (paths::ARMEABI_V7A_DIR_NAME, name),
        None => (paths::ARMEABI_DIR_NAME, library),
    }
}

/// Copy every component's native libraries into `libs_dir/<abi>/`.
///
/// Extension libraries nest under `external_comps/<type>/`.
pub fn insert_native_libs(
    native: &RequirementMap,
    files: &ComponentFiles<'_>,
    libs_dir: &Path,
) -> Result<(), BuildError> {
    for abi in [paths::ARMEABI_DIR_NAME, paths::ARMEABI_V7A_DIR_NAME] {
        filesystem::create_dir_all(&libs_dir.join(abi)).map_err(native_code_error)?;
    }

    for (type_name, libraries) in native {
        for library in libraries {
            let (abi, name) = abi_target(library);
            let (source, origin) = files
                .resolve(type_name, &format!("{abi}/{name}"))
                .map_err(native_code_error)?;
            let target = nested(libs_dir.join(abi), type_name, origin).join(name);
            tracing::debug!(library = %library, target = %target.display(), "Copying native library");
            filesystem::copy_file(&source, &target).map_err(native_code_error)?;
        }
    }
    Ok(())
}

/// Copy every component's assets into `<assets_dir>/component/`
pub fn attach_component_assets(
    assets: &RequirementMap,
    files: &ComponentFiles<'_>,
    assets_dir: &Path,
) -> Result<(), BuildError> {
    let component_dir = assets_dir.join(paths::ASSET_DIRECTORY);
    filesystem::create_dir_all(&component_dir).map_err(assets_error)?;

    for (type_name, names) in assets {
        for asset in names {
            let (source, origin) = files.resolve(type_name, asset).map_err(assets_error)?;
            let target = nested(component_dir.clone(), type_name, origin).join(asset);
            filesystem::copy_file(&source, &target).map_err(assets_error)?;
        }
    }
    Ok(())
}

fn native_code_error(e: impl std::fmt::Display) -> BuildError {
    BuildError::stage(Stage::NativeCode, e)
}

fn assets_error(e: impl std::fmt::Display) -> BuildError {
    BuildError::stage(Stage::Assets, e)
}

fn nested(dir: PathBuf, type_name: &str, origin: ComponentOrigin) -> PathBuf {
    match origin {
        ComponentOrigin::Builtin => dir,
        ComponentOrigin::Extension => dir.join(paths::EXT_COMPS_DIR_NAME).join(type_name),
    }
}
