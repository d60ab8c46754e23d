//! Logical resource paths
//!
//! Every path here is relative to the runtime files root configured in
//! `[runtime] files_dir`. Resolve them through
//! [`crate::infra::resources::ResourceCache`] to get a real file.

/// Directory holding runtime jars, component libraries and assets
pub const RUNTIME_FILES_DIR: &str = "files";

/// Crash reporting runtime
pub const ACRA_RUNTIME: &str = "files/acra-4.4.0.jar";

/// Platform SDK jar
pub const ANDROID_RUNTIME: &str = "files/android.jar";

/// Built-in component build info catalog
pub const COMP_BUILD_INFO: &str = "files/simple_components_build_info.json";

/// Dex merger
pub const DX_JAR: &str = "files/dx.jar";

/// Kawa compiler and runtime
pub const KAWA_RUNTIME: &str = "files/kawa.jar";

/// App Inventor component runtime
pub const SIMPLE_ANDROID_RUNTIME_JAR: &str = "files/AndroidRuntime.jar";

/// YAIL runtime definitions compiled alongside every project
pub const YAIL_RUNTIME: &str = "files/runtime.scm";

/// Icon used when the project has none
pub const DEFAULT_ICON: &str = "files/ya.png";

/// Debug keystore used for robot controller builds
pub const ROBOT_KEYSTORE: &str = "files/ftc.debug.keystore";

/// Comma-separated robot controller resource list
pub const ROBOT_RES_LIST: &str = "files/ftc/res.list";

/// Comma-separated robot controller asset list
pub const ROBOT_ASSETS_LIST: &str = "files/ftc/assets.list";

/// Comma-separated robot controller native library list
pub const ROBOT_LIBS_LIST: &str = "files/ftc/libs.list";

/// Directory holding robot controller resources
pub const ROBOT_RES_DIR: &str = "files/ftc/res";

/// Directory holding robot controller assets
pub const ROBOT_ASSETS_DIR: &str = "files/ftc/assets";

/// Directory holding robot controller native libraries
pub const ROBOT_LIBS_DIR: &str = "files/ftc/libs";

/// Name of the extensions directory inside project assets
pub const EXT_COMPS_DIR_NAME: &str = "external_comps";

/// Name of the component asset directory inside project assets
pub const ASSET_DIRECTORY: &str = "component";

/// Extension descriptor holding an array of component descriptors
pub const EXT_BUILD_INFOS_JSON: &str = "component_build_infos.json";

/// Extension descriptor holding one descriptor (or, in older bundles, an array)
pub const EXT_BUILD_INFO_JSON: &str = "component_build_info.json";

/// Extension runtime jar name inside the extension's files directory
pub const EXT_RUNTIME_JAR: &str = "AndroidRuntime.jar";

/// Native library directory inside the build directory
pub const LIBS_DIR_NAME: &str = "libs";

/// Default ABI directory
pub const ARMEABI_DIR_NAME: &str = "armeabi";

/// ARMv7 ABI directory
pub const ARMEABI_V7A_DIR_NAME: &str = "armeabi-v7a";

/// Suffix marking a native library built for ARMv7
pub const ARMEABI_V7A_SUFFIX: &str = "-v7a";
