//! Default configuration values

/// Version code used when the project does not declare one
pub const DEFAULT_VERSION_CODE: &str = "1";

/// Version name used when the project does not declare one
pub const DEFAULT_VERSION_NAME: &str = "1.0";

/// Application label used when the project does not declare one
pub const DEFAULT_APP_NAME: &str = "";

/// Minimum SDK level declared in the manifest
pub const DEFAULT_MIN_SDK: &str = "4";

/// Minimum SDK level required by FirebaseDB (Gingerbread MR1)
pub const FIREBASE_MIN_SDK: &str = "10";

/// Maximum number of library jars folded into the first dex container.
///
/// All libraries fit into one container at 16 libraries and broke at 17.
pub const FIRST_DEX_LIBRARY_CAP: usize = 12;

/// RAM available to one child tool process, in MB
pub const CHILD_PROCESS_RAM_MB: u32 = 2048;

/// RAM reserved for the compiler's JVM beyond its heap, in MB
pub const COMPILER_RAM_OVERHEAD_MB: u32 = 200;

/// Total RAM the build server may hand out to concurrent tool processes, in MB
pub const MEMORY_BUDGET_MB: u32 = 2048;

/// Timeout for the YAIL compiler and the dex merger (in seconds)
pub const COMPILE_TIMEOUT_SECS: u64 = 900;

/// Timeout for resource packaging and sealing (in seconds)
pub const PACKAGE_TIMEOUT_SECS: u64 = 300;

/// Timeout for signing and alignment (in seconds)
pub const SIGN_TIMEOUT_SECS: u64 = 120;

/// Keystore password used by the build server's signing keys
pub const KEYSTORE_PASSWORD: &str = "android";

/// Key alias for regular application keystores
pub const KEY_ALIAS: &str = "AndroidKey";

/// Key alias inside the robot controller debug keystore
pub const ROBOT_KEY_ALIAS: &str = "androiddebugkey";

/// Zip alignment boundary in bytes
pub const ZIP_ALIGNMENT: &str = "4";

/// Java language level for generated `R.java` sources
pub const JAVAC_LANGUAGE_LEVEL: &str = "1.7";

/// Robot controller application package
pub const ROBOT_PACKAGE: &str = "com.qualcomm.ftcrobotcontroller";

/// Robot controller release version code
pub const ROBOT_VERSION_CODE: &str = "21";

/// Robot controller release version name
pub const ROBOT_VERSION_NAME: &str = "3.5";

/// Robot controller minimum SDK level
pub const ROBOT_MIN_SDK: &str = "19";

/// Robot controller target SDK level
pub const ROBOT_TARGET_SDK: &str = "19";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
