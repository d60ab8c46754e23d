//! Error types for yailbuild
//!
//! Domain-specific error types using thiserror.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage names as they appear in user-facing error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Extension directory discovery
    Extensions,
    /// Permission aggregation
    Permissions,
    /// Library aggregation
    Libraries,
    /// Native library aggregation
    NativeLibraries,
    /// Asset aggregation and insertion
    Assets,
    /// Activity aggregation
    Activities,
    /// Broadcast receiver aggregation
    BroadcastReceivers,
    /// Legacy single-string broadcast receiver aggregation
    BroadcastReceiver,
    /// Animation resource emission
    Animation,
    /// Robot controller resource, asset and native library copying
    Resources,
    /// Manifest synthesis
    Manifest,
    /// Native library insertion
    NativeCode,
    /// YAIL compilation
    Compile,
    /// Compilation of generated `R.java` sources
    Javac,
    /// Dex merge
    Dx,
    /// Resource packaging
    Aapt,
    /// Archive sealing
    ApkBuilder,
    /// Archive signing
    JarSigner,
    /// Archive alignment
    ZipAlign,
}

impl Stage {
    /// Name used in the user-facing "error in the X stage" message
    pub fn label(self) -> &'static str {
        match self {
            Self::Extensions => "Extensions",
            Self::Permissions => "Permissions",
            Self::Libraries => "Libraries",
            Self::NativeLibraries => "Native Libraries",
            Self::Assets => "Assets",
            Self::Activities => "Activities",
            Self::BroadcastReceivers => "BroadcastReceivers",
            Self::BroadcastReceiver => "BroadcastReceiver",
            Self::Animation => "Animation",
            Self::Resources => "Resources",
            Self::Manifest => "manifest",
            Self::NativeCode => "Native Code",
            Self::Compile => "Compile",
            Self::Javac => "Javac",
            Self::Dx => "DX",
            Self::Aapt => "AAPT",
            Self::ApkBuilder => "ApkBuilder",
            Self::JarSigner => "JarSigner",
            Self::ZipAlign => "ZIPALIGN",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Build pipeline errors
///
/// `Display` carries the diagnostic detail for logs; [`BuildError::user_message`]
/// renders the text shown to the project's author.
#[derive(Error, Debug)]
pub enum BuildError {
    /// No source file contains any user-authored logic
    #[error("no user code exists in any source file")]
    NoUserCode,

    /// The project icon could not be used
    #[error("icon '{icon}' cannot be used: {reason}")]
    Icon { icon: String, reason: String },

    /// A source unit did not produce its class file
    #[error("compilation of '{unit}' produced no class file")]
    Compilation { unit: String },

    /// Infrastructure failure in a named stage
    #[error("{stage} stage failed: {reason}")]
    Stage { stage: Stage, reason: String },
}

impl BuildError {
    /// Create a stage failure from any displayable cause
    pub fn stage(stage: Stage, reason: impl fmt::Display) -> Self {
        Self::Stage {
            stage,
            reason: reason.to_string(),
        }
    }

    /// Stage the failure belongs to, if it is an infrastructure failure
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Render the message written to the user-facing error stream
    pub fn user_message(&self) -> String {
        match self {
            Self::NoUserCode => "Error: No user code exists.\n".to_string(),
            Self::Icon { icon, .. } => format!(
                "Error: Your build failed because {icon} cannot be used as the application icon.\n"
            ),
            Self::Compilation { unit } => {
                format!("Error: Your build failed due to an error when compiling {unit}.\n")
            }
            Self::Stage { stage, .. } => format!(
                "Error: Your build failed due to an error in the {stage} stage, \
                 not because of an error in your program.\n"
            ),
        }
    }
}

/// Project descriptor errors
#[derive(Error, Debug)]
pub enum ProjectError {
    /// Properties file not found
    #[error("Project properties not found at '{path}'")]
    PropertiesNotFound { path: PathBuf },

    /// Required property missing
    #[error("Project properties are missing required key '{key}'")]
    MissingProperty { key: String },

    /// Main class is not a qualified name
    #[error("Main class '{main}' is not a qualified class name")]
    InvalidMainClass { main: String },

    /// Main class has no matching source file
    #[error("No source file found for main class '{main}'")]
    MainSourceMissing { main: String },

    /// Filesystem error while reading the project
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Component build-info catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog text is not valid JSON for a build-info document
    #[error("Malformed build info in '{origin}': {error}")]
    Malformed { origin: String, error: String },

    /// A component descriptor lacks a required category field
    #[error("Component '{component}' has no '{field}' field")]
    MissingField { component: String, field: String },
}

/// Component type resolution errors
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Extension directory not found under any naming convention
    #[error("No extension directory for '{component}' (looked in {})", tried.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    ExtensionNotFound {
        component: String,
        tried: Vec<PathBuf>,
    },

    /// Extension directory has no build-info descriptor
    #[error("Extension '{component}' has no build info descriptor in '{dir}'")]
    DescriptorMissing { component: String, dir: PathBuf },

    /// Type name has no package part
    #[error("Component type '{component}' is not a qualified name")]
    UnqualifiedType { component: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_message_names_stage() {
        let err = BuildError::stage(Stage::Dx, "exit status 1");
        assert_eq!(
            err.user_message(),
            "Error: Your build failed due to an error in the DX stage, \
             not because of an error in your program.\n"
        );
        assert_eq!(err.failed_stage(), Some(Stage::Dx));
        assert!(err.to_string().contains("exit status 1"));
    }

    #[test]
    fn test_manifest_stage_is_lowercase() {
        let err = BuildError::stage(Stage::Manifest, "disk full");
        assert!(err.user_message().contains("in the manifest stage"));
    }

    #[test]
    fn test_compilation_message_names_unit() {
        let err = BuildError::Compilation {
            unit: "Screen2".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Error: Your build failed due to an error when compiling Screen2.\n"
        );
        assert_eq!(err.failed_stage(), None);
    }

    #[test]
    fn test_user_errors_have_own_templates() {
        assert_eq!(BuildError::NoUserCode.user_message(), "Error: No user code exists.\n");
        let icon = BuildError::Icon {
            icon: "song.wav".to_string(),
            reason: "not an image".to_string(),
        };
        assert_eq!(
            icon.user_message(),
            "Error: Your build failed because song.wav cannot be used as the application icon.\n"
        );
    }
}
