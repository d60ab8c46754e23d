//! Application icon preparation
//!
//! The project's icon (or the server default) is copied into
//! `res/drawable/ya.<ext>`, which the manifest references as `@drawable/ya`.
//! Only image files are accepted; the format is detected from magic bytes.

use std::path::{Path, PathBuf};

use crate::config::paths;
use crate::core::project::Project;
use crate::error::BuildError;
use crate::infra::filesystem;
use crate::infra::resources::ResourceCache;

/// Resource name the manifest refers to
pub const ICON_RESOURCE_NAME: &str = "ya";

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff];
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";

/// Image formats the resource packager accepts as drawables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Detect the format from the file header
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_MAGIC) {
            Some(Self::Png)
        } else if bytes.starts_with(JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(GIF87_MAGIC) || bytes.starts_with(GIF89_MAGIC) {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    /// File extension for the drawable
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

/// Copy the application icon into `drawable_dir`.
///
/// An unusable user icon fails the build. A problem with the default icon is
/// only logged, and `Ok(None)` is returned.
pub fn prepare_icon(
    project: &Project,
    drawable_dir: &Path,
    resources: &ResourceCache,
) -> Result<Option<PathBuf>, BuildError> {
    match project.icon.as_deref() {
        Some(icon) => {
            let icon_error = |reason: String| BuildError::Icon {
                icon: icon.to_string(),
                reason,
            };
            let bytes = filesystem::read_bytes(&project.assets_dir.join(icon))
                .map_err(|e| icon_error(e.to_string()))?;
            let path = install(&bytes, drawable_dir).map_err(icon_error)?;
            Ok(Some(path))
        }
        None => {
            let installed = resources
                .get(paths::DEFAULT_ICON)
                .map_err(|e| e.to_string())
                .and_then(|p| filesystem::read_bytes(&p).map_err(|e| e.to_string()))
                .and_then(|bytes| install(&bytes, drawable_dir));
            match installed {
                Ok(path) => Ok(Some(path)),
                Err(reason) => {
                    tracing::warn!(%reason, "Default application icon unavailable");
                    Ok(None)
                }
            }
        }
    }
}

fn install(bytes: &[u8], drawable_dir: &Path) -> Result<PathBuf, String> {
    let format = ImageFormat::sniff(bytes).ok_or_else(|| "not a supported image".to_string())?;

    // A leftover icon with another extension would be a duplicate resource.
    for other in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif, ImageFormat::Webp] {
        let stale = drawable_dir.join(format!("{ICON_RESOURCE_NAME}.{}", other.extension()));
        if other != format {
            filesystem::remove_file(&stale).map_err(|e| e.to_string())?;
        }
    }

    let target = drawable_dir.join(format!("{ICON_RESOURCE_NAME}.{}", format.extension()));
    filesystem::write_bytes(&target, bytes).map_err(|e| e.to_string())?;
    Ok(target)
}
