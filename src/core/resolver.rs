//! Component type resolution
//!
//! Splits the project's requested component types into built-in types (found
//! in the catalog) and extensions, and finds each extension's directory under
//! `<assets>/external_comps/`.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::config::paths;
use crate::core::build_info::{parse_extension_descriptor, Catalog, ComponentBuildInfo};
use crate::error::{BuildError, ResolverError, Stage};
use crate::infra::filesystem;
use crate::infra::resources::ResourceCache;

/// Requested types split by origin. The two sets are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSets {
    /// Types described by the built-in catalog
    pub builtin: BTreeSet<String>,
    /// Everything else
    pub extensions: BTreeSet<String>,
}

impl ComponentSets {
    /// Partition requested types against the catalog
    pub fn partition<I, S>(requested: I, catalog: &Catalog) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sets = Self::default();
        for type_name in requested {
            let type_name = type_name.as_ref().to_string();
            if catalog.contains(&type_name) {
                sets.builtin.insert(type_name);
            } else {
                sets.extensions.insert(type_name);
            }
        }
        sets
    }

    /// Whether the project uses `type_name` at all
    pub fn uses(&self, type_name: &str) -> bool {
        self.builtin.contains(type_name) || self.extensions.contains(type_name)
    }

    /// Whether `type_name` is a built-in type used by the project
    pub fn has_builtin(&self, type_name: &str) -> bool {
        self.builtin.contains(type_name)
    }
}

/// Finds extension directories, remembering each answer
#[derive(Debug)]
pub struct ExtensionLocator {
    root: PathBuf,
    found: Mutex<HashMap<String, PathBuf>>,
    probes: AtomicUsize,
}

impl ExtensionLocator {
    /// Locator for extensions installed under `assets_dir`
    pub fn new(assets_dir: &Path) -> Self {
        Self {
            root: assets_dir.join(paths::EXT_COMPS_DIR_NAME),
            found: Mutex::new(HashMap::new()),
            probes: AtomicUsize::new(0),
        }
    }

    /// Directory holding the extension for `type_name`.
    ///
    /// Extensions are stored either under their full type name or, when one
    /// bundle provides several types, under their package name.
    pub fn locate(&self, type_name: &str) -> Result<PathBuf, ResolverError> {
        let mut found = self.found.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dir) = found.get(type_name) {
            return Ok(dir.clone());
        }

        let (package, _) = type_name
            .rsplit_once('.')
            .ok_or_else(|| ResolverError::UnqualifiedType {
                component: type_name.to_string(),
            })?;

        let mut tried = Vec::new();
        for candidate in [self.root.join(type_name), self.root.join(package)] {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if candidate.join(paths::RUNTIME_FILES_DIR).is_dir() {
                tracing::debug!(component = type_name, dir = %candidate.display(), "Found extension");
                found.insert(type_name.to_string(), candidate.clone());
                return Ok(candidate);
            }
            tried.push(candidate);
        }

        Err(ResolverError::ExtensionNotFound {
            component: type_name.to_string(),
            tried,
        })
    }

    /// The extension's build-info descriptor file
    pub fn descriptor(&self, type_name: &str) -> Result<PathBuf, ResolverError> {
        let files = self.files_dir(type_name)?;
        [paths::EXT_BUILD_INFOS_JSON, paths::EXT_BUILD_INFO_JSON]
            .iter()
            .map(|name| files.join(name))
            .find(|p| p.is_file())
            .ok_or(ResolverError::DescriptorMissing {
                component: type_name.to_string(),
                dir: files,
            })
    }

    /// The extension's runtime jar
    pub fn runtime_jar(&self, type_name: &str) -> Result<PathBuf, ResolverError> {
        Ok(self.files_dir(type_name)?.join(paths::EXT_RUNTIME_JAR))
    }

    /// A file shipped in the extension's `files/` directory
    pub fn file(&self, type_name: &str, relative: &str) -> Result<PathBuf, ResolverError> {
        Ok(self.files_dir(type_name)?.join(relative))
    }

    /// Number of directory probes performed
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn files_dir(&self, type_name: &str) -> Result<PathBuf, ResolverError> {
        Ok(self.locate(type_name)?.join(paths::RUNTIME_FILES_DIR))
    }
}

/// Where a component's file was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentOrigin {
    /// Shipped with the build server
    Builtin,
    /// Shipped inside the extension directory
    Extension,
}

/// Resolves files named by component requirements
#[derive(Debug, Clone, Copy)]
pub struct ComponentFiles<'a> {
    pub components: &'a ComponentSets,
    pub resources: &'a ResourceCache,
    pub locator: &'a ExtensionLocator,
}

impl ComponentFiles<'_> {
    /// Real path of `relative` as shipped with `type_name`.
    ///
    /// Built-in files come from the runtime `files/` directory, extension
    /// files from the extension's own `files/` directory.
    pub fn resolve(&self, type_name: &str, relative: &str) -> Result<(PathBuf, ComponentOrigin), String> {
        if self.components.has_builtin(type_name) {
            let logical = format!("{}/{relative}", paths::RUNTIME_FILES_DIR);
            let path = self.resources.get(&logical).map_err(|e| e.to_string())?;
            Ok((path, ComponentOrigin::Builtin))
        } else if self.components.extensions.contains(type_name) {
            let path = self.locator.file(type_name, relative).map_err(|e| e.to_string())?;
            Ok((path, ComponentOrigin::Extension))
        } else {
            Err(format!(
                "component type '{type_name}' is neither built in nor an extension"
            ))
        }
    }
}

/// Locate every extension and load its descriptors.
///
/// A bundle providing several types is read once.
pub fn load_extension_infos(
    locator: &ExtensionLocator,
    extensions: &BTreeSet<String>,
) -> Result<Vec<ComponentBuildInfo>, BuildError> {
    let mut read = BTreeSet::new();
    let mut infos = Vec::new();
    for type_name in extensions {
        let descriptor = locator
            .descriptor(type_name)
            .map_err(|e| BuildError::stage(Stage::Extensions, e))?;
        if !read.insert(descriptor.clone()) {
            continue;
        }
        let text = filesystem::read_file(&descriptor)
            .map_err(|e| BuildError::stage(Stage::Extensions, e))?;
        let parsed = parse_extension_descriptor(&descriptor.display().to_string(), &text)
            .map_err(|e| BuildError::stage(Stage::Extensions, e))?;
        infos.extend(parsed);
    }
    Ok(infos)
}
