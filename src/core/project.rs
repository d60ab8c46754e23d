//! Project descriptor loading
//!
//! A project lives in a directory containing
//! `youngandroidproject/project.properties`. Directory-valued properties
//! (`source`, `assets`, `build`) are relative to the `youngandroidproject`
//! directory, so the usual layout is:
//!
//! ```text
//! project/
//!   youngandroidproject/project.properties
//!   src/appinventor/ai_user/HelloPurr/Screen1.yail
//!   assets/
//!   build/
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::defaults;
use crate::error::{FilesystemError, ProjectError};
use crate::infra::filesystem;

/// Directory holding the project properties file
pub const PROJECT_DIR: &str = "youngandroidproject";

/// Name of the project properties file
pub const PROPERTIES_FILE: &str = "project.properties";

/// Extension of YAIL source files
pub const YAIL_EXTENSION: &str = "yail";

/// One YAIL source unit (one screen)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Fully qualified class name, e.g. `appinventor.ai_user.HelloPurr.Screen1`
    pub qualified_name: String,
    /// Absolute path of the `.yail` file
    pub path: PathBuf,
}

impl SourceDescriptor {
    /// Create a descriptor
    pub fn new(qualified_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            path: path.into(),
        }
    }

    /// Simple class name (the screen name)
    pub fn unit_name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map_or(self.qualified_name.as_str(), |(_, name)| name)
    }

    /// Path of the compiled class relative to the classes directory
    pub fn class_file(&self) -> PathBuf {
        let mut path: PathBuf = self.qualified_name.split('.').collect();
        path.set_extension("class");
        path
    }
}

/// A project as seen by the build pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Project name; names the output archives
    pub name: String,
    /// Qualified class name of the main screen
    pub main_class: String,
    /// Source units, sorted by qualified name
    pub sources: Vec<SourceDescriptor>,
    /// Directory of user assets, packaged verbatim
    pub assets_dir: PathBuf,
    /// Build output directory
    pub build_dir: PathBuf,
    /// Icon file name inside the assets directory
    pub icon: Option<String>,
    /// Version code
    pub version_code: Option<String>,
    /// Version name
    pub version_name: Option<String>,
    /// Application label
    pub app_name: Option<String>,
    /// Whether the project asked for location permissions
    pub uses_location: bool,
}

impl Project {
    /// Load a project from its root directory
    pub fn load(root: &Path) -> Result<Self, ProjectError> {
        let props_dir = root.join(PROJECT_DIR);
        let props_path = props_dir.join(PROPERTIES_FILE);
        if !props_path.is_file() {
            return Err(ProjectError::PropertiesNotFound { path: props_path });
        }
        let props = parse_properties(&filesystem::read_file(&props_path)?);

        let required = |key: &str| {
            props
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| ProjectError::MissingProperty {
                    key: key.to_string(),
                })
        };
        let optional = |key: &str| props.get(key).filter(|v| !v.is_empty()).cloned();
        let dir = |key: &str, fallback: &str| {
            let relative = optional(key).unwrap_or_else(|| fallback.to_string());
            filesystem::normalize(&props_dir.join(relative))
        };

        let main_class = required("main")?;
        if !main_class.contains('.') {
            return Err(ProjectError::InvalidMainClass { main: main_class });
        }

        let source_dir = dir("source", "../src");
        let sources = discover_sources(&source_dir)?;
        if !sources.iter().any(|s| s.qualified_name == main_class) {
            return Err(ProjectError::MainSourceMissing { main: main_class });
        }

        let project = Self {
            name: required("name")?,
            main_class,
            sources,
            assets_dir: dir("assets", "../assets"),
            build_dir: dir("build", "../build"),
            icon: optional("icon"),
            version_code: optional("versioncode"),
            version_name: optional("versionname"),
            app_name: optional("aname"),
            uses_location: optional("useslocation").is_some_and(|v| v.eq_ignore_ascii_case("true")),
        };
        tracing::debug!(
            project = %project.name,
            sources = project.sources.len(),
            "Loaded project"
        );
        Ok(project)
    }

    /// Package part of the main class
    pub fn package_name(&self) -> &str {
        self.main_class
            .rsplit_once('.')
            .map_or("", |(package, _)| package)
    }

    /// Simple name of the main class
    pub fn class_name(&self) -> &str {
        self.main_class
            .rsplit_once('.')
            .map_or(self.main_class.as_str(), |(_, class)| class)
    }

    /// Version code, or the default
    pub fn version_code_or_default(&self) -> &str {
        self.version_code
            .as_deref()
            .unwrap_or(defaults::DEFAULT_VERSION_CODE)
    }

    /// Whether `source` is the main screen
    pub fn is_main(&self, source: &SourceDescriptor) -> bool {
        source.qualified_name == self.main_class
    }
}

/// Parse a Java-style properties file
///
/// Supports `key=value` and `key:value`, `#`/`!` comments, and backslash
/// escapes of the separator characters.
pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut key = String::new();
        let mut value = None;
        let mut chars = line.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        key.push(next);
                    }
                }
                '=' | ':' => {
                    value = Some(unescape(chars.as_str().trim()));
                    break;
                }
                c => key.push(c),
            }
        }
        props.insert(key.trim().to_string(), value.unwrap_or_default());
    }
    props
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Find every `.yail` file under `source_dir`, deriving qualified names from
/// relative paths
fn discover_sources(source_dir: &Path) -> Result<Vec<SourceDescriptor>, ProjectError> {
    if !source_dir.is_dir() {
        return Err(FilesystemError::ReadFile {
            path: source_dir.to_path_buf(),
            error: "source directory does not exist".to_string(),
        }
        .into());
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| FilesystemError::ReadFile {
            path: source_dir.to_path_buf(),
            error: e.to_string(),
        })?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(YAIL_EXTENSION)
        {
            continue;
        }
        let Ok(relative) = path.strip_prefix(source_dir) else {
            continue;
        };
        let qualified_name = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(".");
        sources.push(SourceDescriptor::new(qualified_name, path));
    }
    sources.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_project(props: &str, screens: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        filesystem::write_file(
            &temp.path().join(PROJECT_DIR).join(PROPERTIES_FILE),
            props,
        )
        .unwrap();
        for screen in screens {
            filesystem::write_file(
                &temp
                    .path()
                    .join("src/appinventor/ai_test/Hello")
                    .join(format!("{screen}.yail")),
                "(define-form appinventor.ai_test.Hello.Screen1 Screen1)\n",
            )
            .unwrap();
        }
        temp
    }

    const PROPS: &str = "\
# Project properties
main=appinventor.ai_test.Hello.Screen1
name=Hello
assets=../assets
source=../src
build=../build
versioncode=3
versionname=1.2 & more
useslocation=True
";

    #[test]
    fn test_parse_properties() {
        let props = parse_properties("a=1\n# comment\n! other\nb : two words \nc\\:d=x\\=y\nempty=\n");
        assert_eq!(props["a"], "1");
        assert_eq!(props["b"], "two words");
        assert_eq!(props["c:d"], "x=y");
        assert_eq!(props["empty"], "");
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn test_load_project() {
        let temp = write_project(PROPS, &["Screen1", "Screen2"]);
        let project = Project::load(temp.path()).unwrap();

        assert_eq!(project.name, "Hello");
        assert_eq!(project.package_name(), "appinventor.ai_test.Hello");
        assert_eq!(project.class_name(), "Screen1");
        assert_eq!(project.version_code_or_default(), "3");
        assert_eq!(project.version_name.as_deref(), Some("1.2 & more"));
        assert!(project.uses_location);
        assert!(project.icon.is_none());
        assert_eq!(project.sources.len(), 2);
        assert_eq!(
            project.sources[1].qualified_name,
            "appinventor.ai_test.Hello.Screen2"
        );
        assert_eq!(project.assets_dir, temp.path().join("assets"));
        assert_eq!(project.build_dir, temp.path().join("build"));
    }

    #[test]
    fn test_source_class_file() {
        let source = SourceDescriptor::new("appinventor.ai_test.Hello.Screen1", "/x/Screen1.yail");
        assert_eq!(source.unit_name(), "Screen1");
        assert_eq!(
            source.class_file(),
            PathBuf::from("appinventor/ai_test/Hello/Screen1.class")
        );
    }

    #[test]
    fn test_missing_properties_file() {
        let temp = TempDir::new().unwrap();
        let err = Project::load(temp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::PropertiesNotFound { .. }));
    }

    #[test]
    fn test_missing_name_property() {
        let temp = write_project("main=appinventor.ai_test.Hello.Screen1\n", &["Screen1"]);
        let err = Project::load(temp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::MissingProperty { key } if key == "name"));
    }

    #[test]
    fn test_unqualified_main_class() {
        let temp = write_project("main=Screen1\nname=Hello\n", &["Screen1"]);
        let err = Project::load(temp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidMainClass { .. }));
    }

    #[test]
    fn test_main_source_must_exist() {
        let temp = write_project(PROPS, &["Screen2"]);
        let err = Project::load(temp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::MainSourceMissing { .. }));
    }
}
