//! YAIL compilation
//!
//! Compiles every source unit to JVM classes with the Kawa compiler running
//! in a child JVM.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::defaults;
use crate::core::project::{Project, SourceDescriptor};
use crate::error::FilesystemError;
use crate::infra::filesystem;
use crate::infra::process::CommandSpec;

/// Whether any source holds user logic.
///
/// A unit has logic if some line begins with `(`.
pub fn has_user_code(sources: &[SourceDescriptor]) -> Result<bool, FilesystemError> {
    for source in sources {
        let text = filesystem::read_file(&source.path)?;
        if text.lines().any(|line| line.trim_start().starts_with('(')) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Join classpath entries with the platform separator
pub fn join_classpath(entries: &[PathBuf]) -> Result<OsString, String> {
    std::env::join_paths(entries).map_err(|e| e.to_string())
}

/// Inputs of one compiler invocation
#[derive(Debug, Clone)]
pub struct KawaInvocation<'a> {
    pub java: &'a Path,
    pub child_process_ram_mb: u32,
    pub classpath: &'a OsString,
    pub yail_runtime: &'a Path,
    pub classes_dir: &'a Path,
    /// Package the generated classes belong to
    pub package: &'a str,
    pub sources: &'a [SourceDescriptor],
}

impl KawaInvocation<'_> {
    /// Heap for the compiler JVM, leaving headroom for its own overhead
    pub fn heap_mb(&self) -> u32 {
        self.child_process_ram_mb
            .saturating_sub(defaults::COMPILER_RAM_OVERHEAD_MB)
            .max(1)
    }

    /// The compiler command line
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(self.java)
            .arg("-Dfile.encoding=UTF-8")
            .arg(format!("-mx{}M", self.heap_mb()))
            .arg("-cp")
            .arg(self.classpath.clone())
            .arg("kawa.repl")
            .arg("-f")
            .arg(self.yail_runtime)
            .arg("-d")
            .arg(self.classes_dir)
            .arg("-P")
            .arg(format!("{}.", self.package))
            .arg("-C")
            .args(self.sources.iter().map(|s| s.path.as_os_str().to_os_string()))
            .arg(self.yail_runtime)
    }
}

/// First source whose class file was not produced
pub fn missing_class<'p>(project: &'p Project, classes_dir: &Path) -> Option<&'p SourceDescriptor> {
    project
        .sources
        .iter()
        .find(|source| !classes_dir.join(source.class_file()).is_file())
}

/// Counts of compiler diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub warnings: usize,
    pub errors: usize,
}

/// Count warnings and errors in compiler output
pub fn count_diagnostics(output: &str) -> Diagnostics {
    let mut counts = Diagnostics::default();
    // file:line:col: message, with "warning - " marking warnings
    let Ok(diagnostic) =
        Regex::new(r"^(?P<file>.+?):(?P<line>\d+):(?P<col>\d+): (?P<warning>warning - )?(?P<message>.*)$")
    else {
        return counts;
    };
    for captures in output.lines().filter_map(|l| diagnostic.captures(l)) {
        if captures.name("warning").is_some() {
            counts.warnings += 1;
        } else {
            counts.errors += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(dir: &Path, name: &str, body: &str) -> SourceDescriptor {
        let path = dir.join(format!("{name}.yail"));
        std::fs::write(&path, body).unwrap();
        SourceDescriptor::new(format!("appinventor.ai_test.Hello.{name}"), path)
    }

    #[test]
    fn test_user_code_detection() {
        let temp = TempDir::new().unwrap();
        let empty = source(temp.path(), "Screen1", "#|\n$Source $Yail\n|#\n");
        assert!(!has_user_code(std::slice::from_ref(&empty)).unwrap());

        let code = source(temp.path(), "Screen2", "#|\n|#\n  (define-form Screen2)\n");
        assert!(has_user_code(&[empty, code]).unwrap());
    }

    #[test]
    fn test_kawa_command_line() {
        let temp = TempDir::new().unwrap();
        let sources = vec![source(temp.path(), "Screen1", "(x)")];
        let classpath = join_classpath(&[PathBuf::from("/r/kawa.jar"), PathBuf::from("/r/android.jar")])
            .unwrap();
        let invocation = KawaInvocation {
            java: Path::new("/jdk/bin/java"),
            child_process_ram_mb: 2048,
            classpath: &classpath,
            yail_runtime: Path::new("/r/runtime.scm"),
            classes_dir: Path::new("/b/classes"),
            package: "appinventor.ai_test.Hello",
            sources: &sources,
        };
        let spec = invocation.command();
        let args: Vec<String> = spec.args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(spec.program_name(), "/jdk/bin/java");
        assert_eq!(args[0], "-Dfile.encoding=UTF-8");
        assert_eq!(args[1], "-mx1848M");
        assert!(args.contains(&"appinventor.ai_test.Hello.".to_string()));
        assert_eq!(args.last().unwrap(), "/r/runtime.scm");
        let c = args.iter().position(|a| a == "-C").unwrap();
        assert!(args[c + 1].ends_with("Screen1.yail"));
    }

    #[test]
    fn test_missing_class_names_unit() {
        let temp = TempDir::new().unwrap();
        let project = Project {
            name: "Hello".into(),
            main_class: "appinventor.ai_test.Hello.Screen1".into(),
            sources: vec![
                source(temp.path(), "Screen1", "(x)"),
                source(temp.path(), "Screen2", "(y)"),
            ],
            assets_dir: temp.path().join("assets"),
            build_dir: temp.path().join("build"),
            icon: None,
            version_code: None,
            version_name: None,
            app_name: None,
            uses_location: false,
        };
        let classes = temp.path().join("classes");
        filesystem::write_file(&classes.join("appinventor/ai_test/Hello/Screen1.class"), "").unwrap();
        assert_eq!(missing_class(&project, &classes).unwrap().unit_name(), "Screen2");

        filesystem::write_file(&classes.join("appinventor/ai_test/Hello/Screen2.class"), "").unwrap();
        assert!(missing_class(&project, &classes).is_none());
    }

    #[test]
    fn test_count_diagnostics() {
        let output = "\
/tmp/src/Screen1.yail:3:5: warning - no declaration seen for foo
/tmp/src/Screen1.yail:9:1: unbound location bar
(compiling /tmp/src/Screen1.yail to appinventor.Screen1)
";
        assert_eq!(
            count_diagnostics(output),
            Diagnostics { warnings: 1, errors: 1 }
        );
    }
}
