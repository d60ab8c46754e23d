//! Common test utilities and helpers
//!
//! Builds a complete runtime files directory, a fake Java home and a small
//! App Inventor project in a temporary directory, plus a scripted tool
//! runner that stands in for the real build tools.

#![allow(dead_code)]

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tempfile::TempDir;
use yailbuild::core::global_config::GlobalConfig;
use yailbuild::core::project::Project;
use yailbuild::infra::process::{CommandSpec, RunnerError, ToolOutput, ToolRunner};
use yailbuild::infra::toolchain::HostFamily;

/// Main class of the fixture project
pub const MAIN_CLASS: &str = "appinventor.ai_test.Hello.Screen1";

/// Component type prefix used by the fixture catalog
pub const RUNTIME: &str = "com.google.appinventor.components.runtime";

/// PNG signature followed by padding
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Built-in catalog shipped in the fixture's runtime files
pub const CATALOG: &str = r#"[
  {"type": "com.google.appinventor.components.runtime.Form",
   "permissions": [], "libraries": [], "native": [], "assets": [],
   "activities": [], "broadcastReceivers": []},
  {"type": "com.google.appinventor.components.runtime.Button",
   "permissions": [], "libraries": [], "native": [], "assets": [],
   "activities": [], "broadcastReceivers": []},
  {"type": "com.google.appinventor.components.runtime.Twitter",
   "permissions": ["android.permission.INTERNET"],
   "libraries": ["twitter4j.jar", "twitter4jmedia.jar"], "native": [], "assets": [],
   "activities": ["<activity android:name=\"com.google.appinventor.components.runtime.WebViewActivity\" />"],
   "broadcastReceivers": []},
  {"type": "com.google.appinventor.components.runtime.Texting",
   "permissions": ["android.permission.SEND_SMS", "android.permission.INTERNET"],
   "libraries": ["google-api-client.jar"], "native": [], "assets": [],
   "activities": [], "broadcastReceivers": [],
   "broadcastReceiver": ["com.google.appinventor.components.runtime.util.SmsBroadcastReceiver,com.google.android.apps.googlevoice.SMS_RECEIVED,android.provider.Telephony.SMS_RECEIVED"]},
  {"type": "com.google.appinventor.components.runtime.FtcRobotController",
   "permissions": [], "libraries": [], "native": [], "assets": [],
   "activities": [], "broadcastReceivers": []},
  {"type": "com.google.appinventor.components.runtime.Sound",
   "permissions": [], "libraries": [], "native": ["libsound.so", "libsound.so-v7a"],
   "assets": ["click.wav"], "activities": [], "broadcastReceivers": []}
]"#;

/// Extension type installed by [`Fixture::add_extension`]
pub const EXTENSION: &str = "com.example.pinger.Pinger";

/// Full component type name
pub fn component(simple: &str) -> String {
    format!("{RUNTIME}.{simple}")
}

/// Runtime files, Java home and project in one temporary directory
pub struct Fixture {
    /// Owns everything below
    pub dir: TempDir,
}

impl Fixture {
    /// Create a fixture whose project has one screen with user code
    pub fn new() -> Self {
        let fixture = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        };
        fixture.write_runtime_files();
        fixture.write_java_home();
        fixture.write_project();
        fixture
    }

    /// Root of the temporary directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Directory holding `files/` and `tools/`
    pub fn files_dir(&self) -> PathBuf {
        self.dir.path().join("runtime")
    }

    /// Fake Java installation
    pub fn java_home(&self) -> PathBuf {
        self.dir.path().join("jdk")
    }

    /// Project root
    pub fn project_dir(&self) -> PathBuf {
        self.dir.path().join("app")
    }

    /// Build directory of the project
    pub fn build_dir(&self) -> PathBuf {
        self.project_dir().join("build")
    }

    /// Pre-dex cache used by fixture builds
    pub fn dex_cache(&self) -> PathBuf {
        self.dir.path().join("dex-cache")
    }

    /// Configuration pointing at the fixture's runtime files
    pub fn config(&self) -> GlobalConfig {
        let mut config = GlobalConfig::default();
        config.runtime.files_dir = Some(self.files_dir());
        config.runtime.java_home = Some(self.java_home());
        config
    }

    /// Write [`Fixture::config`] as TOML and return its path
    pub fn write_config(&self) -> PathBuf {
        let path = self.dir.path().join("config.toml");
        self.config()
            .save_to_path(&path)
            .expect("Failed to write config");
        path
    }

    /// Load the fixture project
    pub fn project(&self) -> Project {
        Project::load(&self.project_dir()).expect("Failed to load fixture project")
    }

    /// Create a file below the temporary root
    pub fn create_file(&self, name: &str, content: impl AsRef<[u8]>) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Replace the main screen's source
    pub fn write_main_source(&self, content: &str) {
        self.create_file("app/src/appinventor/ai_test/Hello/Screen1.yail", content);
    }

    /// Add a second screen
    pub fn add_screen(&self, name: &str) {
        self.create_file(
            &format!("app/src/appinventor/ai_test/Hello/{name}.yail"),
            format!("(define-form appinventor.ai_test.Hello.{name} {name})\n"),
        );
    }

    /// Install [`EXTENSION`] under the project's `assets/external_comps/`
    pub fn add_extension(&self) {
        let files = format!("app/assets/external_comps/{EXTENSION}/files");
        self.create_file(
            &format!("{files}/component_build_infos.json"),
            format!(
                r#"[{{"type": "{EXTENSION}", "permissions": ["android.permission.VIBRATE"],
                     "libraries": [], "native": [], "assets": ["ping.mp3"],
                     "activities": [], "broadcastReceivers": []}}]"#
            ),
        );
        self.create_file(&format!("{files}/AndroidRuntime.jar"), "jar:pinger");
        self.create_file(&format!("{files}/ping.mp3"), "ID3");
    }

    /// Add the robot controller bundle and its debug keystore to the runtime files
    pub fn add_robot_bundle(&self) {
        self.create_file("runtime/files/ftc.debug.keystore", "debug keystore");
        self.create_file("runtime/files/ftc/res.list", "values/ftc.xml");
        self.create_file("runtime/files/ftc/res/values/ftc.xml", "<resources/>");
        self.create_file("runtime/files/ftc/assets.list", "blocks/robot.js");
        self.create_file("runtime/files/ftc/assets/blocks/robot.js", "// blocks");
        self.create_file("runtime/files/ftc/libs.list", "armeabi-v7a/libRobotCore.so");
        self.create_file("runtime/files/ftc/libs/armeabi-v7a/libRobotCore.so", "elf");
    }

    fn write_runtime_files(&self) {
        for jar in [
            "kawa.jar",
            "acra-4.4.0.jar",
            "AndroidRuntime.jar",
            "android.jar",
            "dx.jar",
            "twitter4j.jar",
            "twitter4jmedia.jar",
            "google-api-client.jar",
        ] {
            self.create_file(&format!("runtime/files/{jar}"), format!("jar:{jar}"));
        }
        self.create_file("runtime/files/runtime.scm", "(define-syntax runtime)\n");
        self.create_file("runtime/files/simple_components_build_info.json", CATALOG);
        self.create_file("runtime/files/ya.png", PNG_BYTES);
        self.create_file("runtime/files/armeabi/libsound.so", "elf");
        self.create_file("runtime/files/armeabi-v7a/libsound.so", "elf-v7a");
        self.create_file("runtime/files/click.wav", "RIFF");

        let host = HostFamily::detect();
        for tool in [host.aapt_resource(), host.zipalign_resource()]
            .into_iter()
            .flatten()
        {
            self.create_file(&format!("runtime/{tool}"), "#!/bin/sh\n");
        }
    }

    fn write_java_home(&self) {
        for tool in ["java", "jarsigner", "javac"] {
            self.create_file(&format!("jdk/bin/{tool}"), "#!/bin/sh\n");
        }
    }

    fn write_project(&self) {
        self.create_file(
            "app/youngandroidproject/project.properties",
            format!("main={MAIN_CLASS}\nname=Hello\nassets=../assets\nsource=../src\nbuild=../build\nversioncode=3\nversionname=1.2\n"),
        );
        self.write_main_source(
            "#|\n$Source $Yail\n|#\n\n(define-form appinventor.ai_test.Hello.Screen1 Screen1)\n",
        );
        self.create_file("app/android.keystore", "keystore");
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool runner that imitates the build tools by creating their outputs
#[derive(Debug, Default)]
pub struct FakeTools {
    /// Class files (relative to the `-d` directory) the compiler produces
    pub classes: Vec<PathBuf>,
    /// Dex merges into `classes.dex` that exit non-zero before one succeeds
    pub failing_merges: AtomicUsize,
    /// Tool (file name) that times out
    pub timeout: Option<&'static str>,
    /// Every command run, in order
    pub calls: Mutex<Vec<CommandSpec>>,
}

impl FakeTools {
    /// Runner whose compiler produces the classes of `qualified_names`
    pub fn compiling(qualified_names: &[&str]) -> Self {
        Self {
            classes: qualified_names
                .iter()
                .map(|name| {
                    let mut path: PathBuf = name.split('.').collect();
                    path.set_extension("class");
                    path
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Make the first `n` primary dex merges fail
    pub fn with_failing_merges(self, n: usize) -> Self {
        self.failing_merges.store(n, Ordering::SeqCst);
        self
    }

    /// Make `tool` time out
    pub fn timing_out(mut self, tool: &'static str) -> Self {
        self.timeout = Some(tool);
        self
    }

    /// Commands run by the tool with this file name
    pub fn calls_to(&self, tool: &str) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .iter()
            .filter(|spec| tool_name(spec) == tool)
            .cloned()
            .collect()
    }

    /// Dex merges into `output_name`, in order
    pub fn merges_into(&self, output_name: &str) -> Vec<CommandSpec> {
        self.calls_to("java")
            .into_iter()
            .filter(|spec| {
                output_of(spec).is_some_and(|out| out.file_name().is_some_and(|n| n == output_name))
            })
            .collect()
    }

    fn respond(&self, spec: &CommandSpec) -> Result<ToolOutput, RunnerError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(spec.clone());

        let tool = tool_name(spec);
        if self.timeout == Some(tool.as_str()) {
            return Err(RunnerError::Timeout {
                program: spec.program_name(),
                timeout_seconds: 1,
            });
        }

        match tool.as_str() {
            "java" if spec.has_arg("kawa.repl") => {
                let classes_dir = value_after(spec, "-d").expect("kawa without -d");
                for class in &self.classes {
                    touch(&classes_dir.join(class));
                }
                Ok(ToolOutput {
                    stderr: b"Screen1.yail:4:2: warning - no declaration seen for x\n".to_vec(),
                    ..ToolOutput::exited(0)
                })
            }
            "java" if spec.has_arg("--dex") => {
                let output = output_of(spec).expect("dx without --output");
                let primary = output.file_name().is_some_and(|n| n == "classes.dex");
                if primary
                    && self
                        .failing_merges
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                        .is_ok()
                {
                    return Ok(ToolOutput {
                        stderr: b"trouble writing output: Too many method references\n".to_vec(),
                        ..ToolOutput::exited(2)
                    });
                }
                touch(&output);
                Ok(ToolOutput::exited(0))
            }
            "aapt" if spec.has_arg("package") => {
                if let Some(apk) = value_after(spec, "-F") {
                    touch(&apk);
                }
                Ok(ToolOutput::exited(0))
            }
            "zipalign" => {
                let aligned = spec.args.last().map(PathBuf::from).expect("zipalign output");
                touch(&aligned);
                Ok(ToolOutput::exited(0))
            }
            _ => Ok(ToolOutput::exited(0)),
        }
    }
}

impl ToolRunner for FakeTools {
    fn run(
        &self,
        spec: &CommandSpec,
        _timeout: Duration,
    ) -> impl Future<Output = Result<ToolOutput, RunnerError>> + Send {
        std::future::ready(self.respond(spec))
    }
}

/// File name of the program a command runs
pub fn tool_name(spec: &CommandSpec) -> String {
    Path::new(&spec.program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Argument following `flag`
pub fn value_after(spec: &CommandSpec, flag: &str) -> Option<PathBuf> {
    let at = spec.args.iter().position(|a| a == flag)?;
    spec.args.get(at + 1).map(PathBuf::from)
}

/// Whether some argument is a path whose file name is `name`
pub fn has_file_arg(spec: &CommandSpec, name: &str) -> bool {
    spec.args
        .iter()
        .any(|a| Path::new(a).file_name().is_some_and(|n| n == name))
}

/// Path given as `--output=<path>`
pub fn output_of(spec: &CommandSpec) -> Option<PathBuf> {
    spec.args.iter().find_map(|a| {
        a.to_str()?
            .strip_prefix("--output=")
            .map(PathBuf::from)
    })
}

/// Input arguments of a dex merge (everything after `--output=`)
pub fn dex_inputs(spec: &CommandSpec) -> Vec<PathBuf> {
    spec.args
        .iter()
        .skip_while(|a| !a.to_string_lossy().starts_with("--output="))
        .skip(1)
        .map(PathBuf::from)
        .collect()
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(path, b"fake").expect("Failed to write tool output");
}
