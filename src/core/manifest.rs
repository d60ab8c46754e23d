//! Android manifest synthesis
//!
//! Renders `AndroidManifest.xml` from the project, the components it uses and
//! their aggregated requirements.

use std::fmt::Write as _;
use std::path::Path;

use quick_xml::escape::escape;

use crate::config::defaults;
use crate::core::build_info::RequirementCategory;
use crate::core::global_config::RobotIdentity;
use crate::core::project::Project;
use crate::core::requirements::Requirements;
use crate::core::resolver::ComponentSets;
use crate::error::{BuildError, Stage};
use crate::infra::filesystem;

/// Component needing a newer minimum SDK
pub const FIREBASE_COMPONENT: &str = "com.google.appinventor.components.runtime.FirebaseDB";

/// Component that makes the main screen respond to NFC tags
pub const NEAR_FIELD_COMPONENT: &str = "com.google.appinventor.components.runtime.NearField";

/// Component that turns the build into a robot controller app
pub const ROBOT_CONTROLLER_COMPONENT: &str =
    "com.google.appinventor.components.runtime.FtcRobotController";

const REPL_APPLICATION: &str = "com.google.appinventor.components.runtime.ReplApplication";
const MULTIDEX_APPLICATION: &str =
    "com.google.appinventor.components.runtime.multidex.MultiDexApplication";

/// Non-required hardware the companion may use
const COMPANION_SOFT_FEATURES: [&str; 9] = [
    "android.hardware.bluetooth",
    "android.hardware.location",
    "android.hardware.telephony",
    "android.hardware.location.network",
    "android.hardware.location.gps",
    "android.hardware.microphone",
    "android.hardware.touchscreen",
    "android.hardware.camera",
    "android.hardware.camera.autofocus",
];

const ROBOT_APPLICATION: &str = include_str!("robot_application.xml");

/// Everything the manifest depends on
#[derive(Debug, Clone, Copy)]
pub struct ManifestInput<'a> {
    pub project: &'a Project,
    pub components: &'a ComponentSets,
    pub requirements: &'a Requirements,
    pub companion: bool,
    /// Release identity when building a robot controller
    pub robot: Option<&'a RobotIdentity>,
}

/// A receiver declared in the legacy `"name,action1,action2"` format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyReceiver {
    pub name: String,
    pub actions: Vec<String>,
}

impl LegacyReceiver {
    /// Parse the legacy format; `None` for an empty name
    pub fn parse(declaration: &str) -> Option<Self> {
        let mut parts = declaration.split(',').map(str::trim);
        let name = parts.next().filter(|n| !n.is_empty())?.to_string();
        let actions = parts.filter(|a| !a.is_empty()).map(str::to_string).collect();
        Some(Self { name, actions })
    }

    fn render(&self, out: &mut String) {
        let _ = writeln!(out, "<receiver android:name=\"{}\" >", escape(&self.name));
        if !self.actions.is_empty() {
            out.push_str("  <intent-filter>\n");
            for action in &self.actions {
                let _ = writeln!(out, "    <action android:name=\"{}\" />", escape(action));
            }
            out.push_str("  </intent-filter>\n");
        }
        out.push_str("</receiver>\n");
    }
}

/// Whether a build is a robot controller build
pub fn is_robot_build(components: &ComponentSets, companion: bool) -> bool {
    !companion && components.has_builtin(ROBOT_CONTROLLER_COMPONENT)
}

/// `&` breaks resource packaging in names
fn clean_name(name: &str) -> String {
    name.replace('&', "and")
}

/// Render the manifest document
pub fn render(input: &ManifestInput<'_>) -> String {
    let project = input.project;
    let companion = input.companion;
    let near_field = !companion && input.components.has_builtin(NEAR_FIELD_COMPONENT);

    let (package, version_code, version_name) = match input.robot {
        Some(robot) => (
            robot.package.clone(),
            robot.version_code.clone(),
            robot.version_name.clone(),
        ),
        None => (
            project.package_name().to_string(),
            project.version_code_or_default().to_string(),
            project
                .version_name
                .as_deref()
                .map_or_else(|| defaults::DEFAULT_VERSION_NAME.to_string(), clean_name),
        ),
    };

    let mut min_sdk = defaults::DEFAULT_MIN_SDK.to_string();
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    let _ = writeln!(
        out,
        "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\" \
         package=\"{}\" android:versionCode=\"{}\" android:versionName=\"{}\" >",
        escape(&package),
        escape(&version_code),
        escape(&version_name)
    );

    if companion {
        for feature in COMPANION_SOFT_FEATURES {
            let _ = writeln!(
                out,
                "  <uses-feature android:name=\"{feature}\" android:required=\"false\" />"
            );
        }
        out.push_str("  <uses-feature android:name=\"android.hardware.wifi\" />\n");
    }

    if !companion && input.components.has_builtin(FIREBASE_COMPONENT) {
        min_sdk = defaults::FIREBASE_MIN_SDK.to_string();
    }

    if let Some(robot) = input.robot {
        out.push_str("  <uses-feature android:name=\"android.hardware.usb.accessory\" />\n");
        out.push_str("  <uses-feature android:glEsVersion=\"0x00020000\" />\n");
        out.push_str("  <uses-feature android:name=\"android.hardware.camera\" />\n");
        out.push_str("  <uses-feature android:name=\"android.hardware.bluetooth\" />\n");
        min_sdk.clone_from(&robot.min_sdk);
    }

    for permission in input.requirements.union(RequirementCategory::Permissions) {
        let _ = writeln!(
            out,
            "  <uses-permission android:name=\"{}\" />",
            escape(&permission)
        );
    }
    if companion {
        out.push_str("  <uses-permission android:name=\"android.permission.READ_LOGS\" />\n");
    }

    let _ = writeln!(out, "  <uses-sdk android:minSdkVersion=\"{}\" />", escape(&min_sdk));

    if let Some(robot) = input.robot {
        let _ = writeln!(
            out,
            "  <uses-sdk android:targetSdkVersion=\"{}\" />",
            escape(&robot.target_sdk)
        );
        out.push_str(ROBOT_APPLICATION);
        if !ROBOT_APPLICATION.ends_with('\n') {
            out.push('\n');
        }
    } else {
        let label = project
            .app_name
            .as_deref()
            .map(clean_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| project.name.clone());
        let application = if companion {
            REPL_APPLICATION
        } else {
            MULTIDEX_APPLICATION
        };
        let _ = writeln!(
            out,
            "  <application android:debuggable=\"false\" android:label=\"{}\" \
             android:icon=\"@drawable/ya\" android:name=\"{application}\" >",
            escape(&label)
        );

        for source in &project.sources {
            let is_main = project.is_main(source);
            let name = if is_main {
                format!(".{}", project.class_name())
            } else {
                source.qualified_name.clone()
            };
            let _ = write!(out, "    <activity android:name=\"{}\" ", escape(&name));
            if near_field && is_main {
                out.push_str("android:launchMode=\"singleTask\" ");
            } else if companion && is_main {
                out.push_str("android:launchMode=\"singleTop\" ");
            }
            out.push_str("android:windowSoftInputMode=\"stateHidden\" ");
            out.push_str("android:configChanges=\"orientation|keyboardHidden|keyboard\">\n");

            out.push_str("      <intent-filter>\n");
            out.push_str("        <action android:name=\"android.intent.action.MAIN\" />\n");
            if is_main {
                out.push_str(
                    "        <category android:name=\"android.intent.category.LAUNCHER\" />\n",
                );
            }
            out.push_str("      </intent-filter>\n");

            if near_field && is_main {
                out.push_str("      <intent-filter>\n");
                out.push_str(
                    "        <action android:name=\"android.nfc.action.NDEF_DISCOVERED\" />\n",
                );
                out.push_str(
                    "        <category android:name=\"android.intent.category.DEFAULT\" />\n",
                );
                out.push_str("        <data android:mimeType=\"text/plain\" />\n");
                out.push_str("      </intent-filter>\n");
            }
            out.push_str("    </activity>\n");
        }
    }

    // Component-declared activities and receivers are complete XML fragments.
    for category in [
        RequirementCategory::Activities,
        RequirementCategory::BroadcastReceivers,
    ] {
        for fragments in input.requirements.get(category).values() {
            for fragment in fragments {
                out.push_str(fragment);
                if !fragment.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }

    for declaration in input
        .requirements
        .union(RequirementCategory::LegacyBroadcastReceiver)
    {
        if let Some(receiver) = LegacyReceiver::parse(&declaration) {
            receiver.render(&mut out);
        }
    }

    out.push_str("  </application>\n");
    out.push_str("</manifest>\n");
    out
}

/// Render the manifest and write it to `path`
pub fn write(path: &Path, input: &ManifestInput<'_>) -> Result<(), BuildError> {
    let manifest = render(input);
    filesystem::write_file(path, &manifest).map_err(|e| BuildError::stage(Stage::Manifest, e))?;
    tracing::info!(path = %path.display(), "Wrote manifest");
    Ok(())
}
