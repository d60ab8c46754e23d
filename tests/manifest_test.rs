//! Manifest synthesis tests
//!
//! Renders manifests for the fixture project and parses them back with
//! quick-xml to check structure rather than text.

mod common;

use std::collections::BTreeSet;

use common::{component, Fixture, CATALOG};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use yailbuild::core::build_info::Catalog;
use yailbuild::core::global_config::RobotIdentity;
use yailbuild::core::manifest::{
    self, ManifestInput, FIREBASE_COMPONENT, NEAR_FIELD_COMPONENT, ROBOT_CONTROLLER_COMPONENT,
};
use yailbuild::core::project::Project;
use yailbuild::core::requirements::Requirements;
use yailbuild::core::resolver::ComponentSets;

/// One element of a parsed manifest
#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn element(start: &BytesStart<'_>) -> Element {
    Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes: start
            .attributes()
            .map(|a| {
                let a = a.expect("malformed attribute");
                (
                    String::from_utf8_lossy(a.key.as_ref()).into_owned(),
                    a.unescape_value().expect("bad escape").into_owned(),
                )
            })
            .collect(),
    }
}

/// Parse the whole document, failing on any XML error
fn parse(xml: &str) -> Vec<Element> {
    let mut reader = Reader::from_str(xml);
    let mut elements = Vec::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                elements.push(element(&e));
            }
            Ok(Event::Empty(e)) => elements.push(element(&e)),
            Ok(Event::End(_)) => depth -= 1,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("manifest is not well-formed: {e}\n{xml}"),
        }
    }
    assert_eq!(depth, 0, "unbalanced manifest:\n{xml}");
    elements
}

fn render(project: &Project, simple_or_full: &[&str], companion: bool) -> String {
    let catalog = Catalog::parse("test", CATALOG).unwrap();
    let types: BTreeSet<String> = simple_or_full
        .iter()
        .map(|t| {
            if t.contains('.') {
                (*t).to_string()
            } else {
                component(t)
            }
        })
        .collect();
    let mut catalog_entries = catalog.components().to_vec();
    for extra in [FIREBASE_COMPONENT, NEAR_FIELD_COMPONENT] {
        catalog_entries.extend(
            yailbuild::core::build_info::parse_catalog(
                "extra",
                &format!(
                    r#"[{{"type": "{extra}", "permissions": [], "libraries": [], "native": [],
                         "assets": [], "activities": [], "broadcastReceivers": []}}]"#
                ),
            )
            .unwrap(),
        );
    }
    let catalog = Catalog::from_components(catalog_entries);
    let components = ComponentSets::partition(&types, &catalog);
    assert!(components.extensions.is_empty());

    let requirements = Requirements::new();
    requirements
        .populate_all(catalog.components(), &[], &components, project.uses_location)
        .unwrap();
    let robot_identity = RobotIdentity::default();
    let robot = manifest::is_robot_build(&components, companion);

    manifest::render(&ManifestInput {
        project,
        components: &components,
        requirements: &requirements,
        companion,
        robot: robot.then_some(&robot_identity),
    })
}

fn min_sdk(elements: &[Element]) -> Option<&str> {
    elements
        .iter()
        .filter(|e| e.name == "uses-sdk")
        .find_map(|e| e.attr("android:minSdkVersion"))
}

#[test]
fn test_exactly_one_launcher_activity() {
    let fixture = Fixture::new();
    fixture.add_screen("Screen2");
    fixture.add_screen("Screen3");
    let project = fixture.project();

    let elements = parse(&render(&project, &["Form", "Button"], false));

    let launchers = elements
        .iter()
        .filter(|e| e.attr("android:name") == Some("android.intent.category.LAUNCHER"))
        .count();
    assert_eq!(launchers, 1);

    let activities: Vec<&str> = elements
        .iter()
        .filter(|e| e.name == "activity")
        .filter_map(|e| e.attr("android:name"))
        .collect();
    assert_eq!(activities.len(), 3);
    assert!(activities.contains(&".Screen1"));
    assert!(activities.contains(&"appinventor.ai_test.Hello.Screen2"));
}

#[test]
fn test_default_min_sdk_and_identity() {
    let fixture = Fixture::new();
    let project = fixture.project();

    let elements = parse(&render(&project, &["Form"], false));

    assert_eq!(min_sdk(&elements), Some("4"));
    let root = &elements[0];
    assert_eq!(root.name, "manifest");
    assert_eq!(root.attr("package"), Some("appinventor.ai_test.Hello"));
    assert_eq!(root.attr("android:versionCode"), Some("3"));
    assert_eq!(root.attr("android:versionName"), Some("1.2"));

    let application = elements.iter().find(|e| e.name == "application").unwrap();
    assert_eq!(application.attr("android:label"), Some("Hello"));
    assert_eq!(application.attr("android:debuggable"), Some("false"));
}

#[test]
fn test_firebase_raises_min_sdk_outside_companion() {
    let fixture = Fixture::new();
    let project = fixture.project();

    let release = parse(&render(&project, &["Form", FIREBASE_COMPONENT], false));
    assert_eq!(min_sdk(&release), Some("10"));

    let companion = parse(&render(&project, &["Form", FIREBASE_COMPONENT], true));
    assert_eq!(min_sdk(&companion), Some("4"));
}

#[test]
fn test_near_field_main_activity_handles_tags() {
    let fixture = Fixture::new();
    let project = fixture.project();

    let elements = parse(&render(&project, &["Form", NEAR_FIELD_COMPONENT], false));

    let main = elements
        .iter()
        .find(|e| e.name == "activity" && e.attr("android:name") == Some(".Screen1"))
        .unwrap();
    assert_eq!(main.attr("android:launchMode"), Some("singleTask"));
    assert!(elements
        .iter()
        .any(|e| e.attr("android:name") == Some("android.nfc.action.NDEF_DISCOVERED")));
    assert!(elements
        .iter()
        .any(|e| e.attr("android:mimeType") == Some("text/plain")));
}

#[test]
fn test_names_are_cleaned_and_escaped() {
    let fixture = Fixture::new();
    let mut project = fixture.project();
    project.app_name = Some("Tom & <Jerry>".to_string());
    project.version_name = Some("1.0 & up".to_string());

    let elements = parse(&render(&project, &["Form"], false));

    let application = elements.iter().find(|e| e.name == "application").unwrap();
    assert_eq!(application.attr("android:label"), Some("Tom and <Jerry>"));
    assert_eq!(elements[0].attr("android:versionName"), Some("1.0 and up"));
}

#[test]
fn test_permissions_are_declared_once() {
    let fixture = Fixture::new();
    let project = fixture.project();

    let elements = parse(&render(&project, &["Form", "Texting", "Twitter"], false));

    let permissions: Vec<&str> = elements
        .iter()
        .filter(|e| e.name == "uses-permission")
        .filter_map(|e| e.attr("android:name"))
        .collect();
    assert_eq!(
        permissions,
        vec!["android.permission.INTERNET", "android.permission.SEND_SMS"]
    );
}

#[test]
fn test_robot_controller_manifest_is_well_formed() {
    let fixture = Fixture::new();
    let project = fixture.project();

    let elements = parse(&render(&project, &["Form", ROBOT_CONTROLLER_COMPONENT], false));

    let identity = RobotIdentity::default();
    assert_eq!(elements[0].attr("package"), Some(identity.package.as_str()));
    assert_eq!(min_sdk(&elements), Some(identity.min_sdk.as_str()));
    assert!(elements
        .iter()
        .any(|e| e.attr("android:name") == Some("android.hardware.usb.accessory")));
}

#[test]
fn test_legacy_receiver_declaration_becomes_receiver() {
    let fixture = Fixture::new();
    let project = fixture.project();

    let elements = parse(&render(&project, &["Form", "Texting"], false));

    let at = elements
        .iter()
        .position(|e| {
            e.name == "receiver"
                && e.attr("android:name")
                    == Some("com.google.appinventor.components.runtime.util.SmsBroadcastReceiver")
        })
        .expect("receiver not declared");
    let actions: Vec<&str> = elements[at + 1..]
        .iter()
        .take_while(|e| e.name == "intent-filter" || e.name == "action")
        .filter(|e| e.name == "action")
        .filter_map(|e| e.attr("android:name"))
        .collect();
    assert_eq!(
        actions,
        vec![
            "com.google.android.apps.googlevoice.SMS_RECEIVED",
            "android.provider.Telephony.SMS_RECEIVED",
        ]
    );
}

#[test]
fn test_companion_manifest() {
    let fixture = Fixture::new();
    let project = fixture.project();

    let elements = parse(&render(&project, &["Form", ROBOT_CONTROLLER_COMPONENT], true));

    // Companion builds never become robot controllers
    assert_eq!(elements[0].attr("package"), Some("appinventor.ai_test.Hello"));
    let application = elements.iter().find(|e| e.name == "application").unwrap();
    assert_eq!(
        application.attr("android:name"),
        Some("com.google.appinventor.components.runtime.ReplApplication")
    );
    let main = elements
        .iter()
        .find(|e| e.name == "activity" && e.attr("android:name") == Some(".Screen1"))
        .unwrap();
    assert_eq!(main.attr("android:launchMode"), Some("singleTop"));
    assert!(elements.iter().any(|e| {
        e.name == "uses-permission" && e.attr("android:name") == Some("android.permission.READ_LOGS")
    }));
    let optional_features = elements
        .iter()
        .filter(|e| e.name == "uses-feature" && e.attr("android:required") == Some("false"))
        .count();
    assert_eq!(optional_features, 9);
}
