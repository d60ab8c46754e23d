//! Project inspection
//!
//! Resolves a project's components and aggregates their requirements the
//! same way a build does, without running any tool.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::build_info::{Catalog, RequirementCategory};
use crate::core::global_config::RobotIdentity;
use crate::core::manifest::{self, ManifestInput};
use crate::core::project::Project;
use crate::core::requirements::{RequirementMap, Requirements};
use crate::core::resolver::{self, ComponentSets, ExtensionLocator};
use crate::error::BuildError;

/// What a build of the project would need
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub project: String,
    pub main_class: String,
    pub sources: Vec<String>,
    pub builtin: BTreeSet<String>,
    pub extensions: BTreeSet<String>,
    pub robot: bool,
    /// Requirement maps keyed by descriptor field
    pub requirements: BTreeMap<&'static str, RequirementMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
}

/// Inspect `project` as a build with `component_types` would see it
pub fn inspect(
    project: &Project,
    component_types: &BTreeSet<String>,
    catalog: &Catalog,
    robot_identity: &RobotIdentity,
    companion: bool,
    with_manifest: bool,
) -> Result<InspectReport, BuildError> {
    let components = ComponentSets::partition(component_types, catalog);
    let locator = ExtensionLocator::new(&project.assets_dir);
    let extension_infos = resolver::load_extension_infos(&locator, &components.extensions)?;

    let requirements = Requirements::new();
    requirements.populate_all(
        catalog.components(),
        &extension_infos,
        &components,
        project.uses_location,
    )?;

    let robot = manifest::is_robot_build(&components, companion);
    let rendered = with_manifest.then(|| {
        manifest::render(&ManifestInput {
            project,
            components: &components,
            requirements: &requirements,
            companion,
            robot: robot.then_some(robot_identity),
        })
    });

    Ok(InspectReport {
        project: project.name.clone(),
        main_class: project.main_class.clone(),
        sources: project
            .sources
            .iter()
            .map(|s| s.qualified_name.clone())
            .collect(),
        requirements: RequirementCategory::ALL
            .iter()
            .map(|&c| (c.field(), requirements.get(c)))
            .filter(|(_, map)| !map.is_empty())
            .collect(),
        builtin: components.builtin,
        extensions: components.extensions,
        robot,
        manifest: rendered,
    })
}
