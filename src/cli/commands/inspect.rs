//! CLI command for `yailbuild inspect`
//!
//! Resolves components and aggregates their requirements the way a build
//! would, without running any tool.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{is_json, print_detail, print_info};
use crate::core::build_info::Catalog;
use crate::core::global_config::GlobalConfig;
use crate::core::inspect::{inspect, InspectReport};
use crate::core::project::Project;
use crate::infra::resources::ResourceCache;

/// Execute the inspect command
pub fn execute(
    project_dir: &Path,
    component_types: &BTreeSet<String>,
    companion: bool,
    with_manifest: bool,
    config: &GlobalConfig,
) -> Result<()> {
    let project = Project::load(project_dir)
        .with_context(|| format!("Failed to load project at {}", project_dir.display()))?;
    let resources = ResourceCache::new(config.files_dir())
        .context("Failed to prepare runtime files")?;
    let catalog = Catalog::load(&resources).context("Failed to load component catalog")?;

    let report = inspect(
        &project,
        component_types,
        &catalog,
        &config.robot.identity(),
        companion,
        with_manifest,
    )
    .with_context(|| format!("Failed to inspect {}", project.name))?;

    if is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &InspectReport) {
    print_info(&format!("Project {} ({})", report.project, report.main_class));
    print_detail(&format!("Sources: {}", report.sources.join(", ")));
    print_detail(&format!("Built-in components: {}", join(&report.builtin)));
    print_detail(&format!("Extensions: {}", join(&report.extensions)));
    if report.robot {
        print_detail("Robot controller build");
    }

    for (category, by_type) in &report.requirements {
        println!();
        print_info(category);
        for (component, values) in by_type {
            print_detail(&format!("{component}: {}", join(values)));
        }
    }

    if let Some(manifest) = &report.manifest {
        println!();
        println!("{manifest}");
    }
}

fn join(values: &BTreeSet<String>) -> String {
    if values.is_empty() {
        return "(none)".to_string();
    }
    values.iter().cloned().collect::<Vec<_>>().join(", ")
}
