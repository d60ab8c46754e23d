//! CLI implementation for `yailbuild clean` command
//!
//! Removes generated build output from a project's build directory.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{is_json, print_detail, print_success};
use crate::core::clean::{clean_build_dir, has_build_artifacts};
use crate::core::project::Project;

/// Execute the clean command
pub fn execute(project_dir: &Path) -> Result<()> {
    let project = Project::load(project_dir)
        .with_context(|| format!("Failed to load project at {}", project_dir.display()))?;

    if !has_build_artifacts(&project.build_dir) {
        if is_json() {
            println!("{}", serde_json::json!({ "status": "success", "removed": [] }));
        } else {
            print_success("Nothing to clean");
        }
        return Ok(());
    }

    let result = clean_build_dir(&project.build_dir).with_context(|| {
        format!(
            "Failed to clean build output in {}",
            project.build_dir.display()
        )
    })?;

    if is_json() {
        println!(
            "{}",
            serde_json::json!({ "status": "success", "removed": result.removed })
        );
        return Ok(());
    }

    print_success(&format!("Cleaned {}", project.build_dir.display()));
    for entry in &result.removed {
        print_detail(&format!("Removed {entry}"));
    }
    Ok(())
}
