//! CLI commands for `yailbuild config`
//!
//! `show` prints the effective configuration as TOML; `init` writes a file
//! with every default spelled out.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::output::{is_json, print_detail, print_success};
use crate::core::global_config::GlobalConfig;

/// Print the effective configuration
pub fn show(config: &GlobalConfig, config_path: &Path) -> Result<()> {
    if is_json() {
        let result = serde_json::json!({
            "path": config_path.display().to_string(),
            "exists": config_path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let origin = if config_path.exists() {
        config_path.display().to_string()
    } else {
        format!("defaults ({} not found)", config_path.display())
    };
    println!("# {origin}");
    print!(
        "{}",
        toml::to_string_pretty(config).context("Failed to render configuration")?
    );
    Ok(())
}

/// Write a fully populated configuration file
pub fn init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            config_path.display()
        );
    }

    GlobalConfig::populated()
        .save_to_path(config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    print_success(&format!("Wrote {}", config_path.display()));
    print_detail("Set [runtime] files_dir to the directory holding files/ and tools/");
    Ok(())
}
