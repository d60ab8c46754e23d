//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod config;
pub mod doctor;
pub mod inspect;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::core::global_config::GlobalConfig;

/// Component types named on the command line
#[derive(Args, Debug, Clone, Default)]
pub struct ComponentArgs {
    /// Component type used by the project (repeatable)
    #[arg(short = 'c', long = "component", value_name = "TYPE")]
    pub components: Vec<String>,

    /// JSON file holding an array of component types
    #[arg(long, value_name = "FILE")]
    pub components_file: Option<PathBuf>,
}

impl ComponentArgs {
    /// Collect every named component type, each once
    pub fn collect(&self) -> Result<BTreeSet<String>> {
        let mut types: BTreeSet<String> = self.components.iter().cloned().collect();
        if let Some(file) = &self.components_file {
            types.extend(read_components_file(file)?);
        }
        Ok(types)
    }
}

fn read_components_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read components file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| {
        format!(
            "Components file {} is not a JSON array of type names",
            path.display()
        )
    })
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a signed APK from a YAIL project
    Build {
        /// Project root (the directory holding youngandroidproject/)
        #[arg(default_value = ".")]
        project: PathBuf,

        #[command(flatten)]
        components: ComponentArgs,

        /// Build the companion instead of a release app
        #[arg(long)]
        companion: bool,

        /// Keystore used to sign the archive
        #[arg(long, value_name = "FILE")]
        keystore: Option<PathBuf>,

        /// Heap for each child JVM, in MB
        #[arg(long, value_name = "MB")]
        ram: Option<u32>,

        /// Pre-dex cache directory
        #[arg(long, value_name = "DIR", conflicts_with = "no_dex_cache")]
        dex_cache: Option<PathBuf>,

        /// Merge raw library jars without pre-dexing
        #[arg(long)]
        no_dex_cache: bool,
    },

    /// Show the components, requirements and manifest a build would use
    Inspect {
        /// Project root
        #[arg(default_value = ".")]
        project: PathBuf,

        #[command(flatten)]
        components: ComponentArgs,

        /// Inspect a companion build
        #[arg(long)]
        companion: bool,

        /// Include the synthesized manifest
        #[arg(long)]
        manifest: bool,
    },

    /// Check Java tools and runtime resources
    Doctor,

    /// Manage the global configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Remove generated build output
    Clean {
        /// Project root
        #[arg(default_value = ".")]
        project: PathBuf,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a configuration file with every default filled in
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, config: &GlobalConfig, config_path: &Path) -> Result<()> {
        match self {
            Self::Build {
                project,
                components,
                companion,
                keystore,
                ram,
                dex_cache,
                no_dex_cache,
            } => {
                let options = build::BuildArgs {
                    component_types: components.collect()?,
                    companion,
                    keystore,
                    ram,
                    dex_cache,
                    no_dex_cache,
                };
                build::execute(&project, options, config).await
            }
            Self::Inspect {
                project,
                components,
                companion,
                manifest,
            } => {
                let types = components.collect()?;
                inspect::execute(&project, &types, companion, manifest, config)
            }
            Self::Doctor => doctor::execute(config),
            Self::Config { command } => match command {
                ConfigCommands::Show => config::show(config, config_path),
                ConfigCommands::Init { force } => config::init(config_path, force),
            },
            Self::Clean { project } => clean::execute(&project),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_merges_flags_and_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("components.json");
        std::fs::write(&file, r#"["Button", "Form", "Button"]"#).unwrap();

        let args = ComponentArgs {
            components: vec!["Label".to_string(), "Form".to_string()],
            components_file: Some(file),
        };
        let types = args.collect().unwrap();
        assert_eq!(
            types.into_iter().collect::<Vec<_>>(),
            vec!["Button", "Form", "Label"]
        );
    }

    #[test]
    fn test_collect_rejects_non_array_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("components.json");
        std::fs::write(&file, r#"{"Button": true}"#).unwrap();

        let args = ComponentArgs {
            components: Vec::new(),
            components_file: Some(file),
        };
        assert!(args.collect().is_err());
    }
}
