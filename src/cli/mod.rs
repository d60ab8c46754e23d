//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use commands::Commands;

use crate::core::global_config::GlobalConfig;
use crate::infra::dirs::BuildDirs;

/// Commit the binary was built from, when known
pub const GIT_SHA: Option<&str> = option_env!("VERGEN_GIT_SHA");

/// yailbuild - App Inventor build server pipeline
///
/// Compiles YAIL projects and packages them into signed, aligned APKs.
#[derive(Parser, Debug)]
#[command(name = "yailbuild")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "YAILBUILD_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let Some(cmd) = self.command else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            return Ok(());
        };

        let config_path = self
            .config
            .unwrap_or_else(|| BuildDirs::new().global_config_path());
        let config = GlobalConfig::load_from_path(&config_path)
            .with_context(|| format!("Failed to load configuration {}", config_path.display()))?;
        tracing::debug!(path = %config_path.display(), "Loaded configuration");

        cmd.run(&config, &config_path).await
    }
}
