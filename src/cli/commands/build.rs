//! Build command implementation
//!
//! Implements `yailbuild build`: loads the project, runs the pipeline with
//! real tools and shows the progress channel as a bar.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::cli::output::{create_build_bar, is_json, is_quiet, print_success, verbosity};
use crate::core::builder::{self, BuildLayout, BuildOptions, BuildServices, Streams};
use crate::core::global_config::GlobalConfig;
use crate::core::progress;
use crate::core::project::Project;
use crate::infra::dirs::BuildDirs;
use crate::infra::process::SystemRunner;

/// Keystore looked up in the project root when none is given
pub const DEFAULT_KEYSTORE: &str = "android.keystore";

/// Arguments for one build
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
    /// Component types the project uses
    pub component_types: BTreeSet<String>,
    /// Build the companion
    pub companion: bool,
    /// Signing keystore
    pub keystore: Option<PathBuf>,
    /// Child JVM heap override
    pub ram: Option<u32>,
    /// Pre-dex cache override
    pub dex_cache: Option<PathBuf>,
    /// Disable the pre-dex cache
    pub no_dex_cache: bool,
}

impl BuildArgs {
    /// Resolve pipeline options against the configuration
    pub fn options(&self, project_dir: &Path, config: &GlobalConfig) -> BuildOptions {
        let dex_cache_dir = if self.no_dex_cache {
            None
        } else {
            Some(
                self.dex_cache
                    .clone()
                    .or_else(|| config.dex.cache.clone())
                    .unwrap_or_else(|| BuildDirs::new().dex_cache_dir()),
            )
        };
        BuildOptions {
            companion: self.companion,
            keystore: self
                .keystore
                .clone()
                .unwrap_or_else(|| project_dir.join(DEFAULT_KEYSTORE)),
            child_process_ram_mb: self.ram.unwrap_or_else(|| config.child_process_ram_mb()),
            dex_cache_dir,
        }
    }
}

/// Execute the build command
pub async fn execute(project_dir: &Path, args: BuildArgs, config: &GlobalConfig) -> Result<()> {
    let project = Project::load(project_dir)
        .with_context(|| format!("Failed to load project at {}", project_dir.display()))?;
    let options = args.options(project_dir, config);
    let services = BuildServices::new(SystemRunner, config).with_context(|| {
        format!(
            "Failed to prepare runtime files from {}",
            config.files_dir().display()
        )
    })?;

    tracing::info!(
        project = %project.name,
        components = args.component_types.len(),
        companion = options.companion,
        "Starting build"
    );

    let (sender, mut receiver) = progress::channel();
    let bar = create_build_bar();
    bar.set_message(project.name.clone());
    bar.set_position(u64::from(receiver.current()));
    let bar_task = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(percent) = receiver.changed().await {
                bar.set_position(u64::from(percent));
            }
        })
    };

    // With the bar on screen the tool log is kept back and shown on failure.
    let live = !is_json() && !is_quiet() && verbosity() > 0;
    let mut log = Vec::new();
    let mut errors = Vec::new();
    let mut user_errors = Vec::new();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let streams = if live {
        Streams {
            out: &mut stdout,
            err: &mut stderr,
            user_errors: &mut user_errors,
        }
    } else {
        Streams {
            out: &mut log,
            err: &mut errors,
            user_errors: &mut user_errors,
        }
    };

    let succeeded = builder::compile(
        &project,
        &args.component_types,
        streams,
        &options,
        &services,
        &sender,
    )
    .await;
    let final_progress = sender.current();
    drop(sender);
    let _ = bar_task.await;
    bar.finish_and_clear();

    let materialized = services.resources.materialized_count();
    if let Err(e) = services.resources.cleanup() {
        tracing::warn!(error = %e, "Failed to remove materialized resources");
    } else {
        tracing::debug!(materialized, "Removed materialized resources");
    }

    let apk = BuildLayout::new(&project.build_dir).archive(&project.name);
    let log = String::from_utf8_lossy(&log);
    let user_errors = String::from_utf8_lossy(&user_errors);

    if is_json() {
        let result = serde_json::json!({
            "status": if succeeded { "success" } else { "error" },
            "project": project.name,
            "apk": succeeded.then(|| apk.display().to_string()),
            "progress": final_progress,
            "output": log,
            "errors": String::from_utf8_lossy(&errors),
            "user_errors": user_errors,
        });
        println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
        if !succeeded {
            bail!("Build of {} failed", project.name);
        }
        return Ok(());
    }

    if !succeeded {
        if !live && !is_quiet() {
            print!("{log}");
            let _ = io::stderr().write_all(&errors);
        }
        eprint!("{user_errors}");
        bail!("Build of {} failed", project.name);
    }

    print_success(&format!("Built {}", apk.display()));
    Ok(())
}
