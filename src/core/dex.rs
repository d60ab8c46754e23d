//! Dex merge planning and execution
//!
//! Compiled classes and every library jar are merged into one or two dex
//! containers. The base inputs always lead the first container; library jars
//! fill it up to a cap and spill into the second.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::config::defaults;
use crate::error::{BuildError, Stage};
use crate::infra::filesystem;
use crate::infra::process::{CommandSpec, ToolRunner};

/// Hex characters of the content hash used to name cached pre-dexed jars
const CACHE_KEY_LEN: usize = 16;

/// How library jars are distributed across dex containers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexPolicy {
    /// Library jars folded into the first container
    pub first_dex_cap: usize,
    /// Jar file names the application needs at startup, in load order
    pub startup_libraries: Vec<String>,
}

impl Default for DexPolicy {
    fn default() -> Self {
        Self {
            first_dex_cap: defaults::FIRST_DEX_LIBRARY_CAP,
            startup_libraries: Vec::new(),
        }
    }
}

impl DexPolicy {
    /// Whether `library` is in the startup order
    pub fn is_startup(&self, library: &Path) -> bool {
        self.startup_index(library).is_some()
    }

    fn startup_index(&self, library: &Path) -> Option<usize> {
        let name = library.file_name()?.to_str()?;
        self.startup_libraries.iter().position(|s| s == name)
    }
}

/// Which split to attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexAttempt {
    /// Fill the first container up to the cap
    Initial,
    /// Keep only startup libraries in the first container
    Conservative,
}

/// Inputs of each dex container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DexPlan {
    /// Inputs of `classes.dex`
    pub primary: Vec<PathBuf>,
    /// Inputs of `classes2.dex`; empty when one container suffices
    pub secondary: Vec<PathBuf>,
}

impl DexPlan {
    /// Whether a second container is needed
    pub fn needs_secondary(&self) -> bool {
        !self.secondary.is_empty()
    }
}

/// Order libraries so startup libraries lead in their configured order.
///
/// Libraries outside the startup order keep their relative order.
pub fn order_libraries(libraries: &[PathBuf], policy: &DexPolicy) -> Vec<PathBuf> {
    let mut ordered = libraries.to_vec();
    ordered.sort_by_key(|lib| policy.startup_index(lib).unwrap_or(usize::MAX));
    ordered
}

/// Split base inputs and libraries into containers
pub fn plan(base: &[PathBuf], libraries: &[PathBuf], policy: &DexPolicy, attempt: DexAttempt) -> DexPlan {
    let libraries = order_libraries(libraries, policy);
    let in_first = match attempt {
        DexAttempt::Initial => libraries.len().min(policy.first_dex_cap),
        DexAttempt::Conservative => libraries.iter().take_while(|l| policy.is_startup(l)).count(),
    };

    let mut primary = base.to_vec();
    primary.extend_from_slice(&libraries[..in_first]);
    DexPlan {
        primary,
        secondary: libraries[in_first..].to_vec(),
    }
}

/// Content key naming a jar's pre-dexed copy
pub fn cache_key(jar: &Path) -> Result<String, BuildError> {
    let bytes = filesystem::read_bytes(jar).map_err(|e| BuildError::stage(Stage::Dx, e))?;
    let digest = hex::encode(Sha256::digest(&bytes));
    Ok(digest[..CACHE_KEY_LEN].to_string())
}

/// Runs the dex merger
#[derive(Debug)]
pub struct DexMerger<'a, R> {
    pub runner: &'a R,
    pub java: &'a Path,
    pub dx_jar: &'a Path,
    pub heap_mb: u32,
    pub timeout: Duration,
    /// Where pre-dexed jars are kept across builds
    pub cache_dir: Option<&'a Path>,
}

impl<R: ToolRunner> DexMerger<'_, R> {
    /// The merger command line
    pub fn command(&self, output: &Path, inputs: &[PathBuf]) -> CommandSpec {
        CommandSpec::new(self.java)
            .arg(format!("-Xmx{}m", self.heap_mb))
            .arg("-jar")
            .arg(self.dx_jar)
            .arg("--dex")
            .arg(format!("--output={}", output.display()))
            .args(inputs.iter().map(|p| p.as_os_str().to_os_string()))
    }

    /// Merge `inputs` into `output`.
    ///
    /// Returns `Ok(false)` when the merger exits unsuccessfully; spawn
    /// failures and timeouts are stage errors.
    pub async fn merge(&self, output: &Path, inputs: &[PathBuf]) -> Result<bool, BuildError> {
        let mut prepared = Vec::with_capacity(inputs.len());
        for input in inputs {
            prepared.push(self.predexed(input).await?);
        }

        let spec = self.command(output, &prepared);
        let result = self
            .runner
            .run(&spec, self.timeout)
            .await
            .map_err(|e| BuildError::stage(Stage::Dx, e))?;
        if !result.success() {
            tracing::warn!(output = %output.display(), reason = %result.failure_reason(), "Dex merge failed");
            return Ok(false);
        }
        Ok(true)
    }

    /// The cached pre-dexed copy of a jar input, creating it on a miss.
    ///
    /// Directories, and every input when no cache is configured, pass
    /// through unchanged. A failed pre-dex also falls back to the raw jar.
    async fn predexed(&self, input: &Path) -> Result<PathBuf, BuildError> {
        let Some(cache_dir) = self.cache_dir else {
            return Ok(input.to_path_buf());
        };
        if !input.is_file() || input.extension().map_or(true, |e| e != "jar") {
            return Ok(input.to_path_buf());
        }

        let cached = cache_dir.join(format!("{}.jar", cache_key(input)?));
        if cached.is_file() {
            tracing::debug!(jar = %input.display(), cached = %cached.display(), "Pre-dex cache hit");
            return Ok(cached);
        }

        filesystem::create_dir_all(cache_dir).map_err(|e| BuildError::stage(Stage::Dx, e))?;
        let spec = self.command(&cached, std::slice::from_ref(&input.to_path_buf()));
        let result = self
            .runner
            .run(&spec, self.timeout)
            .await
            .map_err(|e| BuildError::stage(Stage::Dx, e))?;
        if result.success() && cached.is_file() {
            Ok(cached)
        } else {
            tracing::warn!(jar = %input.display(), "Pre-dexing failed, using the raw jar");
            Ok(input.to_path_buf())
        }
    }
}
