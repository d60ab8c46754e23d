//! Build orchestration
//!
//! Drives one project from YAIL sources to a signed, aligned archive. Stages
//! run strictly in order; the first failure ends the build and leaves the
//! build directory in place for inspection.
//!
//! Several builds may run at once against one [`BuildServices`]. They share
//! the runtime resource cache, the component catalog and the tool slots that
//! keep concurrent JVM children within the memory budget.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::paths;
use crate::core::anim;
use crate::core::attach;
use crate::core::build_info::{Catalog, ComponentBuildInfo, RequirementCategory};
use crate::core::compile::{self, KawaInvocation};
use crate::core::dex::{self, DexAttempt, DexMerger, DexPolicy};
use crate::core::global_config::{GlobalConfig, RobotIdentity, ToolTimeouts};
use crate::core::icon;
use crate::core::manifest::{self, ManifestInput};
use crate::core::packaging::{self, PackageInputs, SigningKey};
use crate::core::progress::ProgressSender;
use crate::core::project::Project;
use crate::core::requirements::Requirements;
use crate::core::resolver::{self, ComponentFiles, ComponentSets, ExtensionLocator};
use crate::core::robot::{self, RJavaInputs};
use crate::error::{BuildError, Stage};
use crate::infra::filesystem;
use crate::infra::process::{CommandSpec, ToolOutput, ToolRunner};
use crate::infra::resources::{ResourceCache, ResourceError};
use crate::infra::slots::ToolSlots;
use crate::infra::toolchain::Toolchain;

/// First dex container
pub const CLASSES_DEX: &str = "classes.dex";

/// Second dex container
pub const CLASSES2_DEX: &str = "classes2.dex";

/// Output streams of one build
pub struct Streams<'a> {
    /// Stage banners, tool timings and compiler output
    pub out: &'a mut (dyn Write + Send),
    /// Diagnostic lines for the build server's operators
    pub err: &'a mut (dyn Write + Send),
    /// Messages meant for the project's author
    pub user_errors: &'a mut (dyn Write + Send),
}

/// Per-build options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build the companion (REPL) app instead of a standalone app
    pub companion: bool,
    /// Keystore holding the signing key
    pub keystore: PathBuf,
    /// Heap for each child JVM, in MB
    pub child_process_ram_mb: u32,
    /// Pre-dex cache shared across builds
    pub dex_cache_dir: Option<PathBuf>,
}

/// Services shared by every build in the process
#[derive(Debug)]
pub struct BuildServices<R> {
    pub runner: R,
    pub resources: ResourceCache,
    pub toolchain: Toolchain,
    pub slots: ToolSlots,
    pub timeouts: ToolTimeouts,
    pub dex_policy: DexPolicy,
    pub robot: RobotIdentity,
    catalog: Mutex<Option<Arc<Catalog>>>,
}

impl<R: ToolRunner> BuildServices<R> {
    /// Services configured from the global configuration
    pub fn new(runner: R, config: &GlobalConfig) -> Result<Self, ResourceError> {
        Ok(Self {
            runner,
            resources: ResourceCache::new(config.files_dir())?,
            toolchain: Toolchain::detect(config.runtime.java_home.clone()),
            slots: ToolSlots::new(config.memory_budget_mb()),
            timeouts: config.timeouts.resolve(),
            dex_policy: DexPolicy {
                first_dex_cap: config.first_dex_cap(),
                startup_libraries: config.dex.startup_libraries.clone(),
            },
            robot: config.robot.identity(),
            catalog: Mutex::new(None),
        })
    }

    /// The built-in component catalog, read on first use
    pub fn catalog(&self) -> Result<Arc<Catalog>, BuildError> {
        let mut slot = self.catalog.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(catalog) = slot.as_ref() {
            return Ok(Arc::clone(catalog));
        }
        let catalog = Arc::new(Catalog::load(&self.resources)?);
        tracing::debug!(components = catalog.components().len(), "Loaded component catalog");
        *slot = Some(Arc::clone(&catalog));
        Ok(catalog)
    }
}

/// Paths inside the build directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    pub root: PathBuf,
    pub res: PathBuf,
    pub drawable: PathBuf,
    pub anim: PathBuf,
    pub classes: PathBuf,
    pub gen: PathBuf,
    pub tmp: PathBuf,
    pub deploy: PathBuf,
    pub libs: PathBuf,
    pub manifest: PathBuf,
}

impl BuildLayout {
    /// Layout rooted at `build_dir`
    pub fn new(build_dir: &Path) -> Self {
        let res = build_dir.join("res");
        Self {
            root: build_dir.to_path_buf(),
            drawable: res.join("drawable"),
            anim: res.join("anim"),
            res,
            classes: build_dir.join("classes"),
            gen: build_dir.join("gen"),
            tmp: build_dir.join("tmp"),
            deploy: build_dir.join("deploy"),
            libs: build_dir.join(paths::LIBS_DIR_NAME),
            manifest: build_dir.join("AndroidManifest.xml"),
        }
    }

    /// Archive produced by resource packaging
    pub fn intermediate_archive(&self, project_name: &str) -> PathBuf {
        self.deploy.join(format!("{project_name}.ap_"))
    }

    /// The final archive
    pub fn archive(&self, project_name: &str) -> PathBuf {
        self.deploy.join(format!("{project_name}.apk"))
    }

    /// Subtrees the build creates
    pub fn generated(&self) -> [&Path; 7] {
        [
            &self.res,
            &self.classes,
            &self.gen,
            &self.tmp,
            &self.deploy,
            &self.libs,
            &self.manifest,
        ]
    }
}

/// What a successful build produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifacts {
    /// The signed, aligned archive
    pub apk: PathBuf,
    /// Dex containers added to the archive
    pub dex_files: Vec<PathBuf>,
    /// Whether this was a robot controller build
    pub robot: bool,
}

/// Build `project` and report the outcome on `streams`.
///
/// Returns whether the build succeeded. Failures are logged, summarized on
/// the error stream and rendered for the author on the user error stream.
pub async fn compile<R: ToolRunner>(
    project: &Project,
    component_types: &BTreeSet<String>,
    streams: Streams<'_>,
    options: &BuildOptions,
    services: &BuildServices<R>,
    progress: &ProgressSender,
) -> bool {
    let Streams {
        out,
        err,
        user_errors,
    } = streams;
    match run_build(project, component_types, out, options, services, progress).await {
        Ok(artifacts) => {
            tracing::info!(apk = %artifacts.apk.display(), "Build succeeded");
            true
        }
        Err(e) => {
            tracing::error!(stage = ?e.failed_stage(), error = %e, "Build failed");
            if let Some(stage) = e.failed_stage() {
                let _ = writeln!(err, "YAIL compiler - {stage} execution failed.");
            }
            let _ = write!(user_errors, "{}", e.user_message());
            false
        }
    }
}

/// Run every stage, stopping at the first failure
pub async fn run_build<R: ToolRunner>(
    project: &Project,
    component_types: &BTreeSet<String>,
    out: &mut (dyn Write + Send),
    options: &BuildOptions,
    services: &BuildServices<R>,
    progress: &ProgressSender,
) -> Result<BuildArtifacts, BuildError> {
    let start = Instant::now();
    let mut pipeline = Pipeline::prepare(project, component_types, out, options, services, progress)?;
    let artifacts = pipeline.run().await?;
    pipeline.say(&format!(
        "Build finished in {:.3} seconds",
        start.elapsed().as_secs_f64()
    ));
    Ok(artifacts)
}

struct Pipeline<'a, 'o, R> {
    project: &'a Project,
    options: &'a BuildOptions,
    services: &'a BuildServices<R>,
    progress: &'a ProgressSender,
    out: &'o mut (dyn Write + Send),
    components: ComponentSets,
    builtin_infos: Arc<Catalog>,
    extension_infos: Vec<ComponentBuildInfo>,
    locator: ExtensionLocator,
    requirements: Requirements,
    robot: bool,
    layout: BuildLayout,
    /// Component library jars, each once
    libraries: Vec<PathBuf>,
    /// Extension runtime jars, each once
    extension_jars: Vec<PathBuf>,
}

impl<'a, 'o, R: ToolRunner> Pipeline<'a, 'o, R> {
    fn prepare(
        project: &'a Project,
        component_types: &BTreeSet<String>,
        out: &'o mut (dyn Write + Send),
        options: &'a BuildOptions,
        services: &'a BuildServices<R>,
        progress: &'a ProgressSender,
    ) -> Result<Self, BuildError> {
        let catalog = services.catalog()?;
        let components = ComponentSets::partition(component_types, &catalog);
        let locator = ExtensionLocator::new(&project.assets_dir);
        let extension_infos = resolver::load_extension_infos(&locator, &components.extensions)?;
        let robot = manifest::is_robot_build(&components, options.companion);
        tracing::info!(
            project = %project.name,
            builtin = components.builtin.len(),
            extensions = components.extensions.len(),
            robot,
            "Resolved component types"
        );

        Ok(Self {
            project,
            options,
            services,
            progress,
            out,
            components,
            builtin_infos: catalog,
            extension_infos,
            locator,
            requirements: Requirements::new(),
            robot,
            layout: BuildLayout::new(&project.build_dir),
            libraries: Vec::new(),
            extension_jars: Vec::new(),
        })
    }

    async fn run(&mut self) -> Result<BuildArtifacts, BuildError> {
        let services = self.services;
        let project = self.project;

        self.requirements.populate_all(
            self.builtin_infos.components(),
            &self.extension_infos,
            &self.components,
            project.uses_location,
        )?;

        filesystem::create_dir_all(&self.layout.root)
            .map_err(|e| BuildError::stage(Stage::Resources, e))?;

        self.say("________Preparing application icon");
        icon::prepare_icon(project, &self.layout.drawable, &services.resources)?;
        self.progress.set(15);

        self.say("________Creating animation xml");
        anim::write_animations(&self.layout.anim)?;

        if self.robot {
            let copied = robot::copy_resources(&services.resources, &self.layout.res)?
                + robot::copy_assets(&services.resources, &project.assets_dir)?
                + robot::copy_native_libs(&services.resources, &self.layout.libs)?;
            tracing::info!(files = copied, "Added robot controller files");
        }

        self.say("________Generating manifest file");
        manifest::write(
            &self.layout.manifest,
            &ManifestInput {
                project,
                components: &self.components,
                requirements: &self.requirements,
                companion: self.options.companion,
                robot: self.robot.then_some(&services.robot),
            },
        )?;
        self.progress.set(20);

        self.say("________Attaching native libraries");
        attach::insert_native_libs(
            &self.requirements.get(RequirementCategory::Native),
            &self.files(),
            &self.layout.libs,
        )?;

        self.say("________Attaching component assets");
        attach::attach_component_assets(
            &self.requirements.get(RequirementCategory::Assets),
            &self.files(),
            &project.assets_dir,
        )?;

        self.say("________Compiling source files");
        self.compile_sources().await?;
        self.progress.set(35);

        if self.robot {
            self.say("________Generating R.java files");
            self.compile_r_classes().await?;
        }

        self.say("________Invoking DX");
        let dex_files = self.run_dx().await?;
        self.progress.set(85);

        self.say("________Invoking AAPT");
        let intermediate = self.package_resources().await?;
        self.progress.set(90);

        self.say("________Invoking ApkBuilder");
        let apk = self.layout.archive(&project.name);
        self.seal(&intermediate, &apk, &dex_files).await?;
        self.progress.set(95);

        self.say("________Signing the apk file");
        self.sign(&apk).await?;

        self.say("________ZipAligning the apk file");
        self.align(&apk).await?;
        self.progress.set(100);

        Ok(BuildArtifacts {
            apk,
            dex_files,
            robot: self.robot,
        })
    }

    async fn compile_sources(&mut self) -> Result<(), BuildError> {
        let services = self.services;
        let project = self.project;
        let compile_error = |e: String| BuildError::stage(Stage::Compile, e);

        if !compile::has_user_code(&project.sources).map_err(|e| compile_error(e.to_string()))? {
            return Err(BuildError::NoUserCode);
        }

        let classpath = compile::join_classpath(&self.classpath()?).map_err(compile_error)?;
        tracing::debug!(classpath = %classpath.to_string_lossy(), "Libraries classpath");
        let java = services.toolchain.java().map_err(|e| compile_error(e.to_string()))?;
        let yail_runtime = services
            .resources
            .get(paths::YAIL_RUNTIME)
            .map_err(|e| compile_error(e.to_string()))?;
        filesystem::create_dir_all(&self.layout.classes).map_err(|e| compile_error(e.to_string()))?;

        // Robot controller classes live in the robot controller's package.
        let package = if self.robot {
            services.robot.package.as_str()
        } else {
            project.package_name()
        };
        let spec = KawaInvocation {
            java: &java,
            child_process_ram_mb: self.options.child_process_ram_mb,
            classpath: &classpath,
            yail_runtime: &yail_runtime,
            classes_dir: &self.layout.classes,
            package,
            sources: &project.sources,
        }
        .command();

        let start = Instant::now();
        let slot = services
            .slots
            .acquire(self.options.child_process_ram_mb)
            .await
            .map_err(|e| compile_error(e.to_string()))?;
        let output = services
            .runner
            .run(&spec, services.timeouts.compile)
            .await
            .map_err(|e| compile_error(e.to_string()))?;
        drop(slot);

        if !output.success() {
            tracing::error!(reason = %output.failure_reason(), "Kawa compile has failed");
        }
        let diagnostics = output.stderr_string();
        let counts = compile::count_diagnostics(&diagnostics);
        tracing::info!(warnings = counts.warnings, errors = counts.errors, "Kawa diagnostics");
        let _ = self.out.write_all(diagnostics.as_bytes());
        self.say(&format!(
            "Kawa compile time: {:.3} seconds",
            start.elapsed().as_secs_f64()
        ));

        if let Some(missing) = compile::missing_class(project, &self.layout.classes) {
            tracing::info!(class = %missing.class_file().display(), "Can't find class file");
            return Err(BuildError::Compilation {
                unit: missing.unit_name().to_string(),
            });
        }
        Ok(())
    }

    /// Compiler classpath; records the library jars for the dex stage
    fn classpath(&mut self) -> Result<Vec<PathBuf>, BuildError> {
        let resources = &self.services.resources;
        let compile_error = |e: String| BuildError::stage(Stage::Compile, e);
        let runtime = |logical: &str| resources.get(logical).map_err(|e| compile_error(e.to_string()));

        let mut entries = vec![
            runtime(paths::KAWA_RUNTIME)?,
            runtime(paths::ACRA_RUNTIME)?,
            runtime(paths::SIMPLE_ANDROID_RUNTIME_JAR)?,
        ];

        let mut extension_jars = Vec::new();
        for type_name in &self.components.extensions {
            let jar = self
                .locator
                .runtime_jar(type_name)
                .map_err(|e| compile_error(e.to_string()))?;
            if !extension_jars.contains(&jar) {
                extension_jars.push(jar);
            }
        }

        let mut libraries = Vec::new();
        let files = self.files();
        for (type_name, names) in self.requirements.get(RequirementCategory::Libraries) {
            for name in names {
                let (jar, _) = files.resolve(&type_name, &name).map_err(compile_error)?;
                if !libraries.contains(&jar) {
                    libraries.push(jar);
                }
            }
        }

        entries.extend(extension_jars.iter().cloned());
        entries.extend(libraries.iter().cloned());
        entries.push(runtime(paths::ANDROID_RUNTIME)?);

        self.libraries = libraries;
        self.extension_jars = extension_jars;
        Ok(entries)
    }

    async fn compile_r_classes(&mut self) -> Result<(), BuildError> {
        let services = self.services;
        let layout = self.layout.clone();
        let aapt = self.aapt(Stage::Aapt)?;
        let android_jar = services
            .resources
            .get(paths::ANDROID_RUNTIME)
            .map_err(|e| BuildError::stage(Stage::Aapt, e))?;
        filesystem::create_dir_all(&layout.gen).map_err(|e| BuildError::stage(Stage::Aapt, e))?;

        let inputs = RJavaInputs {
            android_jar: &android_jar,
            res_dir: &layout.res,
            manifest: &layout.manifest,
            gen_dir: &layout.gen,
        };
        let mut sources = Vec::with_capacity(robot::R_PACKAGES.len());
        for package in robot::R_PACKAGES {
            let start = Instant::now();
            let spec = robot::r_java_command(&aapt, &inputs, package);
            run_tool(&services.runner, Stage::Aapt, &spec, services.timeouts.package).await?;
            self.report_time("AAPT", start);
            sources.push(robot::r_java_path(&layout.gen, package));
        }

        self.say("________Compiling R.java files");
        let javac = services
            .toolchain
            .javac()
            .map_err(|e| BuildError::stage(Stage::Javac, e))?;
        let spec = robot::javac_command(&javac, &layout.classes, &sources);
        run_tool(&services.runner, Stage::Javac, &spec, services.timeouts.compile).await?;
        Ok(())
    }

    /// Merge classes and libraries into dex containers; returns their paths
    async fn run_dx(&mut self) -> Result<Vec<PathBuf>, BuildError> {
        let services = self.services;
        let options = self.options;
        let progress = self.progress;
        let dx_error = |e: String| BuildError::stage(Stage::Dx, e);
        let runtime = |logical: &str| {
            services
                .resources
                .get(logical)
                .map_err(|e| dx_error(e.to_string()))
        };

        let base = vec![
            self.layout.classes.clone(),
            runtime(paths::SIMPLE_ANDROID_RUNTIME_JAR)?,
            runtime(paths::KAWA_RUNTIME)?,
            runtime(paths::ACRA_RUNTIME)?,
        ];
        let mut libraries = self.libraries.clone();
        libraries.extend(self.extension_jars.iter().cloned());

        let java = services.toolchain.java().map_err(|e| dx_error(e.to_string()))?;
        let dx_jar = runtime(paths::DX_JAR)?;
        filesystem::create_dir_all(&self.layout.tmp).map_err(|e| dx_error(e.to_string()))?;
        let primary = self.layout.tmp.join(CLASSES_DEX);
        let secondary = self.layout.tmp.join(CLASSES2_DEX);

        let merger = DexMerger {
            runner: &services.runner,
            java: &java,
            dx_jar: &dx_jar,
            heap_mb: options.child_process_ram_mb,
            timeout: services.timeouts.dex,
            cache_dir: options.dex_cache_dir.as_deref(),
        };

        let start = Instant::now();
        let slot = services
            .slots
            .acquire(options.child_process_ram_mb)
            .await
            .map_err(|e| dx_error(e.to_string()))?;
        let mut attempt = DexAttempt::Initial;
        let dex_files = loop {
            let plan = dex::plan(&base, &libraries, &services.dex_policy, attempt);
            progress.set(50);
            if merger.merge(&primary, &plan.primary).await? {
                if !plan.needs_secondary() {
                    break vec![primary];
                }
                progress.set(60);
                let merged = merger.merge(&secondary, &plan.secondary).await?;
                progress.set(75);
                if !merged {
                    return Err(dx_error(format!("failed to build {CLASSES2_DEX}")));
                }
                break vec![primary, secondary];
            }
            if attempt == DexAttempt::Conservative {
                return Err(dx_error("dex merge failed with fewer libraries".to_string()));
            }
            tracing::info!("DX execution failed, trying with fewer libraries.");
            attempt = DexAttempt::Conservative;
        };
        drop(slot);

        self.report_time("DX", start);
        Ok(dex_files)
    }

    async fn package_resources(&mut self) -> Result<PathBuf, BuildError> {
        let services = self.services;
        let project = self.project;
        let aapt_error = |e: String| BuildError::stage(Stage::Aapt, e);

        // aapt rejects a missing assets directory
        filesystem::create_dir_all(&project.assets_dir).map_err(|e| aapt_error(e.to_string()))?;
        filesystem::create_dir_all(&self.layout.deploy).map_err(|e| aapt_error(e.to_string()))?;
        filesystem::create_dir_all(&self.layout.libs).map_err(|e| aapt_error(e.to_string()))?;
        let aapt = self.aapt(Stage::Aapt)?;
        let android_jar = services
            .resources
            .get(paths::ANDROID_RUNTIME)
            .map_err(|e| aapt_error(e.to_string()))?;
        let output = self.layout.intermediate_archive(&project.name);

        let spec = packaging::aapt_package_command(
            &aapt,
            &PackageInputs {
                manifest: &self.layout.manifest,
                res_dir: &self.layout.res,
                assets_dir: &project.assets_dir,
                android_jar: &android_jar,
                output: &output,
                libs_dir: &self.layout.libs,
            },
        );
        let start = Instant::now();
        run_tool(&services.runner, Stage::Aapt, &spec, services.timeouts.package).await?;
        self.report_time("AAPT", start);
        Ok(output)
    }

    async fn seal(&mut self, intermediate: &Path, apk: &Path, dex_files: &[PathBuf]) -> Result<(), BuildError> {
        let services = self.services;
        let seal_error = |e: String| BuildError::stage(Stage::ApkBuilder, e);

        filesystem::copy_file(intermediate, apk).map_err(|e| seal_error(e.to_string()))?;
        let aapt = self.aapt(Stage::ApkBuilder)?;
        let names: Vec<&str> = dex_files
            .iter()
            .filter_map(|p| p.file_name()?.to_str())
            .collect();
        let spec = packaging::seal_command(&aapt, apk, &self.layout.tmp, &names);
        run_tool(&services.runner, Stage::ApkBuilder, &spec, services.timeouts.package).await?;
        Ok(())
    }

    async fn sign(&mut self, apk: &Path) -> Result<(), BuildError> {
        let services = self.services;
        let sign_error = |e: String| BuildError::stage(Stage::JarSigner, e);

        let jarsigner = services
            .toolchain
            .jarsigner()
            .map_err(|e| sign_error(e.to_string()))?;
        let key = SigningKey::select(self.robot, &self.options.keystore, &services.resources)
            .map_err(|e| sign_error(e.to_string()))?;
        let spec = packaging::jarsigner_command(&jarsigner, &key, apk);
        run_tool(&services.runner, Stage::JarSigner, &spec, services.timeouts.sign).await?;
        Ok(())
    }

    async fn align(&mut self, apk: &Path) -> Result<(), BuildError> {
        let services = self.services;
        let align_error = |e: String| BuildError::stage(Stage::ZipAlign, e);

        let logical = services
            .toolchain
            .host()
            .zipalign_resource()
            .map_err(|e| align_error(e.to_string()))?;
        let zipalign = services
            .resources
            .get(&logical)
            .map_err(|e| align_error(e.to_string()))?;
        let aligned = self.layout.tmp.join("zipaligned.apk");

        let start = Instant::now();
        let spec = packaging::zipalign_command(&zipalign, apk, &aligned);
        run_tool(&services.runner, Stage::ZipAlign, &spec, services.timeouts.sign).await?;
        filesystem::copy_file(&aligned, apk).map_err(|e| align_error(e.to_string()))?;
        self.report_time("ZIPALIGN", start);
        Ok(())
    }

    fn aapt(&self, stage: Stage) -> Result<PathBuf, BuildError> {
        let logical = self
            .services
            .toolchain
            .host()
            .aapt_resource()
            .map_err(|e| BuildError::stage(stage, e))?;
        self.services
            .resources
            .get(&logical)
            .map_err(|e| BuildError::stage(stage, e))
    }

    fn files(&self) -> ComponentFiles<'_> {
        ComponentFiles {
            components: &self.components,
            resources: &self.services.resources,
            locator: &self.locator,
        }
    }

    fn report_time(&mut self, tool: &str, start: Instant) {
        let message = format!("{tool} time: {:.3} seconds", start.elapsed().as_secs_f64());
        tracing::info!("{message}");
        self.say(&message);
    }

    fn say(&mut self, line: &str) {
        let _ = writeln!(self.out, "{line}");
    }
}

/// Run a tool that must exit successfully
async fn run_tool<R: ToolRunner>(
    runner: &R,
    stage: Stage,
    spec: &CommandSpec,
    timeout: Duration,
) -> Result<ToolOutput, BuildError> {
    let output = runner
        .run(spec, timeout)
        .await
        .map_err(|e| BuildError::stage(stage, e))?;
    tracing::debug!(stage = stage.label(), stdout = %output.stdout_string(), "Tool finished");
    if output.success() {
        Ok(output)
    } else {
        Err(BuildError::stage(stage, output.failure_reason()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = BuildLayout::new(Path::new("/p/build"));
        assert_eq!(layout.drawable, PathBuf::from("/p/build/res/drawable"));
        assert_eq!(layout.anim, PathBuf::from("/p/build/res/anim"));
        assert_eq!(layout.libs, PathBuf::from("/p/build/libs"));
        assert_eq!(
            layout.intermediate_archive("Hello"),
            PathBuf::from("/p/build/deploy/Hello.ap_")
        );
        assert_eq!(layout.archive("Hello"), PathBuf::from("/p/build/deploy/Hello.apk"));
        assert!(layout.generated().iter().all(|p| p.starts_with("/p/build")));
    }

    #[test]
    fn test_tool_gate_holds_memory_budget() {
        let runtime = tempfile::TempDir::new().unwrap();
        let mut config = GlobalConfig::default();
        config.runtime.files_dir = Some(runtime.path().to_path_buf());
        config.limits.memory_budget_mb = Some(8192);
        config.limits.child_process_ram_mb = Some(2048);

        let services = BuildServices::new(crate::infra::process::SystemRunner, &config).unwrap();
        assert_eq!(services.slots.budget_mb(), 8192);
        // A build asking for a larger heap than configured gets fewer slots
        assert_eq!(services.slots.capacity_for(2048), 4);
        assert_eq!(services.slots.capacity_for(4096), 2);
    }
}
