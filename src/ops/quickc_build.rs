//! Implementation of `quickc build`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::builder::{
    detect_toolchain, BuildExecutor, BuildManifest, BuildPlan, BuildReport, BuildSession,
    NativeRunner, StepRunner,
};
use crate::core::{Project, UnitPath, Variant};
use crate::util::config::Config;
use crate::util::diagnostic::suggestions;
use crate::util::fs::write_string;
use crate::util::shell::{Shell, Status};

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Build the release variant
    pub release: bool,

    /// Units to build (empty = the project's root units)
    pub units: Vec<String>,

    /// Number of parallel jobs
    pub jobs: Option<usize>,

    /// Print the plan as JSON instead of running it
    pub plan_only: bool,

    /// Write the settings snapshot here after evaluation
    pub manifest_out: Option<PathBuf>,
}

impl BuildOptions {
    pub fn variant(&self) -> Variant {
        Variant::from_release(self.release)
    }
}

/// Build result.
#[derive(Debug)]
pub struct BuildResult {
    /// Units that were requested, resolved
    pub units: Vec<UnitPath>,

    pub plan: BuildPlan,

    /// Settings snapshot taken after evaluation
    pub manifest: BuildManifest,

    /// `None` when only the plan was requested
    pub report: Option<BuildReport>,
}

/// Evaluate `units` (or the project's root units when empty) without
/// running anything.
pub fn evaluate(project: Project, variant: Variant, units: &[String]) -> Result<BuildSession> {
    let mut session = BuildSession::new(project, variant);
    if units.is_empty() {
        if session.project().root_units().is_empty() {
            bail!(
                "no units to build\n\
                 hint: list root units under `[project] units` in QuickProject.toml, \
                 or name them on the command line"
            );
        }
        session.build_root_units()?;
    } else {
        session.build_units(units)?;
    }
    Ok(session)
}

/// Build the project with the host toolchain.
pub fn build(
    project: Project,
    config: &Config,
    shell: Arc<Shell>,
    opts: &BuildOptions,
) -> Result<BuildResult> {
    if opts.plan_only {
        return run(project, None, shell, opts);
    }
    let toolchain = detect_toolchain(&config.toolchain)?;
    tracing::debug!(
        "using {} toolchain at {}",
        toolchain.platform().as_str(),
        toolchain.compiler_path().display()
    );
    let runner = NativeRunner::new(toolchain);
    run(project, Some(&runner), shell, opts)
}

/// Build the project, running steps with `runner`.
pub fn build_with_runner(
    project: Project,
    runner: &dyn StepRunner,
    shell: Arc<Shell>,
    opts: &BuildOptions,
) -> Result<BuildResult> {
    run(project, Some(runner), shell, opts)
}

fn run(
    project: Project,
    runner: Option<&dyn StepRunner>,
    shell: Arc<Shell>,
    opts: &BuildOptions,
) -> Result<BuildResult> {
    let variant = opts.variant();
    let root = project.root().to_path_buf();

    shell.status(Status::Evaluating, format!("{} ({})", project.name(), variant));
    let session = evaluate(project, variant, &opts.units)?;
    let units = session.registry().dependencies(&UnitPath::root()).to_vec();
    let manifest = session.manifest();

    if let Some(ref path) = opts.manifest_out {
        write_string(path, &manifest.to_json()?)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        tracing::info!("wrote settings to {}", path.display());
    }

    let plan = session.into_plan();
    tracing::info!(
        "planned {} step(s): {} compile, {} link, {} install",
        plan.len(),
        plan.compile_count(),
        plan.link_count(),
        plan.install_count()
    );

    let Some(runner) = runner.filter(|_| !opts.plan_only) else {
        return Ok(BuildResult {
            units,
            plan,
            manifest,
            report: None,
        });
    };

    let report = BuildExecutor::new(runner, shell, &root)
        .jobs(opts.jobs)
        .execute(&plan)?;
    if !report.is_success() {
        bail!(
            "build failed: {} step(s) failed, {} skipped\n\
             hint: {}",
            report.failures.len(),
            report.skipped(),
            suggestions::BUILD_FAILED
        );
    }

    Ok(BuildResult {
        units,
        plan,
        manifest,
        report: Some(report),
    })
}
