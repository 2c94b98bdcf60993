//! Native C/C++ compiler driver.
//!
//! Runs plan steps with a real toolchain: compiles sources, archives and
//! links artifacts, and copies installed files.

use std::fs;

use anyhow::{bail, Context, Result};

use crate::builder::executor::StepRunner;
use crate::builder::plan::{ArchiveStep, BuildStep, CompileStep, InstallStep, LinkStep};
use crate::builder::toolchain::{
    parse_defines, ArchiveInput, CommandSpec, CompileInput, Language, LinkInput, Toolchain,
};
use crate::core::unit::UnitKind;
use crate::util::fs::ensure_parent;
use crate::util::process::ProcessBuilder;

/// Runs steps with a native toolchain.
pub struct NativeRunner {
    toolchain: Box<dyn Toolchain>,
}

impl NativeRunner {
    pub fn new(toolchain: Box<dyn Toolchain>) -> Self {
        NativeRunner { toolchain }
    }

    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    fn compile(&self, step: &CompileStep) -> Result<()> {
        ensure_parent(&step.output)?;

        let input = CompileInput {
            source: step.source.clone(),
            output: step.output.clone(),
            include_dirs: step.include_dirs.clone(),
            defines: parse_defines(&step.defines),
            cflags: step.cflags.clone(),
            pic: step.pic,
        };
        let spec = self.toolchain.compile_command(&input, step.lang);

        tracing::debug!(
            "compiling {} -> {} ({})",
            step.source.display(),
            step.output.display(),
            step.lang.as_str()
        );
        run(spec, || format!("compilation failed for {}", step.source.display()))
    }

    fn archive(&self, step: &ArchiveStep) -> Result<()> {
        ensure_parent(&step.output)?;
        // `ar rcs` updates in place, so stale members would survive
        if step.output.exists() {
            fs::remove_file(&step.output)
                .with_context(|| format!("failed to remove {}", step.output.display()))?;
        }

        let input = ArchiveInput {
            objects: step.objects.clone(),
            output: step.output.clone(),
        };
        let spec = self.toolchain.archive_command(&input);

        tracing::debug!("creating static library {}", step.output.display());
        run(spec, || format!("archiving failed for {}", step.output.display()))
    }

    fn link(&self, step: &LinkStep) -> Result<()> {
        ensure_parent(&step.output)?;

        let input = LinkInput {
            objects: step.objects.clone(),
            output: step.output.clone(),
            lib_dirs: step.lib_dirs.clone(),
            libs: normalize_libs(&step.libs),
            ldflags: step.ldflags.clone(),
        };
        let driver = if step.use_cxx_linker {
            Language::Cxx
        } else {
            Language::C
        };

        let spec = match step.kind {
            UnitKind::SharedLib => self.toolchain.link_shared_command(&input, driver),
            UnitKind::Program => self.toolchain.link_exe_command(&input, driver),
            UnitKind::StaticLib => bail!("static library {} must be archived", step.target),
        };

        tracing::debug!(
            "linking {} {} (driver: {})",
            step.kind,
            step.output.display(),
            driver.as_str()
        );
        run(spec, || format!("linking failed for {}", step.output.display()))
    }

    fn install(&self, step: &InstallStep) -> Result<()> {
        ensure_parent(&step.dest)?;
        fs::copy(&step.source, &step.dest).with_context(|| {
            format!(
                "failed to install {} to {}",
                step.source.display(),
                step.dest.display()
            )
        })?;
        Ok(())
    }
}

impl StepRunner for NativeRunner {
    fn run(&self, step: &BuildStep) -> Result<()> {
        match step {
            BuildStep::Compile(s) => self.compile(s),
            BuildStep::Archive(s) => self.archive(s),
            BuildStep::Link(s) => self.link(s),
            BuildStep::Install(s) => self.install(s),
        }
    }
}

/// Run a tool; its stderr becomes the error message verbatim.
fn run(spec: CommandSpec, what: impl FnOnce() -> String) -> Result<()> {
    let cmd = process_builder_from_spec(spec);
    tracing::trace!("{}", cmd.display_command());

    let output = cmd.exec()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{}\n{}", what(), stderr);
    }
    Ok(())
}

fn process_builder_from_spec(spec: CommandSpec) -> ProcessBuilder {
    let mut cmd = ProcessBuilder::new(&spec.program).args(spec.args);
    for (key, value) in spec.env {
        cmd = cmd.env(key, value);
    }
    cmd
}

/// Accept `-lfoo` as well as `foo` in library lists.
fn normalize_libs(libs: &[String]) -> Vec<String> {
    libs.iter()
        .map(|lib| lib.strip_prefix("-l").unwrap_or(lib).to_string())
        .filter(|lib| !lib.is_empty())
        .collect()
}
