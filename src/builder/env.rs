//! The per-unit build environment.
//!
//! A [`UnitEnv`] is handed to a unit's description while it is evaluated.
//! It owns the unit's private settings, collects what the unit exports, and
//! exposes the operations a description may call.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::install::{collect_install_files, install_pairs, InstallOptions};
use crate::builder::plan::{Artifact, ArtifactRequest, StepId};
use crate::builder::session::BuildSession;
use crate::builder::snapshot::BuildManifest;
use crate::builder::toolchain::Language;
use crate::core::settings::{ExportedSettings, SettingsBag};
use crate::core::unit::{UnitKind, UnitPath};
use crate::core::variant::Variant;
use crate::resolver::merge_dependencies;

pub struct UnitEnv<'s> {
    session: &'s mut BuildSession,
    unit: UnitPath,
    dir: PathBuf,
    settings: SettingsBag,
    exports: ExportedSettings,
}

impl<'s> UnitEnv<'s> {
    /// A fresh environment for `unit`, derived from the project-level one.
    pub(crate) fn new(session: &'s mut BuildSession, unit: UnitPath) -> Self {
        let dir = session.project().unit_dir(&unit);
        let settings = session.base_settings().clone();
        UnitEnv {
            session,
            unit,
            dir,
            settings,
            exports: ExportedSettings::new(),
        }
    }

    pub fn unit(&self) -> &UnitPath {
        &self.unit
    }

    pub fn unit_dir(&self) -> &Path {
        &self.dir
    }

    pub fn project_root(&self) -> &Path {
        self.session.project().root()
    }

    pub fn variant(&self) -> Variant {
        self.session.variant()
    }

    /// The unit's own build settings.
    pub fn settings(&self) -> &SettingsBag {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsBag {
        &mut self.settings
    }

    /// What this unit has exported so far.
    pub fn exports(&self) -> &ExportedSettings {
        &self.exports
    }

    /// Evaluate another unit, resolved relative to this one.
    pub fn quick_build(&mut self, spec: &str) -> Result<UnitPath> {
        self.session.quick_build_from(&self.unit, spec)
    }

    pub fn quick_program(&mut self, name: Option<&str>, deps: &[String]) -> Result<Artifact> {
        self.quick_artifact(UnitKind::Program, name, deps)
    }

    pub fn quick_static_lib(&mut self, name: Option<&str>, deps: &[String]) -> Result<Artifact> {
        self.quick_artifact(UnitKind::StaticLib, name, deps)
    }

    pub fn quick_shared_lib(&mut self, name: Option<&str>, deps: &[String]) -> Result<Artifact> {
        self.quick_artifact(UnitKind::SharedLib, name, deps)
    }

    /// Declare an artifact of this unit.
    ///
    /// Dependencies are resolved and merged into a copy of the unit
    /// settings, the artifact is planned under `build/<variant>/<unit>`, and
    /// its public settings are added to the unit's exports. A library
    /// re-exports what it merged from its own dependencies.
    fn quick_artifact(&mut self, kind: UnitKind, name: Option<&str>, deps: &[String]) -> Result<Artifact> {
        self.session.registry_mut().declare_kind(&self.unit, kind)?;

        let mut settings = self.settings.clone();
        let resolved = merge_dependencies(&mut *self.session, &mut settings, &self.unit, deps)?;
        settings.append_include_dirs([self.dir.join("inc"), self.dir.join("src")]);

        let name = match name {
            Some(name) => name.to_string(),
            None => self.default_name(),
        };
        let sources = self.sources()?;
        if sources.is_empty() {
            tracing::warn!("unit `{}` has no sources for `{}`", self.unit, name);
        }

        let mut link_deps: Vec<StepId> = Vec::new();
        for dep in &resolved {
            link_deps.extend_from_slice(self.session.registry().provides(dep));
        }

        let build_dir = self
            .session
            .project()
            .unit_build_dir(self.session.variant(), &self.unit);
        let artifact = self.session.plan_mut().add_artifact(ArtifactRequest {
            unit: &self.unit,
            kind,
            name: &name,
            build_dir: &build_dir,
            sources: &sources,
            settings: &settings,
            link_deps: &link_deps,
        })?;
        tracing::debug!(
            "planned {} `{}` at {}",
            kind,
            name,
            artifact.path.display()
        );

        let mut public = ExportedSettings::new().with_include_dir(self.dir.join("inc"));
        if kind.is_library() {
            public = public
                .with_lib_dir(build_dir)
                .with_lib(artifact.filename());
            for dep in &resolved {
                if let Some(exports) = self.session.registry().settings(dep) {
                    public.merge(exports);
                }
            }
            let mut provides = vec![artifact.step];
            provides.extend(link_deps);
            self.session.registry_mut().add_provides(&self.unit, provides);
        }
        self.exports.merge(&public);

        Ok(artifact)
    }

    fn default_name(&self) -> String {
        match self.unit.name() {
            Some(name) => name.to_string(),
            None => self.session.project().name(),
        }
    }

    /// C and C++ sources directly in `<unit>/src`, sorted.
    fn sources(&self) -> Result<Vec<PathBuf>> {
        let src = self.dir.join("src");
        if !src.is_dir() {
            return Ok(Vec::new());
        }
        let mut sources = Vec::new();
        for entry in std::fs::read_dir(&src)? {
            let path = entry?.path();
            let is_source = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| Language::SOURCE_EXTENSIONS.contains(&e));
            if is_source && path.is_file() {
                sources.push(path);
            }
        }
        sources.sort();
        Ok(sources)
    }

    /// Install `sources` into `targets`.
    ///
    /// Relative targets are taken from the project root, relative sources
    /// from the unit directory. Returns the planned destination files.
    pub fn install_files(
        &mut self,
        targets: &[PathBuf],
        sources: &[PathBuf],
        options: &InstallOptions,
    ) -> Result<Vec<PathBuf>> {
        let root = self.project_root().to_path_buf();
        let targets: Vec<PathBuf> = targets.iter().map(|t| root.join(t)).collect();
        let sources: Vec<PathBuf> = sources.iter().map(|s| self.dir.join(s)).collect();

        let mut installed = Vec::new();
        for (target, source) in install_pairs(&targets, &sources)? {
            for (dest, file) in collect_install_files(&target, &source, options)? {
                self.session.plan_mut().add_install(&self.unit, &file, &dest)?;
                installed.push(dest);
            }
        }
        Ok(installed)
    }

    /// Copy programs into `export/<variant>/bin`.
    pub fn export_bin(&mut self, sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let target = self.session.project().export_bin_dir(self.variant());
        self.install_files(&[target], sources, &InstallOptions::flat())
    }

    /// Copy libraries into `export/<variant>/lib`.
    pub fn export_lib(&mut self, sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let target = self.session.project().export_lib_dir(self.variant());
        self.install_files(&[target], sources, &InstallOptions::flat())
    }

    /// Copy public headers into `export/<variant>/include[/<prefix>]`.
    pub fn export_include(&mut self, sources: &[PathBuf], prefix: Option<&str>) -> Result<Vec<PathBuf>> {
        let mut target = self.session.project().export_include_dir(self.variant());
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            target = target.join(prefix);
        }
        self.install_files(&[target], sources, &InstallOptions::default())
    }

    /// Snapshot of every unit known to this build so far.
    pub fn manifest_build_settings(&self) -> BuildManifest {
        self.session.manifest()
    }

    /// Add settings to what this unit exports to its dependents.
    pub fn export_settings(&mut self, settings: &ExportedSettings) {
        self.exports.merge(settings);
    }

    pub(crate) fn finish(self) -> ExportedSettings {
        self.exports
    }
}
