//! BuildSession - one build invocation's evaluation state.
//!
//! The session owns everything unit evaluation shares: the project and
//! variant, the path resolver, the unit registry, and the build plan being
//! recorded. Evaluation is synchronous; a unit's description runs to
//! completion before the unit that requested it continues.

use anyhow::Result;

use crate::builder::description::{DescriptionLoader, ManifestLoader};
use crate::builder::env::UnitEnv;
use crate::builder::plan::BuildPlan;
use crate::builder::snapshot::BuildManifest;
use crate::core::project::Project;
use crate::core::settings::{ExportedSettings, SettingsBag};
use crate::core::unit::UnitPath;
use crate::core::variant::Variant;
use crate::resolver::{DependencyProvider, Lookup, PathResolver, UnitRegistry};

pub struct BuildSession {
    project: Project,
    variant: Variant,
    resolver: PathResolver,
    registry: UnitRegistry,
    plan: BuildPlan,
    base: SettingsBag,
    loader: Box<dyn DescriptionLoader>,
}

impl BuildSession {
    /// Start a build of `project` for `variant`, reading unit descriptions
    /// from their `QuickUnit.toml`.
    pub fn new(project: Project, variant: Variant) -> Self {
        let resolver = PathResolver::new(project.root());
        let base = project.base_settings(variant);
        BuildSession {
            project,
            variant,
            resolver,
            registry: UnitRegistry::new(),
            plan: BuildPlan::new(variant),
            base,
            loader: Box::new(ManifestLoader),
        }
    }

    /// Use `loader` instead of reading `QuickUnit.toml` files.
    pub fn with_loader(mut self, loader: impl DescriptionLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// The project-level environment every unit starts from.
    pub fn base_settings(&self) -> &SettingsBag {
        &self.base
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut UnitRegistry {
        &mut self.registry
    }

    pub fn plan(&self) -> &BuildPlan {
        &self.plan
    }

    pub(crate) fn plan_mut(&mut self) -> &mut BuildPlan {
        &mut self.plan
    }

    pub fn into_plan(self) -> BuildPlan {
        self.plan
    }

    /// Evaluate the unit `spec` names, searching from the project root.
    pub fn quick_build(&mut self, spec: &str) -> Result<UnitPath> {
        self.quick_build_from(&UnitPath::root(), spec)
    }

    /// Evaluate the project's root units, in manifest order.
    pub fn build_root_units(&mut self) -> Result<Vec<UnitPath>> {
        let specs = self.project.root_units().to_vec();
        self.build_units(&specs)
    }

    /// Evaluate each of `specs`, in order.
    pub fn build_units(&mut self, specs: &[String]) -> Result<Vec<UnitPath>> {
        let mut units = Vec::with_capacity(specs.len());
        for spec in specs {
            units.push(self.quick_build(spec)?);
        }
        Ok(units)
    }

    pub(crate) fn quick_build_from(&mut self, base: &UnitPath, spec: &str) -> Result<UnitPath> {
        let unit = self.resolve(base, spec)?;
        self.get_or_build(&unit, base, spec)?;
        self.registry.record_dependency(base, &unit);
        Ok(unit)
    }

    /// Snapshot of every unit known so far.
    pub fn manifest(&self) -> BuildManifest {
        BuildManifest::from_registry(&self.project.name(), self.variant, &self.registry)
    }

    fn evaluate(&mut self, unit: &UnitPath) -> Result<ExportedSettings> {
        let dir = self.project.unit_dir(unit);
        let description = self.loader.load(unit, &dir)?;

        tracing::info!("evaluating unit `{}` ({})", unit, self.variant);
        let mut env = UnitEnv::new(self, unit.clone());
        description.evaluate(&mut env)?;
        Ok(env.finish())
    }
}

impl DependencyProvider for BuildSession {
    fn resolve(&self, base: &UnitPath, spec: &str) -> Result<UnitPath> {
        let unit = self.resolver.resolve_str(base, spec)?;
        tracing::debug!("`{}` from `{}` resolved to `{}`", spec, base, unit);
        Ok(unit)
    }

    fn get_or_build(&mut self, unit: &UnitPath, requester: &UnitPath, spec: &str) -> Result<ExportedSettings> {
        match self.registry.begin(unit, requester, spec)? {
            Lookup::Resolved(settings) => Ok(settings),
            Lookup::Started => match self.evaluate(unit) {
                Ok(settings) => {
                    self.registry.mark_resolved(unit, settings.clone())?;
                    Ok(settings)
                }
                Err(err) => {
                    self.registry.abandon(unit);
                    Err(err)
                }
            },
        }
    }

    fn record_dependency(&mut self, from: &UnitPath, to: &UnitPath) {
        self.registry.record_dependency(from, to);
    }
}
