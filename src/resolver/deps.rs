//! Merging dependency exports into a requesting unit's environment.

use anyhow::Result;

use crate::core::settings::{ExportedSettings, SettingsBag};
use crate::core::unit::UnitPath;

/// Where the dependency resolver gets units from.
///
/// Implemented by [`BuildSession`](crate::builder::BuildSession); the trait
/// keeps the merge logic independent of how units are evaluated.
pub trait DependencyProvider {
    /// Resolve a raw dependency spec as seen from `base`.
    fn resolve(&self, base: &UnitPath, spec: &str) -> Result<UnitPath>;

    /// Exported settings of `unit`, evaluating it first if needed.
    fn get_or_build(&mut self, unit: &UnitPath, requester: &UnitPath, spec: &str)
        -> Result<ExportedSettings>;

    /// Record the edge `from -> to` in the dependency graph.
    fn record_dependency(&mut self, from: &UnitPath, to: &UnitPath);
}

/// Resolve `specs` in declaration order and merge each dependency's exports
/// into `env`.
///
/// Returns the resolved units in declaration order. A dependency already
/// merged into `env` is not merged again, so calling this twice with the
/// same inputs leaves `env` as the first call did.
pub fn merge_dependencies<P>(
    provider: &mut P,
    env: &mut SettingsBag,
    base: &UnitPath,
    specs: &[String],
) -> Result<Vec<UnitPath>>
where
    P: DependencyProvider + ?Sized,
{
    let mut resolved = Vec::with_capacity(specs.len());

    for spec in specs {
        let unit = provider.resolve(base, spec)?;
        let settings = provider.get_or_build(&unit, base, spec)?;
        provider.record_dependency(base, &unit);

        if env.merge_unit(&unit, &settings) {
            tracing::debug!("merged exports of `{}` into `{}`", unit, base);
        }
        if !resolved.contains(&unit) {
            resolved.push(unit);
        }
    }

    Ok(resolved)
}
