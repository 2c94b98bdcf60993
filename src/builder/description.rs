//! Unit build descriptions.
//!
//! A description is what a unit does when it is evaluated: declare
//! artifacts, pull in other units, export files. The stock description is
//! the unit's `QuickUnit.toml`; embedders and tests can supply their own
//! through a [`DescriptionLoader`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::env::UnitEnv;
use crate::builder::install::InstallOptions;
use crate::core::manifest::{ArtifactDecl, UnitManifest, UNIT_MANIFEST};
use crate::core::settings::ExportedSettings;
use crate::core::unit::{UnitKind, UnitPath};

/// The build description of one unit.
pub trait UnitDescription {
    fn evaluate(&self, env: &mut UnitEnv<'_>) -> Result<()>;
}

impl<F> UnitDescription for F
where
    F: Fn(&mut UnitEnv<'_>) -> Result<()>,
{
    fn evaluate(&self, env: &mut UnitEnv<'_>) -> Result<()> {
        self(env)
    }
}

/// Produces the description of a unit directory.
pub trait DescriptionLoader {
    fn load(&self, unit: &UnitPath, dir: &Path) -> Result<Box<dyn UnitDescription>>;
}

/// Loads `QuickUnit.toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader;

impl DescriptionLoader for ManifestLoader {
    fn load(&self, unit: &UnitPath, dir: &Path) -> Result<Box<dyn UnitDescription>> {
        let manifest = UnitManifest::load(&dir.join(UNIT_MANIFEST))
            .with_context(|| format!("failed to load build description of unit `{}`", unit))?;
        Ok(Box::new(manifest))
    }
}

impl UnitDescription for UnitManifest {
    fn evaluate(&self, env: &mut UnitEnv<'_>) -> Result<()> {
        for spec in &self.build {
            env.quick_build(spec)?;
        }

        let dir = env.unit_dir().to_path_buf();
        let flags = &self.flags;
        let settings = env.settings_mut();
        settings.append_cflags(flags.cflags.iter().cloned());
        settings.append_link_flags(flags.link_flags.iter().cloned());
        settings.append_defines(flags.defines.iter().cloned());
        settings.append_include_dirs(flags.include_dirs.iter().map(|d| dir.join(d)));
        settings.append_lib_dirs(flags.lib_dirs.iter().map(|d| dir.join(d)));
        settings.append_libs(flags.libs.iter().cloned());

        let artifacts = [
            (UnitKind::StaticLib, &self.static_lib),
            (UnitKind::SharedLib, &self.shared_lib),
            (UnitKind::Program, &self.program),
        ];
        for (kind, decls) in artifacts {
            for decl in decls {
                declare(env, kind, decl)?;
            }
        }

        if !self.export.include.is_empty() {
            let paths = relative_to(&dir, &self.export.include);
            env.export_include(&paths, self.export.include_prefix.as_deref())?;
        }

        for install in &self.install {
            let target = env.project_root().join(&install.dest);
            let options = InstallOptions {
                exclude: install.exclude.clone(),
                glob: install.glob.clone(),
                recurse: install.recurse,
            };
            env.install_files(&[target], &relative_to(&dir, &install.files), &options)?;
        }

        if !self.public.is_empty() {
            let public = ExportedSettings {
                include_dirs: relative_to(&dir, &self.public.include_dirs),
                lib_dirs: relative_to(&dir, &self.public.lib_dirs),
                ..self.public.clone()
            };
            env.export_settings(&public);
        }

        Ok(())
    }
}

fn declare(env: &mut UnitEnv<'_>, kind: UnitKind, decl: &ArtifactDecl) -> Result<()> {
    let name = decl.name.as_deref();
    let artifact = match kind {
        UnitKind::StaticLib => env.quick_static_lib(name, &decl.deps)?,
        UnitKind::SharedLib => env.quick_shared_lib(name, &decl.deps)?,
        UnitKind::Program => env.quick_program(name, &decl.deps)?,
    };
    if decl.export {
        let path = [artifact.path];
        if kind.is_library() {
            env.export_lib(&path)?;
        } else {
            env.export_bin(&path)?;
        }
    }
    Ok(())
}

fn relative_to(dir: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().map(|p| dir.join(p)).collect()
}
