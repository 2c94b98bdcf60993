//! Project - the root of a multi-unit build.
//!
//! A Project owns the project root and manifest and knows the fixed output
//! layout: intermediate files go to `build/<variant>/<unit>/` and exported
//! artifacts to `export/<variant>/{bin,lib,include}/`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::manifest::{find_project_root, ProjectManifest, PROJECT_MANIFEST};
use crate::core::settings::SettingsBag;
use crate::core::unit::UnitPath;
use crate::core::variant::Variant;

/// Compiler flags applied to every variant by default.
pub const DEFAULT_CFLAGS: &[&str] = &["-Wall", "-Wextra", "-Wpedantic", "-Werror"];

/// Extra default compiler flags for debug builds.
pub const DEBUG_CFLAGS: &[&str] = &["-O0", "-g"];

/// Extra default compiler flags for release builds.
pub const RELEASE_CFLAGS: &[&str] = &["-O3", "-fvisibility=hidden"];

/// Extra default link flags for release builds.
pub const RELEASE_LINK_FLAGS: &[&str] = &["-Wl,--strip-all"];

/// A loaded project.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    manifest: ProjectManifest,
}

impl Project {
    /// Load the project rooted at `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to resolve project root {}", root.display()))?;
        let manifest = ProjectManifest::load(&root.join(PROJECT_MANIFEST))?;
        Ok(Project { root, manifest })
    }

    /// Find the project containing `cwd` and load it.
    pub fn discover(cwd: &Path) -> Result<Self> {
        let root = find_project_root(cwd)?;
        Self::load(&root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    /// Display name of the project.
    pub fn name(&self) -> String {
        self.manifest.project.name.clone().unwrap_or_else(|| {
            self.root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "project".to_string())
        })
    }

    /// Units quick-built at orchestration start.
    pub fn root_units(&self) -> &[String] {
        &self.manifest.project.units
    }

    /// Source directory of a unit.
    pub fn unit_dir(&self, unit: &UnitPath) -> PathBuf {
        unit.to_path(&self.root)
    }

    /// `build/<variant>`
    pub fn build_dir(&self, variant: Variant) -> PathBuf {
        self.root.join("build").join(variant.as_str())
    }

    /// `build/<variant>/<unit>`
    pub fn unit_build_dir(&self, variant: Variant, unit: &UnitPath) -> PathBuf {
        unit.to_path(&self.build_dir(variant))
    }

    /// `export/<variant>`
    pub fn export_dir(&self, variant: Variant) -> PathBuf {
        self.root.join("export").join(variant.as_str())
    }

    pub fn export_bin_dir(&self, variant: Variant) -> PathBuf {
        self.export_dir(variant).join("bin")
    }

    pub fn export_lib_dir(&self, variant: Variant) -> PathBuf {
        self.export_dir(variant).join("lib")
    }

    pub fn export_include_dir(&self, variant: Variant) -> PathBuf {
        self.export_dir(variant).join("include")
    }

    /// The project-level build environment every unit starts from.
    pub fn base_settings(&self, variant: Variant) -> SettingsBag {
        let build = &self.manifest.build;
        let mut bag = SettingsBag::new();

        if build.default_flags {
            bag.append_cflags(DEFAULT_CFLAGS.iter().copied());
            match variant {
                Variant::Debug => bag.append_cflags(DEBUG_CFLAGS.iter().copied()),
                Variant::Release => {
                    bag.append_cflags(RELEASE_CFLAGS.iter().copied());
                    bag.append_link_flags(RELEASE_LINK_FLAGS.iter().copied());
                }
            }
        }

        bag.append_cflags(build.cflags.iter().cloned());
        bag.append_link_flags(build.link_flags.iter().cloned());
        bag.append_defines(build.defines.iter().cloned());

        let profile = self.manifest.profile.for_variant(variant);
        bag.append_cflags(profile.cflags.iter().cloned());
        bag.append_link_flags(profile.link_flags.iter().cloned());

        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_project(dir: &Path, manifest: &str) -> Project {
        std::fs::write(dir.join(PROJECT_MANIFEST), manifest).unwrap();
        Project::load(dir).unwrap()
    }

    #[test]
    fn test_layout() {
        let tmp = TempDir::new().unwrap();
        let project = create_project(tmp.path(), "");
        let unit = UnitPath::from_segments(["Group1", "Lib"]);
        let root = project.root().to_path_buf();

        assert_eq!(
            project.unit_build_dir(Variant::Debug, &unit),
            root.join("build/debug/Group1/Lib")
        );
        assert_eq!(
            project.export_lib_dir(Variant::Release),
            root.join("export/release/lib")
        );
        assert_eq!(
            project.export_include_dir(Variant::Debug),
            root.join("export/debug/include")
        );
    }

    #[test]
    fn test_default_flags_per_variant() {
        let tmp = TempDir::new().unwrap();
        let project = create_project(tmp.path(), "");

        let debug = project.base_settings(Variant::Debug);
        assert!(debug.cflags().contains(&"-Werror".to_string()));
        assert!(debug.cflags().contains(&"-g".to_string()));
        assert!(debug.link_flags().is_empty());

        let release = project.base_settings(Variant::Release);
        assert!(release.cflags().contains(&"-O3".to_string()));
        assert_eq!(release.link_flags(), &["-Wl,--strip-all"]);
    }

    #[test]
    fn test_default_flags_disabled() {
        let tmp = TempDir::new().unwrap();
        let project = create_project(
            tmp.path(),
            "[build]\ndefault-flags = false\ncflags = [\"-std=c99\"]\n\n[profile.debug]\ncflags = [\"-g3\"]\n",
        );

        let bag = project.base_settings(Variant::Debug);
        assert_eq!(bag.cflags(), &["-std=c99", "-g3"]);
    }

    #[test]
    fn test_name_defaults_to_directory() {
        let tmp = TempDir::new().unwrap();
        let project = create_project(tmp.path(), "[project]\nname = \"demo\"\n");
        assert_eq!(project.name(), "demo");
    }
}
