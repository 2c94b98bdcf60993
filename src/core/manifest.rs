//! `QuickProject.toml` and `QuickUnit.toml` parsing.
//!
//! The project manifest marks the project root and carries project-wide
//! settings. A unit manifest is the declarative build description of one
//! unit; its presence is what makes a directory a unit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::settings::ExportedSettings;
use crate::core::variant::Variant;
use crate::util::config::ToolchainSettings;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Name of the project manifest file.
pub const PROJECT_MANIFEST: &str = "QuickProject.toml";

/// Name of the unit build description file.
pub const UNIT_MANIFEST: &str = "QuickUnit.toml";

/// Errors locating or reading manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find QuickProject.toml in `{}` or any parent directory", .dir.display())]
    ProjectRootNotFound { dir: PathBuf },

    #[error("failed to parse `{}`: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

impl ManifestError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ManifestError::ProjectRootNotFound { dir } => {
                Diagnostic::error("not inside a quickc project")
                    .with_context(format!("searched upward from {}", dir.display()))
                    .with_suggestion(suggestions::NO_PROJECT)
            }
            ManifestError::Parse { path, message } => {
                Diagnostic::error("invalid manifest")
                    .with_location(path)
                    .with_context(message.trim_end().to_string())
                    .with_suggestion(suggestions::BAD_MANIFEST)
            }
        }
    }
}

/// Walk upward from `start` to the first directory containing the project
/// manifest.
pub fn find_project_root(start: &Path) -> Result<PathBuf, ManifestError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(PROJECT_MANIFEST).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ManifestError::ProjectRootNotFound {
                dir: start.to_path_buf(),
            });
        }
    }
}

fn parse_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = toml::from_str(&contents).map_err(|e| ManifestError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(parsed)
}

// =============================================================================
// Project manifest
// =============================================================================

/// Contents of `QuickProject.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectManifest {
    pub project: ProjectSection,
    pub build: BuildSection,
    pub profile: ProfileSection,
    /// Compiler overrides
    pub toolchain: ToolchainSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectSection {
    /// Display name, defaults to the root directory name
    pub name: Option<String>,
    /// Units quick-built at orchestration start
    pub units: Vec<String>,
}

/// Project-wide compile and link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildSection {
    /// Apply the default warning and optimisation flags
    pub default_flags: bool,
    pub cflags: Vec<String>,
    pub link_flags: Vec<String>,
    pub defines: Vec<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        BuildSection {
            default_flags: true,
            cflags: Vec::new(),
            link_flags: Vec::new(),
            defines: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProfileSection {
    pub debug: ProfileFlags,
    pub release: ProfileFlags,
}

impl ProfileSection {
    pub fn for_variant(&self, variant: Variant) -> &ProfileFlags {
        match variant {
            Variant::Debug => &self.debug,
            Variant::Release => &self.release,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProfileFlags {
    pub cflags: Vec<String>,
    pub link_flags: Vec<String>,
}

impl ProjectManifest {
    pub fn load(path: &Path) -> Result<Self> {
        parse_toml(path)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

// =============================================================================
// Unit manifest
// =============================================================================

/// Contents of `QuickUnit.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct UnitManifest {
    /// Other units to quick-build, as dependency specs
    pub build: Vec<String>,
    pub flags: UnitFlags,
    pub static_lib: Vec<ArtifactDecl>,
    pub shared_lib: Vec<ArtifactDecl>,
    pub program: Vec<ArtifactDecl>,
    pub export: ExportDecl,
    pub install: Vec<InstallDecl>,
    /// Extra settings exported to dependents
    pub public: ExportedSettings,
}

/// Flags added to the unit's own build environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct UnitFlags {
    pub cflags: Vec<String>,
    pub link_flags: Vec<String>,
    pub defines: Vec<String>,
    pub include_dirs: Vec<PathBuf>,
    pub lib_dirs: Vec<PathBuf>,
    pub libs: Vec<String>,
}

/// A program or library declared by a unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactDecl {
    /// Artifact name, defaults to the unit directory name
    pub name: Option<String>,
    /// Dependency specs, resolved relative to this unit
    pub deps: Vec<String>,
    /// Place the artifact in the export tree
    pub export: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExportDecl {
    /// Public header files or directories, relative to the unit
    pub include: Vec<PathBuf>,
    /// Subdirectory of `export/<variant>/include` to install into
    pub include_prefix: Option<String>,
}

/// A free-form install action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InstallDecl {
    /// Destination directory, relative to the project root
    pub dest: PathBuf,
    /// Files or directories, relative to the unit
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub glob: Vec<String>,
    #[serde(default = "default_recurse")]
    pub recurse: bool,
}

fn default_recurse() -> bool {
    true
}

impl UnitManifest {
    pub fn load(path: &Path) -> Result<Self> {
        parse_toml(path)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
