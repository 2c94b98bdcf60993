//! Configuration file support for quickc.
//!
//! The user-wide configuration lives in `~/.quickc/config.toml`. Project
//! settings come from `QuickProject.toml`; compiler overrides there take
//! precedence over the user config, and `CC`/`CXX`/`AR` take precedence
//! over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::manifest::ProjectManifest;

/// quickc user configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub build: BuildConfig,
    pub toolchain: ToolchainSettings,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default number of parallel jobs (None = one per CPU)
    pub jobs: Option<usize>,
}

/// Compiler overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainSettings {
    /// C compiler, a path or a name looked up on PATH
    pub cc: Option<PathBuf>,
    /// C++ compiler
    pub cxx: Option<PathBuf>,
    /// Archiver
    pub ar: Option<PathBuf>,
}

impl ToolchainSettings {
    pub fn has_overrides(&self) -> bool {
        self.cc.is_some() || self.cxx.is_some() || self.ar.is_some()
    }

    /// Merge another set of overrides into this one (other takes precedence).
    pub fn merge(&mut self, other: &ToolchainSettings) {
        if other.cc.is_some() {
            self.cc = other.cc.clone();
        }
        if other.cxx.is_some() {
            self.cxx = other.cxx.clone();
        }
        if other.ar.is_some() {
            self.ar = other.ar.clone();
        }
    }

    /// Overrides from the `CC`, `CXX` and `AR` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<PathBuf>) -> Self {
        ToolchainSettings {
            cc: lookup("CC"),
            cxx: lookup("CXX"),
            ar: lookup("AR"),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// The user config, or defaults when there is none.
    pub fn load_global() -> Self {
        match global_config_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    /// Layer the project manifest and the environment over this config.
    pub fn with_project(mut self, manifest: &ProjectManifest) -> Self {
        self.toolchain.merge(&manifest.toolchain);
        self.toolchain.merge(&ToolchainSettings::from_env());
        self
    }
}

/// Get the global quickc config directory (~/.quickc).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".quickc"))
}

/// Get the global config path (~/.quickc/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}
