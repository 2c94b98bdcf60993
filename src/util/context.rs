//! Global context for quickc operations.
//!
//! Provides centralized access to the working directory and user
//! configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::manifest::{find_project_root, ManifestError};
use crate::core::project::Project;
use crate::util::config::Config;

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    cwd: PathBuf,
    /// User configuration (~/.quickc/config.toml)
    config: Config,
}

impl GlobalContext {
    /// Context for the current directory with the user config loaded.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_config(cwd, Config::load_global()))
    }

    /// Context for `cwd` with the given configuration.
    pub fn with_config(cwd: PathBuf, config: Config) -> Self {
        GlobalContext { cwd, config }
    }

    /// Find the project root by searching upward from the working directory.
    pub fn find_project_root(&self) -> Result<PathBuf, ManifestError> {
        find_project_root(&self.cwd)
    }

    /// Load the enclosing project.
    pub fn load_project(&self) -> Result<Project> {
        let root = self.find_project_root()?;
        Project::load(&root)
    }

    /// The user configuration with the project's overrides and the
    /// environment layered on top.
    pub fn effective_config(&self, project: &Project) -> Config {
        self.config.clone().with_project(project.manifest())
    }
}
