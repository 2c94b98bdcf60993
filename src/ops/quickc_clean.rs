//! Implementation of `quickc clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::{Project, Variant};
use crate::util::fs::remove_dir_all_if_exists;

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    pub release: bool,
    /// Clean every variant
    pub all: bool,
}

/// Remove the build and export trees of the selected variants.
///
/// Returns the directories that existed and were removed.
pub fn clean(project: &Project, opts: &CleanOptions) -> Result<Vec<PathBuf>> {
    let variants: Vec<Variant> = if opts.all {
        Variant::all().to_vec()
    } else {
        vec![Variant::from_release(opts.release)]
    };

    let mut removed = Vec::new();
    for variant in variants {
        for dir in [project.build_dir(variant), project.export_dir(variant)] {
            if remove_dir_all_if_exists(&dir)? {
                tracing::debug!("removed {}", dir.display());
                removed.push(dir);
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::PROJECT_MANIFEST;
    use tempfile::TempDir;

    fn project(tmp: &TempDir) -> Project {
        std::fs::write(tmp.path().join(PROJECT_MANIFEST), "[project]\n").unwrap();
        for dir in ["build/debug/A", "build/release/A", "export/debug/bin"] {
            std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        Project::load(tmp.path()).unwrap()
    }

    #[test]
    fn test_clean_debug_only() {
        let tmp = TempDir::new().unwrap();
        let project = project(&tmp);

        let removed = clean(&project, &CleanOptions::default()).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!tmp.path().join("build/debug").exists());
        assert!(!tmp.path().join("export/debug").exists());
        assert!(tmp.path().join("build/release/A").exists());
    }

    #[test]
    fn test_clean_all() {
        let tmp = TempDir::new().unwrap();
        let project = project(&tmp);

        let opts = CleanOptions {
            all: true,
            ..Default::default()
        };
        let removed = clean(&project, &opts).unwrap();
        assert_eq!(removed.len(), 3);
        assert!(!tmp.path().join("build/release").exists());

        // Nothing left to remove.
        assert!(clean(&project, &opts).unwrap().is_empty());
    }
}
