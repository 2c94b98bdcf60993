//! Core data structures for quickc.
//!
//! This module contains the foundational types used throughout quickc:
//! - Units, their kinds and evaluation states
//! - Build variants
//! - Exported settings and the per-unit settings bag
//! - Manifests and the project layout

pub mod manifest;
pub mod project;
pub mod settings;
pub mod unit;
pub mod variant;

pub use manifest::{
    find_project_root, ManifestError, ProjectManifest, UnitManifest, PROJECT_MANIFEST,
    UNIT_MANIFEST,
};
pub use project::Project;
pub use settings::{ExportedSettings, SettingsBag};
pub use unit::{UnitKind, UnitPath, UnitState};
pub use variant::Variant;
