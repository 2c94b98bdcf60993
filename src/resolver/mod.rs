//! Dependency resolution.
//!
//! Dependencies are declared as relative paths. [`PathResolver`] maps them to
//! unit directories, [`UnitRegistry`] makes sure each unit is evaluated once
//! per build, and [`merge_dependencies`] folds the dependencies' exported
//! settings into the requesting unit's environment.

pub mod deps;
pub mod errors;
pub mod path;
pub mod registry;

pub use deps::{merge_dependencies, DependencyProvider};
pub use errors::ResolveError;
pub use path::{is_unit_dir, DependencySpec, PathResolver};
pub use registry::{Lookup, UnitEntry, UnitRegistry};
