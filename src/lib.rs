//! quickc - path-based unit dependencies for multi-unit C/C++ projects
//!
//! Units declare their dependencies as relative paths. quickc finds each
//! dependency by searching from the requesting unit up to the project root,
//! evaluates every unit once per build, merges exported settings into the
//! dependents, and builds into separate debug and release trees.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

pub use builder::{BuildExecutor, BuildPlan, BuildSession, UnitEnv};
pub use core::{ExportedSettings, Project, SettingsBag, UnitKind, UnitPath, Variant};
pub use resolver::{PathResolver, ResolveError, UnitRegistry};
pub use util::context::GlobalContext;
