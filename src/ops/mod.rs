//! High-level operations.
//!
//! This module contains the implementation of quickc commands.

pub mod quickc_build;
pub mod quickc_clean;

pub use quickc_build::{build, build_with_runner, evaluate, BuildOptions, BuildResult};
pub use quickc_clean::{clean, CleanOptions};
