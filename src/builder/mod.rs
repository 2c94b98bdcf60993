//! Unit evaluation and build execution.
//!
//! Evaluation records steps into a [`BuildPlan`] through a [`BuildSession`];
//! the [`BuildExecutor`] then runs the plan with a [`StepRunner`], normally
//! the [`NativeRunner`] driving the host C/C++ toolchain.

pub mod description;
pub mod env;
pub mod executor;
pub mod install;
pub mod native;
pub mod plan;
pub mod session;
pub mod snapshot;
pub mod toolchain;

pub use description::{DescriptionLoader, ManifestLoader, UnitDescription};
pub use env::UnitEnv;
pub use executor::{BuildExecutor, BuildReport, StepFailure, StepRunner, StepState};
pub use install::{InstallError, InstallOptions};
pub use native::NativeRunner;
pub use plan::{Artifact, BuildPlan, BuildStep, PlanError, StepId};
pub use session::BuildSession;
pub use snapshot::{BuildManifest, UnitRecord};
pub use toolchain::{detect_toolchain, GccToolchain, Language, Toolchain, ToolchainPlatform};
