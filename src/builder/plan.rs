//! Build plan generation.
//!
//! A BuildPlan is the list of host-tool actions recorded while unit
//! descriptions are evaluated: compiling sources, archiving and linking
//! artifacts, and copying files into the export tree. Steps are appended
//! after the steps they depend on, so plan order is a valid execution order.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::install::InstallError;
use crate::builder::toolchain::Language;
use crate::core::settings::SettingsBag;
use crate::core::unit::{UnitKind, UnitPath};
use crate::core::variant::Variant;

/// Index of a step within its plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub usize);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors from planning compile steps.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Two artifacts of a unit want the same object file built differently.
    #[error(
        "object {} of unit `{unit}` is needed with different build settings by `{artifact}`; \
         give the artifacts the same dependencies or put them in separate units",
        output.display()
    )]
    ConflictingObject {
        output: PathBuf,
        unit: UnitPath,
        artifact: String,
    },
}

/// A complete build plan for one variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildPlan {
    pub variant: Variant,
    /// All steps in execution order
    pub steps: Vec<PlannedStep>,
    #[serde(skip)]
    producers: HashMap<PathBuf, StepId>,
}

/// A step together with the steps it waits for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedStep {
    pub id: StepId,
    pub unit: UnitPath,
    pub deps: Vec<StepId>,
    #[serde(flatten)]
    pub step: BuildStep,
}

/// A build step in the plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BuildStep {
    /// Compile a source file to an object file
    Compile(CompileStep),
    /// Create a static library from object files
    Archive(ArchiveStep),
    /// Link objects into a shared library or program
    Link(LinkStep),
    /// Copy a file into place
    Install(InstallStep),
}

/// A compilation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileStep {
    pub source: PathBuf,
    pub output: PathBuf,
    pub lang: Language,
    pub include_dirs: Vec<PathBuf>,
    /// NAME or NAME=VALUE
    pub defines: Vec<String>,
    pub cflags: Vec<String>,
    /// Position independent code, for shared library objects
    pub pic: bool,
}

/// A step to create a static library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveStep {
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
    /// Artifact name
    pub target: String,
}

/// A link step producing a program or a shared library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkStep {
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
    pub target: String,
    pub kind: UnitKind,
    pub lib_dirs: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub ldflags: Vec<String>,
    /// Use the C++ driver (any C++ source in the artifact)
    pub use_cxx_linker: bool,
}

/// A file copy into the export or install tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallStep {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl BuildStep {
    /// The file this step produces.
    pub fn output(&self) -> &Path {
        match self {
            BuildStep::Compile(s) => &s.output,
            BuildStep::Archive(s) => &s.output,
            BuildStep::Link(s) => &s.output,
            BuildStep::Install(s) => &s.dest,
        }
    }

    /// Short human-readable description for status lines.
    pub fn describe(&self, root: &Path) -> String {
        let rel = |p: &Path| {
            p.strip_prefix(root)
                .unwrap_or(p)
                .display()
                .to_string()
        };
        match self {
            BuildStep::Compile(s) => rel(&s.source),
            BuildStep::Archive(s) => rel(&s.output),
            BuildStep::Link(s) => rel(&s.output),
            BuildStep::Install(s) => rel(&s.dest),
        }
    }
}

/// What [`BuildPlan::add_artifact`] needs to plan one artifact.
#[derive(Debug, Clone)]
pub struct ArtifactRequest<'a> {
    pub unit: &'a UnitPath,
    pub kind: UnitKind,
    pub name: &'a str,
    /// Directory the artifact and its objects go to
    pub build_dir: &'a Path,
    /// Sources, all inside `<unit>/src`
    pub sources: &'a [PathBuf],
    pub settings: &'a SettingsBag,
    /// Steps producing the libraries this artifact links against
    pub link_deps: &'a [StepId],
}

/// A planned artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub unit: UnitPath,
    pub kind: UnitKind,
    pub name: String,
    pub path: PathBuf,
    /// The archive or link step producing `path`
    pub step: StepId,
}

impl Artifact {
    /// File name of the artifact, which is also what dependents link with.
    pub fn filename(&self) -> String {
        self.kind.artifact_filename(&self.name)
    }
}

impl BuildPlan {
    pub fn new(variant: Variant) -> Self {
        BuildPlan {
            variant,
            steps: Vec::new(),
            producers: HashMap::new(),
        }
    }

    /// Append a step. Every id in `deps` must already be in the plan.
    pub fn add(&mut self, unit: &UnitPath, step: BuildStep, deps: Vec<StepId>) -> StepId {
        let id = StepId(self.steps.len());
        debug_assert!(deps.iter().all(|d| d.0 < id.0));
        self.producers.insert(step.output().to_path_buf(), id);
        self.steps.push(PlannedStep {
            id,
            unit: unit.clone(),
            deps,
            step,
        });
        id
    }

    /// The step that produces `path`, if any.
    pub fn producer_of(&self, path: &Path) -> Option<StepId> {
        self.producers.get(path).copied()
    }

    pub fn get(&self, id: StepId) -> Option<&PlannedStep> {
        self.steps.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of compile steps.
    pub fn compile_count(&self) -> usize {
        self.count(|s| matches!(s, BuildStep::Compile(_)))
    }

    /// Number of archive and link steps.
    pub fn link_count(&self) -> usize {
        self.count(|s| matches!(s, BuildStep::Archive(_) | BuildStep::Link(_)))
    }

    pub fn install_count(&self) -> usize {
        self.count(|s| matches!(s, BuildStep::Install(_)))
    }

    fn count(&self, pred: impl Fn(&BuildStep) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.step)).count()
    }

    /// Plan the compile steps and the archive or link step for one artifact.
    ///
    /// Objects land in `<build_dir>/src/<file>.<ext>`, so `util.c` and
    /// `util.cpp` get distinct objects. An object planned by an earlier
    /// artifact is reused only when its compile step is identical.
    pub fn add_artifact(&mut self, req: ArtifactRequest<'_>) -> Result<Artifact, PlanError> {
        let pic = req.kind == UnitKind::SharedLib;
        let mut objects = Vec::with_capacity(req.sources.len());
        let mut compile_ids = Vec::with_capacity(req.sources.len());
        let mut use_cxx_linker = false;

        for source in req.sources {
            let lang = Language::from_path(source);
            if lang == Language::Cxx {
                use_cxx_linker = true;
            }
            let file_name = source
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let output = req
                .build_dir
                .join("src")
                .join(format!("{}.{}", file_name, req.kind.object_extension()));

            let compile = CompileStep {
                source: source.clone(),
                output: output.clone(),
                lang,
                include_dirs: req.settings.include_dirs().to_vec(),
                defines: req.settings.defines().to_vec(),
                cflags: req.settings.cflags().to_vec(),
                pic,
            };
            let id = match self.producer_of(&output) {
                Some(id) => match self.get(id).map(|p| &p.step) {
                    Some(BuildStep::Compile(existing)) if *existing == compile => id,
                    _ => {
                        return Err(PlanError::ConflictingObject {
                            output,
                            unit: req.unit.clone(),
                            artifact: req.name.to_string(),
                        })
                    }
                },
                None => self.add(req.unit, BuildStep::Compile(compile), Vec::new()),
            };
            objects.push(output);
            compile_ids.push(id);
        }

        let path = req.build_dir.join(req.kind.artifact_filename(req.name));
        let step = match req.kind {
            UnitKind::StaticLib => BuildStep::Archive(ArchiveStep {
                objects,
                output: path.clone(),
                target: req.name.to_string(),
            }),
            UnitKind::SharedLib | UnitKind::Program => {
                compile_ids.extend(req.link_deps.iter().copied());
                BuildStep::Link(LinkStep {
                    objects,
                    output: path.clone(),
                    target: req.name.to_string(),
                    kind: req.kind,
                    lib_dirs: req.settings.lib_dirs().to_vec(),
                    libs: req.settings.libs().to_vec(),
                    ldflags: req.settings.link_flags().to_vec(),
                    use_cxx_linker,
                })
            }
        };
        compile_ids.sort();
        compile_ids.dedup();
        let step = self.add(req.unit, step, compile_ids);

        Ok(Artifact {
            unit: req.unit.clone(),
            kind: req.kind,
            name: req.name.to_string(),
            path,
            step,
        })
    }

    /// Plan copying `source` to `dest`, after whatever step produces `source`.
    ///
    /// Repeating the same copy returns the existing step. Any other step
    /// already writing `dest` is a conflict.
    pub fn add_install(
        &mut self,
        unit: &UnitPath,
        source: &Path,
        dest: &Path,
    ) -> Result<StepId, InstallError> {
        if let Some(existing) = self.producer_of(dest) {
            return match self.get(existing).map(|p| &p.step) {
                Some(BuildStep::Install(s)) if s.source == source => Ok(existing),
                Some(BuildStep::Install(s)) => Err(InstallError::ConflictingInstall {
                    dest: dest.to_path_buf(),
                    existing: s.source.clone(),
                    requested: source.to_path_buf(),
                }),
                _ => Err(InstallError::ConflictingInstall {
                    dest: dest.to_path_buf(),
                    existing: dest.to_path_buf(),
                    requested: source.to_path_buf(),
                }),
            };
        }
        let deps = self.producer_of(source).into_iter().collect();
        Ok(self.add(
            unit,
            BuildStep::Install(InstallStep {
                source: source.to_path_buf(),
                dest: dest.to_path_buf(),
            }),
            deps,
        ))
    }
}
