//! Dependency path resolution.
//!
//! A dependency is written as a `/`-separated relative path. It resolves to
//! the first `ancestor/<spec>` that is a unit directory, walking from the
//! requesting unit up to the project root. The nearest ancestor wins, so a
//! nested project section can shadow a unit of the same name higher up.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::core::manifest::UNIT_MANIFEST;
use crate::core::unit::UnitPath;
use crate::resolver::errors::ResolveError;

/// Whether `dir` contains a unit build description.
pub fn is_unit_dir(dir: &Path) -> bool {
    dir.join(UNIT_MANIFEST).is_file()
}

/// A validated dependency spec, as written by the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    raw: String,
    segments: Vec<String>,
}

impl DependencySpec {
    /// Validate a spec written by `requester`.
    ///
    /// Empty specs, absolute paths and `..` segments are rejected; empty and
    /// `.` segments are ignored.
    pub fn parse(requester: &UnitPath, raw: &str) -> Result<Self, ResolveError> {
        let malformed = |reason: &str| ResolveError::MalformedDependencySpec {
            requester: requester.clone(),
            spec: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(malformed("dependency name is empty"));
        }

        let as_path = Path::new(raw);
        if raw.starts_with('/')
            || raw.starts_with('\\')
            || as_path.is_absolute()
            || as_path
                .components()
                .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        {
            return Err(malformed("expected a relative path, found an absolute one"));
        }

        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(malformed("`..` segments are not allowed")),
                s => segments.push(s.to_string()),
            }
        }

        if segments.is_empty() {
            return Err(malformed("dependency does not name a unit"));
        }

        Ok(DependencySpec {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Resolves dependency specs against the project directory tree.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for the project at `root`.
    ///
    /// `root` should already be canonical so that resolved units compare
    /// equal regardless of how they were reached.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PathResolver { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `spec` as seen from the unit `base`.
    pub fn resolve(&self, base: &UnitPath, spec: &DependencySpec) -> Result<UnitPath, ResolveError> {
        let mut search = base.clone();
        let mut searched = Vec::new();

        loop {
            let candidate = search.join(spec.segments());
            let dir = candidate.to_path(&self.root);

            if is_unit_dir(&dir) {
                self.check_case(base, spec, &search.to_path(&self.root))?;
                let unit = self.canonical_unit(base, spec, &dir, candidate)?;
                tracing::debug!("resolved `{}` from `{}` to `{}`", spec, base, unit);
                return Ok(unit);
            }
            searched.push(dir.display().to_string());

            match search.parent() {
                Some(parent) => search = parent,
                None => {
                    return Err(ResolveError::DependencyNotFound {
                        requester: base.clone(),
                        spec: spec.as_str().to_string(),
                        searched,
                    })
                }
            }
        }
    }

    /// Parse and resolve a raw spec in one step.
    pub fn resolve_str(&self, base: &UnitPath, raw: &str) -> Result<UnitPath, ResolveError> {
        let spec = DependencySpec::parse(base, raw)?;
        self.resolve(base, &spec)
    }

    /// Compare each spec segment under `from` with the directory entries
    /// actually present. On a case-folding filesystem `lib` would open
    /// `Lib`; that match is rejected. Entry names are checked before any
    /// symlink is followed, so a link may differ in case from its target.
    fn check_case(&self, base: &UnitPath, spec: &DependencySpec, from: &Path) -> Result<(), ResolveError> {
        let mut dir = from.to_path_buf();
        for segment in spec.segments() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(_) => return Ok(()),
            };
            let mut folded = None;
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name == segment.as_str() {
                    folded = None;
                    break;
                }
                if name.eq_ignore_ascii_case(segment) {
                    folded = Some(name.into_owned());
                }
            }
            if let Some(found) = folded {
                return Err(ResolveError::MalformedDependencySpec {
                    requester: base.clone(),
                    spec: spec.as_str().to_string(),
                    reason: format!("matches `{}` only case-insensitively", found),
                });
            }
            dir.push(segment);
        }
        Ok(())
    }

    /// Map a matched directory to its registry key.
    ///
    /// Symlinks are followed so a unit reached through two names is one unit.
    fn canonical_unit(
        &self,
        base: &UnitPath,
        spec: &DependencySpec,
        dir: &Path,
        lexical: UnitPath,
    ) -> Result<UnitPath, ResolveError> {
        let malformed = |reason: String| ResolveError::MalformedDependencySpec {
            requester: base.clone(),
            spec: spec.as_str().to_string(),
            reason,
        };

        let canonical = match dir.canonicalize() {
            Ok(path) => path,
            Err(_) => return Ok(lexical),
        };

        let unit = UnitPath::from_relative(&self.root, &canonical).ok_or_else(|| {
            malformed(format!(
                "resolves to {} outside the project root",
                canonical.display()
            ))
        })?;

        if unit.is_root() {
            return Err(malformed("resolves to the project root itself".to_string()));
        }

        Ok(unit)
    }
}
