//! Units: the buildable targets of a project.
//!
//! A unit is a directory below the project root that contains a build
//! description. Units are named by their path relative to the project root,
//! always with `/` separators regardless of platform, so the same unit has the
//! same name no matter which dependent referred to it.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The project-relative path of a unit (e.g. `Group1/Lib`).
///
/// The empty path names the project root itself, which is where top-level
/// quick builds start their search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitPath(String);

impl UnitPath {
    /// The project root.
    pub fn root() -> Self {
        UnitPath(String::new())
    }

    /// Build a unit path from already-validated segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined: Vec<String> = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        UnitPath(joined.join("/"))
    }

    /// Compute the unit path of `dir` relative to `root`.
    ///
    /// Returns `None` when `dir` is not inside `root` or contains `..`.
    pub fn from_relative(root: &Path, dir: &Path) -> Option<Self> {
        let rel = dir.strip_prefix(root).ok()?;
        let mut segments = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(s) => segments.push(s.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(UnitPath::from_segments(segments))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path segments, root has none.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// The last segment, i.e. the unit directory's basename.
    pub fn name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// The enclosing unit path, `None` for the root.
    pub fn parent(&self) -> Option<UnitPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(UnitPath(self.0[..idx].to_string())),
            None => Some(UnitPath::root()),
        }
    }

    /// Join further segments onto this path.
    pub fn join<S: AsRef<str>>(&self, segments: &[S]) -> UnitPath {
        UnitPath::from_segments(
            self.segments()
                .map(str::to_string)
                .chain(segments.iter().map(|s| s.as_ref().to_string())),
        )
    }

    /// Resolve this unit path below a filesystem directory.
    pub fn to_path(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        for segment in self.segments() {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for UnitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// The kind of artifact a unit produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    Program,
    StaticLib,
    SharedLib,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Program => "program",
            UnitKind::StaticLib => "static-lib",
            UnitKind::SharedLib => "shared-lib",
        }
    }

    pub fn is_library(&self) -> bool {
        matches!(self, UnitKind::StaticLib | UnitKind::SharedLib)
    }

    /// Artifact filename for a target of this kind.
    pub fn artifact_filename(&self, name: &str) -> String {
        match self {
            UnitKind::Program => name.to_string(),
            UnitKind::StaticLib => format!("{}.a", name),
            UnitKind::SharedLib => format!("{}.so", name),
        }
    }

    /// Object file extension used for sources of this kind.
    pub fn object_extension(&self) -> &'static str {
        match self {
            UnitKind::SharedLib => "os",
            _ => "o",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation state of a unit within one build invocation.
///
/// Transitions only go forward: `Unresolved -> InProgress -> Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitState {
    #[default]
    Unresolved,
    InProgress,
    Resolved,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_path_segments() {
        let path = UnitPath::from_segments(["Group1", "", "Lib"]);
        assert_eq!(path.as_str(), "Group1/Lib");
        assert_eq!(path.name(), Some("Lib"));
        assert_eq!(path.parent(), Some(UnitPath::from_segments(["Group1"])));
        assert_eq!(
            UnitPath::from_segments(["Group1"]).parent(),
            Some(UnitPath::root())
        );
        assert_eq!(UnitPath::root().parent(), None);
    }

    #[test]
    fn test_unit_path_relative() {
        let root = Path::new("/work/Project");
        let unit = UnitPath::from_relative(root, Path::new("/work/Project/a/b")).unwrap();
        assert_eq!(unit.as_str(), "a/b");
        assert_eq!(unit.to_path(root), PathBuf::from("/work/Project/a/b"));
        assert!(UnitPath::from_relative(root, Path::new("/elsewhere")).is_none());
        assert!(UnitPath::from_relative(root, root).unwrap().is_root());
    }

    #[test]
    fn test_root_display() {
        assert_eq!(UnitPath::root().to_string(), ".");
        assert_eq!(UnitPath::root().join(&["Lib"]).to_string(), "Lib");
    }

    #[test]
    fn test_artifact_filenames() {
        assert_eq!(UnitKind::Program.artifact_filename("progname"), "progname");
        assert_eq!(UnitKind::StaticLib.artifact_filename("StaticLib"), "StaticLib.a");
        assert_eq!(UnitKind::SharedLib.artifact_filename("SharedLib"), "SharedLib.so");
        assert_eq!(UnitKind::SharedLib.object_extension(), "os");
    }
}
