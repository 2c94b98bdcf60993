//! Build settings and their merge rules.
//!
//! [`ExportedSettings`] is what a unit publishes to its dependents.
//! [`SettingsBag`] is the mutable build environment of one unit: the same
//! settings plus the things that never propagate (preprocessor defines) and a
//! record of which dependency units have already been merged in.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::unit::UnitPath;

/// Settings a unit exports to the units that depend on it.
///
/// Merge rules (see [`ExportedSettings::merge`]):
/// - `include_dirs`, `lib_dirs`: set union, first-seen order.
/// - `libs`: appended, an already-present name is dropped (first wins).
/// - `cflags`, `link_flags`: appended verbatim, duplicates kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExportedSettings {
    pub include_dirs: Vec<PathBuf>,
    pub lib_dirs: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub cflags: Vec<String>,
    pub link_flags: Vec<String>,
}

impl ExportedSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.include_dirs.is_empty()
            && self.lib_dirs.is_empty()
            && self.libs.is_empty()
            && self.cflags.is_empty()
            && self.link_flags.is_empty()
    }

    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        append_unique(&mut self.include_dirs, [dir.into()]);
        self
    }

    pub fn with_lib_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        append_unique(&mut self.lib_dirs, [dir.into()]);
        self
    }

    pub fn with_lib(mut self, lib: impl Into<String>) -> Self {
        append_unique(&mut self.libs, [lib.into()]);
        self
    }

    /// Merge `other` into `self` following the merge rules.
    pub fn merge(&mut self, other: &ExportedSettings) {
        append_unique(&mut self.include_dirs, other.include_dirs.iter().cloned());
        append_unique(&mut self.lib_dirs, other.lib_dirs.iter().cloned());
        append_unique(&mut self.libs, other.libs.iter().cloned());
        self.cflags.extend(other.cflags.iter().cloned());
        self.link_flags.extend(other.link_flags.iter().cloned());
    }
}

/// Append items that are not yet present, keeping first-seen order.
pub fn append_unique<T, I>(target: &mut Vec<T>, items: I)
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// The build environment of a single unit.
///
/// Created fresh for every unit from the project-level environment, then
/// extended by the unit's own flags and its dependencies' exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingsBag {
    settings: ExportedSettings,
    defines: Vec<String>,
    #[serde(skip)]
    merged: Vec<UnitPath>,
}

impl SettingsBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.settings.include_dirs
    }

    pub fn lib_dirs(&self) -> &[PathBuf] {
        &self.settings.lib_dirs
    }

    pub fn libs(&self) -> &[String] {
        &self.settings.libs
    }

    pub fn cflags(&self) -> &[String] {
        &self.settings.cflags
    }

    pub fn link_flags(&self) -> &[String] {
        &self.settings.link_flags
    }

    pub fn defines(&self) -> &[String] {
        &self.defines
    }

    /// Units whose exports have been merged into this bag, in merge order.
    pub fn merged_units(&self) -> &[UnitPath] {
        &self.merged
    }

    /// The bag's settings in exported shape.
    pub fn settings(&self) -> &ExportedSettings {
        &self.settings
    }

    pub fn append_include_dirs<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        append_unique(
            &mut self.settings.include_dirs,
            dirs.into_iter().map(|d| d.as_ref().to_path_buf()),
        );
    }

    pub fn append_lib_dirs<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        append_unique(
            &mut self.settings.lib_dirs,
            dirs.into_iter().map(|d| d.as_ref().to_path_buf()),
        );
    }

    pub fn append_libs<I, S>(&mut self, libs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        append_unique(&mut self.settings.libs, libs.into_iter().map(Into::into));
    }

    pub fn append_cflags<I, S>(&mut self, flags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.cflags.extend(flags.into_iter().map(Into::into));
    }

    pub fn append_link_flags<I, S>(&mut self, flags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings
            .link_flags
            .extend(flags.into_iter().map(Into::into));
    }

    pub fn append_defines<I, S>(&mut self, defines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        append_unique(&mut self.defines, defines.into_iter().map(Into::into));
    }

    /// Merge exported settings without recording where they came from.
    pub fn merge(&mut self, exported: &ExportedSettings) {
        self.settings.merge(exported);
    }

    /// Merge a dependency unit's exports.
    ///
    /// Returns `false` and leaves the bag untouched if `unit` has already been
    /// merged, so merging the same dependency list twice is a no-op.
    pub fn merge_unit(&mut self, unit: &UnitPath, exported: &ExportedSettings) -> bool {
        if self.merged.contains(unit) {
            return false;
        }
        self.merged.push(unit.clone());
        self.settings.merge(exported);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib_settings(inc: &str, libs: &[&str]) -> ExportedSettings {
        ExportedSettings {
            include_dirs: vec![PathBuf::from(inc)],
            lib_dirs: vec![PathBuf::from("/build/lib")],
            libs: libs.iter().map(|s| s.to_string()).collect(),
            cflags: vec![],
            link_flags: vec!["-pthread".to_string()],
        }
    }

    #[test]
    fn test_merge_dirs_are_unique() {
        let mut a = lib_settings("/a/inc", &["a"]);
        a.merge(&lib_settings("/a/inc", &["b"]));
        assert_eq!(a.include_dirs, vec![PathBuf::from("/a/inc")]);
        assert_eq!(a.lib_dirs.len(), 1);
    }

    #[test]
    fn test_merge_libs_first_occurrence_wins() {
        let mut merged = ExportedSettings::new();
        merged.merge(&lib_settings("/x", &["x", "common"]));
        merged.merge(&lib_settings("/y", &["y", "common", "x"]));
        assert_eq!(merged.libs, vec!["x", "common", "y"]);
    }

    #[test]
    fn test_merge_link_flags_verbatim() {
        let mut merged = ExportedSettings::new();
        merged.merge(&lib_settings("/x", &[]));
        merged.merge(&lib_settings("/y", &[]));
        assert_eq!(merged.link_flags, vec!["-pthread", "-pthread"]);
    }

    #[test]
    fn test_bag_merge_unit_once() {
        let unit = UnitPath::from_segments(["Lib"]);
        let exported = lib_settings("/lib/inc", &["Lib.a"]);
        let mut bag = SettingsBag::new();

        assert!(bag.merge_unit(&unit, &exported));
        let after_first = bag.clone();
        assert!(!bag.merge_unit(&unit, &exported));
        assert_eq!(bag, after_first);
        assert_eq!(bag.merged_units(), &[unit]);
    }

    #[test]
    fn test_bag_defines_unique() {
        let mut bag = SettingsBag::new();
        bag.append_defines(["NDEBUG", "NDEBUG", "LEVEL=2"]);
        assert_eq!(bag.defines(), &["NDEBUG", "LEVEL=2"]);
    }
}
