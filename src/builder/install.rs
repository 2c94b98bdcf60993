//! File selection for install and export actions.
//!
//! Sources are paired with target directories; directory sources are
//! walked and filtered with fnmatch-style patterns. Nothing is copied here,
//! the caller turns each selected pair into an install step.

use std::path::{Path, PathBuf};

use glob::Pattern;
use thiserror::Error;
use walkdir::WalkDir;

/// Patterns always excluded from directory installs.
pub const DEFAULT_EXCLUDES: &[&str] = &[".*", "*~", "*.o", "*.os"];

/// Errors from [`install_pairs`], [`collect_install_files`] and planning
/// install steps.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("install target count ({targets}) does not match source count ({sources})")]
    InstallMismatch { targets: usize, sources: usize },

    #[error("invalid file pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to walk {}: {message}", path.display())]
    Walk { path: PathBuf, message: String },

    #[error(
        "{} is installed from both {} and {}",
        dest.display(),
        existing.display(),
        requested.display()
    )]
    ConflictingInstall {
        dest: PathBuf,
        existing: PathBuf,
        requested: PathBuf,
    },
}

/// Filters for a directory install.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Names to skip, in addition to [`DEFAULT_EXCLUDES`]
    pub exclude: Vec<String>,
    /// When non-empty, only files matching one of these are installed
    pub glob: Vec<String>,
    /// Descend into subdirectories
    pub recurse: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        InstallOptions {
            exclude: Vec::new(),
            glob: Vec::new(),
            recurse: true,
        }
    }
}

impl InstallOptions {
    /// Options for installing individual files only.
    pub fn flat() -> Self {
        InstallOptions {
            recurse: false,
            ..Default::default()
        }
    }
}

/// Pair each source with its target directory.
///
/// A single target applies to every source; otherwise the counts must match.
pub fn install_pairs(
    targets: &[PathBuf],
    sources: &[PathBuf],
) -> Result<Vec<(PathBuf, PathBuf)>, InstallError> {
    if targets.len() == 1 {
        return Ok(sources
            .iter()
            .map(|s| (targets[0].clone(), s.clone()))
            .collect());
    }
    if targets.len() != sources.len() {
        return Err(InstallError::InstallMismatch {
            targets: targets.len(),
            sources: sources.len(),
        });
    }
    Ok(targets.iter().cloned().zip(sources.iter().cloned()).collect())
}

struct Filter {
    exclude: Vec<Pattern>,
    glob: Vec<Pattern>,
}

impl Filter {
    fn new(options: &InstallOptions) -> Result<Self, InstallError> {
        let exclude = DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(options.exclude.iter().map(String::as_str));

        Ok(Filter {
            exclude: compile_patterns(exclude)?,
            glob: compile_patterns(options.glob.iter().map(String::as_str))?,
        })
    }

    fn excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(name))
    }

    fn accepts_file(&self, name: &str) -> bool {
        !self.excluded(name) && (self.glob.is_empty() || self.glob.iter().any(|p| p.matches(name)))
    }
}

fn compile_patterns<'a>(
    patterns: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<Pattern>, InstallError> {
    patterns
        .into_iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| InstallError::InvalidPattern {
                pattern: p.to_string(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

/// Select the files to install from `source` into `target`.
///
/// Returns `(destination, source)` pairs sorted by destination. A source that
/// is not an existing directory (a plain file, or an artifact that has not
/// been built yet) installs as `target/<basename>`.
pub fn collect_install_files(
    target: &Path,
    source: &Path,
    options: &InstallOptions,
) -> Result<Vec<(PathBuf, PathBuf)>, InstallError> {
    if !source.is_dir() {
        let dest = match source.file_name() {
            Some(name) => target.join(name),
            None => target.to_path_buf(),
        };
        return Ok(vec![(dest, source.to_path_buf())]);
    }

    let filter = Filter::new(options)?;
    let walker = WalkDir::new(source)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            options.recurse && !filter.excluded(&name)
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| InstallError::Walk {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !filter.accepts_file(&name) {
            continue;
        }
        let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
        files.push((target.join(rel), entry.path().to_path_buf()));
    }

    files.sort();
    Ok(files)
}
