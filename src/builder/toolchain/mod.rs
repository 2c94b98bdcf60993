//! Toolchain abstraction for C/C++ compilers.
//!
//! A toolchain turns planned steps into concrete compiler, archiver and
//! linker command lines. Only GCC-style drivers (gcc, clang) are supported.
//!
//! Toolchain selection priority:
//! 1. Environment variables (CC, CXX, AR)
//! 2. Project manifest `[toolchain]`
//! 3. User config (`~/.quickc/config.toml`)
//! 4. Auto-detection (searching PATH for common compilers)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

mod detect;
mod gcc;

pub use detect::detect_toolchain;
pub use gcc::GccToolchain;

/// Source language of a compile step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    C,
    #[serde(alias = "c++")]
    Cxx,
}

impl Language {
    /// Source file extensions picked up from a unit's `src/` directory.
    pub const SOURCE_EXTENSIONS: &'static [&'static str] = &["c", "cpp", "cc", "cxx"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
        }
    }

    /// Language of a source file, by extension.
    pub fn from_path(path: &Path) -> Language {
        match path.extension().and_then(|e| e.to_str()) {
            Some("cpp" | "cc" | "cxx" | "C") => Language::Cxx,
            _ => Language::C,
        }
    }
}

/// A command to execute, with program, arguments, and environment.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }
}

/// Input for a compile step.
#[derive(Debug, Clone)]
pub struct CompileInput {
    pub source: PathBuf,
    pub output: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor defines (name, optional value)
    pub defines: Vec<(String, Option<String>)>,
    pub cflags: Vec<String>,
    pub pic: bool,
}

/// Input for an archive step (creating a static library).
#[derive(Debug, Clone)]
pub struct ArchiveInput {
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Input for a link step.
#[derive(Debug, Clone)]
pub struct LinkInput {
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
    pub lib_dirs: Vec<PathBuf>,
    /// Libraries, either a plain name (`m`) or an artifact file (`Core.a`)
    pub libs: Vec<String>,
    pub ldflags: Vec<String>,
}

/// The family of a toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainPlatform {
    Gcc,
    Clang,
}

impl ToolchainPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainPlatform::Gcc => "gcc",
            ToolchainPlatform::Clang => "clang",
        }
    }
}

/// Trait for toolchain implementations.
pub trait Toolchain: Send + Sync {
    fn platform(&self) -> ToolchainPlatform;

    fn compiler_path(&self) -> &Path;

    fn compile_command(&self, input: &CompileInput, lang: Language) -> CommandSpec;

    fn archive_command(&self, input: &ArchiveInput) -> CommandSpec;

    fn link_shared_command(&self, input: &LinkInput, driver: Language) -> CommandSpec;

    fn link_exe_command(&self, input: &LinkInput, driver: Language) -> CommandSpec;
}

/// Split `NAME=VALUE` defines into name and optional value.
pub fn parse_defines(defines: &[String]) -> Vec<(String, Option<String>)> {
    defines
        .iter()
        .map(|d| match d.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(value.to_string())),
            None => (d.clone(), None),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path(Path::new("src/a.c")), Language::C);
        assert_eq!(Language::from_path(Path::new("src/a.cpp")), Language::Cxx);
        assert_eq!(Language::from_path(Path::new("src/a.cc")), Language::Cxx);
        assert_eq!(Language::from_path(Path::new("src/a")), Language::C);
    }

    #[test]
    fn test_parse_defines() {
        let defines = parse_defines(&["DEBUG".to_string(), "LEVEL=3".to_string()]);
        assert_eq!(
            defines,
            vec![
                ("DEBUG".to_string(), None),
                ("LEVEL".to_string(), Some("3".to_string())),
            ]
        );
    }
}
