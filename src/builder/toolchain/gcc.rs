//! GCC/Clang toolchain implementation.

use std::path::{Path, PathBuf};

use super::{ArchiveInput, CommandSpec, CompileInput, Language, LinkInput, Toolchain, ToolchainPlatform};

/// GCC/Clang toolchain (Unix-like systems).
#[derive(Debug, Clone)]
pub struct GccToolchain {
    pub cc: PathBuf,
    pub cxx: PathBuf,
    pub ar: PathBuf,
    pub family: ToolchainPlatform,
}

impl GccToolchain {
    pub fn new(cc: PathBuf, cxx: PathBuf, ar: PathBuf, family: ToolchainPlatform) -> Self {
        GccToolchain {
            cc,
            cxx,
            ar,
            family,
        }
    }

    /// Infer C++ compiler path from C compiler path.
    ///
    /// - gcc, x86_64-linux-gnu-gcc -> g++, x86_64-linux-gnu-g++
    /// - clang -> clang++
    /// - cc, /usr/bin/cc -> c++, /usr/bin/c++
    pub fn infer_cxx(cc: &Path) -> PathBuf {
        let cc_str = cc.to_string_lossy();

        if cc_str.ends_with("gcc") {
            return PathBuf::from(format!("{}++", &cc_str[..cc_str.len() - 2]));
        }

        if cc_str.ends_with("clang") {
            return PathBuf::from(format!("{}++", cc_str));
        }

        // Only a whole "cc" basename, not "mycc"
        let is_standalone_cc =
            cc_str == "cc" || cc_str.ends_with("/cc") || cc_str.ends_with("-cc");
        if is_standalone_cc {
            return PathBuf::from(format!("{}++", &cc_str[..cc_str.len() - 1]));
        }

        PathBuf::from(format!("{}++", cc_str))
    }

    fn driver(&self, lang: Language) -> &Path {
        match lang {
            Language::C => &self.cc,
            Language::Cxx => &self.cxx,
        }
    }

    /// Objects, search paths, libraries, then flags.
    fn link_inputs(mut cmd: CommandSpec, input: &LinkInput) -> CommandSpec {
        cmd = cmd.arg("-o").arg(input.output.display().to_string());

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        for dir in &input.lib_dirs {
            cmd = cmd.arg(format!("-L{}", dir.display()));
        }

        for lib in &input.libs {
            cmd = cmd.arg(lib_flag(lib));
        }

        cmd.args(input.ldflags.iter().cloned())
    }
}

/// `-l:<file>` for artifact file names, `-l<name>` otherwise.
pub fn lib_flag(lib: &str) -> String {
    if lib.ends_with(".a") || lib.ends_with(".so") {
        format!("-l:{}", lib)
    } else {
        format!("-l{}", lib)
    }
}

impl Toolchain for GccToolchain {
    fn platform(&self) -> ToolchainPlatform {
        self.family
    }

    fn compiler_path(&self) -> &Path {
        &self.cc
    }

    fn compile_command(&self, input: &CompileInput, lang: Language) -> CommandSpec {
        let mut cmd = CommandSpec::new(self.driver(lang)).arg("-c");

        if input.pic {
            cmd = cmd.arg("-fPIC");
        }

        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        for (name, value) in &input.defines {
            match value {
                Some(v) => cmd = cmd.arg(format!("-D{}={}", name, v)),
                None => cmd = cmd.arg(format!("-D{}", name)),
            }
        }

        cmd = cmd.args(input.cflags.iter().cloned());

        cmd.arg(input.source.display().to_string())
            .arg("-o")
            .arg(input.output.display().to_string())
    }

    fn archive_command(&self, input: &ArchiveInput) -> CommandSpec {
        // Create archive with symbol index, replace files
        let mut cmd = CommandSpec::new(&self.ar)
            .arg("rcs")
            .arg(input.output.display().to_string());

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        cmd
    }

    fn link_shared_command(&self, input: &LinkInput, driver: Language) -> CommandSpec {
        let cmd = CommandSpec::new(self.driver(driver)).arg("-shared");
        Self::link_inputs(cmd, input)
    }

    fn link_exe_command(&self, input: &LinkInput, driver: Language) -> CommandSpec {
        let cmd = CommandSpec::new(self.driver(driver));
        Self::link_inputs(cmd, input)
    }
}
