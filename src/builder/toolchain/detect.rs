//! Toolchain detection.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use which::which;

use crate::util::config::ToolchainSettings;

use super::{GccToolchain, Toolchain, ToolchainPlatform};

/// Detect the toolchain to build with.
///
/// Configured tools win; anything left unset is searched for on PATH
/// (`cc`, `gcc`, `clang` for C, `c++`, `g++`, `clang++` for C++, `ar`,
/// `llvm-ar` for the archiver).
pub fn detect_toolchain(settings: &ToolchainSettings) -> Result<Box<dyn Toolchain>> {
    let cc = match &settings.cc {
        Some(cc) => locate(cc)?,
        None => match first_on_path(&["cc", "gcc", "clang"]) {
            Some(cc) => cc,
            None => bail!(
                "no C compiler found\n\
                 \n\
                 quickc requires a C compiler (gcc or clang).\n\
                 Set the CC environment variable, add `[toolchain] cc` to QuickProject.toml,\n\
                 or install a compiler."
            ),
        },
    };

    let cxx = match &settings.cxx {
        Some(cxx) => locate(cxx)?,
        None => first_on_path(&["c++", "g++", "clang++"])
            .unwrap_or_else(|| GccToolchain::infer_cxx(&cc)),
    };

    let ar = match &settings.ar {
        Some(ar) => locate(ar)?,
        None => match first_on_path(&["ar", "llvm-ar"]) {
            Some(ar) => ar,
            None => bail!("archiver (ar) not found on PATH"),
        },
    };

    let family = detect_compiler_family(&cc);

    tracing::debug!(
        "using toolchain: cc={}, cxx={}, ar={} ({})",
        cc.display(),
        cxx.display(),
        ar.display(),
        family.as_str()
    );

    Ok(Box::new(GccToolchain::new(cc, cxx, ar, family)))
}

/// Resolve a configured tool, which may be a bare name or a path.
fn locate(tool: &Path) -> Result<PathBuf> {
    match which(tool) {
        Ok(path) => Ok(path),
        Err(_) => bail!("configured tool `{}` not found", tool.display()),
    }
}

fn first_on_path(names: &[&str]) -> Option<PathBuf> {
    names.iter().find_map(|name| which(name).ok())
}

fn detect_compiler_family(cc: &Path) -> ToolchainPlatform {
    let name = cc
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    if name.contains("clang") {
        return ToolchainPlatform::Clang;
    } else if name.contains("gcc") {
        return ToolchainPlatform::Gcc;
    }

    // `cc` is usually a symlink; ask the driver
    let output = std::process::Command::new(cc).arg("--version").output();
    if let Ok(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
        if stdout.contains("clang") {
            return ToolchainPlatform::Clang;
        }
    }

    ToolchainPlatform::Gcc
}
