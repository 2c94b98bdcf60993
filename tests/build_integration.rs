//! Library-level integration tests.
//!
//! These drive evaluation and execution end to end with a runner that
//! writes placeholder files instead of invoking a compiler.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use quickc::builder::{BuildStep, InstallError, PlanError, StepRunner, UnitEnv};
use quickc::core::{Project, UnitKind, UnitPath, Variant};
use quickc::ops::{build_with_runner, evaluate, BuildOptions};
use quickc::resolver::ResolveError;
use quickc::util::shell::{ColorChoice, Shell, Verbosity};
use quickc::BuildSession;

/// Writes a placeholder for every compiled, archived or linked file and
/// copies installed ones.
struct FakeRunner;

impl StepRunner for FakeRunner {
    fn run(&self, step: &BuildStep) -> Result<()> {
        if let Some(parent) = step.output().parent() {
            fs::create_dir_all(parent)?;
        }
        match step {
            BuildStep::Install(install) => {
                fs::copy(&install.source, &install.dest)?;
            }
            other => fs::write(other.output(), "placeholder")?,
        }
        Ok(())
    }
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn quiet() -> Arc<Shell> {
    Arc::new(Shell::new(Verbosity::Quiet, ColorChoice::Never))
}

/// Program -> SharedLib, StaticLib; StaticLib -> SharedLib.
fn demo_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "QuickProject.toml", "[project]\nname = \"demo\"\nunits = [\"Program\"]\n");

    write(
        root,
        "Program/QuickUnit.toml",
        "[[program]]\nname = \"progname\"\ndeps = [\"SharedLib\", \"StaticLib\"]\nexport = true\n",
    );
    write(root, "Program/src/main.c", "int main(void) { return 0; }\n");

    write(
        root,
        "SharedLib/QuickUnit.toml",
        "[[shared-lib]]\nexport = true\n\n[export]\ninclude = [\"inc\"]\n",
    );
    write(root, "SharedLib/src/shared.c", "int shared(void) { return 1; }\n");
    write(root, "SharedLib/inc/shared.h", "int shared(void);\n");

    write(
        root,
        "StaticLib/QuickUnit.toml",
        "[[static-lib]]\ndeps = [\"SharedLib\"]\n",
    );
    write(root, "StaticLib/src/a.c", "int a(void) { return 2; }\n");
    write(root, "StaticLib/src/b.cpp", "int b() { return 3; }\n");
    tmp
}

fn load(tmp: &TempDir) -> Project {
    Project::load(tmp.path()).unwrap()
}

fn unit(path: &str) -> UnitPath {
    UnitPath::from_segments(path.split('/'))
}

#[test]
fn test_end_to_end_debug_build() {
    let tmp = demo_project();
    let root = tmp.path();

    let result = build_with_runner(load(&tmp), &FakeRunner, quiet(), &BuildOptions::default()).unwrap();

    assert!(result.report.unwrap().is_success());
    assert_eq!(result.units, vec![unit("Program")]);
    assert!(root.join("build/debug/Program/progname").is_file());
    assert!(root.join("build/debug/SharedLib/SharedLib.so").is_file());
    assert!(root.join("build/debug/StaticLib/StaticLib.a").is_file());
    assert!(root.join("build/debug/SharedLib/src/shared.c.os").is_file());
    assert!(root.join("build/debug/StaticLib/src/a.c.o").is_file());
    assert!(root.join("export/debug/bin/progname").is_file());
    assert!(root.join("export/debug/lib/SharedLib.so").is_file());
    assert!(root.join("export/debug/include/shared.h").is_file());
    assert!(!root.join("export/debug/lib/StaticLib.a").exists());
    assert!(!root.join("build/release").exists());
}

#[test]
fn test_each_unit_evaluated_once() {
    let tmp = demo_project();
    let session = evaluate(load(&tmp), Variant::Debug, &[]).unwrap();

    // SharedLib is requested by Program and by StaticLib.
    assert_eq!(session.registry().evaluations(), 3);
    assert_eq!(session.plan().link_count(), 3);
}

#[test]
fn test_program_environment_carries_library_exports() {
    let tmp = demo_project();
    let root = load(&tmp).root().to_path_buf();
    let session = evaluate(load(&tmp), Variant::Debug, &[]).unwrap();

    let link = session
        .plan()
        .steps
        .iter()
        .find_map(|s| match &s.step {
            BuildStep::Link(link) if link.kind == UnitKind::Program => Some(link.clone()),
            _ => None,
        })
        .unwrap();

    // SharedLib arrives directly and again through StaticLib; it is linked once.
    assert_eq!(link.libs, vec!["SharedLib.so", "StaticLib.a"]);
    assert!(link.lib_dirs.contains(&root.join("build/debug/SharedLib")));
    assert!(!link.use_cxx_linker);

    let compile = session
        .plan()
        .steps
        .iter()
        .find_map(|s| match &s.step {
            BuildStep::Compile(c) if c.source.ends_with("main.c") => Some(c.clone()),
            _ => None,
        })
        .unwrap();
    assert!(compile.include_dirs.contains(&root.join("SharedLib/inc")));
    assert!(compile.include_dirs.contains(&root.join("Program/inc")));
}

#[test]
fn test_exported_settings_snapshot() {
    let tmp = demo_project();
    let root = load(&tmp).root().to_path_buf();
    let session = evaluate(load(&tmp), Variant::Debug, &[]).unwrap();
    let manifest = session.manifest();

    let shared = manifest.get(&unit("SharedLib")).unwrap();
    assert_eq!(shared.kind, Some(UnitKind::SharedLib));
    assert_eq!(shared.exports.libs, vec!["SharedLib.so"]);
    assert_eq!(shared.exports.include_dirs, vec![root.join("SharedLib/inc")]);
    assert_eq!(shared.dependents, vec![unit("Program"), unit("StaticLib")]);

    // A static library re-exports what it linked against.
    let static_lib = manifest.get(&unit("StaticLib")).unwrap();
    assert_eq!(static_lib.exports.libs, vec!["StaticLib.a", "SharedLib.so"]);
}

#[test]
fn test_variant_isolation() {
    let tmp = demo_project();
    let root = tmp.path();

    let release = BuildOptions {
        release: true,
        ..Default::default()
    };
    build_with_runner(load(&tmp), &FakeRunner, quiet(), &BuildOptions::default()).unwrap();
    build_with_runner(load(&tmp), &FakeRunner, quiet(), &release).unwrap();

    assert!(root.join("build/debug/Program/progname").is_file());
    assert!(root.join("build/release/Program/progname").is_file());
    assert!(root.join("export/release/lib/SharedLib.so").is_file());

    let session = evaluate(load(&tmp), Variant::Release, &[]).unwrap();
    let shared = session.manifest();
    let lib_dirs = &shared.get(&unit("SharedLib")).unwrap().exports.lib_dirs;
    assert!(lib_dirs.iter().all(|d| d.ends_with("build/release/SharedLib")));
}

#[test]
fn test_nearest_ancestor_wins() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "QuickProject.toml", "[project]\nunits = [\"Group/App\"]\n");
    write(root, "Group/App/QuickUnit.toml", "[[program]]\ndeps = [\"Lib\"]\n");
    write(root, "Group/Lib/QuickUnit.toml", "[[static-lib]]\nname = \"inner\"\n");
    write(root, "Lib/QuickUnit.toml", "[[static-lib]]\nname = \"outer\"\n");

    let session = evaluate(Project::load(root).unwrap(), Variant::Debug, &[]).unwrap();
    let registry = session.registry();
    assert_eq!(registry.dependencies(&unit("Group/App")), &[unit("Group/Lib")]);
    assert!(registry.get(&unit("Lib")).is_none());
}

#[test]
fn test_circular_dependency() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "QuickProject.toml", "[project]\nunits = [\"A\"]\n");
    write(root, "A/QuickUnit.toml", "[[static-lib]]\ndeps = [\"B\"]\n");
    write(root, "B/QuickUnit.toml", "[[static-lib]]\ndeps = [\"A\"]\n");

    let err = evaluate(Project::load(root).unwrap(), Variant::Debug, &[])
        .err()
        .unwrap();
    match err.downcast_ref::<ResolveError>() {
        Some(ResolveError::CircularDependency { chain, .. }) => {
            assert_eq!(chain, &vec![unit("A"), unit("B"), unit("A")]);
        }
        other => panic!("expected a cycle, got {:?}", other),
    }
}

#[test]
fn test_missing_dependency() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "QuickProject.toml", "[project]\nunits = [\"App\"]\n");
    write(root, "App/QuickUnit.toml", "[[program]]\ndeps = [\"Nowhere\"]\n");

    let err = evaluate(Project::load(root).unwrap(), Variant::Debug, &[])
        .err()
        .unwrap();
    assert!(matches!(
        err.downcast_ref::<ResolveError>(),
        Some(ResolveError::DependencyNotFound { .. })
    ));
}

#[test]
fn test_programs_with_different_deps_conflict() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "QuickProject.toml", "[project]\nunits = [\"Tools\"]\n");
    write(
        root,
        "Tools/QuickUnit.toml",
        "[[program]]\nname = \"plain\"\n\n[[program]]\nname = \"withlib\"\ndeps = [\"Lib\"]\n",
    );
    write(root, "Tools/src/main.c", "int main(void) { return 0; }\n");
    write(root, "Lib/QuickUnit.toml", "[[static-lib]]\n");
    write(root, "Lib/src/lib.c", "int lib(void) { return 0; }\n");
    write(root, "Lib/inc/lib.h", "int lib(void);\n");

    let err = evaluate(Project::load(root).unwrap(), Variant::Debug, &[])
        .err()
        .unwrap();
    match err.downcast_ref::<PlanError>() {
        Some(PlanError::ConflictingObject { output, artifact, .. }) => {
            assert!(output.ends_with("src/main.c.o"));
            assert_eq!(artifact, "withlib");
        }
        other => panic!("expected an object conflict, got {:?}", other),
    }
}

#[test]
fn test_programs_with_same_deps_share_objects() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "QuickProject.toml", "[project]\nunits = [\"Tools\"]\n");
    write(
        root,
        "Tools/QuickUnit.toml",
        "[[program]]\nname = \"one\"\n\n[[program]]\nname = \"two\"\n",
    );
    write(root, "Tools/src/main.c", "int main(void) { return 0; }\n");

    let session = evaluate(Project::load(root).unwrap(), Variant::Debug, &[]).unwrap();
    assert_eq!(session.plan().compile_count(), 1);
    assert_eq!(session.plan().link_count(), 2);
}

#[test]
fn test_same_header_exported_by_two_units() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "QuickProject.toml", "[project]\nunits = [\"A\", \"B\"]\n");
    for name in ["A", "B"] {
        write(
            root,
            &format!("{name}/QuickUnit.toml"),
            "[[static-lib]]\n\n[export]\ninclude = [\"inc\"]\n",
        );
        write(root, &format!("{name}/src/{name}.c"), "int f(void) { return 0; }\n");
        write(root, &format!("{name}/inc/common.h"), "int f(void);\n");
    }

    let err = evaluate(Project::load(root).unwrap(), Variant::Debug, &[])
        .err()
        .unwrap();
    match err.downcast_ref::<InstallError>() {
        Some(InstallError::ConflictingInstall { dest, existing, requested }) => {
            assert!(dest.ends_with("export/debug/include/common.h"));
            assert!(existing.ends_with("A/inc/common.h"));
            assert!(requested.ends_with("B/inc/common.h"));
        }
        other => panic!("expected an install conflict, got {:?}", other),
    }
}

#[test]
fn test_failed_step_skips_dependents() {
    struct FailShared;

    impl StepRunner for FailShared {
        fn run(&self, step: &BuildStep) -> Result<()> {
            if step.output().to_string_lossy().contains("shared.c.os") {
                anyhow::bail!("shared.c:1: error: expected ';'");
            }
            FakeRunner.run(step)
        }
    }

    let tmp = demo_project();
    let err = build_with_runner(load(&tmp), &FailShared, quiet(), &BuildOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("build failed"));

    let root = tmp.path();
    // StaticLib's objects do not depend on SharedLib; its archive does not
    // either, only links wait for libraries.
    assert!(root.join("build/debug/StaticLib/src/a.c.o").is_file());
    assert!(!root.join("build/debug/SharedLib/SharedLib.so").exists());
    assert!(!root.join("build/debug/Program/progname").exists());
}

#[test]
fn test_plan_only_runs_nothing() {
    let tmp = demo_project();
    let opts = BuildOptions {
        plan_only: true,
        manifest_out: Some(tmp.path().join("settings.json")),
        ..Default::default()
    };
    let result = build_with_runner(load(&tmp), &FakeRunner, quiet(), &opts).unwrap();

    assert!(result.report.is_none());
    assert!(!result.plan.is_empty());
    assert!(!tmp.path().join("build").exists());
    let written = fs::read_to_string(tmp.path().join("settings.json")).unwrap();
    assert!(written.contains("\"SharedLib\""));
}

#[test]
fn test_closure_descriptions() {
    use quickc::builder::{DescriptionLoader, UnitDescription};

    struct Scripted;

    impl DescriptionLoader for Scripted {
        fn load(&self, unit: &UnitPath, _dir: &Path) -> Result<Box<dyn UnitDescription>> {
            let description: Box<dyn UnitDescription> = match unit.as_str() {
                "Tool" => Box::new(|env: &mut UnitEnv<'_>| -> Result<()> {
                    env.quick_build("Data")?;
                    env.quick_program(Some("tool"), &["Core".to_string()])?;
                    Ok(())
                }),
                "Core" => Box::new(|env: &mut UnitEnv<'_>| -> Result<()> {
                    env.settings_mut().append_defines(["CORE=1"]);
                    env.quick_static_lib(None, &[])?;
                    Ok(())
                }),
                _ => Box::new(|env: &mut UnitEnv<'_>| -> Result<()> {
                    let dest = PathBuf::from("export/debug/share");
                    env.install_files(&[dest], &[PathBuf::from("files")], &Default::default())?;
                    Ok(())
                }),
            };
            Ok(description)
        }
    }

    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "QuickProject.toml", "");
    write(root, "Tool/QuickUnit.toml", "");
    write(root, "Core/QuickUnit.toml", "");
    write(root, "Data/QuickUnit.toml", "");
    write(root, "Data/files/table.txt", "1 2 3");
    write(root, "Data/files/.hidden", "");
    write(root, "Data/files/nested/more.txt", "4 5 6");

    let mut session = BuildSession::new(Project::load(root).unwrap(), Variant::Debug).with_loader(Scripted);
    session.quick_build("Tool").unwrap();

    let plan = session.plan();
    assert_eq!(plan.install_count(), 2);
    assert_eq!(plan.link_count(), 2);
    assert_eq!(session.registry().dependencies(&unit("Tool")), &[unit("Data"), unit("Core")]);
}
