//! CLI integration tests for quickc.
//!
//! Only commands that need no C compiler are exercised here.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the quickc binary command.
fn quickc() -> Command {
    let mut cmd = Command::cargo_bin("quickc").unwrap();
    cmd.env_remove("QUICKC_RELEASE").arg("--no-color");
    cmd
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Program depends on Lib, found from the project root.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "QuickProject.toml", "[project]\nname = \"demo\"\nunits = [\"Program\"]\n");
    write(
        root,
        "Program/QuickUnit.toml",
        "[[program]]\nname = \"progname\"\ndeps = [\"Lib\"]\nexport = true\n",
    );
    write(root, "Program/src/main.c", "int main(void) { return 0; }\n");
    write(root, "Lib/QuickUnit.toml", "[[shared-lib]]\nexport = true\n");
    write(root, "Lib/src/lib.c", "int lib(void) { return 0; }\n");
    tmp
}

// ============================================================================
// quickc build --plan
// ============================================================================

#[test]
fn test_build_plan_prints_json() {
    let tmp = project();

    quickc()
        .args(["build", "--plan"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"link\""))
        .stdout(predicate::str::contains("Lib.so"))
        .stdout(predicate::str::contains("progname"));

    assert!(!tmp.path().join("build").exists());
}

#[test]
fn test_build_plan_release_from_env() {
    let tmp = project();

    quickc()
        .args(["build", "--plan"])
        .env("QUICKC_RELEASE", "true")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"variant\": \"release\""))
        .stdout(predicate::str::contains("build/release/Lib"));
}

#[test]
fn test_build_plan_writes_manifest() {
    let tmp = project();

    quickc()
        .args(["build", "--plan", "--manifest-out", "settings.json"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let json = fs::read_to_string(tmp.path().join("settings.json")).unwrap();
    assert!(json.contains("\"Lib.so\""));
}

// ============================================================================
// quickc settings / tree
// ============================================================================

#[test]
fn test_settings_lists_units() {
    let tmp = project();

    quickc()
        .arg("settings")
        .current_dir(tmp.path().join("Program/src"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"project\": \"demo\""))
        .stdout(predicate::str::contains("\"Lib\""))
        .stdout(predicate::str::contains("\"shared-lib\""));
}

#[test]
fn test_settings_single_unit() {
    let tmp = project();

    quickc()
        .args(["settings", "Lib"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"shared-lib\""))
        .stdout(predicate::str::contains("progname").not());
}

#[test]
fn test_tree() {
    let tmp = project();
    write(tmp.path(), "QuickProject.toml", "[project]\nname = \"demo\"\nunits = [\"Program\", \"Lib\"]\n");

    quickc()
        .arg("tree")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("demo\n"))
        .stdout(predicate::str::contains("├── Program [program]"))
        .stdout(predicate::str::contains("│   ├── Lib [shared-lib]"))
        .stdout(predicate::str::contains("├── Lib [shared-lib] (*)"));
}

// ============================================================================
// quickc clean
// ============================================================================

#[test]
fn test_clean_removes_variant_trees() {
    let tmp = project();
    fs::create_dir_all(tmp.path().join("build/debug/Lib")).unwrap();
    fs::create_dir_all(tmp.path().join("export/debug/lib")).unwrap();
    fs::create_dir_all(tmp.path().join("build/release/Lib")).unwrap();

    quickc()
        .arg("clean")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    assert!(!tmp.path().join("build/debug").exists());
    assert!(!tmp.path().join("export/debug").exists());
    assert!(tmp.path().join("build/release").exists());

    quickc()
        .args(["clean", "--all"])
        .current_dir(tmp.path())
        .assert()
        .success();
    assert!(!tmp.path().join("build/release").exists());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_outside_project() {
    let tmp = TempDir::new().unwrap();

    quickc()
        .args(["build", "--plan"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not inside a quickc project"));
}

#[test]
fn test_missing_dependency() {
    let tmp = project();
    write(tmp.path(), "Program/QuickUnit.toml", "[[program]]\ndeps = [\"Missing\"]\n");

    quickc()
        .args(["build", "--plan"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "could not find unit `Missing` required by `Program`",
        ));
}

#[test]
fn test_circular_dependency() {
    let tmp = project();
    write(tmp.path(), "Lib/QuickUnit.toml", "[[shared-lib]]\ndeps = [\"Program\"]\n");

    quickc()
        .arg("tree")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("circular dependency"))
        .stderr(predicate::str::contains("Program -> Lib -> Program"));
}

#[test]
fn test_unknown_manifest_key() {
    let tmp = project();
    write(tmp.path(), "Lib/QuickUnit.toml", "[[shared-lib]]\nexports = true\n");

    quickc()
        .arg("settings")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid manifest"));
}

#[test]
fn test_completions() {
    quickc()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quickc"));
}
