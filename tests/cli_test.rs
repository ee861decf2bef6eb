//! CLI tests for the imgbb-uploadr binary

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("imgbb-uploadr").unwrap();
    cmd.env_remove("API_KEY").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_codegen_reports_longest_loc() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.test.js"),
        "const lib = require(\"../lib/cjs\");\ntest(\"a\", () => {});\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("codegen.js"), "// generator\n").unwrap();

    cli()
        .current_dir(dir.path())
        .args(["codegen", "--tests-dir", ".", "--ignore", "codegen.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Longest LOC: 2"));

    let generated = std::fs::read_to_string(dir.path().join("import/a.test.js")).unwrap();
    assert_eq!(
        generated,
        "import lib from \"../lib/esm\";\ntest(\"ESM: a\", () => {});\n"
    );
    assert!(!dir.path().join("import/codegen.js").exists());
}

#[test]
fn test_codegen_missing_dir_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .current_dir(dir.path())
        .args(["codegen", "--tests-dir", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist"));
}

#[test]
fn test_upload_without_api_key_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .current_dir(dir.path())
        .args(["upload", "cat.jpg", "--endpoint", "http://127.0.0.1:9/1/upload"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key is required"));
}

#[test]
fn test_upload_requires_an_image() {
    cli()
        .args(["upload", "--api-key", "abc"])
        .assert()
        .failure();
}

#[test]
fn test_help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("codegen"));
}
