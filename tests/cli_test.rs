//! Integration tests for the `tset` binary
//!
//! These tests create throwaway projects and drive the CLI end to end.
//! Anything that needs a real CMake is skipped when `cmake` is not on PATH.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn tset(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tset"))
        .arg("--root")
        .arg(project)
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute tset")
}

fn create_project(config: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("config"), config).expect("Failed to write config");
    fs::create_dir_all(dir.path().join("include").join("acme")).unwrap();
    fs::write(
        dir.path().join("include").join("acme").join("acme.h"),
        "#pragma once\nint acme_answer();\n",
    )
    .unwrap();
    dir
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn cmake_available() -> bool {
    Command::new("cmake").arg("--version").output().is_ok()
}

const CONFIG: &str = "# acme\nPROJECT_NAME=acme\nPROJECT_VERSION=\"1.2.0\"\nCONAN_REQUIRE=fmt/10.2.1@{user}/{channel}\nCONAN_USER=me\nCONAN_CHANNEL=testing\n";

#[test]
fn test_info_reads_config() {
    let project = create_project(CONFIG);
    let output = tset(project.path(), &["info"]);

    assert!(output.status.success(), "info failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("acme"));
    assert!(out.contains("1.2.0"));
    assert!(out.contains("fmt/10.2.1@me/testing"));
    assert!(out.contains("header-only"));
}

#[test]
fn test_missing_config_fails() {
    let project = tempfile::tempdir().unwrap();
    let output = tset(project.path(), &["info"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Config file not found"));
}

#[test]
fn test_strict_rejects_malformed_line() {
    let project = create_project("PROJECT_NAME=acme\nPROJECT_VERSION=1.0\noops\n");

    let lenient = tset(project.path(), &["info"]);
    assert!(lenient.status.success(), "{}", stderr(&lenient));

    let strict = tset(project.path(), &["--strict", "info"]);
    assert!(!strict.status.success());
    assert!(stderr(&strict).contains("expected KEY=VALUE"));
}

#[test]
fn test_from_env_source() {
    let project = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_tset"))
        .arg("--root")
        .arg(project.path())
        .args(["--from-env", "info"])
        .env("NO_COLOR", "1")
        .env("PROJECT_NAME", "envpkg")
        .env("PROJECT_VERSION", "3.0")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("envpkg"));
}

#[test]
fn test_init_writes_parseable_config() {
    let project = tempfile::tempdir().unwrap();
    let output = tset(
        project.path(),
        &[
            "init",
            "widget",
            "--pkg-version",
            "2.0.1",
            "--require",
            "zlib/1.3",
            "--yes",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let config = tset::config::PackageConfig::load(&project.path().join("config")).unwrap();
    assert_eq!(config.get("PROJECT_NAME"), Some("widget"));
    assert_eq!(config.get("PROJECT_VERSION"), Some("2.0.1"));
    assert_eq!(config.get("CONAN_REQUIRE"), Some("zlib/1.3"));
}

#[test]
fn test_package_dry_run_touches_nothing() {
    let project = create_project(CONFIG);
    let output = tset(project.path(), &["package", "--dry-run"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Would execute"));
    assert!(!project.path().join("build").exists());
    assert!(!project.path().join("package").exists());
    assert!(!project.path().join("out").exists());
}

#[test]
fn test_deploy_and_clean() {
    let project = create_project(CONFIG);
    let package = project.path().join("package");
    fs::create_dir_all(package.join("bin")).unwrap();
    fs::create_dir_all(package.join("lib")).unwrap();
    fs::write(package.join("bin").join("acme_cli"), "").unwrap();
    fs::write(package.join("lib").join("libacme.so"), "").unwrap();

    let dest: PathBuf = project.path().join("dist");
    let output = tset(project.path(), &["deploy", dest.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(dest.join("bin").join("acme_cli").exists());
    assert!(dest.join("bin").join("libacme.so").exists());

    let output = tset(project.path(), &["clean"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!package.exists());
}

#[test]
fn test_without_tests_dir() {
    let project = create_project(CONFIG);
    let output = tset(project.path(), &["test"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("No tests/ directory found"));
}

#[test]
fn test_tests_without_persisted_env_fail() {
    let project = create_project(CONFIG);
    fs::create_dir_all(project.path().join("tests")).unwrap();

    let output = tset(project.path(), &["test"]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Config file not found"), "{}", err);
    assert!(err.contains("tset package"), "{}", err);
}

#[test]
fn test_tests_dry_run_passes_resolved_requirements() {
    let project = create_project(CONFIG);
    fs::create_dir_all(project.path().join("tests")).unwrap();
    fs::create_dir_all(project.path().join("out")).unwrap();
    fs::write(
        project.path().join("out").join(".env"),
        "PROJECT_NAME=acme\nPROJECT_VERSION=1.2.0\nCONAN_REQUIRE=fmt/10.2.1@{user}/{channel},zlib/1.3\nCONAN_USER=me\nCONAN_CHANNEL=testing\n",
    )
    .unwrap();

    let output = tset(project.path(), &["test", "--dry-run"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("-DTSET_REQUIRES=fmt/10.2.1@me/testing;zlib/1.3"), "{}", out);
    let prefix = format!(
        "-DCMAKE_PREFIX_PATH={}",
        std::path::absolute(project.path()).unwrap().join("package").display()
    );
    assert!(out.contains(&prefix), "{}", out);
    assert!(!project.path().join("build-tests").exists());
}

#[test]
fn test_deploy_relative_to_root() {
    let project = create_project(CONFIG);
    let package = project.path().join("package");
    fs::create_dir_all(package.join("bin")).unwrap();
    fs::create_dir_all(package.join("lib")).unwrap();
    fs::write(package.join("bin").join("acme_cli"), "").unwrap();
    fs::write(package.join("lib").join("libacme.so"), "").unwrap();

    let output = tset(project.path(), &["deploy", "."]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(project.path().join("bin").join("acme_cli").exists());
    assert!(project.path().join("bin").join("libacme.so").exists());
}

#[test]
fn test_info_rejects_build_only_flags() {
    let project = create_project(CONFIG);
    let output = tset(project.path(), &["info", "--dry-run"]);
    assert!(!output.status.success());

    let output = tset(project.path(), &["info", "--build-type", "Debug"]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn test_build_failure_propagates() {
    if !cmake_available() {
        eprintln!("Skipping: cmake not found");
        return;
    }
    let project = create_project(CONFIG);
    fs::write(
        project.path().join("CMakeLists.txt"),
        "cmake_minimum_required(VERSION 3.10)\nproject(acme NONE)\nmessage(FATAL_ERROR \"boom\")\n",
    )
    .unwrap();

    let output = tset(project.path(), &["package"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("cmake configure failed"));
    assert!(!project.path().join("package").exists());
    assert!(!project.path().join("out").exists());
}
