//! End-to-end tests for the yamltest binary
//!
//! These run the built binary against the exec scenarios in
//! `tests/testdata`, with `XDG_CONFIG_HOME` pointed at a scratch directory
//! so no user configuration is picked up.

mod common;

use std::process::{Command, Output};

use common::testdata;

fn yamltest(args: &[&str]) -> Output {
    let config_home = tempfile::tempdir().expect("Failed to create config dir");
    Command::new(env!("CARGO_BIN_EXE_yamltest"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run yamltest")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_run_passing_directory() {
    let dir = testdata("exec");
    let output = yamltest(&["run", dir.to_str().unwrap()]);

    assert!(output.status.success(), "stdout: {}\nstderr: {}", stdout(&output), stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("echo-cat"));
    assert!(out.contains("0 failed (4 scenarios)"));
}

#[test]
fn test_run_failing_scenario() {
    let file = testdata("exec-failing/on-fail.yaml");
    let output = yamltest(&["run", "--debug", file.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("not equal: expected dat but got cat"));
    let err = stderr(&output);
    assert!(err.contains("(yamltest) exec: echo [bad kitty]"));
    assert!(err.contains("1 of 1 scenarios failed"));
}

#[test]
fn test_run_timeout_cascade() {
    let file = testdata("exec/timeout-cascade.yaml");
    let output = yamltest(&["run", "--debug", file.to_str().unwrap()]);

    assert!(output.status.success(), "stdout: {}\nstderr: {}", stdout(&output), stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("(yamltest) using timeout of 5s (expected: false) [scenario default]"));
    assert!(err.contains("(yamltest) using timeout of 20ms (expected: true)"));
}

#[test]
fn test_run_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let debug_log = dir.path().join("debug.log");
    std::fs::write(
        &config,
        format!(
            "[debug]\nenabled = true\nfile = \"{}\"\n\n[exec]\nshell = \"sh\"\n",
            debug_log.display()
        ),
    )
    .unwrap();
    let scenario = dir.path().join("pipe.yaml");
    std::fs::write(&scenario, "tests:\n  - exec: echo cat | tr c b\n    assert:\n      out:\n        is: bat\n").unwrap();

    let output = yamltest(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        scenario.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "stdout: {}\nstderr: {}", stdout(&output), stderr(&output));
    let log = std::fs::read_to_string(&debug_log).unwrap();
    assert!(log.contains("(yamltest) exec: sh [-c echo cat | tr c b]"));
}

#[test]
fn test_run_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = dir.path().join("bad.yaml");
    std::fs::write(&scenario, "tests:\n  - nope: 1\n").unwrap();

    let output = yamltest(&["run", scenario.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("no plugin could parse spec definition at $.tests[0]"));
}

#[test]
fn test_plugins_lists_exec() {
    let output = yamltest(&["plugins", "--json"]);

    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing[0]["name"], "exec");
    assert_eq!(listing[0]["specs"][0]["kind"], "exec");
}
