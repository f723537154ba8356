//! Argument handling, exit codes, and the `init`/`version` commands.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[allow(deprecated)]
fn datalint_cmd() -> Command {
    let mut cmd = Command::cargo_bin("datalint").expect("datalint binary not found");
    for var in [
        "DATALINT_LOG_LEVEL",
        "DATALINT_CONFIG",
        "DATALINT_ERROR_LEVEL",
        "DATALINT_ROOT_DIR",
        "DATALINT_LOG_COLOR",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

const CONFIG: &str = r#"
[engine]
command = ["datalint-engine-that-does-not-exist"]

[[targets]]
data_files = ["*.json"]

[[targets.lint_files]]
path = "*.jsonnet"
"#;

fn workspace() -> TempDir {
    let tmp = TempDir::new().expect("temp dir");
    std::fs::write(tmp.path().join("datalint.toml"), CONFIG).expect("config");
    std::fs::write(tmp.path().join("a.json"), "{}").expect("data");
    std::fs::write(tmp.path().join("r.jsonnet"), "[]").expect("rule");
    tmp
}

#[test]
fn help_works() {
    datalint_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lint"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn version_subcommand_prints_version() {
    datalint_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "datalint {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn invalid_error_level_exits_1() {
    let tmp = workspace();
    datalint_cmd()
        .current_dir(tmp.path())
        .args(["lint", "--root-dir", "cache", "--error-level", "fatal"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("datalint error:"))
        .stderr(predicate::str::contains("invalid error level"));
}

#[test]
fn error_level_from_environment_is_validated() {
    let tmp = workspace();
    datalint_cmd()
        .current_dir(tmp.path())
        .env("DATALINT_ERROR_LEVEL", "loud")
        .args(["lint", "--root-dir", "cache"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("\"loud\""));
}

#[test]
fn missing_config_exits_1() {
    let tmp = TempDir::new().expect("temp dir");
    datalint_cmd()
        .current_dir(tmp.path())
        .args(["lint", "--root-dir", "cache"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no configuration file found"));
}

#[test]
fn explicit_config_flag_is_used() {
    let tmp = TempDir::new().expect("temp dir");
    std::fs::write(tmp.path().join("other.toml"), "targets = 3").expect("config");
    datalint_cmd()
        .current_dir(tmp.path())
        .args(["--config", "other.toml", "lint", "--root-dir", "cache"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("other.toml"));
}

#[test]
fn engine_failures_are_reported_per_rule() {
    let tmp = workspace();
    datalint_cmd()
        .current_dir(tmp.path())
        .args(["lint", "--root-dir", "cache", "--output", "json"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("datalint-engine-that-does-not-exist"));
}

#[test]
fn init_creates_config_once() {
    let tmp = TempDir::new().expect("temp dir");
    datalint_cmd()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("created"));
    assert!(tmp.path().join("datalint.toml").is_file());

    datalint_cmd()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn completion_scripts_are_generated_per_shell() {
    for (shell, marker) in [
        ("bash", "_datalint()"),
        ("zsh", "#compdef datalint"),
        ("fish", "complete -c datalint"),
    ] {
        datalint_cmd()
            .args(["completion", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains(marker))
            .stdout(predicate::str::contains("output-success"));
    }
}

#[test]
fn completion_rejects_unknown_shell() {
    datalint_cmd()
        .args(["completion", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tcsh"));
}

#[test]
fn log_color_controls_ansi_escapes() {
    let tmp = workspace();
    datalint_cmd()
        .current_dir(tmp.path())
        .args(["--log-color", "always", "lint", "--root-dir", "cache"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("lint finished"))
        .stderr(predicate::str::contains("\u{1b}["));

    datalint_cmd()
        .current_dir(tmp.path())
        .env("DATALINT_LOG_COLOR", "never")
        .args(["lint", "--root-dir", "cache"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("lint finished"))
        .stderr(predicate::str::contains("\u{1b}[").not());
}

#[test]
fn invalid_log_color_is_rejected() {
    datalint_cmd()
        .args(["--log-color", "rainbow", "version"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rainbow"));
}
