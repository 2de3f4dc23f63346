use assert_cmd::Command;
use predicates::prelude::*;

fn quickrewind_cmd() -> Command {
    Command::cargo_bin("quickrewind").expect("binary exists")
}

#[test]
fn help_prints_description() {
    quickrewind_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Retroactive screen recorder with a rolling replay buffer",
        ));
}

#[test]
fn no_flags_prints_usage() {
    quickrewind_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("quickrewind --daemon"));
}

#[test]
fn once_requires_a_value() {
    quickrewind_cmd()
        .arg("--once")
        .assert()
        .failure()
        .stderr(predicate::str::contains("a value is required"));
}

#[test]
fn version_flag_works() {
    quickrewind_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quickrewind"));
}
