#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env("RUST_LOG", "off")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_prints_banner_and_help() {
    run_cli("help\nquit\n")
        .success()
        .stdout(str_contains("PERT Network Tool (CLI)"))
        .stdout(str_contains("analyze [target]"));
}

#[test]
fn cli_rejects_non_numeric_times() {
    run_cli("add A null one 2 3\nquit\n")
        .success()
        .stdout(str_contains(
            "Invalid time 'one'. Please enter valid times for all fields.",
        ));
}

#[test]
fn cli_analyzes_chain_with_target() {
    run_cli("add a null 1 2 3\nadd b a 2 3 4\nadd c b 1 1 1\nanalyze 6\nquit\n")
        .success()
        .stdout(str_contains("Activity upserted."))
        .stdout(str_contains("critical=A->B->C"))
        .stdout(str_contains("probability=50.0000%"));
}

#[test]
fn cli_reports_zero_variance() {
    run_cli("add A null 2 2 2\nanalyze 2\nquit\n")
        .success()
        .stdout(str_contains(
            "Critical path has zero variance; probability is undefined.",
        ));
}

#[test]
fn cli_rejects_bad_target() {
    run_cli("target soon\nquit\n")
        .success()
        .stdout(str_contains("Please enter a valid target duration."));
}

#[test]
fn cli_delete_command_removes_activity() {
    run_cli("add A null 1 2 3\nadd B A 1 2 3\ndelete b\ndelete b\nquit\n")
        .success()
        .stdout(str_contains("Deleted activity B."))
        .stdout(str_contains("Activity B not found."));
}

#[test]
fn cli_save_and_load_csv_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().replace('\\', "\\\\");
    let script = format!(
        "add KEEP null 1 2 3\nsave csv {path}\nadd TEMP KEEP 1 1 1\nload csv {path}\nshow\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Project saved to"));
    assert!(output.contains("Project loaded from"));
    let after_reload = output
        .split("Project loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("KEEP"));
    assert!(
        !after_reload.contains("TEMP"),
        "temporary activity should not appear after reload:\n{}",
        after_reload
    );
}

#[test]
fn cli_switches_and_rejects_finish_rules() {
    run_cli("rule Positional\nrule diagonal\nquit\n")
        .success()
        .stdout(str_contains("Finish rule set to positional."))
        .stdout(str_contains("unknown finish rule 'diagonal'"));
}

#[test]
fn cli_clears_target_duration() {
    run_cli("target 12\ntarget none\nmeta show\nquit\n")
        .success()
        .stdout(str_contains("Target duration set to 12."))
        .stdout(str_contains("Target duration cleared."))
        .stdout(str_contains("Target duration    : (none)"));
}
