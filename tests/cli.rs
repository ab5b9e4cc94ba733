use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn mackerel() -> Command {
    Command::cargo_bin("mackerel").expect("binary exists")
}

#[test]
fn mackerel_eval_snippet() {
    let mut cmd = mackerel();
    cmd.arg("eval").arg("1 + 2 + 3");
    cmd.assert().success().stdout("6\n");
}

#[test]
fn mackerel_run_script() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("service.mck");
    fs::write(
        &script,
        "decl port: base + 80\ndecl base: 8000\nshow [name: \"api\", port: port]\n",
    )
    .expect("write script");

    let mut cmd = mackerel();
    cmd.arg("run").arg(&script);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[name: api, port: 8080]"));
}

#[test]
fn mackerel_run_reads_stdin() {
    let mut cmd = mackerel();
    cmd.arg("run").arg("-").write_stdin("show \"from \" + 42\n");
    cmd.assert().success().stdout("from 42\n");
}

#[test]
fn syntax_error_exits_with_data_error() {
    let mut cmd = mackerel();
    cmd.arg("eval").arg("[1, a: 2]");
    cmd.assert()
        .code(65)
        .stderr(predicate::str::contains("parser: expect sequence element"));
}

#[test]
fn runtime_error_exits_with_software_error() {
    let mut cmd = mackerel();
    cmd.arg("eval").arg("missing");
    cmd.assert()
        .code(70)
        .stderr(predicate::str::contains(
            "runtime: cannot find variable `missing` [line 1, col 1]",
        ));
}

#[test]
fn warnings_do_not_fail_the_run() {
    let mut cmd = mackerel();
    cmd.arg("eval").arg("[a: 1, a: 2]");
    cmd.assert()
        .success()
        .stdout("[a: 2]\n")
        .stderr(predicate::str::contains("warning: runtime: duplicate key in table: a"));
}

#[test]
fn missing_script_is_an_io_error() {
    let dir = tempdir().expect("create temp dir");
    let mut cmd = mackerel();
    cmd.arg("run").arg(dir.path().join("absent.mck"));
    cmd.assert().code(74).stderr(predicate::str::contains("error:"));
}
