//! End-to-end tests driving the `dsvnfilter` binary itself, as opposed to
//! `dsvnfilter-core`'s unit and scenario tests which exercise the library
//! directly.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn sample_dump() -> String {
    let mut s = String::from("SVN-fs-dump-format-version: 3\n\n");
    s.push_str("Revision-number: 1\nProp-content-length: 10\nContent-length: 10\n\nPROPS-END\n\n");
    s.push_str("Node-path: trunk/a\nNode-kind: file\nNode-action: add\nProp-content-length: 10\nText-content-length: 5\nContent-length: 15\n\nPROPS-END\nhello\n\n");
    s.push_str("Revision-number: 2\nProp-content-length: 10\nContent-length: 10\n\nPROPS-END\n\n");
    s.push_str("Node-path: branches/b\nNode-kind: file\nNode-action: add\nProp-content-length: 10\nText-content-length: 5\nContent-length: 15\n\nPROPS-END\nworld\n\n");
    s
}

#[test]
fn scan_mode_runs_without_a_repository_argument() {
    let mut dump = tempfile::NamedTempFile::new().unwrap();
    dump.write_all(sample_dump().as_bytes()).unwrap();

    let mut cmd = Command::cargo_bin("dsvnfilter").unwrap();
    cmd.arg(dump.path()).arg("include").arg("trunk").arg("--scan");
    cmd.assert().success();
}

#[test]
fn include_mode_emits_only_the_selected_prefix() {
    let mut dump = tempfile::NamedTempFile::new().unwrap();
    dump.write_all(sample_dump().as_bytes()).unwrap();
    let out = tempfile::NamedTempFile::new().unwrap();

    let mut cmd = Command::cargo_bin("dsvnfilter").unwrap();
    cmd.arg(dump.path())
        .arg("include")
        .arg("trunk")
        .arg("-o")
        .arg(out.path())
        .arg("-s")
        .arg("-k");
    cmd.assert().success();

    let contents = std::fs::read_to_string(out.path()).unwrap();
    assert!(contents.contains("trunk/a"));
    assert!(!contents.contains("branches/b"));
}

#[test]
fn untangle_without_a_repo_argument_fails_with_a_probe_error() {
    let mut dump = tempfile::NamedTempFile::new().unwrap();
    let mut s = String::from("SVN-fs-dump-format-version: 3\n\n");
    s.push_str("Revision-number: 10\nProp-content-length: 10\nContent-length: 10\n\nPROPS-END\n\n");
    s.push_str(
        "Node-path: a/x\nNode-kind: file\nNode-action: add\nNode-copyfrom-rev: 7\nNode-copyfrom-path: b/y\n\n\n",
    );
    dump.write_all(s.as_bytes()).unwrap();

    let mut cmd = Command::cargo_bin("dsvnfilter").unwrap();
    cmd.arg(dump.path()).arg("include").arg("a");
    cmd.assert().failure().code(1).stderr(predicate::str::contains("-r"));
}

#[test]
fn rejects_an_empty_path_set_with_exit_code_two() {
    let mut dump = tempfile::NamedTempFile::new().unwrap();
    dump.write_all(sample_dump().as_bytes()).unwrap();

    let mut cmd = Command::cargo_bin("dsvnfilter").unwrap();
    cmd.arg(dump.path()).arg("include").arg("--scan");
    cmd.assert().failure().code(2);
}

#[test]
fn rejects_stop_renumbering_without_preserve_empty_with_exit_code_two() {
    let mut dump = tempfile::NamedTempFile::new().unwrap();
    dump.write_all(sample_dump().as_bytes()).unwrap();

    let mut cmd = Command::cargo_bin("dsvnfilter").unwrap();
    cmd.arg(dump.path()).arg("include").arg("trunk").arg("-s");
    cmd.assert().failure().code(2).stderr(predicate::str::contains("preserve-empty"));
}

#[test]
fn quiet_flag_suppresses_info_level_scan_logging() {
    let mut dump = tempfile::NamedTempFile::new().unwrap();
    dump.write_all(sample_dump().as_bytes()).unwrap();

    let mut cmd = Command::cargo_bin("dsvnfilter").unwrap();
    cmd.arg(dump.path()).arg("include").arg("trunk").arg("--scan").arg("-q");
    cmd.assert().success().stderr(predicate::str::contains("scan complete").not());
}
