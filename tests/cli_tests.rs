//! Binary-level tests for the aggr CLI

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn aggr() -> Command {
    Command::cargo_bin("aggr").unwrap()
}

#[test]
fn test_pack_unpack_round_trip() {
    let src = tempdir().unwrap();
    let work = tempdir().unwrap();

    fs::create_dir_all(src.path().join("nested")).unwrap();
    fs::write(src.path().join("a.txt"), "alpha\n").unwrap();
    fs::write(src.path().join("nested/b.txt"), "beta").unwrap();

    let archive = work.path().join("pack.aggr");
    aggr()
        .args([
            "-C",
            src.path().to_str().unwrap(),
            "-o",
            archive.to_str().unwrap(),
            "-f",
            "",
        ])
        .assert()
        .success();

    let dest = work.path().join("extracted");
    aggr()
        .args(["-u", "-o", dest.to_str().unwrap()])
        .arg(archive.to_str().unwrap())
        .assert()
        .success();

    assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"alpha\n");
    assert_eq!(fs::read(dest.join("nested/b.txt")).unwrap(), b"beta\n");
}

#[test]
fn test_pack_to_stdout() {
    let src = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "hello\n").unwrap();

    aggr()
        .args(["-C", src.path().to_str().unwrap(), "-o", "-", "-f", ""])
        .assert()
        .success()
        .stdout(predicate::str::contains("// === AGGR: BEGIN: a.txt"))
        .stdout(predicate::str::contains("\n1 files\n"));
}

#[test]
fn test_unpack_requires_exactly_one_argument() {
    aggr()
        .arg("-u")
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one file argument"));
}

#[test]
fn test_unpack_missing_archive_fails() {
    let work = tempdir().unwrap();
    aggr()
        .current_dir(work.path())
        .args(["-u", "definitely-missing.aggr"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_pattern_fails() {
    let src = tempdir().unwrap();
    aggr()
        .args(["-C", src.path().to_str().unwrap(), "-f", "", "-d"])
        .arg("../escape")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));
}

#[test]
fn test_missing_ignore_file_fails() {
    let src = tempdir().unwrap();
    aggr()
        .args([
            "-C",
            src.path().to_str().unwrap(),
            "-f",
            "no-such-ignore-file",
            "-d",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let src = tempdir().unwrap();
    let work = tempdir().unwrap();
    fs::write(src.path().join("a.txt"), "x\n").unwrap();

    let archive = work.path().join("dry.aggr");
    aggr()
        .args([
            "-C",
            src.path().to_str().unwrap(),
            "-o",
            archive.to_str().unwrap(),
            "-d",
            "-f",
            "",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt (#1)"));

    assert!(!archive.exists());
}
