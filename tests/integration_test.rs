//! Integration tests for sqltool
//!
//! This file contains end-to-end tests running the sqltool binary.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_inline_sql() -> Result<(), Box<dyn std::error::Error>> {
    // The last statement has no ';' and must still run
    let mut cmd = Command::cargo_bin("sqltool")?;
    cmd.arg("-s")
        .arg("create table t (a integer); insert into t values (5); select a * 2 as doubled from t");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("doubled"))
        .stdout(predicate::str::contains("10"))
        .stdout(predicate::str::contains("1 row"));

    Ok(())
}

#[test]
fn test_script_files_share_a_session() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let first = temp_dir.path().join("first.sql");
    let second = temp_dir.path().join("second.sql");
    fs::write(&first, "create table t (a int);\ninsert into t values (1);\n*greeting = hello\n")?;
    fs::write(&second, "\\p *{greeting}\nselect count(*) as n from t;\n")?;

    let mut cmd = Command::cargo_bin("sqltool")?;
    cmd.arg(first.to_str().unwrap()).arg(second.to_str().unwrap());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("1 row"));

    Ok(())
}

#[test]
fn test_script_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = assert_cmd::Command::cargo_bin("sqltool")?;
    cmd.arg("-").write_stdin("select 'piped' as src;\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("piped"));

    Ok(())
}

#[test]
fn test_setvar() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("sqltool")?;
    cmd.arg("--setvar")
        .arg("who=world")
        .arg("-s")
        .arg("select 'hello *{who}' as greeting;");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hello world"));

    Ok(())
}

#[test]
fn test_error_exits_non_zero() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("sqltool")?;
    cmd.arg("-s").arg("select * from missing;\n\\p unreachable");

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("unreachable").not())
        .stderr(predicate::str::contains("no such table"));

    Ok(())
}

#[test]
fn test_continue_on_error_flag() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("sqltool")?;
    cmd.arg("-c")
        .arg("-s")
        .arg("select * from missing;\n\\p reached");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("reached"))
        .stderr(predicate::str::contains("no such table"));

    Ok(())
}

#[test]
fn test_abort_message_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("sqltool")?;
    cmd.arg("-s").arg("\\q giving up");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("giving up"));

    Ok(())
}

#[test]
fn test_database_file_persists_commits() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let db = temp_dir.path().join("test.db");
    let db = db.to_str().unwrap();

    Command::cargo_bin("sqltool")?
        .args(["-d", db, "-s"])
        .arg("create table t (a int); insert into t values (1); commit; insert into t values (2);")
        .assert()
        .success();

    // The uncommitted second insert is lost when the first run exits
    Command::cargo_bin("sqltool")?
        .args(["-d", db, "-s", "select count(*) as n from t;"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 row"))
        .stdout(predicate::str::is_match(r"(?m)^n\s*$")?)
        .stdout(predicate::str::is_match(r"(?m)^1$")?);

    Ok(())
}

#[test]
fn test_autocommit_flag() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("sqltool")?;
    cmd.args(["--autocommit", "-s", "\\a"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Autocommit is on"));

    Ok(())
}
