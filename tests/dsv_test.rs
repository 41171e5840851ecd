//! DSV import and export tests for sqltool

mod helpers;

use std::fs;
use std::path::Path;

use helpers::TestSession;
use sqltool::connection::StatementResult;
use sqltool::error::SqlToolError;
use sqltool::value::Value;
use tempfile::TempDir;

fn scalar(t: &mut TestSession, sql: &str) -> Value {
    match t.session.connection.execute(sql, &[]).unwrap() {
        StatementResult::Rows(rs) => rs.scalar().cloned().unwrap_or(Value::Null),
        other => panic!("unexpected result {other:?}"),
    }
}

fn path_str(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

fn inner(err: SqlToolError) -> SqlToolError {
    match err {
        SqlToolError::Located { source, .. } => *source,
        other => other,
    }
}

#[test]
fn test_export_then_import() {
    let dir = TempDir::new().unwrap();
    let file = path_str(&dir.path().join("items.dsv"));

    let mut t = TestSession::new();
    t.session.vars.set("*DSV_TARGET_FILE", file.as_str());
    t.run(
        "create table items (id integer, name varchar(20), price real);\n\
         insert into items values (1, 'apple', 1.5);\n\
         insert into items values (2, null, 2.25);\n\
         \\x items\n",
    )
    .unwrap();
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "id|name|price\n1|apple|1.5\n2|[null]|2.25\n"
    );
    assert!(t.output().contains("2 rows exported"));

    t.session.vars.set("*DSV_TARGET_TABLE", "copy");
    t.run(&format!(
        "create table copy (id integer, name varchar(20), price real);\n\\m {file}\n"
    ))
    .unwrap();
    assert!(t
        .output()
        .contains("2 records read, 0 skipped, 0 rejected, 2 inserted"));
    assert_eq!(
        scalar(&mut t, "SELECT count(*) FROM copy WHERE name IS NULL"),
        Value::Integer(1)
    );
    assert_eq!(
        scalar(&mut t, "SELECT price FROM copy WHERE id = 2"),
        Value::Float(2.25)
    );
}

#[test]
fn test_export_query_needs_target_file() {
    let mut t = TestSession::new();
    let err = t.run("\\x select 1\n").unwrap_err();
    assert!(matches!(inner(err), SqlToolError::DsvError(_)));
}

#[test]
fn test_unsafe_export_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bad.dsv");

    let mut t = TestSession::new();
    t.session.vars.set("*DSV_TARGET_FILE", path_str(&file));
    let err = t
        .run(
            "create table t (v varchar(10));\n\
             insert into t values ('a|b');\n\
             \\x t\n",
        )
        .unwrap_err();
    assert!(matches!(
        inner(err),
        SqlToolError::UnsafeFieldValue { ref value, .. } if value == "a|b"
    ));
    assert!(!file.exists());
}

#[test]
fn test_rejects_are_isolated_and_reported() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("t.dsv");
    let rejects = dir.path().join("t.rej");
    let report = dir.path().join("t.csv");
    fs::write(&data, "id|name\n1|ok\nx|bad\n3\n\n# note\n4|fine\n").unwrap();

    let mut t = TestSession::new();
    t.session.vars.set("*DSV_REJECT_FILE", path_str(&rejects));
    t.session.vars.set("*DSV_REJECT_REPORT", path_str(&report));
    t.run(&format!(
        "create table t (id integer, name varchar(10));\n\\m {}\n",
        data.display()
    ))
    .unwrap();

    assert!(t
        .output()
        .contains("4 records read, 2 skipped, 2 rejected, 2 inserted"));
    assert!(t.output().contains("2 rejected records written to"));
    assert_eq!(fs::read_to_string(&rejects).unwrap(), "x|bad\n3\n");

    let mut reader = csv::Reader::from_path(&report).unwrap();
    let lines: Vec<String> = reader
        .records()
        .map(|r| r.unwrap().get(0).unwrap().to_string())
        .collect();
    assert_eq!(lines, vec!["3", "4"]);
    assert_eq!(scalar(&mut t, "SELECT count(*) FROM t"), Value::Integer(2));
}

#[test]
fn test_clean_import_removes_reject_artifacts() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("t.dsv");
    let rejects = dir.path().join("t.rej");
    fs::write(&data, "id\n1\n2\n").unwrap();

    let mut t = TestSession::new();
    t.session.vars.set("*DSV_REJECT_FILE", path_str(&rejects));
    t.run(&format!("create table t (id integer);\n\\m {}\n", data.display()))
        .unwrap();
    assert!(!rejects.exists());
}

#[test]
fn test_first_reject_fails_without_reject_file() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("t.dsv");
    fs::write(&data, "id\n1\nnot-a-number\n3\n").unwrap();

    let mut t = TestSession::new();
    let err = t
        .run(&format!("create table t (id integer);\n\\m {}\n", data.display()))
        .unwrap_err();
    assert!(matches!(
        inner(err),
        SqlToolError::RejectedRecord { line: 3, .. }
    ));
}

#[test]
fn test_header_switch_with_skip_and_const_columns() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("input.dsv");
    fs::write(
        &data,
        "# exported data\n\
         headerswitch{\n\
         other:a|b|c\n\
         *:id|-|junk|name\n\
         }\n\
         1|ignored|zzz|one\n\
         2|ignored|yyy|two\n",
    )
    .unwrap();

    let mut t = TestSession::new();
    t.run(&format!(
        "create table people (id integer, junk varchar(5), name varchar(10), source varchar(10));\n\
         * *DSV_TARGET_TABLE = people\n\
         * *DSV_SKIP_COLS = junk\n\
         * *DSV_CONST_COLS = source=batch1\n\
         \\m {}\n",
        data.display()
    ))
    .unwrap();

    assert_eq!(
        scalar(
            &mut t,
            "SELECT count(*) FROM people WHERE source = 'batch1' AND junk IS NULL"
        ),
        Value::Integer(2)
    );
    assert_eq!(
        scalar(&mut t, "SELECT name FROM people WHERE id = 2"),
        Value::Text("two".to_string())
    );
}

#[test]
fn test_header_switch_picks_table_entry() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("input.dsv");
    fs::write(
        &data,
        "headerswitch{\nother:a;b\n# for people\nPEOPLE:id;name\n*:x;y\n}\n1;one\n2;two\n",
    )
    .unwrap();

    let mut t = TestSession::new();
    t.session.vars.set("*DSV_COL_DELIM", ";");
    t.session.vars.set("*DSV_TARGET_TABLE", "people");
    t.run(&format!(
        "create table people (id integer, name varchar(10));\n\\m {}\n",
        data.display()
    ))
    .unwrap();

    assert!(t
        .output()
        .contains("2 records read, 0 skipped, 0 rejected, 2 inserted"));
    assert_eq!(
        scalar(&mut t, "SELECT name FROM people WHERE id = 1"),
        Value::Text("one".to_string())
    );
}

#[test]
fn test_unclosed_header_switch_fails() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("t.dsv");
    fs::write(&data, "headerswitch{\n*:id\n1\n").unwrap();

    let mut t = TestSession::new();
    let err = t
        .run(&format!("create table t (id integer);\n\\m {}\n", data.display()))
        .unwrap_err();
    assert!(matches!(inner(err), SqlToolError::DsvError(_)));
}

#[test]
fn test_failed_import_removes_empty_reject_artifacts() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("child.dsv");
    let rejects = dir.path().join("child.rej");
    let report = dir.path().join("child.csv");
    fs::write(&data, "id|pid\n1|99\n").unwrap();

    let mut t = TestSession::new();
    t.session.vars.set("*DSV_REJECT_FILE", path_str(&rejects));
    t.session.vars.set("*DSV_REJECT_REPORT", path_str(&report));
    // The deferred foreign key only fails at the batch commit
    let err = t
        .run(&format!(
            "\\a true\n\
             pragma foreign_keys = on;\n\
             create table parent (id integer primary key);\n\
             create table child (id integer, pid integer \
             references parent (id) deferrable initially deferred);\n\
             * *DSV_RECORDS_PER_COMMIT = 10\n\
             \\m {}\n",
            data.display()
        ))
        .unwrap_err();

    assert!(inner(err).to_string().contains("FOREIGN KEY"));
    assert!(!rejects.exists());
    assert!(!report.exists());
}

#[test]
fn test_batched_import_restores_autocommit() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("t.dsv");
    fs::write(&data, "id\n1\n2\n3\n").unwrap();

    let mut t = TestSession::new();
    t.run(&format!(
        "\\a true\n\
         create table t (id integer);\n\
         * *DSV_RECORDS_PER_COMMIT = 2\n\
         \\m {}\n\
         \\a\n",
        data.display()
    ))
    .unwrap();
    assert!(t.session.connection.auto_commit());
    assert!(t.output().ends_with("Autocommit is on\n"));
    assert_eq!(scalar(&mut t, "SELECT count(*) FROM t"), Value::Integer(3));
}

#[test]
fn test_custom_delimiters() {
    let dir = TempDir::new().unwrap();
    let file = path_str(&dir.path().join("t.tsv"));

    let mut t = TestSession::new();
    t.session.vars.set("*DSV_TARGET_FILE", file.as_str());
    t.run(
        "create table t (a integer, b varchar(5));\n\
         insert into t values (1, 'x');\n\
         * *DSV_COL_DELIM = \\t\n\
         * *DSV_NULL_REP = NULL\n\
         insert into t values (2, null);\n\
         \\x t\n",
    )
    .unwrap();
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "a\tb\n1\tx\n2\tNULL\n"
    );
}
