//! Test helpers for sqltool integration tests
//!
//! Scripts run in-process against an in-memory SQLite database, with the
//! session's output and error streams captured into shared buffers.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use sqltool::connection::Connection;
use sqltool::error::SqlToolResult;
use sqltool::line_source::ReaderSource;
use sqltool::session::Session;
use sqltool::sqlfile::SqlFile;
use sqltool::sqlite::SqliteConnection;

/// A `Write` sink whose contents stay readable after it is boxed
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session with captured streams
pub struct TestSession {
    pub session: Session,
    pub out: SharedBuffer,
    pub err: SharedBuffer,
}

impl TestSession {
    /// In-memory database with autocommit off
    pub fn new() -> Self {
        let mut connection = SqliteConnection::open_in_memory().unwrap();
        connection.set_auto_commit(false).unwrap();
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let session = Session::new(Box::new(connection))
            .with_output(Box::new(out.clone()))
            .with_errors(Box::new(err.clone()));
        TestSession { session, out, err }
    }

    /// Run `script` as a non-interactive top-level script
    pub fn run(&mut self, script: &str) -> SqlToolResult<()> {
        self.run_with(script, None)
    }

    pub fn run_with(&mut self, script: &str, continue_on_error: Option<bool>) -> SqlToolResult<()> {
        SqlFile::new(
            &mut self.session,
            Box::new(ReaderSource::from_text(script)),
            "test.sql",
            false,
        )
        .execute(continue_on_error)
    }

    /// Run `script` as if typed at the console
    pub fn run_interactive(&mut self, script: &str) -> SqlToolResult<()> {
        SqlFile::new(
            &mut self.session,
            Box::new(ReaderSource::from_text(script)),
            "<console>",
            true,
        )
        .execute(None)
    }

    pub fn output(&self) -> String {
        self.out.contents()
    }

    pub fn errors(&self) -> String {
        self.err.contents()
    }

    pub fn var(&self, name: &str) -> Option<String> {
        self.session.vars.get(name).map(str::to_string)
    }
}

/// Run a script in a fresh session, returning (result, output, errors)
pub fn run_script(script: &str) -> (SqlToolResult<()>, String, String) {
    let mut t = TestSession::new();
    let result = t.run(script);
    (result, t.output(), t.errors())
}
