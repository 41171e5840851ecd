//! Interpreter state shared by a script and everything it includes
//!
//! A `Session` owns the connection, the variable and macro tables, the output
//! sinks and the flags that commands leave behind for later statements.
//! Nested interpreters (included files, block bodies) borrow the same session,
//! so settings and definitions made at any level are visible everywhere.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};

use tracing::debug;

use crate::connection::Connection;
use crate::error::{SqlToolError, SqlToolResult};
use crate::history::DEFAULT_HISTORY_SIZE;
use crate::messages::{Catalog, MessageProvider};
use crate::render::DEFAULT_NULL_REP;
use crate::shell::{Platform, ShellEscape};
use crate::token::Token;
use crate::variables::VariableStore;

/// Variable naming the display string of NULL cells
pub const NULL_REP_VAR: &str = "*NULL_REP_TOKEN";

/// Value bound by a prepared statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareSource {
    /// The binary buffer (`\bp`)
    Binary,
    /// A user variable (`*prepare VAR`)
    Variable(String),
}

/// Variable armed to receive the next statement's scalar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub name: String,
    /// Suppress display of the result
    pub silent: bool,
}

/// Console output with an optional tee file
pub struct Output {
    console: Box<dyn Write>,
    tee: Option<File>,
}

impl Output {
    pub fn new(console: Box<dyn Write>) -> Self {
        Output { console, tee: None }
    }

    /// Write `text` to the console and the tee file, if open
    pub fn write_str(&mut self, text: &str) -> SqlToolResult<()> {
        self.console.write_all(text.as_bytes())?;
        self.console.flush()?;
        if let Some(tee) = self.tee.as_mut() {
            tee.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    pub fn println(&mut self, text: &str) -> SqlToolResult<()> {
        self.write_str(text)?;
        self.write_str("\n")
    }

    /// Start appending output to `path`, replacing any open tee
    pub fn open_tee(&mut self, path: &str) -> SqlToolResult<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.tee = Some(file);
        Ok(())
    }

    /// Stop teeing; `false` when no tee was open
    pub fn close_tee(&mut self) -> bool {
        self.tee.take().is_some()
    }
}

pub struct Session {
    pub connection: Box<dyn Connection>,
    pub vars: VariableStore,
    pub macros: HashMap<String, Token>,
    /// Set by any statement that may have left work uncommitted
    pub possibly_uncommitted: bool,
    pub continue_on_error: bool,
    pub html: bool,
    pub timing: bool,
    /// Expand variables in SQL statements
    pub pl_mode: bool,
    pub binary_buffer: Option<Vec<u8>>,
    /// Store the next query's first value in the binary buffer
    pub fetch_binary: bool,
    pub prepare: Option<PrepareSource>,
    pub fetch_var: Option<FetchTarget>,
    pub output: Output,
    pub shell: ShellEscape,
    pub history_size: usize,
    /// Set once `\q` ends a script; no further input should run
    pub quit: bool,
    errors: Box<dyn Write>,
    messages: Box<dyn MessageProvider>,
}

impl Session {
    /// A session writing to stdout/stderr with the built-in message catalog
    pub fn new(connection: Box<dyn Connection>) -> Self {
        Session {
            connection,
            vars: VariableStore::new(),
            macros: HashMap::new(),
            possibly_uncommitted: false,
            continue_on_error: false,
            html: false,
            timing: false,
            pl_mode: false,
            binary_buffer: None,
            fetch_binary: false,
            prepare: None,
            fetch_var: None,
            output: Output::new(Box::new(io::stdout())),
            shell: ShellEscape::new(Platform::current()),
            history_size: DEFAULT_HISTORY_SIZE,
            quit: false,
            errors: Box::new(io::stderr()),
            messages: Box::new(Catalog::default()),
        }
    }

    pub fn with_output(mut self, console: Box<dyn Write>) -> Self {
        self.output = Output::new(console);
        self
    }

    pub fn with_errors(mut self, errors: Box<dyn Write>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_messages(mut self, messages: Box<dyn MessageProvider>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.shell = ShellEscape::new(platform);
        self
    }

    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size.max(1);
        self
    }

    pub fn message(&self, key: &str, args: &[&str]) -> String {
        self.messages.format(key, args)
    }

    /// Print a catalog message to the output
    pub fn notify(&mut self, key: &str, args: &[&str]) -> SqlToolResult<()> {
        let text = self.messages.format(key, args);
        self.output.println(&text)
    }

    pub fn print(&mut self, text: &str) -> SqlToolResult<()> {
        self.output.println(text)
    }

    /// Display string for NULL cells
    pub fn null_rep(&self) -> String {
        self.vars
            .get(NULL_REP_VAR)
            .unwrap_or(DEFAULT_NULL_REP)
            .to_string()
    }

    /// Report an error and its causes on the error stream
    pub fn report_error(&mut self, err: &SqlToolError) {
        debug!("Reporting error: {:?}", err);
        // Nothing sensible remains if the error stream itself fails.
        let _ = writeln!(self.errors, "{}", err.chain());
        let _ = self.errors.flush();
    }

    /// Report a non-fatal problem on the error stream
    pub fn warn(&mut self, text: &str) {
        let _ = writeln!(self.errors, "WARNING: {}", text);
        let _ = self.errors.flush();
    }

    /// Roll back after an abort if work may be uncommitted
    ///
    /// Only attempted with autocommit off. A failed rollback is reported
    /// without replacing the error that caused the abort.
    pub fn rollback_on_abort(&mut self) {
        if !self.possibly_uncommitted || self.connection.auto_commit() {
            return;
        }
        match self.connection.rollback() {
            Ok(()) => {
                self.possibly_uncommitted = false;
                let text = self.message("rollback.done", &[]);
                self.warn(&text);
            }
            Err(err) => {
                let text = self.message("rollback.failed", &[&err.to_string()]);
                self.warn(&text);
            }
        }
    }
}
