//! Configuration module for sqltool
//!
//! This module provides a centralized configuration structure for the application.
//! It collects the settings parsed from the command line into one value that
//! `main` uses to build the session and choose the inputs to run.

use anyhow::{anyhow, Result};

use crate::history::DEFAULT_HISTORY_SIZE;

/// Application configuration
///
/// Created once at startup from the command-line arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Whether to show verbose diagnostics
    verbose: bool,

    /// Force interactive mode even when stdin is not a terminal
    interactive: bool,

    /// Continue-on-error override; `None` uses the interactive default
    continue_on_error: Option<bool>,

    /// Initial autocommit state of the connection
    autocommit: bool,

    /// Start with HTML output
    html: bool,

    /// Number of commands kept in each history
    history_size: usize,

    /// Variables defined before any script runs
    variables: Vec<(String, String)>,

    /// SQLite database path; in-memory when `None`
    database: Option<String>,

    /// Script paths, `-` meaning stdin
    scripts: Vec<String>,

    /// Inline SQL scripts
    sql: Vec<String>,
}

impl AppConfig {
    /// Create a new application configuration from parsed arguments
    pub fn new(args: &crate::cli::SqlToolArgs) -> Result<Self> {
        let variables = args
            .setvar
            .iter()
            .map(|pair| parse_assignment(pair))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            verbose: args.verbose,
            interactive: args.interactive,
            continue_on_error: args.continue_on_error.then_some(true),
            autocommit: args.autocommit,
            html: args.html,
            history_size: args.history_size.unwrap_or(DEFAULT_HISTORY_SIZE),
            variables,
            database: args.database.clone(),
            scripts: args.scripts.clone(),
            sql: args.sql.clone(),
        })
    }

    /// Get the verbose flag
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Get whether interactive mode was requested
    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn continue_on_error(&self) -> Option<bool> {
        self.continue_on_error
    }

    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    pub fn html(&self) -> bool {
        self.html
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }

    /// Get the predefined variables
    pub fn variables(&self) -> &[(String, String)] {
        &self.variables
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Inline scripts, each terminated so the last statement executes
    pub fn inline_sql(&self) -> Vec<String> {
        self.sql.iter().map(|sql| terminate_inline(sql)).collect()
    }
}

/// Split `NAME=VALUE`
fn parse_assignment(pair: &str) -> Result<(String, String)> {
    let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{}'", pair))?;
    let name = name.trim();
    crate::variables::validate_name(name)?;
    Ok((name.to_string(), value.to_string()))
}

/// Add a final `;` to inline SQL that is not a command and lacks one
fn terminate_inline(sql: &str) -> String {
    let trimmed = sql.trim_end();
    let last_line = trimmed.lines().last().unwrap_or("").trim_start();
    let is_command = last_line.starts_with(['\\', '*', ':', '/']) && !last_line.starts_with("/*");
    if trimmed.is_empty() || trimmed.ends_with(';') || is_command {
        format!("{}\n", trimmed)
    } else {
        format!("{};\n", trimmed)
    }
}
