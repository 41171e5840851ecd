//! CLI argument parsing module for sqltool
//!
//! This module handles parsing command-line arguments using the clap crate.
//! It defines the command-line interface of the script interpreter: which
//! database to open, which scripts to run and the initial session settings.
//!
//! Key features of the CLI:
//! - Script files run in order, `-` reads a script from stdin
//! - Inline SQL with `-s`, run before any script file
//! - Variables predefined with `--setvar NAME=VALUE`
//! - Interactive console when no script is given and stdin is a terminal

use anyhow::Result;
use clap::Parser;

/// Command-line arguments for sqltool
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "SQL script interpreter with procedural commands and DSV import/export"
)]
pub struct SqlToolArgs {
    /// SQLite database file to open
    ///
    /// The file is created if it does not exist. Without this option the
    /// session runs against a private in-memory database.
    #[clap(short, long, help = "SQLite database file (default: in-memory)")]
    pub database: Option<String>,

    /// Inline SQL scripts to execute
    ///
    /// Each value is run as a complete script before any script file.
    /// A final statement without a terminating ';' is still executed.
    /// Example: -s "CREATE TABLE t (a int)" -s "\dt"
    #[clap(short, long, help = "Inline SQL script to execute")]
    pub sql: Vec<String>,

    /// Script files to execute, in order
    ///
    /// Use `-` to read a script from standard input. All scripts share one
    /// session, so variables, macros and settings carry over between them.
    #[clap(help = "Script files to execute ('-' for stdin)")]
    pub scripts: Vec<String>,

    /// Define a variable before any script runs - format: NAME=VALUE
    #[clap(long, value_name = "NAME=VALUE", help = "Set a PL variable")]
    pub setvar: Vec<String>,

    /// Keep going after a failed command
    ///
    /// Non-interactive runs stop at the first error by default.
    #[clap(short, long, help = "Continue after errors")]
    pub continue_on_error: bool,

    /// Start with autocommit enabled
    #[clap(long, help = "Enable autocommit")]
    pub autocommit: bool,

    /// Render query results as HTML tables
    #[clap(long, help = "Start with HTML output")]
    pub html: bool,

    /// Read commands from the console even if stdin is not a terminal
    #[clap(short, long, help = "Start in interactive mode")]
    pub interactive: bool,

    /// Number of commands remembered for `:` editing
    #[clap(long, value_name = "N", help = "Command history size")]
    pub history_size: Option<usize>,

    /// Enable verbose diagnostic output
    ///
    /// Equivalent to SQLTOOL_LOG=debug; an explicit SQLTOOL_LOG wins.
    #[clap(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Parse command-line arguments into the SqlToolArgs structure
pub fn parse_args() -> Result<SqlToolArgs> {
    Ok(SqlToolArgs::parse())
}
