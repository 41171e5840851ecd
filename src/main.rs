//! sqltool - an SQL script interpreter and interactive client
//!
//! Runs SQL scripts against a SQLite database. Besides plain SQL, scripts can
//! use `\` special commands (catalog listings, DSV import/export, output
//! teeing), `*` procedural commands (variables, conditionals, loops) and `/`
//! macros. Without script arguments it reads commands from stdin, with a line
//! editor when stdin is a terminal.
//!
//! # Program Flow
//!
//! 1. Parse command-line arguments and set up logging
//! 2. Open the database and build the session
//! 3. Run inline `-s` scripts, then script files in order
//! 4. Without any script, run stdin (interactively on a terminal)
//! 5. Exit non-zero if a script aborted

use std::fs::File;
use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use tracing::{debug, info};

use sqltool::cli;
use sqltool::config::AppConfig;
use sqltool::connection::Connection;
use sqltool::line_source::{ConsoleSource, LineSource, ReaderSource};
use sqltool::logging;
use sqltool::session::Session;
use sqltool::sqlfile::SqlFile;
use sqltool::sqlite::SqliteConnection;

/// Main entry point for the sqltool utility
fn main() -> Result<()> {
    let args = cli::parse_args()?;
    let config = AppConfig::new(&args)?;
    logging::init(config.verbose());
    debug!("Arguments: {:?}", args);

    let mut connection = match config.database() {
        Some(path) => SqliteConnection::open(path)
            .with_context(|| format!("Failed to open database: {path}"))?,
        None => SqliteConnection::open_in_memory().context("Failed to open in-memory database")?,
    };
    connection
        .set_auto_commit(config.autocommit())
        .context("Failed to set autocommit")?;

    let mut session = Session::new(Box::new(connection)).with_history_size(config.history_size());
    session.html = config.html();
    for (name, value) in config.variables() {
        session.vars.set(name, value.as_str());
        session.pl_mode = true;
    }

    for (i, sql) in config.inline_sql().iter().enumerate() {
        if session.quit {
            return Ok(());
        }
        let name = format!("<inline SQL {}>", i + 1);
        run(
            &mut session,
            Box::new(ReaderSource::from_text(sql)),
            &name,
            false,
            &config,
        )?;
    }

    for script in config.scripts() {
        if session.quit {
            return Ok(());
        }
        if script == "-" {
            run_stdin(&mut session, &config)?;
        } else {
            let file =
                File::open(script).with_context(|| format!("Failed to open script: {script}"))?;
            run(
                &mut session,
                Box::new(ReaderSource::buffered(file)),
                script,
                false,
                &config,
            )?;
        }
    }

    if !session.quit
        && config.scripts().is_empty()
        && (config.inline_sql().is_empty() || config.interactive())
    {
        run_stdin(&mut session, &config)?;
    }
    Ok(())
}

/// Run stdin, with the console editor on a terminal or when forced
fn run_stdin(session: &mut Session, config: &AppConfig) -> Result<()> {
    if config.interactive() || io::stdin().is_terminal() {
        info!("Starting interactive session");
        let console = ConsoleSource::new().context("Failed to start the line editor")?;
        run(session, Box::new(console), "<console>", true, config)
    } else {
        run(
            session,
            Box::new(ReaderSource::buffered(io::stdin())),
            "<stdin>",
            false,
            config,
        )
    }
}

fn run(
    session: &mut Session,
    source: Box<dyn LineSource>,
    name: &str,
    interactive: bool,
    config: &AppConfig,
) -> Result<()> {
    SqlFile::new(session, source, name, interactive)
        .execute(config.continue_on_error())
        .with_context(|| format!("Execution of {name} failed"))
}
