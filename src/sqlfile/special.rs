//! Special (`\`) command execution

use std::fs::{self, File, OpenOptions};
use std::io::Write;

use regex::Regex;
use tracing::{debug, error, info, trace, warn, Level};

use super::sql::DisplayOptions;
use super::{Flow, Scope, SqlFile};
use crate::block::BlockKind;
use crate::commands::special::{self, SpecialCommand};
use crate::dsv::{self, DsvSettings};
use crate::error::{SqlToolError, SqlToolResult};
use crate::history::HistoryRef;
use crate::line_source::ReaderSource;
use crate::metadata::{self, CatalogQuery, Vendor};
use crate::session::PrepareSource;
use crate::token::Token;

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn log_message(level: Level, message: &str) {
    if level == Level::ERROR {
        error!(target: "sqltool::script", "{}", message);
    } else if level == Level::WARN {
        warn!(target: "sqltool::script", "{}", message);
    } else if level == Level::INFO {
        info!(target: "sqltool::script", "{}", message);
    } else if level == Level::DEBUG {
        debug!(target: "sqltool::script", "{}", message);
    } else {
        trace!(target: "sqltool::script", "{}", message);
    }
}

/// Append a command to `path`, one command per line
pub(super) fn append_command(path: &str, token: &Token) -> SqlToolResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", token.reconstitute())?;
    Ok(())
}

impl<'s, 't> SqlFile<'s, 't> {
    /// A special command read from the input: buffered, then executed
    pub(super) fn run_special_token(&mut self, token: &Token) -> SqlToolResult<Flow> {
        let command = self.parse_special(&token.value)?;
        if !matches!(command, SpecialCommand::WriteBuffer(_)) {
            self.history.set_buffer(token.clone())?;
            self.history.historize();
        }
        self.execute_special(command)
    }

    /// A special command recalled from the buffer or a macro
    pub(super) fn run_special(&mut self, text: &str) -> SqlToolResult<Flow> {
        let command = self.parse_special(text)?;
        self.execute_special(command)
    }

    fn parse_special(&self, text: &str) -> SqlToolResult<SpecialCommand> {
        if self.session.pl_mode {
            special::parse(&self.session.vars.dereference(text, true)?)
        } else {
            special::parse(text)
        }
    }

    fn execute_special(&mut self, command: SpecialCommand) -> SqlToolResult<Flow> {
        debug!("Special command: {:?}", command);
        match command {
            SpecialCommand::Help => {
                let text = self.session.message("help.special", &[]);
                self.session.print(&text)?;
            }
            SpecialCommand::Quit(message) => return Ok(Flow::Quit(message)),
            SpecialCommand::ToggleHtml => {
                self.session.html = !self.session.html;
                let state = on_off(self.session.html);
                self.session.notify("html.status", &[state])?;
            }
            SpecialCommand::Print(text) => self.session.print(&text)?,
            SpecialCommand::WriteBuffer(path) => {
                let token = self.history.recall(HistoryRef::Buffer)?;
                append_command(&path, &token)?;
                self.session.notify("buffer.written", &[&path])?;
            }
            SpecialCommand::Include(path) => return self.run_include(&path),
            SpecialCommand::Output(Some(path)) => {
                self.session.output.open_tee(&path)?;
                self.session.notify("output.opened", &[&path])?;
            }
            SpecialCommand::Output(None) => {
                if self.session.output.close_tee() {
                    self.session.notify("output.closed", &[])?;
                }
            }
            SpecialCommand::Log { level, message } => log_message(level, &message),
            SpecialCommand::AutoCommit(setting) => {
                if let Some(on) = setting {
                    self.session.connection.set_auto_commit(on)?;
                    if on {
                        self.session.possibly_uncommitted = false;
                    }
                }
                let state = on_off(self.session.connection.auto_commit());
                self.session.notify("autocommit.status", &[state])?;
            }
            SpecialCommand::Isolation(setting) => {
                if let Some(level) = setting {
                    self.session.connection.set_transaction_isolation(level)?;
                }
                let level = self.session.connection.transaction_isolation()?.to_string();
                self.session.notify("isolation.status", &[&level])?;
            }
            SpecialCommand::Commit => {
                self.session.connection.commit()?;
                self.session.possibly_uncommitted = false;
                self.session.notify("commit.done", &[])?;
            }
            SpecialCommand::BinaryFetch => self.session.fetch_binary = true,
            SpecialCommand::BinaryPrepare => self.session.prepare = Some(PrepareSource::Binary),
            SpecialCommand::BinaryDump(path) => {
                let bytes = self
                    .session
                    .binary_buffer
                    .as_ref()
                    .ok_or(SqlToolError::EmptyBinaryBuffer)?;
                fs::write(&path, bytes)?;
                let size = bytes.len().to_string();
                self.session.notify("binary.dumped", &[&size, &path])?;
            }
            SpecialCommand::BinaryLoad(path) => {
                let bytes = fs::read(&path)?;
                let size = bytes.len().to_string();
                self.session.binary_buffer = Some(bytes);
                self.session.notify("binary.loaded", &[&size, &path])?;
            }
            SpecialCommand::Timing(setting) => {
                self.session.timing = setting.unwrap_or(!self.session.timing);
                let state = on_off(self.session.timing);
                self.session.notify("timing.status", &[state])?;
            }
            SpecialCommand::ContinueOnError(setting) => {
                if let Some(on) = setting {
                    self.session.continue_on_error = on;
                }
                let state = on_off(self.session.continue_on_error);
                self.session.notify("continue.status", &[state])?;
            }
            SpecialCommand::Shell(command) => {
                let output = self.session.shell.run(&command)?;
                self.session.output.write_str(&output)?;
            }
            SpecialCommand::List { listing, filter } => {
                let vendor = Vendor::sniff(&self.session.connection.product_name());
                let query = metadata::listing_query(vendor, listing, filter.as_deref())?;
                self.run_catalog_query(query, None)?;
            }
            SpecialCommand::Describe { table, filter } => {
                let filter = filter.as_deref().map(Regex::new).transpose()?;
                let vendor = Vendor::sniff(&self.session.connection.product_name());
                self.run_catalog_query(metadata::describe_query(vendor, &table), filter)?;
            }
            SpecialCommand::DescribeHelp => {
                let text = self.session.message("help.describe", &[]);
                self.session.print(&text)?;
            }
            SpecialCommand::Import(path) => {
                let settings = DsvSettings::from_vars(&self.session.vars)?;
                self.session.possibly_uncommitted = true;
                let summary = dsv::import(&mut *self.session.connection, &settings, &path)?;
                self.session.notify(
                    "dsv.imported",
                    &[
                        &path,
                        &summary.table,
                        &summary.read.to_string(),
                        &summary.skipped.to_string(),
                        &summary.rejected.to_string(),
                        &summary.inserted.to_string(),
                    ],
                )?;
                if !summary.reject_outputs.is_empty() {
                    let outputs = summary.reject_outputs.join(", ");
                    let rejected = summary.rejected.to_string();
                    self.session.notify("dsv.rejects", &[&rejected, &outputs])?;
                }
            }
            SpecialCommand::Export(target) => {
                let settings = DsvSettings::from_vars(&self.session.vars)?;
                let summary = dsv::export(&mut *self.session.connection, &settings, &target)?;
                let rows = summary.rows.to_string();
                self.session.notify("dsv.exported", &[&rows, &summary.path])?;
            }
        }
        Ok(Flow::Normal)
    }

    fn run_catalog_query(
        &mut self,
        query: CatalogQuery,
        filter: Option<Regex>,
    ) -> SqlToolResult<()> {
        let result = self
            .session
            .connection
            .execute(&query.sql, &query.params)?;
        self.display(
            result,
            DisplayOptions {
                columns: query.columns,
                filter,
                ..DisplayOptions::default()
            },
        )
    }

    /// Execute another script in this session
    fn run_include(&mut self, path: &str) -> SqlToolResult<Flow> {
        let wrap = |err: SqlToolError| SqlToolError::Include {
            path: path.to_string(),
            source: Box::new(err),
        };

        let file = File::open(path).map_err(|e| wrap(e.into()))?;
        debug!("Including {}", path);
        let mut nested = SqlFile::with_scope(
            &mut *self.session,
            Box::new(ReaderSource::buffered(file)),
            path,
            false,
            Scope::IncludedFile,
        );
        match nested.run() {
            Ok(Flow::Break(None)) | Ok(Flow::Break(Some(BlockKind::File))) => Ok(Flow::Normal),
            Ok(flow) => Ok(flow),
            Err(err) => Err(wrap(err)),
        }
    }
}
