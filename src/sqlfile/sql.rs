//! SQL execution and result display

use std::time::Instant;

use regex::Regex;

use super::{Flow, SqlFile};
use crate::connection::StatementResult;
use crate::error::{SqlToolError, SqlToolResult};
use crate::render::{format_cell, html_table, text_table};
use crate::session::{FetchTarget, PrepareSource};
use crate::statement;
use crate::value::{ColumnInfo, ResultSet, Value};
use crate::variables::LAST_VALUE;

/// How a result should be shown
#[derive(Debug, Default)]
pub(super) struct DisplayOptions {
    /// 1-based columns to show; all when `None`
    pub columns: Option<Vec<usize>>,
    /// Only rows with a cell matching this are shown
    pub filter: Option<Regex>,
    pub fetch_var: Option<FetchTarget>,
    pub fetch_binary: bool,
}

impl<'s, 't> SqlFile<'s, 't> {
    /// Execute one SQL statement; `expand` applies variable expansion in PL mode
    pub(super) fn run_sql(&mut self, text: &str, expand: bool) -> SqlToolResult<Flow> {
        let session = &mut *self.session;
        let prepare = session.prepare.take();
        let fetch_binary = std::mem::take(&mut session.fetch_binary);
        let fetch_var = session.fetch_var.take();

        let sql = if expand && session.pl_mode {
            session.vars.dereference(text, false)?
        } else {
            text.to_string()
        };
        if sql.trim().is_empty() {
            return Err(SqlToolError::EmptyStatement);
        }

        let params = match prepare {
            None => Vec::new(),
            Some(source) => {
                let count = statement::placeholder_count(&sql)?;
                if count != 1 {
                    return Err(SqlToolError::PlaceholderCount(count));
                }
                vec![match source {
                    PrepareSource::Binary => Value::Blob(
                        session
                            .binary_buffer
                            .clone()
                            .ok_or(SqlToolError::EmptyBinaryBuffer)?,
                    ),
                    PrepareSource::Variable(name) => Value::Text(
                        session
                            .vars
                            .get(&name)
                            .ok_or(SqlToolError::UndefinedVariable(name.clone()))?
                            .to_string(),
                    ),
                }]
            }
        };

        session.possibly_uncommitted = !statement::ends_transaction(&sql);
        let started = Instant::now();
        let result = session.connection.execute(&sql, &params)?;
        let elapsed = started.elapsed();

        self.display(
            result,
            DisplayOptions {
                fetch_var,
                fetch_binary,
                ..DisplayOptions::default()
            },
        )?;

        if self.session.timing {
            let millis = format!("{:.3}", elapsed.as_secs_f64() * 1000.0);
            self.session.notify("timing.elapsed", &[&millis])?;
        }
        Ok(Flow::Normal)
    }

    pub(super) fn display(
        &mut self,
        result: StatementResult,
        options: DisplayOptions,
    ) -> SqlToolResult<()> {
        match result {
            StatementResult::UpdateCount(count) => {
                let count = count.to_string();
                self.session.vars.set(LAST_VALUE, count.as_str());
                let silent = match &options.fetch_var {
                    Some(target) => {
                        self.session.vars.set(&target.name, count.as_str());
                        target.silent
                    }
                    None => false,
                };
                if silent {
                    return Ok(());
                }
                if count == "1" {
                    self.session.notify("update.one", &[])
                } else {
                    self.session.notify("update.many", &[&count])
                }
            }
            StatementResult::NoResult => self.session.notify("result.none", &[]),
            StatementResult::Rows(rs) => self.display_rows(rs, options),
        }
    }

    fn display_rows(&mut self, rs: ResultSet, options: DisplayOptions) -> SqlToolResult<()> {
        let included: Vec<usize> = match &options.columns {
            Some(columns) => columns
                .iter()
                .filter(|&&c| c >= 1 && c <= rs.column_count())
                .map(|c| c - 1)
                .collect(),
            None => (0..rs.column_count()).collect(),
        };
        let null_rep = self.session.null_rep();

        if rs.rows.is_empty() {
            if let Some(target) = &options.fetch_var {
                self.session.vars.remove(&target.name);
                if target.silent {
                    return Ok(());
                }
            }
        }

        let mut shown: Vec<Vec<String>> = Vec::new();
        for (index, row) in rs.rows.iter().enumerate() {
            for &c in &included {
                if options.fetch_binary || matches!(row[c], Value::Blob(_)) {
                    return self.store_binary(&row[c], &rs.columns[c]);
                }
            }

            let cells: Vec<String> = included
                .iter()
                .map(|&c| format_cell(&row[c], &rs.columns[c], &null_rep))
                .collect();

            if index == 0 {
                if let Some(&first) = included.first() {
                    let value = row[first].as_display();
                    self.session
                        .vars
                        .set(LAST_VALUE, value.clone().unwrap_or_default());
                    if let Some(target) = &options.fetch_var {
                        match value {
                            Some(v) => self.session.vars.set(&target.name, v),
                            None => {
                                self.session.vars.remove(&target.name);
                            }
                        }
                        if target.silent {
                            return Ok(());
                        }
                    }
                }
            }

            if let Some(filter) = &options.filter {
                if !cells.iter().any(|cell| filter.is_match(cell)) {
                    continue;
                }
            }
            shown.push(cells);
        }

        let columns: Vec<&ColumnInfo> = included.iter().map(|&c| &rs.columns[c]).collect();
        let table = if self.session.html {
            html_table(&columns, &shown)
        } else {
            text_table(&columns, &shown)
        };
        self.session.output.write_str(&table)?;

        if shown.len() == 1 {
            self.session.notify("rows.one", &[])
        } else {
            self.session.notify("rows.many", &[&shown.len().to_string()])
        }
    }

    /// Put a fetched value into the binary buffer instead of displaying it
    fn store_binary(&mut self, value: &Value, column: &ColumnInfo) -> SqlToolResult<()> {
        let bytes = match value {
            Value::Blob(bytes) => bytes.clone(),
            Value::Null => Vec::new(),
            other => other.to_string().into_bytes(),
        };
        let size = bytes.len().to_string();
        self.session.binary_buffer = Some(bytes);
        self.session
            .notify("binary.stored", &[&size, column.type_name()])
    }
}
