//! Delimiter-separated values import and export for sqltool
//!
//! This module moves whole tables between the database and DSV files:
//!
//! - `\x` exports a table or a query to a DSV file with a header line
//! - `\m` imports a DSV file into a table, converting each field according
//!   to the declared type of its target column
//!
//! Delimiters, the null token, constant and skipped columns, commit batching
//! and reject handling are all taken from `*DSV_*` settings variables, so a
//! script configures an import with ordinary PL assignments before running it.
//!
//! Rows are split on plain string delimiters rather than with a CSV parser:
//! DSV has no quoting, which is why an export refuses values that contain a
//! delimiter. The CSV crate is used for the reject report instead.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{debug, info};

use crate::connection::{Connection, StatementResult};
use crate::error::{SqlToolError, SqlToolResult};
use crate::render::format_cell;
use crate::statement;
use crate::value::{decode_hex, ColumnType, Value};
use crate::variables::VariableStore;

/// DSV settings for one import or export
#[derive(Debug, Clone, PartialEq)]
pub struct DsvSettings {
    pub col_delim: String,
    pub row_delim: String,
    pub skip_prefix: String,
    pub null_rep: String,
    /// Columns given a fixed value, in configured order
    pub const_cols: Vec<(String, String)>,
    /// Header columns to ignore
    pub skip_cols: Vec<String>,
    pub records_per_commit: Option<usize>,
    pub reject_file: Option<String>,
    pub reject_report: Option<String>,
    pub target_table: Option<String>,
    pub target_file: Option<String>,
}

impl Default for DsvSettings {
    fn default() -> Self {
        DsvSettings {
            col_delim: "|".to_string(),
            row_delim: "\n".to_string(),
            skip_prefix: "#".to_string(),
            null_rep: "[null]".to_string(),
            const_cols: Vec::new(),
            skip_cols: Vec::new(),
            records_per_commit: None,
            reject_file: None,
            reject_report: None,
            target_table: None,
            target_file: None,
        }
    }
}

/// Expand `\t`, `\n`, `\r` and `\\` in a delimiter setting
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn invalid(name: &str, value: &str) -> SqlToolError {
    SqlToolError::InvalidSetting {
        name: name.to_string(),
        value: value.to_string(),
    }
}

impl DsvSettings {
    /// Read settings from the `*DSV_*` variables, defaulting unset ones
    pub fn from_vars(vars: &VariableStore) -> SqlToolResult<Self> {
        let mut settings = DsvSettings::default();
        let get = |name: &str| vars.get(name).filter(|v| !v.is_empty());

        if let Some(v) = get("*DSV_COL_DELIM") {
            settings.col_delim = unescape(v);
        }
        if let Some(v) = get("*DSV_ROW_DELIM") {
            settings.row_delim = unescape(v);
        }
        if let Some(v) = get("*DSV_SKIP_PREFIX") {
            settings.skip_prefix = unescape(v);
        }
        if let Some(v) = get("*DSV_NULL_REP") {
            settings.null_rep = v.to_string();
        }
        if let Some(v) = get("*DSV_CONST_COLS") {
            for pair in v.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (name, value) = pair
                    .split_once('=')
                    .ok_or_else(|| invalid("*DSV_CONST_COLS", v))?;
                settings
                    .const_cols
                    .push((name.trim().to_string(), value.trim().to_string()));
            }
        }
        if let Some(v) = get("*DSV_SKIP_COLS") {
            settings.skip_cols = v
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = get("*DSV_RECORDS_PER_COMMIT") {
            settings.records_per_commit = match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => return Err(invalid("*DSV_RECORDS_PER_COMMIT", v)),
            };
        }
        settings.reject_file = get("*DSV_REJECT_FILE").map(str::to_string);
        settings.reject_report = get("*DSV_REJECT_REPORT").map(str::to_string);
        settings.target_table = get("*DSV_TARGET_TABLE").map(str::to_string);
        settings.target_file = get("*DSV_TARGET_FILE").map(str::to_string);

        if settings.col_delim.is_empty() {
            return Err(invalid("*DSV_COL_DELIM", ""));
        }
        if settings.row_delim.is_empty() {
            return Err(invalid("*DSV_ROW_DELIM", ""));
        }
        Ok(settings)
    }
}

/// Result of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: String,
    pub rows: usize,
}

/// Export a table or query result to a DSV file
///
/// # Arguments
/// * `conn` - Connection to run the query on
/// * `settings` - Active DSV settings
/// * `target` - A table name, or a query (which requires `*DSV_TARGET_FILE`)
///
/// # Returns
/// * `Ok(ExportSummary)` - The written file and its row count
/// * `Err` - On query failure or an unsafe value; no partial file is left behind
pub fn export(
    conn: &mut dyn Connection,
    settings: &DsvSettings,
    target: &str,
) -> SqlToolResult<ExportSummary> {
    let target = target.trim();
    let (sql, path) = if statement::is_query(target) {
        let path = settings.target_file.clone().ok_or_else(|| {
            SqlToolError::DsvError("exporting a query requires *DSV_TARGET_FILE".to_string())
        })?;
        (target.to_string(), path)
    } else {
        if target.contains(char::is_whitespace) {
            return Err(SqlToolError::DsvError(format!(
                "expected a table name or a query: {}",
                target
            )));
        }
        let path = settings
            .target_file
            .clone()
            .unwrap_or_else(|| format!("{}.dsv", target));
        (format!("SELECT * FROM {}", target), path)
    };

    let result_set = match conn.execute(&sql, &[])? {
        StatementResult::Rows(rs) => rs,
        _ => {
            return Err(SqlToolError::DsvError(format!(
                "'{}' did not produce a result set",
                sql
            )))
        }
    };

    debug!("Exporting {} rows to {}", result_set.row_count(), path);
    let written = write_export(&path, settings, &result_set);
    if written.is_err() {
        let _ = fs::remove_file(&path);
    }
    written?;

    Ok(ExportSummary {
        path,
        rows: result_set.row_count(),
    })
}

fn write_export(
    path: &str,
    settings: &DsvSettings,
    result_set: &crate::value::ResultSet,
) -> SqlToolResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    let labels = result_set.labels();
    writer.write_all(labels.join(&settings.col_delim).as_bytes())?;
    writer.write_all(settings.row_delim.as_bytes())?;

    for row in &result_set.rows {
        let mut fields = Vec::with_capacity(row.len());
        for (value, column) in row.iter().zip(&result_set.columns) {
            let text = format_cell(value, column, &settings.null_rep);
            if !value.is_null()
                && (text.contains(&settings.col_delim)
                    || text.contains(&settings.row_delim)
                    || text.trim() == settings.null_rep)
            {
                return Err(SqlToolError::UnsafeFieldValue {
                    column: column.label.clone(),
                    value: text,
                });
            }
            fields.push(text);
        }
        writer.write_all(fields.join(&settings.col_delim).as_bytes())?;
        writer.write_all(settings.row_delim.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// A header field: a column to insert or a placeholder to skip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderColumn {
    Insert(String),
    Skip,
}

/// Counters of a finished import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub table: String,
    pub read: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub inserted: usize,
    /// Reject artifacts that were kept because they hold rejects
    pub reject_outputs: Vec<String>,
}

/// One line of the CSV reject report
#[derive(Debug, Serialize)]
struct RejectEntry<'a> {
    line: usize,
    reason: &'a str,
    record: &'a str,
}

/// Destination of rejected records
struct RejectSink {
    file: Option<(String, BufWriter<File>)>,
    report: Option<(String, csv::Writer<File>)>,
    row_delim: String,
    count: usize,
}

impl RejectSink {
    fn open(settings: &DsvSettings) -> SqlToolResult<Option<Self>> {
        if settings.reject_file.is_none() && settings.reject_report.is_none() {
            return Ok(None);
        }
        let file = match &settings.reject_file {
            Some(path) => Some((path.clone(), BufWriter::new(File::create(path)?))),
            None => None,
        };
        let report = match &settings.reject_report {
            Some(path) => Some((path.clone(), csv::Writer::from_path(path)?)),
            None => None,
        };
        Ok(Some(RejectSink {
            file,
            report,
            row_delim: settings.row_delim.clone(),
            count: 0,
        }))
    }

    fn reject(&mut self, line: usize, reason: &str, record: &str) -> SqlToolResult<()> {
        self.count += 1;
        if let Some((_, file)) = self.file.as_mut() {
            file.write_all(record.as_bytes())?;
            file.write_all(self.row_delim.as_bytes())?;
        }
        if let Some((_, report)) = self.report.as_mut() {
            report.serialize(RejectEntry {
                line,
                reason,
                record,
            })?;
        }
        Ok(())
    }

    /// Flush the artifacts, deleting them when nothing was rejected
    fn finish(self) -> SqlToolResult<Vec<String>> {
        let mut paths = Vec::new();
        if let Some((path, mut file)) = self.file {
            file.flush()?;
            paths.push(path);
        }
        if let Some((path, mut report)) = self.report {
            report.flush()?;
            paths.push(path);
        }
        if self.count == 0 {
            for path in &paths {
                fs::remove_file(path)?;
            }
            paths.clear();
        }
        Ok(paths)
    }
}

/// Pick the header for `table` from `lines`, which start at the header line
///
/// A `headerswitch{` line opens a block of `key:header` lines closed by `}`.
/// Keys are table names (case-insensitive) or `*` for any table, and the first
/// match wins. Blank and comment lines inside the block are ignored.
///
/// Returns the header and the number of lines it occupied.
pub fn select_header(
    lines: &[&str],
    table: &str,
    skip_prefix: &str,
) -> SqlToolResult<(String, usize)> {
    let Some(first) = lines.first() else {
        return Err(SqlToolError::DsvError("no header line".to_string()));
    };
    if first.trim() != "headerswitch{" {
        return Ok((first.to_string(), 1));
    }

    let mut chosen = None;
    for (offset, line) in lines.iter().enumerate().skip(1) {
        let entry = line.trim();
        if entry == "}" {
            let header = chosen.ok_or_else(|| {
                SqlToolError::DsvError(format!("headerswitch has no entry for table '{}'", table))
            })?;
            return Ok((header, offset + 1));
        }
        if entry.is_empty() || line.starts_with(skip_prefix) || chosen.is_some() {
            continue;
        }
        let (key, header) = entry.split_once(':').ok_or_else(|| {
            SqlToolError::DsvError(format!("malformed headerswitch entry '{}'", entry))
        })?;
        let key = key.trim();
        if key == "*" || key.eq_ignore_ascii_case(table) {
            chosen = Some(header.to_string());
        }
    }
    Err(SqlToolError::DsvError(
        "headerswitch block is not closed with '}'".to_string(),
    ))
}

/// Split a header into insert columns and skip placeholders
pub fn parse_header(header: &str, settings: &DsvSettings) -> SqlToolResult<Vec<HeaderColumn>> {
    let mut unmatched: Vec<&String> = settings.skip_cols.iter().collect();
    let mut columns = Vec::new();

    for name in header.split(settings.col_delim.as_str()).map(str::trim) {
        let is_skip = settings
            .skip_cols
            .iter()
            .any(|s| s.eq_ignore_ascii_case(name));
        let is_const = settings
            .const_cols
            .iter()
            .any(|(c, _)| c.eq_ignore_ascii_case(name));
        unmatched.retain(|s| !s.eq_ignore_ascii_case(name));

        if name == "-" || is_skip || is_const {
            columns.push(HeaderColumn::Skip);
        } else if name.is_empty() {
            return Err(SqlToolError::DsvError(format!(
                "empty column name in header '{}'",
                header
            )));
        } else {
            columns.push(HeaderColumn::Insert(name.to_string()));
        }
    }

    if !unmatched.is_empty() {
        let names: Vec<&str> = unmatched.iter().map(|s| s.as_str()).collect();
        return Err(SqlToolError::UnmatchedSkipColumns(names.join(", ")));
    }
    if !columns.iter().any(|c| matches!(c, HeaderColumn::Insert(_))) {
        return Err(SqlToolError::NoColumnsToInsert);
    }
    Ok(columns)
}

/// Convert one DSV field to a value for a column of type `kind`
///
/// The error is the reject reason.
pub fn convert_field(text: &str, kind: ColumnType, null_rep: &str) -> Result<Value, String> {
    let trimmed = text.trim();
    if trimmed == null_rep {
        return Ok(Value::Null);
    }
    if trimmed.is_empty() && kind.autonull() {
        return Ok(Value::Null);
    }

    match kind {
        ColumnType::Integer => trimmed
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| format!("'{}' is not an integer", trimmed)),
        ColumnType::Float => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("'{}' is not a number", trimmed)),
        ColumnType::Decimal => trimmed
            .parse::<f64>()
            .map(|_| Value::Text(trimmed.to_string()))
            .map_err(|_| format!("'{}' is not a decimal number", trimmed)),
        ColumnType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Ok(Value::Integer(1)),
            "false" | "f" | "0" | "no" => Ok(Value::Integer(0)),
            _ => Err(format!("'{}' is not a boolean", trimmed)),
        },
        ColumnType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| format!("'{}' is not a date (yyyy-mm-dd)", trimmed)),
        ColumnType::Time => ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
            .iter()
            .find_map(|f| NaiveTime::parse_from_str(trimmed, f).ok())
            .map(|t| Value::Text(t.format("%H:%M:%S%.f").to_string()))
            .ok_or_else(|| format!("'{}' is not a time (hh:mm:ss)", trimmed)),
        ColumnType::Timestamp => parse_timestamp(trimmed)
            .map(|ts| Value::Text(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()))
            .ok_or_else(|| format!("'{}' is not a timestamp", trimmed)),
        ColumnType::Binary => decode_hex(trimmed)
            .map(Value::Blob)
            .ok_or_else(|| format!("'{}' is not hex encoded binary", trimmed)),
        ColumnType::Char | ColumnType::Clob | ColumnType::Other => {
            Ok(Value::Text(text.to_string()))
        }
    }
}

/// Timestamp with optional fraction; a bare date means midnight
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Import a DSV file
///
/// # Arguments
/// * `conn` - Connection holding the target table
/// * `settings` - Active DSV settings
/// * `path` - The DSV file; its stem names the table unless `*DSV_TARGET_TABLE` is set
///
/// # Returns
/// * `Ok(ImportSummary)` - Counters of the finished import
/// * `Err` - On structural problems, or on the first reject when no reject
///   destination is configured
pub fn import(
    conn: &mut dyn Connection,
    settings: &DsvSettings,
    path: &str,
) -> SqlToolResult<ImportSummary> {
    let table = match &settings.target_table {
        Some(table) => table.clone(),
        None => Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| SqlToolError::DsvError(format!("no table name in '{}'", path)))?,
    };

    let content = fs::read_to_string(path)?;
    let mut lines: Vec<&str> = content.split(settings.row_delim.as_str()).collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    if settings.row_delim == "\n" {
        lines = lines
            .into_iter()
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
    }

    let is_skipped =
        |line: &str| line.trim().is_empty() || line.starts_with(settings.skip_prefix.as_str());
    let header_index = lines
        .iter()
        .position(|&l| !is_skipped(l))
        .ok_or_else(|| SqlToolError::DsvError(format!("no header line in '{}'", path)))?;
    let (header, header_lines) =
        select_header(&lines[header_index..], &table, &settings.skip_prefix)?;
    let data_index = header_index + header_lines;
    let columns = parse_header(&header, settings)?;

    let mut insert_names: Vec<String> = columns
        .iter()
        .filter_map(|c| match c {
            HeaderColumn::Insert(name) => Some(name.clone()),
            HeaderColumn::Skip => None,
        })
        .collect();
    insert_names.extend(settings.const_cols.iter().map(|(name, _)| name.clone()));
    let column_list = insert_names.join(", ");

    let probe = format!("SELECT {} FROM {} WHERE 1 = 2", column_list, table);
    let kinds: Vec<ColumnType> = match conn.execute(&probe, &[])? {
        StatementResult::Rows(rs) => rs.columns.iter().map(|c| c.kind).collect(),
        _ => {
            return Err(SqlToolError::DsvError(format!(
                "could not determine column types of '{}'",
                table
            )))
        }
    };

    let placeholders = vec!["?"; insert_names.len()].join(", ");
    let insert = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table, column_list, placeholders
    );
    debug!("Importing {} into {} with: {}", path, table, insert);

    let mut summary = ImportSummary {
        table: table.clone(),
        ..ImportSummary::default()
    };
    let mut sink = RejectSink::open(settings)?;

    let restore_auto_commit = conn.auto_commit();
    if settings.records_per_commit.is_some() {
        conn.set_auto_commit(false)?;
    }

    let loaded = load_records(
        conn,
        settings,
        &lines[data_index..],
        data_index + 1,
        &columns,
        &kinds,
        &insert,
        &mut sink,
        &mut summary,
    );

    let restored = if settings.records_per_commit.is_some() {
        conn.set_auto_commit(restore_auto_commit)
    } else {
        Ok(())
    };
    let finished = match sink {
        Some(sink) => sink.finish(),
        None => Ok(Vec::new()),
    };
    loaded?;
    restored?;
    summary.reject_outputs = finished?;
    info!(
        "Imported {} of {} records into {}",
        summary.inserted, summary.read, table
    );
    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
fn load_records(
    conn: &mut dyn Connection,
    settings: &DsvSettings,
    lines: &[&str],
    first_line_no: usize,
    columns: &[HeaderColumn],
    kinds: &[ColumnType],
    insert: &str,
    sink: &mut Option<RejectSink>,
    summary: &mut ImportSummary,
) -> SqlToolResult<()> {
    let mut attempted = 0usize;

    for (offset, line) in lines.iter().enumerate() {
        let line_no = first_line_no + offset;
        if line.trim().is_empty() || line.starts_with(settings.skip_prefix.as_str()) {
            summary.skipped += 1;
            continue;
        }
        summary.read += 1;

        let outcome = build_record(line, settings, columns, kinds).and_then(|params| {
            conn.execute(insert, &params)
                .map(|_| ())
                .map_err(|e| e.to_string())
        });
        attempted += 1;

        match outcome {
            Ok(()) => summary.inserted += 1,
            Err(reason) => {
                summary.rejected += 1;
                match sink.as_mut() {
                    Some(sink) => sink.reject(line_no, &reason, line)?,
                    None => {
                        return Err(SqlToolError::RejectedRecord {
                            line: line_no,
                            reason,
                        })
                    }
                }
            }
        }

        if let Some(n) = settings.records_per_commit {
            if attempted % n == 0 {
                conn.commit()?;
            }
        }
    }

    if let Some(n) = settings.records_per_commit {
        if attempted % n != 0 {
            conn.commit()?;
        }
    }
    Ok(())
}

/// Bind values for one record, in insert-column order
fn build_record(
    line: &str,
    settings: &DsvSettings,
    columns: &[HeaderColumn],
    kinds: &[ColumnType],
) -> Result<Vec<Value>, String> {
    let fields: Vec<&str> = line.split(settings.col_delim.as_str()).collect();
    if fields.len() != columns.len() {
        return Err(format!(
            "expected {} fields, found {}",
            columns.len(),
            fields.len()
        ));
    }

    let mut kinds = kinds.iter();
    let mut params = Vec::with_capacity(kinds.len());
    for (field, column) in fields.iter().zip(columns) {
        if let HeaderColumn::Insert(name) = column {
            let kind = kinds.next().copied().unwrap_or(ColumnType::Other);
            params.push(
                convert_field(field, kind, &settings.null_rep)
                    .map_err(|e| format!("column {}: {}", name, e))?,
            );
        }
    }
    for (name, value) in &settings.const_cols {
        let kind = kinds.next().copied().unwrap_or(ColumnType::Other);
        params.push(
            convert_field(value, kind, &settings.null_rep)
                .map_err(|e| format!("constant column {}: {}", name, e))?,
        );
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DsvSettings {
        DsvSettings::default()
    }

    #[test]
    fn test_settings_from_vars() {
        let mut vars = VariableStore::new();
        vars.set("*DSV_COL_DELIM", "\\t");
        vars.set("*DSV_CONST_COLS", "src = batch1, flag=1");
        vars.set("*DSV_SKIP_COLS", "a, b c");
        vars.set("*DSV_RECORDS_PER_COMMIT", "10");
        let s = DsvSettings::from_vars(&vars).unwrap();
        assert_eq!(s.col_delim, "\t");
        assert_eq!(
            s.const_cols,
            vec![
                ("src".to_string(), "batch1".to_string()),
                ("flag".to_string(), "1".to_string())
            ]
        );
        assert_eq!(s.skip_cols, vec!["a", "b", "c"]);
        assert_eq!(s.records_per_commit, Some(10));

        vars.set("*DSV_RECORDS_PER_COMMIT", "0");
        assert!(DsvSettings::from_vars(&vars).is_err());
    }

    #[test]
    fn test_header_switch() {
        let lines = ["headerswitch{", "items:id|name", "# note", "*:id|-", "}", "1|x"];
        assert_eq!(
            select_header(&lines, "ITEMS", "#").unwrap(),
            ("id|name".to_string(), 5)
        );
        assert_eq!(
            select_header(&lines, "other", "#").unwrap(),
            ("id|-".to_string(), 5)
        );
        assert!(select_header(&["headerswitch{", "items:a", "}"], "other", "#").is_err());
        assert!(select_header(&["headerswitch{", "items:a"], "items", "#").is_err());
        assert_eq!(
            select_header(&["a|b", "1|2"], "t", "#").unwrap(),
            ("a|b".to_string(), 1)
        );
    }

    #[test]
    fn test_parse_header() {
        let mut s = settings();
        s.skip_cols = vec!["junk".to_string()];
        s.const_cols = vec![("src".to_string(), "x".to_string())];
        let cols = parse_header("id|-|JUNK|src|name", &s).unwrap();
        assert_eq!(
            cols,
            vec![
                HeaderColumn::Insert("id".to_string()),
                HeaderColumn::Skip,
                HeaderColumn::Skip,
                HeaderColumn::Skip,
                HeaderColumn::Insert("name".to_string()),
            ]
        );

        assert!(matches!(
            parse_header("id|name", &s),
            Err(SqlToolError::UnmatchedSkipColumns(_))
        ));
        assert!(matches!(
            parse_header("-|-", &settings()),
            Err(SqlToolError::NoColumnsToInsert)
        ));
    }

    #[test]
    fn test_convert_field() {
        let null = "[null]";
        assert_eq!(convert_field(" 42 ", ColumnType::Integer, null), Ok(Value::Integer(42)));
        assert!(convert_field("4x", ColumnType::Integer, null).is_err());
        assert_eq!(convert_field("", ColumnType::Integer, null), Ok(Value::Null));
        assert_eq!(convert_field("", ColumnType::Char, null), Ok(Value::Text(String::new())));
        assert_eq!(convert_field("[null]", ColumnType::Char, null), Ok(Value::Null));
        assert_eq!(convert_field("yes", ColumnType::Boolean, null), Ok(Value::Integer(1)));
        assert_eq!(
            convert_field("2024-02-03", ColumnType::Timestamp, null),
            Ok(Value::Text("2024-02-03 00:00:00".to_string()))
        );
        assert!(convert_field("2024-13-03", ColumnType::Date, null).is_err());
        assert_eq!(
            convert_field("0aff", ColumnType::Binary, null),
            Ok(Value::Blob(vec![0x0a, 0xff]))
        );
        assert_eq!(
            convert_field("12.50", ColumnType::Decimal, null),
            Ok(Value::Text("12.50".to_string()))
        );
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a\\tb\\\\c\\x"), "a\tb\\c\\x");
    }
}
