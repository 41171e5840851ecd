//! SQLite implementation of the `Connection` trait
//!
//! SQLite has no session-level autocommit switch; it is in autocommit mode
//! whenever no transaction is open. Turning autocommit off is emulated by
//! keeping a transaction open at all times: one is begun when autocommit is
//! disabled and again after every commit, rollback, or statement that ended
//! the transaction on its own.

use std::path::Path;

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use tracing::debug;

use crate::connection::{Connection, Isolation, StatementResult};
use crate::error::{SqlToolError, SqlToolResult};
use crate::statement;
use crate::value::{ColumnInfo, ResultSet, Value};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Float(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Blob(bytes) => ToSqlOutput::from(bytes.as_slice()),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Float(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// A connection to an SQLite database file or in-memory database
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    auto_commit: bool,
}

impl SqliteConnection {
    /// Open a database file; `:memory:` opens a private in-memory database
    pub fn open(path: &str) -> SqlToolResult<Self> {
        let conn = if path == ":memory:" {
            rusqlite::Connection::open_in_memory()?
        } else {
            rusqlite::Connection::open(Path::new(path))?
        };
        debug!("Opened SQLite database {}", path);
        Ok(SqliteConnection {
            conn,
            auto_commit: true,
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> SqlToolResult<Self> {
        Self::open(":memory:")
    }

    /// Re-open a transaction if autocommit is off and none is active
    fn resume_transaction(&mut self) -> SqlToolResult<()> {
        if !self.auto_commit && self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn run(&mut self, sql: &str, params: &[Value]) -> SqlToolResult<StatementResult> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let column_count = stmt.column_count();

        if column_count == 0 {
            let changes = stmt.execute(rusqlite::params_from_iter(params.iter()))?;
            return Ok(if statement::is_dml(sql) {
                StatementResult::UpdateCount(changes as u64)
            } else {
                StatementResult::NoResult
            });
        }

        let columns: Vec<ColumnInfo> = stmt
            .columns()
            .iter()
            .map(|c| ColumnInfo::new(c.name(), c.decl_type()))
            .collect();
        let mut result = ResultSet::new(columns);

        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(Value::from(row.get_ref(i)?));
            }
            result.rows.push(values);
        }
        Ok(StatementResult::Rows(result))
    }
}

impl Connection for SqliteConnection {
    fn product_name(&self) -> String {
        format!("SQLite {}", rusqlite::version())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> SqlToolResult<StatementResult> {
        debug!("Executing: {}", sql);
        let result = self.run(sql, params);
        let resumed = self.resume_transaction();
        let result = result?;
        resumed?;
        Ok(result)
    }

    fn commit(&mut self) -> SqlToolResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        self.resume_transaction()
    }

    fn rollback(&mut self) -> SqlToolResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        self.resume_transaction()
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> SqlToolResult<()> {
        if auto_commit && !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        self.auto_commit = auto_commit;
        self.resume_transaction()
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn transaction_isolation(&mut self) -> SqlToolResult<Isolation> {
        let read_uncommitted: i64 =
            self.conn
                .query_row("PRAGMA read_uncommitted", [], |row| row.get(0))?;
        Ok(if read_uncommitted != 0 {
            Isolation::ReadUncommitted
        } else {
            Isolation::Serializable
        })
    }

    fn set_transaction_isolation(&mut self, level: Isolation) -> SqlToolResult<()> {
        let flag = match level {
            Isolation::ReadUncommitted => 1,
            Isolation::Serializable => 0,
            other => {
                return Err(SqlToolError::InvalidSetting {
                    name: "SQLite transaction isolation".to_string(),
                    value: other.to_string(),
                })
            }
        };
        self.conn.pragma_update(None, "read_uncommitted", flag)?;
        Ok(())
    }
}
