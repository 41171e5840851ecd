//! Database connection interface for sqltool
//!
//! The interpreter never talks to a driver directly. Everything it needs from a
//! database (statement execution, transaction control, isolation and the
//! product name used to pick catalog queries) goes through the `Connection`
//! trait, so the script engine can run against any implementation.

use std::fmt;
use std::str::FromStr;

use crate::error::{SqlToolError, SqlToolResult};
use crate::value::{ResultSet, Value};

/// Outcome of executing one statement
#[derive(Debug, Clone)]
pub enum StatementResult {
    /// The statement produced a result set
    Rows(ResultSet),
    /// A DML statement and the number of rows it touched
    UpdateCount(u64),
    /// Neither rows nor an update count (DDL, transaction control, ...)
    NoResult,
}

/// Transaction isolation levels in the usual SQL ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    None,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl fmt::Display for Isolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Isolation::None => "NONE",
            Isolation::ReadUncommitted => "READ_UNCOMMITTED",
            Isolation::ReadCommitted => "READ_COMMITTED",
            Isolation::RepeatableRead => "REPEATABLE_READ",
            Isolation::Serializable => "SERIALIZABLE",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Isolation {
    type Err = SqlToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "NONE" => Ok(Isolation::None),
            "READ_UNCOMMITTED" => Ok(Isolation::ReadUncommitted),
            "READ_COMMITTED" => Ok(Isolation::ReadCommitted),
            "REPEATABLE_READ" => Ok(Isolation::RepeatableRead),
            "SERIALIZABLE" => Ok(Isolation::Serializable),
            _ => Err(SqlToolError::InvalidSetting {
                name: "transaction isolation".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Common interface for database connections used by the interpreter
///
/// Implementations prepare statements through a statement cache, so
/// executing the same text repeatedly with different `params` (as the DSV
/// importer does) reuses one prepared statement.
pub trait Connection {
    /// Database product name, used to select vendor-specific catalog queries
    fn product_name(&self) -> String;

    /// Execute one statement, binding `params` positionally to its placeholders
    fn execute(&mut self, sql: &str, params: &[Value]) -> SqlToolResult<StatementResult>;

    /// Commit the current transaction
    fn commit(&mut self) -> SqlToolResult<()>;

    /// Roll back the current transaction
    fn rollback(&mut self) -> SqlToolResult<()>;

    /// Enable or disable autocommit; enabling commits any open transaction
    fn set_auto_commit(&mut self, auto_commit: bool) -> SqlToolResult<()>;

    /// Whether autocommit is on
    fn auto_commit(&self) -> bool;

    /// Current transaction isolation level
    fn transaction_isolation(&mut self) -> SqlToolResult<Isolation>;

    /// Change the transaction isolation level
    fn set_transaction_isolation(&mut self, level: Isolation) -> SqlToolResult<()>;
}
