//! Lightweight SQL statement inspection
//!
//! The interpreter does not parse SQL, but a few decisions depend on what a
//! statement looks like: how many `?` placeholders a prepared statement has,
//! whether a statement is DML, whether an export argument is a query, and
//! whether a statement ends the current transaction. These use the sqlparser
//! tokenizer so quoted text and comments are never mistaken for syntax.

use std::sync::OnceLock;

use regex::Regex;
use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::error::SqlToolResult;

fn tokenize(sql: &str) -> SqlToolResult<Vec<Token>> {
    let dialect = GenericDialect {};
    Ok(Tokenizer::new(&dialect, sql).tokenize()?)
}

/// Count the `?` placeholders outside of literals and comments
pub fn placeholder_count(sql: &str) -> SqlToolResult<usize> {
    Ok(tokenize(sql)?
        .iter()
        .filter(|t| matches!(t, Token::Placeholder(p) if p.starts_with('?')))
        .count())
}

/// The first keyword of a statement, skipping whitespace and comments
pub fn leading_keyword(sql: &str) -> Option<Keyword> {
    let tokens = tokenize(sql).ok()?;
    tokens.into_iter().find_map(|t| match t {
        Token::Whitespace(_) => None,
        Token::Word(w) => Some(Some(w.keyword)),
        _ => Some(None),
    })?
}

/// INSERT, UPDATE, DELETE or REPLACE
pub fn is_dml(sql: &str) -> bool {
    matches!(
        leading_keyword(sql),
        Some(Keyword::INSERT | Keyword::UPDATE | Keyword::DELETE | Keyword::REPLACE)
    )
}

/// SELECT, WITH or VALUES
pub fn is_query(sql: &str) -> bool {
    matches!(
        leading_keyword(sql),
        Some(Keyword::SELECT | Keyword::WITH | Keyword::VALUES)
    )
}

/// Whether the statement is `COMMIT` or `SET AUTOCOMMIT ...`
///
/// Anything else may leave uncommitted work behind.
pub fn ends_transaction(sql: &str) -> bool {
    transaction_end_regex().is_match(sql)
}

fn transaction_end_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^\s*(commit\b|set\s+autocommit\b)")
            .expect("Invalid transaction end regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_count_ignores_literals() {
        assert_eq!(placeholder_count("INSERT INTO t VALUES (?)").unwrap(), 1);
        assert_eq!(
            placeholder_count("SELECT '?' FROM t WHERE a = ? -- ?").unwrap(),
            1
        );
        assert_eq!(placeholder_count("SELECT 1").unwrap(), 0);
        assert_eq!(placeholder_count("UPDATE t SET a = ?, b = ?").unwrap(), 2);
    }

    #[test]
    fn test_statement_classification() {
        assert!(is_dml("  insert into t values (1)"));
        assert!(is_dml("/* c */ DELETE FROM t"));
        assert!(!is_dml("SELECT * FROM t"));
        assert!(is_query("select 1"));
        assert!(is_query("WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(!is_query("t_name"));
    }

    #[test]
    fn test_ends_transaction() {
        assert!(ends_transaction("COMMIT"));
        assert!(ends_transaction("  commit work"));
        assert!(ends_transaction("SET AUTOCOMMIT TRUE"));
        assert!(!ends_transaction("COMMITTED_ROWS"));
        assert!(!ends_transaction("INSERT INTO t VALUES (1)"));
    }
}
