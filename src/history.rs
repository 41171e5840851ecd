//! Edit buffer and command history
//!
//! The buffer holds the current command. Executed commands are pushed from the
//! buffer into a bounded history; history entries keep stable absolute
//! indices (starting at 1) as older entries are evicted.

use std::collections::VecDeque;

use regex::RegexBuilder;

use crate::error::{SqlToolError, SqlToolResult};
use crate::token::{Token, TokenKind};

/// Default number of retained history entries
pub const DEFAULT_HISTORY_SIZE: usize = 40;

/// A reference to a stored command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRef {
    /// The buffer, or the newest history entry when the buffer is empty
    Buffer,
    /// Absolute history index
    Absolute(usize),
    /// Position counted back from the newest entry (1 = newest, typed `-1`)
    Relative(usize),
}

#[derive(Debug)]
pub struct History {
    buffer: Option<Token>,
    entries: VecDeque<Token>,
    capacity: usize,
    oldest_index: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        History {
            buffer: None,
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            oldest_index: 1,
        }
    }

    pub fn buffer(&self) -> Option<&Token> {
        self.buffer.as_ref()
    }

    /// Replace the buffer; `false` when it already held an equal command
    pub fn set_buffer(&mut self, token: Token) -> SqlToolResult<bool> {
        if !matches!(
            token.kind,
            TokenKind::Sql | TokenKind::Pl | TokenKind::Special
        ) {
            return Err(SqlToolError::Internal(format!(
                "{} command cannot be stored in the buffer",
                token.kind
            )));
        }
        if self.buffer.as_ref() == Some(&token) {
            return Ok(false);
        }
        self.buffer = Some(token);
        Ok(true)
    }

    /// Push the buffer onto the history unless it repeats the newest entry
    pub fn historize(&mut self) {
        let Some(token) = self.buffer.clone() else {
            return;
        };
        if self.entries.back() == Some(&token) {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.oldest_index += 1;
        }
        self.entries.push_back(token);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Absolute index of the oldest retained entry
    pub fn oldest_index(&self) -> usize {
        self.oldest_index
    }

    /// Entries with their absolute indices, oldest first
    pub fn entries(&self) -> impl Iterator<Item = (usize, &Token)> {
        let oldest = self.oldest_index;
        self.entries.iter().enumerate().map(move |(i, t)| (oldest + i, t))
    }

    pub fn recall(&self, which: HistoryRef) -> SqlToolResult<Token> {
        match which {
            HistoryRef::Buffer => self
                .buffer
                .clone()
                .or_else(|| self.entries.back().cloned())
                .ok_or(SqlToolError::EmptyBuffer),
            HistoryRef::Absolute(n) => {
                if n < self.oldest_index || n >= self.oldest_index + self.entries.len() {
                    return Err(self.range_error(n.to_string()));
                }
                Ok(self.entries[n - self.oldest_index].clone())
            }
            HistoryRef::Relative(n) => {
                if n == 0 || n > self.entries.len() {
                    return Err(self.range_error(format!("-{}", n)));
                }
                Ok(self.entries[self.entries.len() - n].clone())
            }
        }
    }

    fn range_error(&self, index: String) -> SqlToolError {
        let range = if self.entries.is_empty() {
            "history is empty".to_string()
        } else {
            format!(
                "{}..{}",
                self.oldest_index,
                self.oldest_index + self.entries.len() - 1
            )
        };
        SqlToolError::HistoryRange { index, range }
    }

    /// Absolute index of the newest entry matching `pattern`
    ///
    /// Matching is case-insensitive and `.` matches newlines unless the
    /// pattern overrides that with inline flags.
    pub fn search(&self, pattern: &str) -> SqlToolResult<Option<usize>> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()?;
        Ok(self
            .entries
            .iter()
            .enumerate()
            .rev()
            .find(|(_, t)| re.is_match(&t.value))
            .map(|(i, _)| self.oldest_index + i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(text: &str) -> Token {
        Token::new(TokenKind::Sql, text, 1)
    }

    fn push(history: &mut History, text: &str) {
        history.set_buffer(sql(text)).unwrap();
        history.historize();
    }

    #[test]
    fn test_set_buffer_is_idempotent() {
        let mut history = History::new(5);
        assert!(history.set_buffer(sql("select 1")).unwrap());
        assert!(!history.set_buffer(sql("select 1")).unwrap());
        assert!(history
            .set_buffer(Token::new(TokenKind::Edit, "l", 1))
            .is_err());
    }

    #[test]
    fn test_bounded_history_keeps_absolute_indices() {
        let mut history = History::new(3);
        for i in 1..=5 {
            push(&mut history, &format!("select {}", i));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.oldest_index(), 3);
        assert_eq!(history.recall(HistoryRef::Absolute(3)).unwrap().value, "select 3");
        assert_eq!(history.recall(HistoryRef::Relative(1)).unwrap().value, "select 5");
        assert!(matches!(
            history.recall(HistoryRef::Absolute(2)),
            Err(SqlToolError::HistoryRange { .. })
        ));
        assert!(history.recall(HistoryRef::Relative(4)).is_err());
    }

    #[test]
    fn test_consecutive_duplicates_not_stored() {
        let mut history = History::new(5);
        push(&mut history, "select 1");
        history.historize();
        push(&mut history, "select 1");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_search_newest_first() {
        let mut history = History::new(5);
        push(&mut history, "SELECT a\nFROM t1");
        push(&mut history, "insert into t2 values (1)");
        push(&mut history, "select b from t1");
        assert_eq!(history.search("select.*t1").unwrap(), Some(3));
        assert_eq!(history.search("a.from").unwrap(), Some(1));
        assert_eq!(history.search("(?-i)SELECT b").unwrap(), None);
        assert!(history.search("(").is_err());
    }

    #[test]
    fn test_recall_buffer_falls_back_to_history() {
        let history = History::new(5);
        assert!(matches!(
            history.recall(HistoryRef::Buffer),
            Err(SqlToolError::EmptyBuffer)
        ));
    }
}
