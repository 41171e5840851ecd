//! Command scanner
//!
//! Turns the physical lines of a `LineSource` into command `Token`s. The kind
//! of a command is decided by the first character of its first non-blank
//! line; SQL statements may span lines and end at the first `;` that is not
//! inside a quoted string or a comment.
//!
//! Lexical problems do not fail the scan. They come back as `SyntaxError` or
//! `Unterminated` tokens and are reported when the token is consumed, so an
//! interactive session or a continue-on-error script can carry on.

use tracing::trace;

use crate::error::SqlToolResult;
use crate::line_source::{LineSource, Prompt};
use crate::token::{Token, TokenKind};

/// Quote and comment state carried across the lines of one SQL statement
#[derive(Debug, Default)]
struct SqlScanState {
    in_single: bool,
    in_double: bool,
    in_block_comment: bool,
}

impl SqlScanState {
    /// Byte offset of the terminating `;` in `line`, if there is one
    fn scan(&mut self, line: &str) -> Option<usize> {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            if self.in_block_comment {
                if c == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    self.in_block_comment = false;
                    i += 1;
                }
            } else if self.in_single {
                if c == b'\'' {
                    self.in_single = false;
                }
            } else if self.in_double {
                if c == b'"' {
                    self.in_double = false;
                }
            } else {
                match c {
                    b'\'' => self.in_single = true,
                    b'"' => self.in_double = true,
                    b'-' if bytes.get(i + 1) == Some(&b'-') => return None,
                    b'/' if bytes.get(i + 1) == Some(&b'*') => {
                        self.in_block_comment = true;
                        i += 1;
                    }
                    b';' => return Some(i),
                    _ => {}
                }
            }
            i += 1;
        }
        None
    }

    fn is_open(&self) -> bool {
        self.in_single || self.in_double || self.in_block_comment
    }
}

/// Scanner of commands from a line source
pub struct Lexer {
    source: Box<dyn LineSource>,
    interactive: bool,
    line_no: usize,
    /// Text following a `;` on the line that ended the previous statement
    pending: Option<(String, usize)>,
}

impl Lexer {
    pub fn new(source: Box<dyn LineSource>, interactive: bool) -> Self {
        Lexer {
            source,
            interactive,
            line_no: 0,
            pending: None,
        }
    }

    /// Number of physical lines read so far
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    fn read_line(&mut self, prompt: Prompt) -> SqlToolResult<Option<String>> {
        let line = self.source.next_line(prompt)?;
        if line.is_some() {
            self.line_no += 1;
        }
        Ok(line)
    }

    /// Scan the next command; `None` at end of input
    pub fn next_token(&mut self) -> SqlToolResult<Option<Token>> {
        if let Some((rest, line)) = self.pending.take() {
            if !is_ignorable(&rest) {
                return self.classify(rest, line).map(Some);
            }
        }

        loop {
            let Some(line) = self.read_line(Prompt::Primary)? else {
                return Ok(None);
            };
            if is_ignorable(&line) {
                continue;
            }
            return self.classify(line, self.line_no).map(Some);
        }
    }

    /// Build the command starting with `line` from its first character
    fn classify(&mut self, line: String, start: usize) -> SqlToolResult<Token> {
        let trimmed = line.trim();
        trace!("Scanning command at line {}: {}", start, trimmed);

        if trimmed == "\\." {
            return self.scan_raw(start);
        }

        let token = match trimmed.chars().next() {
            Some('\\') => Token::new(TokenKind::Special, trimmed[1..].trim(), start),
            Some('*') => Token::new(TokenKind::Pl, trimmed[1..].trim(), start),
            Some(':') => Token::new(TokenKind::Edit, &trimmed[1..], start),
            Some('/') if !trimmed.starts_with("/*") => {
                Token::new(TokenKind::Macro, &trimmed[1..], start)
            }
            Some('\'') | Some('"') => Token::new(
                TokenKind::SyntaxError,
                format!("a command may not begin with a quote: {}", trimmed),
                start,
            ),
            _ => return self.scan_sql(line.trim_start().to_string(), start),
        };
        Ok(token)
    }

    /// Accumulate an SQL statement that begins with `first`
    fn scan_sql(&mut self, first: String, start: usize) -> SqlToolResult<Token> {
        let mut state = SqlScanState::default();
        let mut text = String::new();
        let mut line = first;
        let mut line_start = start;

        loop {
            if let Some(end) = state.scan(&line) {
                text.push_str(&line[..end]);
                let rest = &line[end + 1..];
                if !rest.trim().is_empty() {
                    self.pending = Some((rest.trim().to_string(), line_start));
                }
                return Ok(Token::new(TokenKind::Sql, text.trim(), start));
            }
            text.push_str(&line);

            match self.read_line(Prompt::Continuation)? {
                None => return Ok(Token::new(TokenKind::Unterminated, text.trim(), start)),
                Some(next) => {
                    if self.interactive && next.trim().is_empty() && !state.is_open() {
                        return Ok(Token::new(TokenKind::Buffer, text.trim(), start));
                    }
                    text.push('\n');
                    line = next;
                    line_start = self.line_no;
                }
            }
        }
    }

    /// Collect a raw chunk after a `\.` line
    fn scan_raw(&mut self, start: usize) -> SqlToolResult<Token> {
        let mut lines: Vec<String> = Vec::new();
        loop {
            match self.read_line(Prompt::Raw)? {
                None => {
                    return Ok(Token::new(TokenKind::Unterminated, lines.join("\n"), start))
                }
                Some(line) => match line.trim_end() {
                    "." => return Ok(Token::new(TokenKind::Raw, lines.join("\n"), start)),
                    ".;" => return Ok(Token::new(TokenKind::RawExec, lines.join("\n"), start)),
                    _ => lines.push(line),
                },
            }
        }
    }
}

/// Blank, `;`-only and `--` comment lines between commands
fn is_ignorable(trimmed: &str) -> bool {
    let trimmed = trimmed.trim();
    trimmed.is_empty() || trimmed.chars().all(|c| c == ';') || trimmed.starts_with("--")
}
