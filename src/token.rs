//! Command tokens produced by the lexer

use std::fmt;

/// Classification of a scanned command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// SQL statement terminated by `;`
    Sql,
    /// SQL statement terminated by a blank line (interactive): buffered, not run
    Buffer,
    /// `\` special command
    Special,
    /// `*` procedural command
    Pl,
    /// `:` buffer/edit command
    Edit,
    /// `/` macro command
    Macro,
    /// Raw chunk ended by `.`, stored in the buffer
    Raw,
    /// Raw chunk ended by `.;`, executed verbatim
    RawExec,
    /// Lexically malformed command
    SyntaxError,
    /// Input ended inside a statement or raw chunk
    Unterminated,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Sql => "SQL",
            TokenKind::Buffer => "BUFFER",
            TokenKind::Special => "SPECIAL",
            TokenKind::Pl => "PL",
            TokenKind::Edit => "EDIT",
            TokenKind::Macro => "MACRO",
            TokenKind::Raw => "RAW",
            TokenKind::RawExec => "RAW_EXEC",
            TokenKind::SyntaxError => "SYNTAX_ERROR",
            TokenKind::Unterminated => "UNTERMINATED",
        };
        write!(f, "{}", name)
    }
}

/// One command of the input stream
///
/// Tokens compare equal when kind and value match; the line number and any
/// nested block are ignored.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// 1-based line of the first line of the command
    pub line: usize,
    /// Body of an if/while/foreach command, scanned once when the opener is read
    pub nested_block: Option<Vec<Token>>,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            value: value.into(),
            line,
            nested_block: None,
        }
    }

    /// The command as it would be typed, with its leading marker restored
    pub fn reconstitute(&self) -> String {
        match self.kind {
            TokenKind::Sql | TokenKind::Buffer => format!("{};", self.value),
            TokenKind::Special => format!("\\{}", self.value),
            TokenKind::Pl => format!("*{}", self.value),
            TokenKind::Edit => format!(":{}", self.value),
            TokenKind::Macro => format!("/{}", self.value),
            TokenKind::Raw | TokenKind::RawExec => format!("\\.\n{}\n.", self.value),
            TokenKind::SyntaxError | TokenKind::Unterminated => self.value.clone(),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl Eq for Token {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_line() {
        let a = Token::new(TokenKind::Sql, "select 1", 1);
        let b = Token::new(TokenKind::Sql, "select 1", 7);
        let c = Token::new(TokenKind::Pl, "select 1", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_reconstitute() {
        assert_eq!(Token::new(TokenKind::Sql, "select 1", 1).reconstitute(), "select 1;");
        assert_eq!(Token::new(TokenKind::Special, "dt", 1).reconstitute(), "\\dt");
        assert_eq!(Token::new(TokenKind::Pl, "x = 1", 1).reconstitute(), "*x = 1");
        assert_eq!(Token::new(TokenKind::Macro, "m", 1).reconstitute(), "/m");
    }
}
