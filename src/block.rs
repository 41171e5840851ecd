//! Nested PL block scanning
//!
//! When the lexer yields an `*if`, `*while` or `*foreach`, the whole body up
//! to the matching `*end` is scanned before anything in it runs. Bodies nest,
//! so inner openers collect their own bodies recursively; the resulting token
//! tree is then replayed as many times as the construct requires.

use std::fmt;

use crate::error::{SqlToolError, SqlToolResult};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Constructs that `*break` and `*continue` can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    If,
    While,
    Foreach,
    File,
}

impl BlockKind {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "if" => Some(BlockKind::If),
            "while" => Some(BlockKind::While),
            "foreach" => Some(BlockKind::Foreach),
            "file" => Some(BlockKind::File),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::While => "while",
            BlockKind::Foreach => "foreach",
            BlockKind::File => "file",
        }
    }

    pub fn is_loop(self) -> bool {
        matches!(self, BlockKind::While | BlockKind::Foreach)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Leading keyword of a PL command value and the text after it
pub fn split_keyword(value: &str) -> (&str, &str) {
    let end = value
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(value.len());
    (&value[..end], value[end..].trim())
}

/// The construct a token opens, if it is an if/while/foreach command
pub fn opener_kind(token: &Token) -> Option<BlockKind> {
    if token.kind != TokenKind::Pl {
        return None;
    }
    match BlockKind::from_keyword(split_keyword(&token.value).0) {
        Some(BlockKind::File) | None => None,
        kind => kind,
    }
}

/// The construct an `*end X` token closes
fn end_kind(token: &Token) -> Option<SqlToolResult<BlockKind>> {
    if token.kind != TokenKind::Pl {
        return None;
    }
    let (word, rest) = split_keyword(&token.value);
    if word != "end" {
        return None;
    }
    Some(match BlockKind::from_keyword(rest) {
        Some(kind) if kind != BlockKind::File => Ok(kind),
        _ => Err(SqlToolError::BadPlCommand {
            command: token.value.clone(),
            reason: "expected 'end if', 'end while' or 'end foreach'".to_string(),
        }),
    })
}

/// Scan the body of `opener` from `lexer` into `opener.nested_block`
pub fn seek_block(lexer: &mut Lexer, opener: &mut Token) -> SqlToolResult<()> {
    let Some(kind) = opener_kind(opener) else {
        return Err(SqlToolError::Internal(format!(
            "'{}' does not open a block",
            opener.reconstitute()
        )));
    };

    let mut body = Vec::new();
    loop {
        let Some(mut token) = lexer.next_token()? else {
            return Err(SqlToolError::UnterminatedBlock(kind.to_string()));
        };
        if let Some(closing) = end_kind(&token) {
            let closing = closing?;
            if closing != kind {
                return Err(SqlToolError::MismatchedEnd(format!(
                    "'*end {}' at line {} closes an open '{}' block",
                    closing, token.line, kind
                )));
            }
            opener.nested_block = Some(body);
            return Ok(());
        }
        if opener_kind(&token).is_some() {
            seek_block(lexer, &mut token)?;
        }
        body.push(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_source::ReaderSource;

    fn seek(text: &str) -> SqlToolResult<Token> {
        let mut lexer = Lexer::new(Box::new(ReaderSource::from_text(text)), false);
        let mut opener = lexer.next_token()?.unwrap();
        seek_block(&mut lexer, &mut opener)?;
        Ok(opener)
    }

    #[test]
    fn test_nested_blocks() {
        let opener = seek(
            "*while (*x)\n  select 1;\n  *if (*y)\n    \\p in\n  *end if\n*end while\nselect 2;\n",
        )
        .unwrap();
        let body = opener.nested_block.unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].value, "select 1");
        assert_eq!(body[1].nested_block.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_mismatched_and_unterminated() {
        assert!(matches!(
            seek("*if (1)\n*end while\n"),
            Err(SqlToolError::MismatchedEnd(_))
        ));
        assert!(matches!(
            seek("*foreach v (a b)\nselect 1;\n"),
            Err(SqlToolError::UnterminatedBlock(_))
        ));
    }

    #[test]
    fn test_keyword_split() {
        assert_eq!(split_keyword("if(*x)"), ("if", "(*x)"));
        assert_eq!(split_keyword("foreach v (a)"), ("foreach", "v (a)"));
        assert_eq!(split_keyword("x = 1"), ("x", "= 1"));
    }
}
