//! Procedural (`*`) command parsing

use super::split_word;
use crate::block::{split_keyword, BlockKind};
use crate::error::{SqlToolError, SqlToolResult};
use crate::variables::validate_name;

#[derive(Debug, Clone, PartialEq)]
pub enum PlCommand {
    /// `*` alone
    Enable,
    Help,
    If(String),
    While(String),
    Foreach { var: String, values: String },
    /// An `*end` outside of any block
    End(String),
    Break(Option<BlockKind>),
    Continue(Option<BlockKind>),
    List { names: Vec<String>, values: bool },
    Dump { var: String, file: String },
    Load { var: String, file: String },
    Prepare(String),
    Set { var: String, value: String },
    Unset(String),
    /// Capture the next statement's scalar; `silent` suppresses its display
    Fetch { var: String, silent: bool },
}

fn bad(command: &str, reason: &str) -> SqlToolError {
    SqlToolError::BadPlCommand {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

/// Text between a leading `(` and a trailing `)`
fn parenthesized<'a>(command: &str, text: &'a str) -> SqlToolResult<&'a str> {
    text.strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .map(str::trim)
        .ok_or_else(|| bad(command, "expected a parenthesized expression"))
}

/// Parse the text of a PL command (without its leading `*`)
pub fn parse(text: &str) -> SqlToolResult<PlCommand> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(PlCommand::Enable);
    }
    if text == "?" {
        return Ok(PlCommand::Help);
    }

    let (keyword, rest) = split_keyword(text);
    match keyword {
        "if" => return Ok(PlCommand::If(parenthesized(text, rest)?.to_string())),
        "while" => return Ok(PlCommand::While(parenthesized(text, rest)?.to_string())),
        "foreach" => {
            let (var, values) = split_word(rest);
            validate_name(var)?;
            return Ok(PlCommand::Foreach {
                var: var.to_string(),
                values: parenthesized(text, values)?.to_string(),
            });
        }
        "end" => return Ok(PlCommand::End(rest.to_string())),
        "break" | "continue" => {
            let target = match rest {
                "" => None,
                word => Some(
                    BlockKind::from_keyword(word)
                        .ok_or_else(|| bad(text, "expected if, while, foreach or file"))?,
                ),
            };
            return if keyword == "break" {
                Ok(PlCommand::Break(target))
            } else if target.map_or(true, BlockKind::is_loop) {
                Ok(PlCommand::Continue(target))
            } else {
                Err(bad(text, "only while and foreach loops can be continued"))
            };
        }
        "list" | "listvalues" => {
            return Ok(PlCommand::List {
                names: rest.split_whitespace().map(str::to_string).collect(),
                values: keyword == "listvalues",
            })
        }
        "dump" | "load" => {
            let (var, file) = split_word(rest);
            if var.is_empty() || file.is_empty() {
                return Err(bad(text, "expected a variable name and a file path"));
            }
            validate_name(var)?;
            let (var, file) = (var.to_string(), file.to_string());
            return Ok(if keyword == "dump" {
                PlCommand::Dump { var, file }
            } else {
                PlCommand::Load { var, file }
            });
        }
        "prepare" => {
            if rest.is_empty() || rest.contains(char::is_whitespace) {
                return Err(bad(text, "expected one variable name"));
            }
            validate_name(rest)?;
            return Ok(PlCommand::Prepare(rest.to_string()));
        }
        _ => {}
    }

    parse_assignment(text)
}

/// `VAR = value`, `VAR =`, `VAR ~` or `VAR _`
fn parse_assignment(text: &str) -> SqlToolResult<PlCommand> {
    let end = text
        .find(|c: char| c.is_whitespace() || c == '=' || c == '~')
        .unwrap_or(text.len());
    let var = &text[..end];
    let rest = text[end..].trim_start();
    validate_name(var)?;
    let var = var.to_string();

    if let Some(value) = rest.strip_prefix('=') {
        let value = value.trim();
        return Ok(if value.is_empty() {
            PlCommand::Unset(var)
        } else {
            PlCommand::Set {
                var,
                value: value.to_string(),
            }
        });
    }
    match rest {
        "~" => Ok(PlCommand::Fetch { var, silent: false }),
        "_" => Ok(PlCommand::Fetch { var, silent: true }),
        _ => Err(bad(text, "unrecognized PL command")),
    }
}
