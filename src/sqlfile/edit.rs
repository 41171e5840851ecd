//! Buffer editing (`:`) and macros (`/`)

use tracing::debug;

use super::special::append_command;
use super::{Flow, SqlFile};
use crate::block::opener_kind;
use crate::commands::edit::{self, EditAction, EditCommand, EditTarget};
use crate::error::{SqlToolError, SqlToolResult};
use crate::history::HistoryRef;
use crate::token::{Token, TokenKind};

/// `token` with its text replaced, keeping the body of a PL block opener
///
/// Only the opening line of a block can be edited, so an edit that turns
/// some other command into an opener has no body to run.
fn rebuild(command: &str, token: &Token, value: String) -> SqlToolResult<Token> {
    let mut edited = Token::new(token.kind, value, token.line);
    if opener_kind(&edited).is_some() {
        edited.nested_block = token.nested_block.clone();
        if edited.nested_block.is_none() {
            return Err(SqlToolError::BadEditCommand {
                command: command.to_string(),
                reason: "the edited command opens a block without a body".to_string(),
            });
        }
    }
    Ok(edited)
}

impl<'s, 't> SqlFile<'s, 't> {
    pub(super) fn run_edit(&mut self, text: &str) -> SqlToolResult<Flow> {
        let (target, action) = match edit::parse(text)? {
            EditCommand::Help => {
                let help = self.session.message("help.edit", &[]);
                self.session.print(&help)?;
                return Ok(Flow::Normal);
            }
            EditCommand::ListHistory => {
                self.list_history()?;
                return Ok(Flow::Normal);
            }
            EditCommand::Apply { target, action } => (target, action),
        };

        let is_buffer = target == EditTarget::Buffer;
        let token = match target {
            EditTarget::Buffer => self.history.recall(HistoryRef::Buffer)?,
            EditTarget::Absolute(n) => self.history.recall(HistoryRef::Absolute(n))?,
            EditTarget::Relative(n) => self.history.recall(HistoryRef::Relative(n))?,
            EditTarget::Search(pattern) => {
                let index = self
                    .history
                    .search(&pattern)?
                    .ok_or(SqlToolError::NoHistoryMatch(pattern))?;
                self.history.recall(HistoryRef::Absolute(index))?
            }
        };
        debug!("Edit {:?} on {:?}", action, token.value);

        match action {
            EditAction::Default => {
                if !is_buffer {
                    self.history.set_buffer(token.clone())?;
                }
                self.show_buffer(&token)?;
            }
            EditAction::List => self.session.print(&token.reconstitute())?,
            EditAction::Execute => {
                self.history.set_buffer(token.clone())?;
                self.history.historize();
                return self.execute_stored(&token);
            }
            EditAction::Append(appendage) => {
                let (appendage, execute) = match appendage.trim_end().strip_suffix(';') {
                    Some(stripped) => (stripped.to_string(), true),
                    None => (appendage, false),
                };
                let edited = rebuild(text, &token, format!("{}{}", token.value, appendage))?;
                return self.store_edited(edited, execute);
            }
            EditAction::Write(file) => {
                append_command(&file, &token)?;
                self.session.notify("buffer.written", &[&file])?;
            }
            EditAction::Substitute(sub) => match sub.apply(&token.value)? {
                None => self.session.notify("substitute.nomatch", &[])?,
                Some(value) => {
                    let edited = rebuild(text, &token, value)?;
                    return self.store_edited(edited, sub.execute);
                }
            },
        }
        Ok(Flow::Normal)
    }

    /// Put an edited command in the buffer, then run or show it
    fn store_edited(&mut self, token: Token, execute: bool) -> SqlToolResult<Flow> {
        self.history.set_buffer(token.clone())?;
        if execute {
            self.history.historize();
            self.execute_stored(&token)
        } else {
            self.show_buffer(&token)?;
            Ok(Flow::Normal)
        }
    }

    fn show_buffer(&mut self, token: &Token) -> SqlToolResult<()> {
        self.session.notify("buffer.show", &[&token.reconstitute()])
    }

    fn list_history(&mut self) -> SqlToolResult<()> {
        if self.history.is_empty() {
            return self.session.notify("history.empty", &[]);
        }
        let lines: Vec<String> = self
            .history
            .entries()
            .map(|(index, token)| format!("{:>3}: {}", index, token.reconstitute()))
            .collect();
        for line in lines {
            self.session.print(&line)?;
        }
        Ok(())
    }

    pub(super) fn run_macro(&mut self, text: &str) -> SqlToolResult<Flow> {
        match text.strip_prefix('=') {
            Some(definition) => {
                self.define_macro(definition.trim())?;
                Ok(Flow::Normal)
            }
            None => self.expand_macro(text),
        }
    }

    fn define_macro(&mut self, definition: &str) -> SqlToolResult<()> {
        if definition.is_empty() {
            return self.list_macros();
        }

        let end = definition
            .find(char::is_whitespace)
            .unwrap_or(definition.len());
        let (name, body) = (&definition[..end], definition[end..].trim());
        if body.is_empty() {
            return Err(SqlToolError::BadSpecialCommand {
                command: format!("/={}", definition),
                reason: "a macro needs a body, or ':' for the buffer".to_string(),
            });
        }

        let line = self.feed.line_no();
        let token = if body == ":" {
            self.history.recall(HistoryRef::Buffer)?
        } else if let Some(special) = body.strip_prefix('\\') {
            Token::new(TokenKind::Special, special.trim(), line)
        } else if let Some(pl) = body.strip_prefix('*') {
            Token::new(TokenKind::Pl, pl.trim(), line)
        } else {
            let sql = body.strip_suffix(';').unwrap_or(body).trim_end();
            Token::new(TokenKind::Sql, sql, line)
        };
        self.session.macros.insert(name.to_string(), token);
        self.session.notify("macro.defined", &[name])
    }

    fn list_macros(&mut self) -> SqlToolResult<()> {
        if self.session.macros.is_empty() {
            return self.session.notify("macro.none", &[]);
        }
        let mut lines: Vec<String> = self
            .session
            .macros
            .iter()
            .map(|(name, token)| format!("/{} = {}", name, token.reconstitute()))
            .collect();
        lines.sort();
        for line in lines {
            self.session.print(&line)?;
        }
        Ok(())
    }

    fn expand_macro(&mut self, text: &str) -> SqlToolResult<Flow> {
        let end = text
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.' || c == '-'))
            .unwrap_or(text.len());
        let (name, appendage) = text.split_at(end);
        let stored = self
            .session
            .macros
            .get(name)
            .cloned()
            .ok_or_else(|| SqlToolError::UndefinedMacro(name.to_string()))?;
        let value = format!("{}{}", stored.value, appendage);

        match stored.kind {
            TokenKind::Sql => {
                let trimmed = value.trim_end();
                match trimmed.strip_suffix(';') {
                    Some(sql) => {
                        let token = Token::new(TokenKind::Sql, sql, stored.line);
                        self.history.set_buffer(token.clone())?;
                        self.history.historize();
                        self.run_sql(&token.value, true)
                    }
                    None => {
                        let token = Token::new(TokenKind::Sql, trimmed, stored.line);
                        let shown = token.reconstitute();
                        self.history.set_buffer(token)?;
                        self.session.notify("macro.loaded", &[&shown])?;
                        Ok(Flow::Normal)
                    }
                }
            }
            kind => {
                let mut token = Token::new(kind, value, stored.line);
                token.nested_block = stored.nested_block;
                self.history.set_buffer(token.clone())?;
                self.history.historize();
                self.execute_stored(&token)
            }
        }
    }
}
