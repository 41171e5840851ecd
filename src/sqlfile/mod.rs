//! The script interpreter
//!
//! A `SqlFile` pulls command tokens from a lexer (a script, stdin or the
//! console) or replays the scanned body of a PL block, and dispatches each
//! token by kind: SQL to the connection, `\` commands to the special-command
//! handlers, `*` commands to the PL executor, `:` commands to the buffer
//! editor and `/` commands to the macro table.
//!
//! Included files and block bodies run in nested `SqlFile`s borrowing the
//! same `Session`. Quit, break and continue are returned as `Flow` values and
//! handled by whichever level they concern.

mod edit;
mod pl;
mod special;
mod sql;

use std::borrow::Cow;
use std::fmt;

use tracing::{debug, warn};

use crate::block::{opener_kind, seek_block, BlockKind};
use crate::error::{SqlToolError, SqlToolResult};
use crate::history::History;
use crate::lexer::Lexer;
use crate::line_source::LineSource;
use crate::session::Session;
use crate::token::{Token, TokenKind};

/// Control flow produced by executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Normal,
    /// Leave the named construct, or the innermost one
    Break(Option<BlockKind>),
    /// Start the next pass of the named loop, or the innermost one
    Continue(Option<BlockKind>),
    /// Stop everything; a message makes it an abort
    Quit(Option<String>),
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Normal => write!(f, "normal"),
            Flow::Break(None) => write!(f, "break"),
            Flow::Break(Some(kind)) => write!(f, "break {}", kind),
            Flow::Continue(None) => write!(f, "continue"),
            Flow::Continue(Some(kind)) => write!(f, "continue {}", kind),
            Flow::Quit(_) => write!(f, "quit"),
        }
    }
}

/// Where a `SqlFile` sits in the nesting of scripts and blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    TopFile,
    IncludedFile,
    Block,
}

/// Token supply: live scanning, or replay of a scanned block body
enum Feed<'t> {
    Lexer(Lexer),
    Replay { tokens: &'t [Token], pos: usize },
}

impl<'t> Feed<'t> {
    fn next(&mut self) -> SqlToolResult<Option<Cow<'t, Token>>> {
        match self {
            Feed::Lexer(lexer) => {
                let Some(mut token) = lexer.next_token()? else {
                    return Ok(None);
                };
                if opener_kind(&token).is_some() {
                    seek_block(lexer, &mut token)?;
                }
                Ok(Some(Cow::Owned(token)))
            }
            Feed::Replay { tokens, pos } => {
                let tokens: &'t [Token] = *tokens;
                let token = tokens.get(*pos);
                *pos += 1;
                Ok(token.map(Cow::Borrowed))
            }
        }
    }

    fn line_no(&self) -> usize {
        match self {
            Feed::Lexer(lexer) => lexer.line_no(),
            Feed::Replay { tokens, pos } => tokens
                .get(pos.saturating_sub(1))
                .map(|t| t.line)
                .unwrap_or(0),
        }
    }
}

/// Interpreter of one script, included file or block body
pub struct SqlFile<'s, 't> {
    session: &'s mut Session,
    feed: Feed<'t>,
    source_name: String,
    interactive: bool,
    scope: Scope,
    history: History,
}

impl<'s> SqlFile<'s, 'static> {
    /// Interpreter for a top-level script or console session
    pub fn new(
        session: &'s mut Session,
        source: Box<dyn LineSource>,
        source_name: &str,
        interactive: bool,
    ) -> Self {
        Self::with_scope(session, source, source_name, interactive, Scope::TopFile)
    }

    fn with_scope(
        session: &'s mut Session,
        source: Box<dyn LineSource>,
        source_name: &str,
        interactive: bool,
        scope: Scope,
    ) -> Self {
        let history = History::new(session.history_size);
        SqlFile {
            session,
            feed: Feed::Lexer(Lexer::new(source, interactive)),
            source_name: source_name.to_string(),
            interactive,
            scope,
            history,
        }
    }
}

impl<'s, 't> SqlFile<'s, 't> {
    /// Interpreter replaying the body of a block
    fn block(session: &'s mut Session, tokens: &'t [Token], source_name: &str) -> Self {
        let history = History::new(session.history_size);
        SqlFile {
            session,
            feed: Feed::Replay { tokens, pos: 0 },
            source_name: source_name.to_string(),
            interactive: false,
            scope: Scope::Block,
            history,
        }
    }

    pub fn session(&mut self) -> &mut Session {
        &mut *self.session
    }

    /// Run the script to its end
    ///
    /// `Some(flag)` overrides the session's continue-on-error setting;
    /// `None` keeps whatever earlier scripts left. Interactive input always
    /// continues after an error. If the run aborts (an
    /// error, or `\q` with a message) while uncommitted work may exist and
    /// autocommit is off, the work is rolled back.
    pub fn execute(&mut self, continue_on_error: Option<bool>) -> SqlToolResult<()> {
        if let Some(on) = continue_on_error {
            self.session.continue_on_error = on;
        }
        debug!(
            "Executing {} (continue on error: {})",
            self.source_name, self.session.continue_on_error
        );

        match self.run() {
            Ok(Flow::Quit(Some(message))) => {
                self.session.rollback_on_abort();
                Err(SqlToolError::Aborted(message))
            }
            Ok(Flow::Quit(None)) => {
                self.session.quit = true;
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(err) => {
                self.session.rollback_on_abort();
                Err(err)
            }
        }
    }

    /// Dispatch tokens until the input ends or a flow leaves this level
    fn run(&mut self) -> SqlToolResult<Flow> {
        loop {
            let token = match self.feed.next() {
                Ok(Some(token)) => token,
                Ok(None) => return Ok(Flow::Normal),
                Err(err @ (SqlToolError::IoError(_) | SqlToolError::ReadlineError(_))) => {
                    return Err(err)
                }
                Err(err) => {
                    let line = self.feed.line_no();
                    self.handle_error(err.located(&self.source_name, line, String::new()))?;
                    continue;
                }
            };

            let flow = match self.dispatch(&token) {
                Ok(flow) => flow,
                Err(err) => {
                    let err = err.located(&self.source_name, token.line, token.reconstitute());
                    self.handle_error(err)?;
                    continue;
                }
            };

            match (flow, self.scope) {
                (Flow::Normal, _) => {}
                (
                    Flow::Break(None) | Flow::Break(Some(BlockKind::File)),
                    Scope::TopFile | Scope::IncludedFile,
                ) => return Ok(Flow::Normal),
                (flow @ (Flow::Break(_) | Flow::Continue(_)), Scope::TopFile) => {
                    warn!("Unsatisfied {} at line {}", flow, token.line);
                    let text = self.session.message("flow.unsatisfied", &[&flow.to_string()]);
                    self.session.warn(&text);
                }
                (flow, _) => return Ok(flow),
            }
        }
    }

    /// Report and continue, or give the error back when it is fatal
    fn handle_error(&mut self, err: SqlToolError) -> SqlToolResult<()> {
        if self.session.continue_on_error || self.interactive {
            self.session.report_error(&err);
            Ok(())
        } else {
            Err(err)
        }
    }

    fn dispatch(&mut self, token: &Token) -> SqlToolResult<Flow> {
        match token.kind {
            TokenKind::Sql => {
                self.history.set_buffer(token.clone())?;
                self.history.historize();
                self.run_sql(&token.value, true)
            }
            TokenKind::Buffer => {
                let changed = self
                    .history
                    .set_buffer(Token::new(TokenKind::Sql, token.value.clone(), token.line))?;
                self.notify_buffer(changed, "buffer.stored")?;
                Ok(Flow::Normal)
            }
            TokenKind::Special => self.run_special_token(token),
            TokenKind::Pl => {
                self.history.set_buffer(token.clone())?;
                self.history.historize();
                self.run_pl(token)
            }
            TokenKind::Edit => {
                if !self.interactive {
                    return Err(SqlToolError::EditNotInteractive);
                }
                self.run_edit(&token.value)
            }
            TokenKind::Macro => self.run_macro(&token.value),
            TokenKind::Raw => {
                let changed = self
                    .history
                    .set_buffer(Token::new(TokenKind::Sql, token.value.clone(), token.line))?;
                self.notify_buffer(changed, "buffer.raw")?;
                Ok(Flow::Normal)
            }
            TokenKind::RawExec => {
                self.history
                    .set_buffer(Token::new(TokenKind::Sql, token.value.clone(), token.line))?;
                self.history.historize();
                self.run_sql(&token.value, false)
            }
            TokenKind::SyntaxError => Err(SqlToolError::SyntaxError(token.value.clone())),
            TokenKind::Unterminated => Err(SqlToolError::Unterminated(token.value.clone())),
        }
    }

    fn notify_buffer(&mut self, changed: bool, key: &str) -> SqlToolResult<()> {
        if changed {
            self.session.notify(key, &[])
        } else {
            self.session.notify("buffer.unchanged", &[])
        }
    }

    /// Execute a command recalled from the buffer, history or macro table
    fn execute_stored(&mut self, token: &Token) -> SqlToolResult<Flow> {
        match token.kind {
            TokenKind::Sql => self.run_sql(&token.value, true),
            TokenKind::Special => self.run_special(&token.value),
            TokenKind::Pl => self.run_pl(token),
            other => Err(SqlToolError::Internal(format!(
                "cannot execute a stored {} command",
                other
            ))),
        }
    }

    /// Run the body of a block in a nested interpreter
    fn run_block(&mut self, body: &[Token]) -> SqlToolResult<Flow> {
        let mut nested = SqlFile::block(&mut *self.session, body, &self.source_name);
        nested.run()
    }
}
