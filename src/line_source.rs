//! Physical line input for the lexer
//!
//! The lexer pulls one line at a time from a `LineSource` and tells it which
//! kind of prompt applies. Scripts, stdin and in-memory text use
//! `ReaderSource`; an interactive terminal uses `ConsoleSource`, a rustyline
//! editor with completion of command prefixes.

use std::borrow::Cow;
use std::io::{BufRead, BufReader, Cursor, Read};

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{self, Validator};
use rustyline::{Config, Context, Editor, Helper};

use crate::error::SqlToolResult;

/// Which prompt the lexer wants shown for the next line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Start of a new command
    Primary,
    /// Continuation of an SQL statement
    Continuation,
    /// Inside a `\.` raw chunk
    Raw,
}

impl Prompt {
    fn text(self) -> &'static str {
        match self {
            Prompt::Primary => "sql> ",
            Prompt::Continuation => "  +> ",
            Prompt::Raw => "raw> ",
        }
    }
}

/// Supplier of physical input lines
pub trait LineSource {
    /// Next line without its terminator, or `None` at end of input
    fn next_line(&mut self, prompt: Prompt) -> SqlToolResult<Option<String>>;
}

/// Line source over any buffered reader; prompts are ignored
pub struct ReaderSource<R: BufRead> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource { reader }
    }
}

impl ReaderSource<Cursor<Vec<u8>>> {
    /// Line source over in-memory text
    pub fn from_text(text: &str) -> Self {
        ReaderSource::new(Cursor::new(text.as_bytes().to_vec()))
    }
}

impl<R: Read> ReaderSource<BufReader<R>> {
    /// Line source over an unbuffered reader such as a file or stdin
    pub fn buffered(reader: R) -> Self {
        ReaderSource::new(BufReader::new(reader))
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self, _prompt: Prompt) -> SqlToolResult<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// Completer for special, PL and buffer command prefixes
#[derive(Default)]
struct CommandCompleter {
    commands: Vec<String>,
}

impl CommandCompleter {
    fn new() -> Self {
        let commands = [
            "\\?", "\\q", "\\H", "\\p", "\\w", "\\i", "\\o", "\\l", "\\a", "\\v", "\\=", "\\b",
            "\\bp", "\\bd", "\\bl", "\\t", "\\c", "\\!", "\\dt", "\\dv", "\\ds", "\\di", "\\d",
            "\\m", "\\x", "\\.", "*?", "*if", "*while", "*foreach", "*end", "*break",
            "*continue", "*list", "*listvalues", "*dump", "*load", "*prepare", ":?", ":h",
        ]
        .into_iter()
        .map(|s| s.to_string())
        .collect();

        Self { commands }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        // Only the command word itself is completed
        let prefix = &line[..pos];
        if !prefix.starts_with(['\\', '*', ':']) || prefix.contains(char::is_whitespace) {
            return Ok((pos, vec![]));
        }

        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for CommandCompleter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        false
    }
}

impl Validator for CommandCompleter {
    fn validate(
        &self,
        _ctx: &mut validate::ValidationContext,
    ) -> rustyline::Result<validate::ValidationResult> {
        Ok(validate::ValidationResult::Valid(None))
    }
}

impl Helper for CommandCompleter {}

/// Interactive terminal input with line editing
pub struct ConsoleSource {
    editor: Editor<CommandCompleter, DefaultHistory>,
}

impl ConsoleSource {
    pub fn new() -> SqlToolResult<Self> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .auto_add_history(false)
            .build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(CommandCompleter::new()));
        Ok(ConsoleSource { editor })
    }
}

impl LineSource for ConsoleSource {
    fn next_line(&mut self, prompt: Prompt) -> SqlToolResult<Option<String>> {
        match self.editor.readline(prompt.text()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
