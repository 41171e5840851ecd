//! Error handling for sqltool
//!
//! This module defines the error type shared by the scanner, the variable
//! engine, the command dispatchers and the DSV engine. Every failure a script
//! can provoke is a variant here; control flow (quit, break, continue) is not
//! an error and travels separately as a `Flow` value.
//!
//! The module uses thiserror to minimize boilerplate code and create
//! a consistent error handling approach throughout the codebase.

use thiserror::Error;

/// SqlToolError represents all possible errors that can occur in sqltool
///
/// This enum covers failures raised during:
/// - Reading input and writing output files
/// - Tokenizing and parsing special, PL and buffer commands
/// - Variable dereferencing
/// - SQL execution against the connection
/// - DSV import and export
///
/// Errors raised while executing a command are wrapped in `Located` so the
/// report carries the source name, line and command text.
#[derive(Error, Debug)]
pub enum SqlToolError {
    /// Error during file system operations (reading/writing files)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reported by the database driver
    #[error("SQL error: {0}")]
    SqlError(#[from] rusqlite::Error),

    /// Error while writing a CSV reject report
    #[error("Reject report error: {0}")]
    CsvError(#[from] csv::Error),

    /// Invalid user-supplied regular expression
    #[error("Malformed regular expression: {0}")]
    RegexError(#[from] regex::Error),

    /// The SQL tokenizer could not scan a statement
    #[error("SQL tokenizer error: {0}")]
    SqlTokenizeError(#[from] sqlparser::tokenizer::TokenizerError),

    /// Line editor failure in interactive mode
    #[error("Input error: {0}")]
    ReadlineError(#[from] rustyline::error::ReadlineError),

    /// A `*{name}` or `${name}` reference to an unset variable
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    /// Variable expansion did not converge
    #[error("Expansion of variable '{0}' does not terminate")]
    InfiniteExpansion(String),

    /// `*{}` or `${}`
    #[error("Empty variable name in reference")]
    EmptyVariableName,

    /// `*{` or `${` without a closing brace
    #[error("Unterminated variable reference: {0}")]
    UnterminatedReference(String),

    /// Variable names may not contain ':'
    #[error("Illegal variable name: {0}")]
    IllegalVariableName(String),

    /// History recall outside of the living window
    #[error("History index {index} is out of range ({range})")]
    HistoryRange { index: String, range: String },

    /// No history entry matched a recall regex
    #[error("No history entry matches /{0}/")]
    NoHistoryMatch(String),

    /// An edit command targeted an empty buffer
    #[error("Buffer is empty")]
    EmptyBuffer,

    /// A token kind that may not be stored in the buffer
    #[error("Internal error: {0}")]
    Internal(String),

    /// PL expression with an unsupported shape
    #[error("Unrecognized expression: {0}")]
    UnrecognizedExpression(String),

    /// End of input inside an if/while/foreach block
    #[error("Unterminated '{0}' block")]
    UnterminatedBlock(String),

    /// `*end X` that does not close the innermost open block
    #[error("Mismatched block end: {0}")]
    MismatchedEnd(String),

    /// Unknown leading character of a special command
    #[error("Unknown special command: \\{0}")]
    UnknownSpecialCommand(String),

    /// Malformed or wrongly-argumented special command
    #[error("Malformed special command '\\{command}': {reason}")]
    BadSpecialCommand { command: String, reason: String },

    /// Malformed PL command
    #[error("Malformed PL command '*{command}': {reason}")]
    BadPlCommand { command: String, reason: String },

    /// Malformed buffer/edit command
    #[error("Malformed buffer command ':{command}': {reason}")]
    BadEditCommand { command: String, reason: String },

    /// Substitution restricted to a line the command does not have
    #[error("Line {line} requested but the command has only {available} line(s)")]
    SubstituteLine { line: usize, available: usize },

    /// Buffer commands in a non-interactive script
    #[error("Buffer commands are only available in interactive mode")]
    EditNotInteractive,

    /// Reference to an undefined macro
    #[error("Undefined macro: {0}")]
    UndefinedMacro(String),

    /// Statement that is empty after trimming
    #[error("Empty SQL statement")]
    EmptyStatement,

    /// Prepared statement without exactly one placeholder
    #[error("Prepared statement must contain exactly one '?' placeholder, found {0}")]
    PlaceholderCount(usize),

    /// Binary buffer used before anything was stored in it
    #[error("Binary buffer is empty")]
    EmptyBinaryBuffer,

    /// Lexically malformed command
    #[error("Syntax error: {0}")]
    SyntaxError(String),

    /// End of input inside a statement or raw chunk
    #[error("Unterminated input at end of file: {0}")]
    Unterminated(String),

    /// A DSV export field would corrupt the delimited format
    #[error("Value {value:?} in column '{column}' contains a delimiter or the null token")]
    UnsafeFieldValue { column: String, value: String },

    /// Configured skip columns that the header never named
    #[error("Skip columns not present in header: {0}")]
    UnmatchedSkipColumns(String),

    /// Header with nothing but skip placeholders
    #[error("No columns to insert")]
    NoColumnsToInsert,

    /// Structural DSV problem (header, settings, target)
    #[error("DSV error: {0}")]
    DsvError(String),

    /// A rejected import record when no reject destination is configured
    #[error("Import aborted at record {line}: {reason}")]
    RejectedRecord { line: usize, reason: String },

    /// External command failure
    #[error("Command '{command}' failed: {reason}")]
    ExternalCommand { command: String, reason: String },

    /// Unsupported setting value (isolation level, delimiter, ...)
    #[error("Invalid value for {name}: {value}")]
    InvalidSetting { name: String, value: String },

    /// `\q` with a message
    #[error("Aborted: {0}")]
    Aborted(String),

    /// Failure of a command, with its source location
    #[error("Error at {source_name} line {line}: {command}")]
    Located {
        source_name: String,
        line: usize,
        command: String,
        #[source]
        source: Box<SqlToolError>,
    },

    /// Failure inside an included script
    #[error("Failed to execute included file '{path}'")]
    Include {
        path: String,
        #[source]
        source: Box<SqlToolError>,
    },
}

impl SqlToolError {
    /// Attach a source location unless the error already carries one
    pub fn located(self, source_name: &str, line: usize, command: String) -> Self {
        match self {
            located @ SqlToolError::Located { .. } => located,
            other => SqlToolError::Located {
                source_name: source_name.to_string(),
                line,
                command,
                source: Box::new(other),
            },
        }
    }

    /// Render this error followed by its cause chain, one cause per line
    pub fn chain(&self) -> String {
        let mut text = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            text.push_str("\n  caused by: ");
            text.push_str(&err.to_string());
            cause = err.source();
        }
        text
    }
}

/// Result type alias for operations that can produce a SqlToolError
pub type SqlToolResult<T> = std::result::Result<T, SqlToolError>;
