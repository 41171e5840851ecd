//! Special (`\`) command parsing

use tracing::Level;

use super::{parse_bool, split_word};
use crate::connection::Isolation;
use crate::error::{SqlToolError, SqlToolResult};

/// Metadata listings of `\dt`, `\dv`, `\ds` and `\di`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Tables,
    Views,
    Schemas,
    Indexes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpecialCommand {
    Help,
    /// Quit; a message turns the quit into an abort
    Quit(Option<String>),
    ToggleHtml,
    Print(String),
    WriteBuffer(String),
    Include(String),
    /// Open a tee file, or close it when `None`
    Output(Option<String>),
    Log { level: Level, message: String },
    AutoCommit(Option<bool>),
    Isolation(Option<Isolation>),
    Commit,
    BinaryFetch,
    BinaryPrepare,
    BinaryDump(String),
    BinaryLoad(String),
    Timing(Option<bool>),
    ContinueOnError(Option<bool>),
    Shell(String),
    List { listing: Listing, filter: Option<String> },
    Describe { table: String, filter: Option<String> },
    DescribeHelp,
    Import(String),
    Export(String),
}

fn bad(command: &str, reason: &str) -> SqlToolError {
    SqlToolError::BadSpecialCommand {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

fn no_args(command: &str, args: &str, parsed: SpecialCommand) -> SqlToolResult<SpecialCommand> {
    if args.is_empty() {
        Ok(parsed)
    } else {
        Err(bad(command, "takes no arguments"))
    }
}

fn required(command: &str, args: &str, what: &str) -> SqlToolResult<String> {
    if args.is_empty() {
        Err(bad(command, &format!("requires {}", what)))
    } else {
        Ok(args.to_string())
    }
}

fn optional(args: &str) -> Option<String> {
    (!args.is_empty()).then(|| args.to_string())
}

fn optional_bool(command: &str, args: &str) -> SqlToolResult<Option<bool>> {
    if args.is_empty() {
        return Ok(None);
    }
    parse_bool(args)
        .map(Some)
        .ok_or_else(|| bad(command, "expected true or false"))
}

/// Parse the text of a special command (without its leading `\`)
pub fn parse(text: &str) -> SqlToolResult<SpecialCommand> {
    let text = text.trim();
    if let Some(command) = text.strip_prefix('!') {
        return Ok(SpecialCommand::Shell(required("!", command.trim(), "a command")?));
    }

    let (word, args) = split_word(text);
    let parsed = match word {
        "?" => no_args(word, args, SpecialCommand::Help)?,
        "q" => SpecialCommand::Quit(optional(args)),
        "H" => no_args(word, args, SpecialCommand::ToggleHtml)?,
        "p" => SpecialCommand::Print(args.to_string()),
        "w" => SpecialCommand::WriteBuffer(required(word, args, "a file path")?),
        "i" => SpecialCommand::Include(required(word, args, "a file path")?),
        "o" => SpecialCommand::Output(optional(args)),
        "l" => {
            let (level, message) = split_word(args);
            let level = level
                .parse::<Level>()
                .map_err(|_| bad(word, "expected level error, warn, info, debug or trace"))?;
            SpecialCommand::Log {
                level,
                message: required(word, message, "a message")?,
            }
        }
        "a" => SpecialCommand::AutoCommit(optional_bool(word, args)?),
        "v" => SpecialCommand::Isolation(match args {
            "" => None,
            level => Some(level.parse()?),
        }),
        "=" => no_args(word, args, SpecialCommand::Commit)?,
        "b" => no_args(word, args, SpecialCommand::BinaryFetch)?,
        "bp" => no_args(word, args, SpecialCommand::BinaryPrepare)?,
        "bd" => SpecialCommand::BinaryDump(required(word, args, "a file path")?),
        "bl" => SpecialCommand::BinaryLoad(required(word, args, "a file path")?),
        "t" => SpecialCommand::Timing(optional_bool(word, args)?),
        "c" | "*" => SpecialCommand::ContinueOnError(optional_bool(word, args)?),
        "dt" => listing(Listing::Tables, args),
        "dv" => listing(Listing::Views, args),
        "ds" => listing(Listing::Schemas, args),
        "di" => listing(Listing::Indexes, args),
        "d?" => no_args(word, args, SpecialCommand::DescribeHelp)?,
        "d" => {
            let (table, rest) = split_word(args);
            if table.is_empty() {
                return Err(bad(word, "requires a table name"));
            }
            let filter = match rest {
                "" => None,
                re if re.len() >= 2 && re.starts_with('/') && re.ends_with('/') => {
                    Some(re[1..re.len() - 1].to_string())
                }
                _ => return Err(bad(word, "expected /regex/ after the table name")),
            };
            SpecialCommand::Describe {
                table: table.to_string(),
                filter,
            }
        }
        "m" => SpecialCommand::Import(required(word, args, "a file path")?),
        "x" => SpecialCommand::Export(required(word, args, "a table name or query")?),
        other => return Err(SqlToolError::UnknownSpecialCommand(other.to_string())),
    };
    Ok(parsed)
}

fn listing(listing: Listing, args: &str) -> SpecialCommand {
    SpecialCommand::List {
        listing,
        filter: optional(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("?").unwrap(), SpecialCommand::Help);
        assert_eq!(parse("q").unwrap(), SpecialCommand::Quit(None));
        assert_eq!(
            parse("q bad input").unwrap(),
            SpecialCommand::Quit(Some("bad input".to_string()))
        );
        assert_eq!(parse("a false").unwrap(), SpecialCommand::AutoCommit(Some(false)));
        assert_eq!(parse("*").unwrap(), SpecialCommand::ContinueOnError(None));
        assert_eq!(
            parse("!echo hi").unwrap(),
            SpecialCommand::Shell("echo hi".to_string())
        );
        assert_eq!(
            parse("v read committed").unwrap(),
            SpecialCommand::Isolation(Some(Isolation::ReadCommitted))
        );
    }

    #[test]
    fn test_extra_arguments_rejected() {
        assert!(matches!(
            parse("H now"),
            Err(SqlToolError::BadSpecialCommand { .. })
        ));
        assert!(parse("= x").is_err());
        assert!(parse("a sometimes").is_err());
        assert!(parse("i").is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            parse("zz"),
            Err(SqlToolError::UnknownSpecialCommand(name)) if name == "zz"
        ));
    }

    #[test]
    fn test_metadata_commands() {
        assert_eq!(
            parse("dt item%").unwrap(),
            SpecialCommand::List {
                listing: Listing::Tables,
                filter: Some("item%".to_string())
            }
        );
        assert_eq!(
            parse("d items /name/").unwrap(),
            SpecialCommand::Describe {
                table: "items".to_string(),
                filter: Some("name".to_string())
            }
        );
        assert!(parse("d items name").is_err());
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(
            parse("l warn disk is full").unwrap(),
            SpecialCommand::Log {
                level: Level::WARN,
                message: "disk is full".to_string()
            }
        );
        assert!(parse("l loud x").is_err());
    }
}
