//! Buffer (`:`) command parsing and substitution

use regex::RegexBuilder;

use crate::error::{SqlToolError, SqlToolResult};

/// Which stored command an edit command operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Buffer,
    Absolute(usize),
    /// Counted back from the newest history entry, 1 = newest
    Relative(usize),
    /// Newest history entry matching a regex
    Search(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    /// List the buffer, or load another target into it
    Default,
    Execute,
    List,
    Append(String),
    Write(String),
    Substitute(Substitution),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Help,
    ListHistory,
    Apply { target: EditTarget, action: EditAction },
}

/// A parsed `s<d>from<d>to<d>flags` action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub from: String,
    pub to: String,
    pub case_insensitive: bool,
    pub global: bool,
    pub execute: bool,
    /// Restrict to this 1-based line of the command
    pub line: Option<usize>,
}

fn bad(command: &str, reason: &str) -> SqlToolError {
    SqlToolError::BadEditCommand {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse the text of an edit command (without its leading `:`)
pub fn parse(text: &str) -> SqlToolResult<EditCommand> {
    match text.trim() {
        "?" => return Ok(EditCommand::Help),
        "h" => return Ok(EditCommand::ListHistory),
        _ => {}
    }

    let (target, rest) = parse_target(text)?;
    let action = match rest.chars().next() {
        None => EditAction::Default,
        Some(';') if rest.trim() == ";" => EditAction::Execute,
        Some('l') if rest.trim() == "l" => EditAction::List,
        Some('a') => EditAction::Append(rest[1..].to_string()),
        Some('w') => {
            let file = rest[1..].trim();
            if file.is_empty() {
                return Err(bad(text, "'w' requires a file path"));
            }
            EditAction::Write(file.to_string())
        }
        Some('s') => EditAction::Substitute(parse_substitution(text, &rest[1..])?),
        Some(_) if rest.trim().is_empty() => EditAction::Default,
        Some(_) => return Err(bad(text, "unknown buffer action")),
    };
    Ok(EditCommand::Apply { target, action })
}

fn parse_target(text: &str) -> SqlToolResult<(EditTarget, &str)> {
    let digits_end = |s: &str| s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());

    if let Some(rest) = text.strip_prefix('-') {
        let end = digits_end(rest);
        let n = rest[..end]
            .parse::<usize>()
            .map_err(|_| bad(text, "expected a history offset after '-'"))?;
        return Ok((EditTarget::Relative(n), &rest[end..]));
    }
    if text.starts_with(|c: char| c.is_ascii_digit()) {
        let end = digits_end(text);
        let n = text[..end]
            .parse::<usize>()
            .map_err(|_| bad(text, "history index too large"))?;
        return Ok((EditTarget::Absolute(n), &text[end..]));
    }
    if let Some(rest) = text.strip_prefix('/') {
        let end = rest
            .find('/')
            .ok_or_else(|| bad(text, "unterminated /regex/"))?;
        return Ok((EditTarget::Search(rest[..end].to_string()), &rest[end + 1..]));
    }
    Ok((EditTarget::Buffer, text))
}

fn parse_substitution(text: &str, body: &str) -> SqlToolResult<Substitution> {
    let delimiter = body
        .chars()
        .next()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .ok_or_else(|| bad(text, "substitution needs a delimiter such as '/'"))?;

    let parts: Vec<&str> = body[delimiter.len_utf8()..].split(delimiter).collect();
    let (from, to, flags) = match parts.as_slice() {
        [from, to, flags] => (*from, *to, *flags),
        [_, _, _, ..] => return Err(bad(text, "too many delimiters")),
        _ => return Err(bad(text, "expected s/from/to/[flags]")),
    };
    if from.is_empty() {
        return Err(bad(text, "empty search pattern"));
    }

    let mut sub = Substitution {
        from: from.to_string(),
        to: to.to_string(),
        case_insensitive: false,
        global: false,
        execute: false,
        line: None,
    };
    let mut line = String::new();
    for c in flags.trim().chars() {
        match c {
            'i' => sub.case_insensitive = true,
            'g' => sub.global = true,
            ';' => sub.execute = true,
            d if d.is_ascii_digit() => line.push(d),
            _ => return Err(bad(text, &format!("unknown substitution flag '{}'", c))),
        }
    }
    if !line.is_empty() {
        sub.line = match line.parse::<usize>() {
            Ok(n) if n > 0 => Some(n),
            _ => return Err(bad(text, "line numbers start at 1")),
        };
    }
    Ok(sub)
}

impl Substitution {
    /// Apply to `text`; `None` when nothing changed
    pub fn apply(&self, text: &str) -> SqlToolResult<Option<String>> {
        let re = RegexBuilder::new(&self.from)
            .case_insensitive(self.case_insensitive)
            .build()?;
        let replace = |s: &str| -> String {
            if self.global {
                re.replace_all(s, self.to.as_str()).into_owned()
            } else {
                re.replace(s, self.to.as_str()).into_owned()
            }
        };

        let result = match self.line {
            None => replace(text),
            Some(n) => {
                let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
                if n > lines.len() {
                    return Err(SqlToolError::SubstituteLine {
                        line: n,
                        available: lines.len(),
                    });
                }
                lines[n - 1] = replace(&lines[n - 1]);
                lines.join("\n")
            }
        };
        Ok((result != text).then_some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(text: &str) -> EditCommand {
        parse(text).unwrap()
    }

    #[test]
    fn test_targets_and_actions() {
        assert_eq!(
            apply(""),
            EditCommand::Apply {
                target: EditTarget::Buffer,
                action: EditAction::Default
            }
        );
        assert_eq!(
            apply("-2;"),
            EditCommand::Apply {
                target: EditTarget::Relative(2),
                action: EditAction::Execute
            }
        );
        assert_eq!(
            apply("12l"),
            EditCommand::Apply {
                target: EditTarget::Absolute(12),
                action: EditAction::List
            }
        );
        assert_eq!(
            apply("/from t/"),
            EditCommand::Apply {
                target: EditTarget::Search("from t".to_string()),
                action: EditAction::Default
            }
        );
        assert_eq!(
            apply("a where x = 1;"),
            EditCommand::Apply {
                target: EditTarget::Buffer,
                action: EditAction::Append(" where x = 1;".to_string())
            }
        );
        assert_eq!(apply("?"), EditCommand::Help);
        assert_eq!(apply("h"), EditCommand::ListHistory);
        assert!(parse("z").is_err());
    }

    #[test]
    fn test_substitution_parsing() {
        let EditCommand::Apply {
            action: EditAction::Substitute(sub),
            ..
        } = apply("s#a#b#ig;2")
        else {
            panic!("expected substitution");
        };
        assert_eq!(sub.from, "a");
        assert!(sub.case_insensitive && sub.global && sub.execute);
        assert_eq!(sub.line, Some(2));

        assert!(parse("s/a/b/c/").is_err());
        assert!(parse("s/a/b").is_err());
        assert!(parse("s//b/").is_err());
    }

    fn sub(from: &str, to: &str) -> Substitution {
        Substitution {
            from: from.to_string(),
            to: to.to_string(),
            case_insensitive: false,
            global: false,
            execute: false,
            line: None,
        }
    }

    #[test]
    fn test_substitution_apply() {
        let s = sub("o", "0");
        assert_eq!(s.apply("foo").unwrap(), Some("f0o".to_string()));
        let global = Substitution { global: true, ..sub("o", "0") };
        assert_eq!(global.apply("foo").unwrap(), Some("f00".to_string()));
        assert_eq!(sub("x", "y").apply("foo").unwrap(), None);

        let on_line = Substitution { line: Some(2), ..sub("a", "b") };
        assert_eq!(on_line.apply("a\na").unwrap(), Some("a\nb".to_string()));
        assert!(matches!(
            Substitution { line: Some(3), ..sub("a", "b") }.apply("a\na"),
            Err(SqlToolError::SubstituteLine { line: 3, available: 2 })
        ));
    }
}
