//! User-facing message catalog
//!
//! Notices printed by the interpreter (row counts, mode changes, import
//! summaries, help text) are looked up by key through a `MessageProvider`, so
//! a front end can supply its own wording or language. Templates use `%1`,
//! `%2`, ... for positional arguments.

use std::collections::HashMap;

/// Source of formatted user-facing messages
pub trait MessageProvider {
    /// Format the message `key` with positional `args`
    fn format(&self, key: &str, args: &[&str]) -> String;
}

/// The built-in English catalog
pub struct Catalog {
    entries: HashMap<&'static str, &'static str>,
}

const ENTRIES: &[(&str, &str)] = &[
    ("update.one", "1 row updated"),
    ("update.many", "%1 rows updated"),
    ("rows.one", "1 row"),
    ("rows.many", "%1 rows"),
    ("result.none", "No result"),
    ("binary.stored", "%1 bytes of type %2 stored in binary buffer"),
    ("binary.dumped", "%1 bytes written to '%2'"),
    ("binary.loaded", "%1 bytes loaded from '%2'"),
    ("buffer.stored", "Statement stored in buffer. Use ':;' to execute it."),
    ("buffer.raw", "Raw chunk stored in buffer"),
    ("buffer.unchanged", "Buffer unchanged"),
    ("buffer.written", "Command appended to '%1'"),
    ("buffer.show", "Buffer: %1"),
    ("substitute.nomatch", "Substitution matched nothing; buffer unchanged"),
    ("html.status", "HTML mode %1"),
    ("timing.status", "Execution time reporting %1"),
    ("timing.elapsed", "Execution time: %1 ms"),
    ("autocommit.status", "Autocommit is %1"),
    ("isolation.status", "Transaction isolation is %1"),
    ("continue.status", "Continue-on-error is %1"),
    ("commit.done", "Committed"),
    ("output.opened", "Output teed to '%1'"),
    ("output.closed", "Output tee closed"),
    ("macro.defined", "Macro '%1' defined"),
    ("macro.loaded", "Macro loaded into buffer: %1"),
    ("macro.none", "No macros defined"),
    ("pl.enabled", "PL variable expansion enabled"),
    ("vars.none", "No variables set"),
    ("var.dumped", "Variable '%1' written to '%2'"),
    ("var.loaded", "Variable '%1' loaded from '%2'"),
    ("rollback.done", "Rolled back uncommitted changes"),
    ("rollback.failed", "Rollback failed: %1"),
    ("flow.unsatisfied", "'%1' is not inside a matching block; ignored"),
    ("history.empty", "History is empty"),
    ("shell.status", "Command exited with status %1"),
    ("dsv.exported", "%1 rows exported to '%2'"),
    (
        "dsv.imported",
        "Import of '%1' into %2: %3 records read, %4 skipped, %5 rejected, %6 inserted",
    ),
    ("dsv.rejects", "%1 rejected records written to %2"),
    (
        "help.special",
        "Special commands:\n\
         \\?                  this help\n\
         \\q [message]        quit (with a message: abort and roll back)\n\
         \\H                  toggle HTML output\n\
         \\p [text]           print text\n\
         \\w file             append buffer to file\n\
         \\i file             execute a script file\n\
         \\o [file]           tee output to file / stop teeing\n\
         \\l level message    log message at level\n\
         \\a [true|false]     show/set autocommit\n\
         \\v [level]          show/set transaction isolation\n\
         \\=                  commit\n\
         \\b, \\bp             fetch next value into / bind next ? from binary buffer\n\
         \\bd file, \\bl file  dump / load binary buffer\n\
         \\t [true|false]     toggle/set execution timing\n\
         \\c [true|false]     show/set continue-on-error (also \\*)\n\
         \\! command          run an external command\n\
         \\dt \\dv \\ds \\di     list tables, views, schemas, indexes\n\
         \\d table [/regex/]  describe table\n\
         \\m file             import DSV file\n\
         \\x table|query      export DSV file\n\
         \\.                  start a raw chunk (end with '.' or '.;')",
    ),
    (
        "help.pl",
        "PL commands:\n\
         *                    enable variable expansion in SQL\n\
         *VAR = value         set variable (no value: unset)\n\
         *VAR ~  /  *VAR _    fetch next SQL result into VAR (_ = silently)\n\
         *if (expr)           ... *end if\n\
         *while (expr)        ... *end while\n\
         *foreach VAR (a b c) ... *end foreach\n\
         *break [if|while|foreach|file], *continue [while|foreach]\n\
         *list [VAR...], *listvalues [VAR...]\n\
         *dump VAR file, *load VAR file, *prepare VAR",
    ),
    (
        "help.describe",
        "Describe commands:\n\
         \\d table           columns of a table\n\
         \\d table /regex/   only rows with a cell matching regex\n\
         \\dt \\dv \\ds \\di  [filter] list tables, views, schemas, indexes",
    ),
    (
        "help.edit",
        "Buffer commands: ':' [N | -N | /regex/] followed by\n\
         (nothing)  load into buffer (':' alone lists the buffer)\n\
         ;          execute\n\
         l          list\n\
         a text     append text (trailing ';' executes)\n\
         w file     append to file\n\
         s/from/to/[i][g][;][N]  substitute\n\
         :h lists the history",
    ),
];

impl Default for Catalog {
    fn default() -> Self {
        Catalog {
            entries: ENTRIES.iter().copied().collect(),
        }
    }
}

impl MessageProvider for Catalog {
    fn format(&self, key: &str, args: &[&str]) -> String {
        match self.entries.get(key) {
            Some(template) => substitute(template, args),
            None if args.is_empty() => key.to_string(),
            None => format!("{}: {}", key, args.join(", ")),
        }
    }
}

/// Replace `%N` markers with the N-th argument
fn substitute(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            if let Some(d) = chars.peek().and_then(|d| d.to_digit(10)) {
                chars.next();
                match args.get(d as usize - 1) {
                    Some(arg) if d > 0 => out.push_str(arg),
                    _ => {
                        out.push('%');
                        out.push_str(&d.to_string());
                    }
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let catalog = Catalog::default();
        assert_eq!(catalog.format("update.many", &["3"]), "3 rows updated");
        assert_eq!(
            catalog.format("binary.stored", &["10", "BLOB"]),
            "10 bytes of type BLOB stored in binary buffer"
        );
    }

    #[test]
    fn test_unknown_key_falls_back() {
        let catalog = Catalog::default();
        assert_eq!(catalog.format("no.such.key", &[]), "no.such.key");
        assert_eq!(catalog.format("no.such.key", &["a"]), "no.such.key: a");
    }

    #[test]
    fn test_missing_argument_left_in_place() {
        assert_eq!(substitute("x %2 y", &["a"]), "x %2 y");
    }
}
