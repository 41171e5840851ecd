//! Parsers for the non-SQL command families
//!
//! Each submodule turns the text of one command token into a typed command
//! value. Parsing never touches session state; the interpreter in `sqlfile`
//! executes the parsed commands.

pub mod edit;
pub mod pl;
pub mod special;

/// Parse a boolean command argument
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Split off the first whitespace-delimited word
pub fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.find(char::is_whitespace) {
        Some(pos) => (&text[..pos], text[pos..].trim()),
        None => (text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_split_word() {
        assert_eq!(split_word("  d  my_table /x/ "), ("d", "my_table /x/"));
        assert_eq!(split_word("q"), ("q", ""));
    }
}
