//! User variables and reference expansion
//!
//! `*{name}` references read the session's variable store and `${name}`
//! references read the process environment. A `:` right after the brace
//! (`*{:name}`) makes an unset variable expand to nothing instead of failing.
//! User-variable values are expanded again after substitution, so a variable
//! may refer to other variables; the nesting depth is capped so that a
//! self-referencing value fails instead of looping.

use std::collections::BTreeMap;

use crate::error::{SqlToolError, SqlToolResult};

/// Deepest chain of nested `*{}` expansions before giving up
pub const MAX_EXPANSION_DEPTH: usize = 50;

/// Name of the variable holding the last fetched scalar or update count
pub const LAST_VALUE: &str = "?";

/// Case-sensitive variable map, ordered by name for listing
#[derive(Debug, Default, Clone)]
pub struct VariableStore {
    vars: BTreeMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.vars.insert(name.to_string(), value.into());
    }

    /// Remove a variable, returning its old value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variables in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Expand all variable references in `text`
    ///
    /// With `permit_alias`, a leading `/name` is first replaced by the value
    /// of variable `name`.
    pub fn dereference(&self, text: &str, permit_alias: bool) -> SqlToolResult<String> {
        if permit_alias {
            if let Some(aliased) = self.expand_alias(text)? {
                return self.expand(&aliased, 0);
            }
        }
        self.expand(text, 0)
    }

    fn expand_alias(&self, text: &str) -> SqlToolResult<Option<String>> {
        let Some(rest) = text.strip_prefix('/') else {
            return Ok(None);
        };
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if end == 0 {
            return Ok(None);
        }
        let name = &rest[..end];
        let value = self
            .get(name)
            .ok_or_else(|| SqlToolError::UndefinedVariable(name.to_string()))?;
        Ok(Some(format!("{}{}", value, &rest[end..])))
    }

    fn expand(&self, text: &str, depth: usize) -> SqlToolResult<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(pos) = find_reference(rest) {
            out.push_str(&rest[..pos]);
            let from_env = rest.as_bytes()[pos] == b'$';
            let body = &rest[pos + 2..];
            let close = body
                .find('}')
                .ok_or_else(|| SqlToolError::UnterminatedReference(rest[pos..].to_string()))?;

            let raw_name = &body[..close];
            let (name, permit_unset) = match raw_name.strip_prefix(':') {
                Some(name) => (name, true),
                None => (raw_name, false),
            };
            if name.is_empty() {
                return Err(SqlToolError::EmptyVariableName);
            }

            if from_env {
                match std::env::var(name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) if permit_unset => {}
                    Err(_) => return Err(SqlToolError::UndefinedVariable(format!("${}", name))),
                }
            } else {
                match self.get(name) {
                    Some(value) => {
                        if depth >= MAX_EXPANSION_DEPTH {
                            return Err(SqlToolError::InfiniteExpansion(name.to_string()));
                        }
                        out.push_str(&self.expand(value, depth + 1)?);
                    }
                    None if permit_unset => {}
                    None => return Err(SqlToolError::UndefinedVariable(name.to_string())),
                }
            }
            rest = &body[close + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Offset of the next `*{` or `${`
fn find_reference(text: &str) -> Option<usize> {
    text.as_bytes()
        .windows(2)
        .position(|w| (w[0] == b'*' || w[0] == b'$') && w[1] == b'{')
}

/// Variable names may not contain ':', which marks permit-unset references
pub fn validate_name(name: &str) -> SqlToolResult<()> {
    if name.is_empty() || name.contains(':') || name.contains(char::is_whitespace) {
        return Err(SqlToolError::IllegalVariableName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(pairs: &[(&str, &str)]) -> VariableStore {
        let mut vars = VariableStore::new();
        for (k, v) in pairs {
            vars.set(k, *v);
        }
        vars
    }

    #[test]
    fn test_plain_and_nested_expansion() {
        let vars = store(&[("t", "items"), ("q", "select * from *{t}")]);
        assert_eq!(vars.dereference("*{q};", false).unwrap(), "select * from items;");
        assert_eq!(vars.dereference("no refs * { here", false).unwrap(), "no refs * { here");
    }

    #[test]
    fn test_unset_references() {
        let vars = VariableStore::new();
        assert!(matches!(
            vars.dereference("x *{nope}", false),
            Err(SqlToolError::UndefinedVariable(name)) if name == "nope"
        ));
        assert_eq!(vars.dereference("x*{:nope}y", false).unwrap(), "xy");
        assert_eq!(
            vars.dereference("${:SQLTOOL_SURELY_UNSET_VAR}", false).unwrap(),
            ""
        );
    }

    #[test]
    fn test_malformed_references() {
        let vars = VariableStore::new();
        assert!(matches!(
            vars.dereference("*{}", false),
            Err(SqlToolError::EmptyVariableName)
        ));
        assert!(matches!(
            vars.dereference("a ${HOME", false),
            Err(SqlToolError::UnterminatedReference(_))
        ));
    }

    #[test]
    fn test_self_reference_does_not_loop() {
        let vars = store(&[("a", "*{b}"), ("b", "x*{a}")]);
        assert!(matches!(
            vars.dereference("*{a}", false),
            Err(SqlToolError::InfiniteExpansion(_))
        ));

        let vars = store(&[("a", "*{a}")]);
        assert!(matches!(
            vars.dereference("*{a}", false),
            Err(SqlToolError::InfiniteExpansion(ref name)) if name == "a"
        ));
    }

    #[test]
    fn test_environment_values_are_literal() {
        std::env::set_var("SQLTOOL_TEST_ENV_REF", "*{not_expanded}");
        let vars = VariableStore::new();
        assert_eq!(
            vars.dereference("${SQLTOOL_TEST_ENV_REF}", false).unwrap(),
            "*{not_expanded}"
        );
    }

    #[test]
    fn test_alias_only_when_permitted() {
        let vars = store(&[("tab", "dt"), ("x", "1")]);
        assert_eq!(vars.dereference("/tab *{x}", true).unwrap(), "dt 1");
        assert_eq!(vars.dereference("/tab", false).unwrap(), "/tab");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("abc").is_ok());
        assert!(validate_name("*DSV_COL_DELIM").is_ok());
        assert!(validate_name("a:b").is_err());
        assert!(validate_name("").is_err());
    }
}
