//! Guard expressions of `*if` and `*while`
//!
//! An expression is one or three whitespace-separated terms, optionally
//! negated by a leading `!`. A term written `*NAME` stands for the value of
//! variable NAME (empty when unset). One term is true unless it is empty or
//! `0`. Three terms compare two values with `==`, `!=` (also `<>`, `><`),
//! `>` or `<`; ordering compares lengths first, so numeric strings of
//! different magnitude order as numbers.

use std::cmp::Ordering;

use crate::error::{SqlToolError, SqlToolResult};
use crate::variables::VariableStore;

pub fn eval(expr: &str, vars: &VariableStore) -> SqlToolResult<bool> {
    let mut terms: Vec<&str> = expr.split_whitespace().collect();

    let mut negate = false;
    if let Some(first) = terms.first().copied() {
        if first == "!" {
            negate = true;
            terms.remove(0);
        } else if let Some(rest) = first.strip_prefix('!') {
            negate = true;
            terms[0] = rest;
        }
    }

    let value = |term: &str| -> String {
        match term.strip_prefix('*') {
            Some(name) if !name.is_empty() => vars.get(name).unwrap_or("").to_string(),
            _ => term.to_string(),
        }
    };

    let result = match terms.as_slice() {
        [single] => {
            let v = value(*single);
            !v.is_empty() && v != "0"
        }
        [left, op, right] => {
            let ordering = compare(&value(*left), &value(*right));
            match *op {
                "==" => ordering == Ordering::Equal,
                "!=" | "<>" | "><" => ordering != Ordering::Equal,
                ">" => ordering == Ordering::Greater,
                "<" => ordering == Ordering::Less,
                _ => return Err(SqlToolError::UnrecognizedExpression(expr.to_string())),
            }
        }
        _ => return Err(SqlToolError::UnrecognizedExpression(expr.to_string())),
    };

    Ok(result != negate)
}

/// Length first, then lexicographic
fn compare(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> VariableStore {
        let mut vars = VariableStore::new();
        vars.set("n", "10");
        vars.set("zero", "0");
        vars.set("empty", "");
        vars
    }

    #[test]
    fn test_single_term() {
        let vars = vars();
        assert!(eval("*n", &vars).unwrap());
        assert!(!eval("*zero", &vars).unwrap());
        assert!(!eval("*empty", &vars).unwrap());
        assert!(!eval("*unset", &vars).unwrap());
        assert!(eval("x", &vars).unwrap());
        assert!(eval("!*zero", &vars).unwrap());
        assert!(eval("! *unset", &vars).unwrap());
    }

    #[test]
    fn test_comparisons() {
        let vars = vars();
        assert!(eval("*n == 10", &vars).unwrap());
        assert!(eval("*n > 9", &vars).unwrap());
        assert!(eval("*n < 100", &vars).unwrap());
        assert!(eval("*n <> 11", &vars).unwrap());
        assert!(eval("abc >< abd", &vars).unwrap());
        assert!(!eval("*n != 10", &vars).unwrap());
        assert!(eval("!*n == 11", &vars).unwrap());
        assert!(eval("b > a", &vars).unwrap());
        assert!(!eval("ab < b", &vars).unwrap());
        assert!(eval("b < ab", &vars).unwrap());
    }

    #[test]
    fn test_unrecognized() {
        let vars = vars();
        assert!(matches!(
            eval("a b", &vars),
            Err(SqlToolError::UnrecognizedExpression(_))
        ));
        assert!(eval("a =~ b", &vars).is_err());
        assert!(eval("", &vars).is_err());
        assert!(eval("1 == 1 == 1", &vars).is_err());
    }
}
