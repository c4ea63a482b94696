//! Lazily compiled regular expressions

use std::sync::OnceLock;

use regex::Regex;

/// Compiles `pattern` once into `cell`.
///
/// Patterns are literals in this crate; an invalid one yields `None` and the
/// calling rule simply does not fire.
pub(crate) fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Declares a function returning a cached regex
macro_rules! regex_fn {
    ($name:ident, $pattern:expr) => {
        fn $name() -> Option<&'static regex::Regex> {
            static CELL: std::sync::OnceLock<Option<regex::Regex>> = std::sync::OnceLock::new();
            $crate::patterns::cached(&CELL, $pattern)
        }
    };
}

pub(crate) use regex_fn;

#[cfg(test)]
mod tests {
    use super::*;

    regex_fn!(digits, r"\d+");
    regex_fn!(broken, r"(unclosed");

    #[test]
    fn test_cached_regex() {
        assert!(digits().is_some_and(|re| re.is_match("abc 42")));
        assert!(std::ptr::eq(digits().unwrap(), digits().unwrap()));
    }

    #[test]
    fn test_invalid_pattern_is_none() {
        assert!(broken().is_none());
    }
}
