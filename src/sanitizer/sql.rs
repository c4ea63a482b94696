//! Statement sanitizing for relational stores

use crate::patterns::regex_fn;

regex_fn!(fence, r"(?i)```[ \t]*(?:sqlite|postgresql|postgres|sql)?");
regex_fn!(language_token, r"(?i)^\s*sql\s+");
regex_fn!(
    leading_prose,
    r"(?is)^.*?\b(SELECT|INSERT|UPDATE|DELETE|CREATE|ALTER|DROP)\b"
);

/// Coerces generator output into one statement ending in exactly one `;`
pub fn sanitize_statement(raw: &str) -> String {
    let mut text = match fence() {
        Some(re) => re.replace_all(raw, "").into_owned(),
        None => raw.to_string(),
    };
    if let Some(re) = language_token() {
        text = re.replace(&text, "").into_owned();
    }
    if let Some(re) = leading_prose() {
        text = re.replace(&text, "$1").into_owned();
    }

    let statement = first_statement(text.trim());
    let body = statement.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    format!("{};", body)
}

/// Cuts the text after the first `;` outside a quoted literal
fn first_statement(text: &str) -> &str {
    let mut quote: Option<char> = None;
    for (idx, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, ';') => return &text[..idx],
            (None, _) => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_statement() {
        assert_eq!(
            sanitize_statement("```sql\nSELECT * FROM customers\n```"),
            "SELECT * FROM customers;"
        );
    }

    #[test]
    fn test_prose_prefix_is_dropped() {
        assert_eq!(
            sanitize_statement("Here is the query: select name FROM products;;"),
            "select name FROM products;"
        );
        assert_eq!(
            sanitize_statement("sql SELECT 1"),
            "SELECT 1;"
        );
    }

    #[test]
    fn test_trailing_prose_is_cut() {
        assert_eq!(
            sanitize_statement("SELECT * FROM orders; This returns all orders."),
            "SELECT * FROM orders;"
        );
    }

    #[test]
    fn test_semicolon_inside_literal_is_kept() {
        assert_eq!(
            sanitize_statement("SELECT * FROM t WHERE note = 'a;b'"),
            "SELECT * FROM t WHERE note = 'a;b';"
        );
    }

    #[test]
    fn test_idempotent() {
        let once = sanitize_statement("```\nThe answer:\nDELETE FROM logs WHERE id = 3 ;  \n```");
        assert_eq!(once, "DELETE FROM logs WHERE id = 3;");
        assert_eq!(sanitize_statement(&once), once);
    }
}
