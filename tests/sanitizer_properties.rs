//! Sanitizer property tests
//!
//! Generated queries arrive wrapped in prose and fences, truncated, or
//! both. These properties must hold for any input.

use proptest::prelude::*;

use polyquery::sanitizer::{sanitize_json, sanitize_statement};

/// Returns the bracket depth after scanning `text`, or `None` if a closer
/// ever appears without its opener. Brackets inside strings are ignored.
fn bracket_depth(text: &str) -> Option<Vec<char>> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => stack.push(c),
            '}' => {
                if stack.pop() != Some('{') {
                    return None;
                }
            }
            ']' => {
                if stack.pop() != Some('[') {
                    return None;
                }
            }
            _ => {}
        }
    }
    if in_string {
        return None;
    }
    Some(stack)
}

fn json_fragment() -> impl Strategy<Value = String> {
    // No backticks: fence removal is covered by example tests
    proptest::string::string_regex(r#"[a-z0-9 :,{}\[\]"*]{0,40}"#).unwrap()
}

fn sql_fragment() -> impl Strategy<Value = String> {
    proptest::string::string_regex(r"[a-zA-Z0-9 *=<>',;]{0,40}").unwrap()
}

fn prose_prefix() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["", "Here is the query:", "Sure, ", "sql ", "The answer is\n"])
}

// =============================================================================
// JSON
// =============================================================================

proptest! {
    #[test]
    fn test_json_output_is_balanced(raw in json_fragment()) {
        let clean = sanitize_json(&raw);
        let stack = bracket_depth(&clean);
        prop_assert_eq!(stack, Some(Vec::new()), "unbalanced output {:?} from {:?}", clean, raw);
    }

    #[test]
    fn test_json_is_idempotent(raw in json_fragment()) {
        let once = sanitize_json(&raw);
        prop_assert_eq!(sanitize_json(&once), once);
    }

    #[test]
    fn test_json_prose_prefix_dropped(body in r#"[a-z0-9:"]{0,12}"#) {
        let raw = format!("Here is the query: {{\"key\": \"{}\"", body);
        let clean = sanitize_json(&raw);
        prop_assert!(clean.starts_with('{'), "{:?}", clean);
    }
}

// =============================================================================
// SQL
// =============================================================================

proptest! {
    #[test]
    fn test_statement_keyword_and_single_terminator(prefix in prose_prefix(), tail in sql_fragment()) {
        let raw = format!("{} select {}", prefix, tail);
        let clean = sanitize_statement(&raw);

        prop_assert!(clean.to_uppercase().starts_with("SELECT"), "{:?}", clean);
        prop_assert!(clean.ends_with(';'));
        prop_assert!(!clean[..clean.len() - 1].trim_end().ends_with(';'));
    }

    #[test]
    fn test_statement_is_idempotent(tail in sql_fragment()) {
        let once = sanitize_statement(&format!("SELECT {}", tail));
        prop_assert_eq!(sanitize_statement(&once), once);
    }
}

// =============================================================================
// EXAMPLES
// =============================================================================

#[test]
fn test_fenced_statement() {
    let raw = "```sql\nSELECT * FROM customers WHERE city = 'London'\n```";
    assert_eq!(sanitize_statement(raw), "SELECT * FROM customers WHERE city = 'London';");
}

#[test]
fn test_fenced_truncated_json() {
    let raw = "```json\n{\"key\": \"order:*\", \"price_condition\": {\"gt\": 100\n```";
    assert_eq!(sanitize_json(raw), "{\"key\": \"order:*\", \"price_condition\": {\"gt\": 100}}");
}
