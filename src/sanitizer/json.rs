//! JSON re-balancing for document and key-value stores
//!
//! The scan tracks string state (a `"` toggles it unless escaped) and a
//! stack of open brackets. Repairs are minimal:
//!
//! - a closer whose opener is buried under other openers first closes them;
//! - a closer with no opener at all gets one prepended;
//! - at the end an open string is closed, then open brackets are closed in
//!   reverse order.
//!
//! The output always nests correctly, so a second pass changes nothing.

use crate::patterns::regex_fn;

regex_fn!(fence, r"(?i)```[ \t]*(?:json5|json|javascript|js)?");

/// Coerces generator output into balanced JSON text
pub fn sanitize_json(raw: &str) -> String {
    let unfenced = match fence() {
        Some(re) => re.replace_all(raw, "").into_owned(),
        None => raw.to_string(),
    };
    let start = unfenced.find(|c: char| c == '{' || c == '[').unwrap_or(0);
    rebalance(unfenced[start..].trim())
}

fn closer_for(opener: char) -> char {
    if opener == '{' {
        '}'
    } else {
        ']'
    }
}

fn opener_for(closer: char) -> char {
    if closer == '}' {
        '{'
    } else {
        '['
    }
}

fn rebalance(text: &str) -> String {
    let mut prefix: Vec<char> = Vec::new();
    let mut out = String::with_capacity(text.len() + 4);
    let mut stack: Vec<char> = Vec::new();
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
            out.push(c);
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' | '[' => stack.push(c),
            '}' | ']' => {
                let opener = opener_for(c);
                match stack.iter().rposition(|&o| o == opener) {
                    Some(pos) => {
                        while stack.len() > pos + 1 {
                            if let Some(inner) = stack.pop() {
                                out.push(closer_for(inner));
                            }
                        }
                        stack.pop();
                    }
                    None => {
                        // Everything still open sits inside the prepended opener.
                        prefix.push(opener);
                        while let Some(inner) = stack.pop() {
                            out.push(closer_for(inner));
                        }
                    }
                }
            }
            _ => {}
        }
        out.push(c);
    }

    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }
    while let Some(opener) = stack.pop() {
        out.push(closer_for(opener));
    }

    let mut balanced: String = prefix.iter().rev().collect();
    balanced.push_str(&out);
    balanced
}
