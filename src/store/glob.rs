//! Redis-style key glob matching
//!
//! Supported syntax: `*` (any run), `?` (any one char), `[abc]`, `[a-z]`,
//! `[^a]` and `\` escapes.

/// Returns true if `key` matches `pattern`.
///
/// Runs in `O(pattern * key)`: on a mismatch only the most recent `*` is
/// extended by one character.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let tokens = tokenize(&pattern);
    let key: Vec<char> = key.chars().collect();

    let (mut t, mut k) = (0, 0);
    // Token index of the last star and the key position it currently ends at
    let mut star: Option<(usize, usize)> = None;
    while k < key.len() {
        match tokens.get(t) {
            Some(Token::Star) => {
                star = Some((t, k));
                t += 1;
                continue;
            }
            Some(token) if token.matches(key[k]) => {
                t += 1;
                k += 1;
                continue;
            }
            _ => {}
        }
        let Some((star_at, end)) = star else {
            return false;
        };
        star = Some((star_at, end + 1));
        t = star_at + 1;
        k = end + 1;
    }
    tokens[t..].iter().all(|token| matches!(token, Token::Star))
}

/// Returns true if `pattern` contains an unescaped glob metacharacter
pub fn has_wildcard(pattern: &str) -> bool {
    let mut escaped = false;
    for c in pattern.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '*' | '?' | '[' => return true,
            _ => {}
        }
    }
    false
}

enum Token {
    Star,
    Any,
    Literal(char),
    Class(CharClass),
}

impl Token {
    /// Single-character match; stars are handled by the caller
    fn matches(&self, c: char) -> bool {
        match self {
            Token::Star => false,
            Token::Any => true,
            Token::Literal(l) => *l == c,
            Token::Class(class) => class.contains(c),
        }
    }
}

struct CharClass {
    negated: bool,
    singles: Vec<char>,
    ranges: Vec<(char, char)>,
}

impl CharClass {
    fn contains(&self, c: char) -> bool {
        let hit = self.singles.contains(&c)
            || self.ranges.iter().any(|&(lo, hi)| c >= lo && c <= hi);
        hit != self.negated
    }
}

fn tokenize(pattern: &[char]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut i = 0;
    while i < pattern.len() {
        match pattern[i] {
            '*' => {
                if !matches!(tokens.last(), Some(Token::Star)) {
                    tokens.push(Token::Star);
                }
                i += 1;
            }
            '?' => {
                tokens.push(Token::Any);
                i += 1;
            }
            '[' => match parse_class(&pattern[i + 1..]) {
                Some((class, consumed)) => {
                    tokens.push(Token::Class(class));
                    i += consumed + 2;
                }
                // Unterminated class: treat '[' literally.
                None => {
                    tokens.push(Token::Literal('['));
                    i += 1;
                }
            },
            '\\' if i + 1 < pattern.len() => {
                tokens.push(Token::Literal(pattern[i + 1]));
                i += 2;
            }
            literal => {
                tokens.push(Token::Literal(literal));
                i += 1;
            }
        }
    }
    tokens
}

/// Parses a character class body (after `[`), returning the class and the
/// length of the body before the closing `]`.
fn parse_class(body: &[char]) -> Option<(CharClass, usize)> {
    let close = body.iter().position(|&c| c == ']')?;
    let class = &body[..close];

    let (negated, class) = match class.split_first() {
        Some(('^', rest)) => (true, rest),
        _ => (false, class),
    };

    let mut singles = Vec::new();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < class.len() {
        if i + 2 < class.len() && class[i + 1] == '-' {
            let (lo, hi) = if class[i] <= class[i + 2] {
                (class[i], class[i + 2])
            } else {
                (class[i + 2], class[i])
            };
            ranges.push((lo, hi));
            i += 3;
        } else {
            singles.push(class[i]);
            i += 1;
        }
    }

    Some((
        CharClass {
            negated,
            singles,
            ranges,
        },
        close,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star() {
        assert!(glob_match("order:*", "order:1"));
        assert!(glob_match("order:*", "order:"));
        assert!(!glob_match("order:*", "customer:1"));
        assert!(glob_match("*:*", "product:12"));
        assert!(!glob_match("*:*", "plainkey"));
        assert!(glob_match("**", ""));
    }

    #[test]
    fn test_question_mark_and_classes() {
        assert!(glob_match("order:?", "order:7"));
        assert!(!glob_match("order:?", "order:17"));
        assert!(glob_match("order:[12]", "order:2"));
        assert!(!glob_match("order:[12]", "order:3"));
        assert!(glob_match("order:[0-9]", "order:5"));
        assert!(glob_match("order:[^1]", "order:2"));
        assert!(!glob_match("order:[^1]", "order:1"));
    }

    #[test]
    fn test_exact_and_escape() {
        assert!(glob_match("customer:1", "customer:1"));
        assert!(!glob_match("customer:1", "customer:10"));
        assert!(glob_match(r"a\*b", "a*b"));
        assert!(!glob_match(r"a\*b", "axb"));
    }

    #[test]
    fn test_unterminated_class_is_literal() {
        assert!(glob_match("order:[1", "order:[1"));
        assert!(!glob_match("order:[1", "order:1"));
    }

    #[test]
    fn test_many_stars_against_long_key() {
        let pattern = format!("{}b", "*a".repeat(20));
        let key = "a".repeat(500);
        assert!(!glob_match(&pattern, &key));
        assert!(glob_match(&pattern, &format!("{}b", key)));
        assert!(glob_match("*:*:*", "a:b:c"));
        assert!(!glob_match("*:*:*", "a:b"));
    }

    #[test]
    fn test_has_wildcard() {
        assert!(has_wildcard("order:*"));
        assert!(has_wildcard("order:?"));
        assert!(has_wildcard("order:[1-3]"));
        assert!(!has_wildcard("customer:7"));
        assert!(!has_wildcard(r"odd\*key"));
    }
}
