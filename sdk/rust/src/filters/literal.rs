//! OData literal helpers
//!
//! String literals in the filter grammar are single-quoted and an embedded
//! quote is written as two quotes. This is the only escaping convention used
//! anywhere in the compiler.

use super::types::Operator;

/// Keywords lower-cased when they appear outside literals in raw fragments
const RAW_KEYWORDS: &[&str] = &[
    "and", "or", "not", "eq", "ne", "gt", "ge", "lt", "le", "null", "true", "false",
];

/// Escape embedded single quotes by doubling them
///
/// ```
/// use azure_scout::filters::escape_literal;
///
/// assert_eq!(escape_literal("O'Connor"), "O''Connor");
/// ```
pub fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Wrap a value in quotes after escaping it
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", escape_literal(s))
}

/// Parse a quoted literal back into the original string
///
/// Returns `None` when the input is not exactly one well-formed literal.
pub fn unquote_literal(s: &str) -> Option<String> {
    let inner = s.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            // A lone quote would have terminated the literal
            if chars.next_if_eq(&'\'').is_none() {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

/// Normalize a caller-authored raw fragment
///
/// Operator symbols (`=`, `==`, `!=`, `<>`, `>`, `>=`, `<`, `<=`) outside string
/// literals become grammar tokens and grammar keywords are lower-cased.
/// Literal contents are copied through untouched.
pub fn normalize_raw(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut out = String::with_capacity(expression.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            i = copy_literal(&chars, i, &mut out);
            continue;
        }

        if let Some((symbol, op)) = match_operator(&chars[i..]) {
            if !out.is_empty() && !out.ends_with(char::is_whitespace) && !out.ends_with('(') {
                out.push(' ');
            }
            out.push_str(op.token().unwrap_or_default());
            i += symbol.len();
            if i < chars.len() && !chars[i].is_whitespace() && chars[i] != ')' {
                out.push(' ');
            }
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let lower = word.to_lowercase();
            if RAW_KEYWORDS.contains(&lower.as_str()) {
                out.push_str(&lower);
            } else {
                out.push_str(&word);
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Copy a quoted literal starting at `start`; returns the index after it
fn copy_literal(chars: &[char], start: usize, out: &mut String) -> usize {
    let end = literal_end(chars, start);
    out.extend(&chars[start..end]);
    end
}

/// Index just past the literal opening at `start`; an unterminated literal
/// runs to the end of the input
fn literal_end(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}

/// Whether `expression` has an `or` outside literals and parentheses
pub(crate) fn has_top_level_or(expression: &str) -> bool {
    let chars: Vec<char> = expression.chars().collect();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' => {
                i = literal_end(&chars, i);
                continue;
            }
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if c.is_alphanumeric() || c == '_' || c == '.' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                if depth == 0 {
                    let word: String = chars[start..i].iter().collect();
                    if word.eq_ignore_ascii_case("or") {
                        return true;
                    }
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    false
}

/// Parenthesize a caller-authored fragment when a top-level `or` would
/// otherwise bind looser than the surrounding ` and ` join
pub(crate) fn enclose_disjunction(expression: String) -> String {
    if has_top_level_or(&expression) {
        format!("({})", expression)
    } else {
        expression
    }
}

fn match_operator(rest: &[char]) -> Option<(&'static str, Operator)> {
    Operator::RAW_ALIASES.iter().copied().find(|(symbol, _)| {
        symbol.chars().count() <= rest.len() && symbol.chars().zip(rest).all(|(a, b)| a == *b)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_literal_doubles_quotes() {
        assert_eq!(escape_literal("O'Connor"), "O''Connor");
        assert_eq!(escape_literal("''"), "''''");
        assert_eq!(escape_literal("plain"), "plain");
        assert_eq!(escape_literal(""), "");
    }

    #[test]
    fn test_unquote_round_trip() {
        for original in ["O'Connor", "", "'", "it''s", "a,b", "back\\slash", "ünïcödé'"] {
            let quoted = quote_literal(original);
            assert_eq!(unquote_literal(&quoted).as_deref(), Some(original));
        }
    }

    #[test]
    fn test_unquote_rejects_lone_quote() {
        assert_eq!(unquote_literal("'O'Connor'"), None);
        assert_eq!(unquote_literal("no quotes"), None);
        assert_eq!(unquote_literal("'"), None);
    }

    #[test]
    fn test_normalize_raw_passes_grammar_through() {
        assert_eq!(normalize_raw("name eq 'John'"), "name eq 'John'");
    }

    #[test]
    fn test_normalize_raw_maps_symbols() {
        assert_eq!(normalize_raw("age >= 18"), "age ge 18");
        assert_eq!(normalize_raw("age<=65"), "age le 65");
        assert_eq!(normalize_raw("status != 'x'"), "status ne 'x'");
        assert_eq!(normalize_raw("status <> 'x'"), "status ne 'x'");
        assert_eq!(normalize_raw("(a=1 or b>2)"), "(a eq 1 or b gt 2)");
    }

    #[test]
    fn test_normalize_raw_double_equals() {
        assert_eq!(normalize_raw("a == 1"), "a eq 1");
        assert_eq!(normalize_raw("a==1 and b = 2"), "a eq 1 and b eq 2");
        assert_eq!(normalize_raw("a >= 1"), "a ge 1");
    }

    #[test]
    fn test_has_top_level_or() {
        assert!(has_top_level_or("a eq 1 or b eq 2"));
        assert!(has_top_level_or("a eq 1 OR b eq 2"));
        assert!(!has_top_level_or("(a eq 1 or b eq 2)"));
        assert!(!has_top_level_or("title eq 'this or that'"));
        assert!(!has_top_level_or("name eq 'O''Brien or not'"));
        assert!(!has_top_level_or("color eq 'red' and order gt 1"));
        assert!(!has_top_level_or("vendor.or eq 1"));
        assert!(has_top_level_or("(a eq 1) or (b eq 2)"));
    }

    #[test]
    fn test_enclose_disjunction() {
        assert_eq!(
            enclose_disjunction("a eq 1 or b eq 2".to_string()),
            "(a eq 1 or b eq 2)"
        );
        assert_eq!(enclose_disjunction("name eq 'John'".to_string()), "name eq 'John'");
        assert_eq!(
            enclose_disjunction("(a eq 1 or b eq 2)".to_string()),
            "(a eq 1 or b eq 2)"
        );
    }

    #[test]
    fn test_normalize_raw_lowercases_keywords() {
        assert_eq!(
            normalize_raw("Age GT 18 AND Deleted EQ NULL"),
            "Age gt 18 and Deleted eq null"
        );
    }

    #[test]
    fn test_normalize_raw_leaves_literals_alone() {
        assert_eq!(
            normalize_raw("title = 'a >= b AND c'"),
            "title eq 'a >= b AND c'"
        );
        assert_eq!(normalize_raw("name = 'O''Brien'"), "name eq 'O''Brien'");
    }

    #[test]
    fn test_normalize_raw_keeps_identifiers_containing_keywords() {
        assert_eq!(normalize_raw("title = 'x'"), "title eq 'x'");
        assert_eq!(normalize_raw("Order gt 1"), "Order gt 1");
    }
}
