//! Query type detection and statement splitting.
//!
//! Detection is a case-insensitive substring search, not a parse: a keyword
//! inside a comment, a string literal or an identifier counts as a match.

use super::QueryType;
use regex::Regex;
use std::sync::OnceLock;

/// Keywords searched for under AUTO, highest precedence first.
const KEYWORD_PRECEDENCE: [QueryType; 5] = [
    QueryType::Select,
    QueryType::Insert,
    QueryType::Update,
    QueryType::Delete,
    QueryType::Create,
];

/// Resolves the query type of a request.
///
/// An explicit type is returned unchanged. Under AUTO the first keyword of
/// `SELECT`, `INSERT`, `UPDATE`, `DELETE`, `CREATE` found anywhere in the
/// text wins. AUTO is returned when none is found, which executes the query
/// as a raw statement.
pub fn classify(declared: QueryType, query: &str) -> QueryType {
    if declared != QueryType::Auto {
        return declared;
    }

    let upper = query.trim().to_uppercase();
    KEYWORD_PRECEDENCE
        .into_iter()
        .find(|keyword| upper.contains(keyword.as_str()))
        .unwrap_or(QueryType::Auto)
}

/// Splits query text on `;`, dropping blank fragments.
///
/// Fragments are trimmed. Semicolons inside string literals are not
/// special.
pub fn split_statements(query: &str) -> Vec<&str> {
    query
        .split(';')
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// Matches literals, quoted identifiers and comments (skipped), statement
/// separators, or the TRIGGER keyword.
fn statement_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?x)
            '(?:[^']|'')*'
            | "(?:[^"]|"")*"
            | `[^`]*`
            | \[[^\]]*\]
            | --[^\n]*
            | /\*(?s:.*?)\*/
            | ;
            | \b(?i:TRIGGER)\b
            "#,
        )
        .expect("statement token pattern is valid")
    })
}

/// Counts the statements in query text.
///
/// Unlike [`split_statements`], a `;` inside a literal, a quoted identifier,
/// a comment or a trigger body does not end a statement. A trigger ends at a
/// `;` that follows `END`. Blank and comment-only statements are not counted.
pub fn count_statements(query: &str) -> usize {
    let mut count = 0;
    let mut pending = false;
    let mut in_trigger = false;
    let mut copied = 0;

    for token in statement_token_pattern().find_iter(query) {
        let gap = &query[copied..token.start()];
        if !gap.trim().is_empty() {
            pending = true;
        }
        copied = token.end();

        match token.as_str() {
            ";" => {
                if in_trigger && !ends_with_end_keyword(gap) {
                    continue;
                }
                count += usize::from(pending);
                pending = false;
                in_trigger = false;
            }
            t if t.starts_with("--") || t.starts_with("/*") => {}
            t if t.eq_ignore_ascii_case("TRIGGER") => {
                in_trigger = true;
                pending = true;
            }
            _ => pending = true,
        }
    }

    if !query[copied..].trim().is_empty() {
        pending = true;
    }
    count + usize::from(pending)
}

fn ends_with_end_keyword(text: &str) -> bool {
    let text = text.trim_end();
    let Some(start) = text.len().checked_sub(3) else {
        return false;
    };
    match (text.get(start..), text.get(..start)) {
        (Some(tail), Some(head)) => {
            tail.eq_ignore_ascii_case("END")
                && !head.ends_with(|c: char| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
