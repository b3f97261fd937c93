//! Argument parsing, filtering and binding.
//!
//! Callers write `$name` in the query and `"$name"` as the argument key.
//! Keys lose every `$`, and `$` in the query becomes `@`, the named
//! parameter sigil SQLite understands. Filtering is a plain substring test
//! of the key against the translated statement text.
//!
//! sqlx only binds positional parameters on SQLite, so [`bind`] turns the
//! named placeholders of a statement into `?N` before execution.

use crate::db::Value;
use crate::error::{NodeError, Result};
use regex::{Captures, Regex};
use std::fmt::Write as _;
use std::sync::OnceLock;

/// Sigil used by callers in queries and argument keys.
const CALLER_SIGIL: char = '$';

/// Sigil the caller's sigil is translated to.
const ENGINE_SIGIL: char = '@';

/// Named arguments in insertion order, keys without the `$` sigil.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: Vec<(String, Value)>,
}

impl Arguments {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an argument, replacing the value of an existing key in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns the argument names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut args = Self::new();
        for (key, value) in iter {
            args.insert(key, value);
        }
        args
    }
}

/// A statement ready for the engine: `?N` placeholders and their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundStatement {
    /// SQL with every named placeholder replaced by `?N`.
    pub sql: String,
    /// `params[N - 1]` is bound to `?N`.
    pub params: Vec<Value>,
}

/// Translates the caller's `$` sigil into the engine's `@` sigil.
pub fn translate_query(query: &str) -> String {
    query.replace(CALLER_SIGIL, &ENGINE_SIGIL.to_string())
}

/// Strips every `$` from an argument key.
pub fn translate_key(key: &str) -> String {
    key.replace(CALLER_SIGIL, "")
}

/// Parses the raw argument text of a request.
///
/// The text must be a JSON object. Blank text counts as `{}`.
pub fn parse_arguments(text: &str) -> Result<Arguments> {
    if text.trim().is_empty() {
        return Ok(Arguments::new());
    }

    let parsed: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| NodeError::argument(format!("Arguments are not valid JSON: {e}")))?;

    let serde_json::Value::Object(object) = parsed else {
        return Err(NodeError::argument(format!(
            "Arguments must be a JSON object, got: {text}"
        )));
    };

    Ok(object
        .iter()
        .map(|(key, value)| (translate_key(key), Value::from_json(value)))
        .collect())
}

/// Keeps the arguments whose name occurs in the statement text.
///
/// The test is a plain substring match, so `id` is kept for a statement
/// mentioning `@user_id` or a column named `id`.
pub fn normalize(args: &Arguments, statement: &str) -> Arguments {
    args.entries
        .iter()
        .filter(|(name, _)| statement.contains(name.as_str()))
        .cloned()
        .collect()
}

/// Matches string literals, quoted identifiers and comments (left alone) or
/// a named placeholder (captured).
fn placeholder_pattern() -> &'static Regex {
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
            | [@:$](?P<name>[A-Za-z0-9_]+)
            "#,
        )
        .expect("placeholder pattern is valid")
    })
}

/// Rewrites the named placeholders of a statement into positional ones.
///
/// Placeholders are numbered by first appearance; a name used twice binds
/// the same position. A placeholder with no matching argument fails the
/// statement, like SQLite's own named binding would.
pub fn bind(statement: &str, args: &Arguments) -> Result<BoundStatement> {
    let mut bound = BoundStatement::default();
    let mut names: Vec<&str> = Vec::new();
    let mut copied = 0;

    for captures in placeholder_pattern().captures_iter(statement) {
        let Some(name) = captures.name("name") else {
            continue;
        };
        let position = match names.iter().position(|known| *known == name.as_str()) {
            Some(position) => position,
            None => {
                let value = args.get(name.as_str()).ok_or_else(|| {
                    NodeError::query(format!("Missing named parameter \"{}\"", name.as_str()))
                })?;
                names.push(name.as_str());
                bound.params.push(value.clone());
                names.len() - 1
            }
        };

        let span = whole_match(&captures);
        bound.sql.push_str(&statement[copied..span.0]);
        let _ = write!(bound.sql, "?{}", position + 1);
        copied = span.1;
    }

    bound.sql.push_str(&statement[copied..]);
    Ok(bound)
}

fn whole_match(captures: &Captures<'_>) -> (usize, usize) {
    captures
        .get(0)
        .map(|m| (m.start(), m.end()))
        .unwrap_or_default()
}
