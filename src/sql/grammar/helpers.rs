//! Quoting, alias splitting and JSON path helpers shared by the query and
//! schema grammars.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::sql::value::Value;

// =============================================================================
// Identifiers
// =============================================================================

/// `"name"`, the base and Postgres/SQLite form. An embedded `"` is written
/// twice, so `a"b` becomes `"a""b"`.
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// MySQL's `` `name` ``; an embedded backtick is doubled.
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// SQL Server's `[name]`. Only the closing bracket needs escaping: `a]b`
/// becomes `[a]]b]`, while `[` stays as it is.
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

/// Reverse [`quote_double`]. Returns `None` if the input is not quoted.
pub fn unquote_double(quoted: &str) -> Option<String> {
    unquote(quoted, '"', '"')
}

/// Reverse [`quote_backtick`].
pub fn unquote_backtick(quoted: &str) -> Option<String> {
    unquote(quoted, '`', '`')
}

/// Reverse [`quote_bracket`].
pub fn unquote_bracket(quoted: &str) -> Option<String> {
    unquote(quoted, '[', ']')
}

fn unquote(quoted: &str, open: char, close: char) -> Option<String> {
    let inner = quoted.strip_prefix(open)?.strip_suffix(close)?;
    let doubled: String = [close, close].iter().collect();
    Some(inner.replace(&doubled, &close.to_string()))
}

// =============================================================================
// Literals
// =============================================================================

/// A single-quoted literal with `'` doubled. Every dialect uses it for
/// defaults, comments and enum values.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote each string and join with `, `.
pub fn quote_string_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| quote_string(v))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Clauses
// =============================================================================

static LEADING_BOOLEAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(and |or )").expect("valid regex"));

static ALIAS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+as\s+").expect("valid regex"));

static JSON_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\\+)?'").expect("valid regex"));

static JSON_ARRAY_KEYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\[[^\]]+\])+$").expect("valid regex"));

/// Remove the connector of the first condition in a compiled list.
///
/// Only the first `and `/`or ` is removed; `and not (...)` keeps its `not`.
pub fn remove_leading_boolean(sql: &str) -> String {
    LEADING_BOOLEAN.replace(sql, "").into_owned()
}

/// Split `expr as alias` on ` as ` (any case, any whitespace).
pub fn split_alias(value: &str) -> Option<(&str, &str)> {
    let mut parts = ALIAS.splitn(value, 3);
    let expr = parts.next()?;
    let alias = parts.next()?;
    Some((expr, alias))
}

/// The alias of `table as alias`, or the table itself.
pub fn alias_of(table: &str) -> &str {
    split_alias(table).map_or(table, |(_, alias)| alias)
}

/// Prefix every item with `prefix `.
pub fn prefix_array(prefix: &str, values: &[String]) -> Vec<String> {
    values.iter().map(|v| format!("{} {}", prefix, v)).collect()
}

// =============================================================================
// JSON Paths
// =============================================================================

/// Render `a->b[0]->c` as a JSON path literal: `'$."a"."b"[0]."c"'`.
///
/// Quotes in the path are escaped by doubling.
pub fn wrap_json_path(value: &str, delimiter: &str) -> String {
    let escaped = JSON_QUOTE.replace_all(value, "''");
    let path = escaped
        .split(delimiter)
        .map(wrap_json_path_segment)
        .collect::<Vec<_>>()
        .join(".");
    let separator = if path.starts_with('[') { "" } else { "." };
    format!("'${}{}'", separator, path)
}

fn wrap_json_path_segment(segment: &str) -> String {
    if let Some(keys) = JSON_ARRAY_KEYS.find(segment) {
        let key = &segment[..keys.start()];
        if key.is_empty() {
            return keys.as_str().to_string();
        }
        return format!("\"{}\"{}", key, keys.as_str());
    }
    format!("\"{}\"", segment)
}

/// Split `a[0][1]` into `["a", "0", "1"]`; plain segments pass through.
pub fn parse_json_path_array_keys(segment: &str) -> Vec<String> {
    match JSON_ARRAY_KEYS.find(segment) {
        Some(keys) => {
            let mut parts = Vec::new();
            let key = &segment[..keys.start()];
            if !key.is_empty() {
                parts.push(key.to_string());
            }
            parts.extend(
                keys.as_str()
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .split("][")
                    .map(str::to_string),
            );
            parts
        }
        None => vec![segment.to_string()],
    }
}

// =============================================================================
// Bindings
// =============================================================================

/// Bind a JSON document as its text.
pub fn json_text_binding(value: Value) -> Value {
    match value {
        Value::Json(doc) => Value::Text(doc.to_string()),
        other => other,
    }
}

/// Bind JSON scalars as plain values; booleans, arrays and objects as JSON
/// text.
pub fn json_scalar_binding(value: Value) -> Value {
    match value {
        Value::Json(doc @ (JsonValue::Bool(_) | JsonValue::Array(_) | JsonValue::Object(_))) => {
            Value::Text(doc.to_string())
        }
        Value::Json(scalar) => Value::from(scalar),
        other => other,
    }
}
