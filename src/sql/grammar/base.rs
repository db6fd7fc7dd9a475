//! Identifier wrapping shared by query and schema grammars.

use std::fmt::Debug;

use super::helpers::{quote_double, quote_string, split_alias, wrap_json_path};
use crate::error::{GrammarError, GrammarResult};
use crate::sql::value::Operand;

/// Wrapping rules every grammar needs.
///
/// The defaults quote with double quotes and reject JSON selectors; dialects
/// override the quoting primitive and the JSON hooks.
pub trait BaseGrammar: Debug + Send + Sync {
    /// Prefix applied to every table name.
    fn table_prefix(&self) -> &str;

    // =========================================================================
    // Identifier Quoting
    // =========================================================================

    /// Quote one identifier segment, doubling embedded quote characters.
    fn quote_identifier(&self, ident: &str) -> String {
        quote_double(ident)
    }

    /// Quote one segment; `*` is never quoted.
    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return value.to_string();
        }
        self.quote_identifier(value)
    }

    /// Wrap a column reference: `table.column`, `expr as alias` or a JSON
    /// selector such as `options->theme`.
    fn wrap(&self, value: &str) -> GrammarResult<String> {
        if let Some((expr, alias)) = split_alias(value) {
            return Ok(format!("{} as {}", self.wrap(expr)?, self.wrap_value(alias)));
        }
        if self.is_json_selector(value) {
            return self.wrap_json_selector(value);
        }
        Ok(self.wrap_segments(value))
    }

    /// Wrap `a.b.c`; the first segment of a qualified name is a table and
    /// gets the prefix.
    fn wrap_segments(&self, value: &str) -> String {
        let segments: Vec<&str> = value.split('.').collect();
        segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                if i == 0 && segments.len() > 1 {
                    self.wrap_table(segment)
                } else {
                    self.wrap_value(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Wrap a table name, applying the prefix to the table and its alias.
    fn wrap_table(&self, table: &str) -> String {
        wrap_table_name(self, table)
    }

    /// Wrap and join a list of column names.
    fn columnize(&self, columns: &[String]) -> GrammarResult<String> {
        let wrapped = columns
            .iter()
            .map(|c| self.wrap(c))
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(wrapped.join(", "))
    }

    /// Wrap every name in a list.
    fn wrap_array(&self, values: &[String]) -> GrammarResult<Vec<String>> {
        values.iter().map(|v| self.wrap(v)).collect()
    }

    // =========================================================================
    // Parameters and Literals
    // =========================================================================

    /// `?` for a bound value, the SQL itself for a raw expression.
    fn parameter(&self, value: &Operand) -> String {
        match value {
            Operand::Raw(expr) => expr.as_str().to_string(),
            Operand::Value(_) => "?".to_string(),
        }
    }

    fn parameterize(&self, values: &[Operand]) -> String {
        values
            .iter()
            .map(|v| self.parameter(v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn quote_string(&self, value: &str) -> String {
        quote_string(value)
    }

    // =========================================================================
    // JSON
    // =========================================================================

    fn is_json_selector(&self, value: &str) -> bool {
        value.contains("->")
    }

    /// Compile `column->path` into the engine's JSON extraction.
    fn wrap_json_selector(&self, _value: &str) -> GrammarResult<String> {
        Err(GrammarError::Unsupported("JSON operations"))
    }

    /// Selector used when comparing against a JSON boolean.
    fn wrap_json_boolean_selector(&self, value: &str) -> GrammarResult<String> {
        self.wrap_json_selector(value)
    }

    /// Literal `true`/`false` as the engine compares it to JSON.
    fn wrap_json_boolean_value(&self, value: &str) -> String {
        value.to_string()
    }

    /// Split `field->a->b` into the wrapped field and `, '$."a"."b"'`.
    ///
    /// The path part is empty when the selector has no arrow.
    fn wrap_json_field_and_path(&self, column: &str) -> GrammarResult<(String, String)> {
        match column.split_once("->") {
            Some((field, path)) => Ok((
                self.wrap(field)?,
                format!(", {}", wrap_json_path(path, "->")),
            )),
            None => Ok((self.wrap(column)?, String::new())),
        }
    }
}

/// Prefix and quote a table name: `schema.table as alias` becomes
/// `"schema"."p_table" as "p_alias"`.
pub fn wrap_table_name<G: BaseGrammar + ?Sized>(grammar: &G, table: &str) -> String {
    let prefix = grammar.table_prefix();

    if let Some((name, alias)) = split_alias(table) {
        return format!(
            "{} as {}",
            wrap_table_name(grammar, name),
            grammar.wrap_value(&format!("{}{}", prefix, alias))
        );
    }

    if let Some((schema, name)) = table.rsplit_once('.') {
        let mut segments: Vec<String> = schema.split('.').map(|s| grammar.wrap_value(s)).collect();
        segments.push(grammar.wrap_value(&format!("{}{}", prefix, name)));
        return segments.join(".");
    }

    grammar.wrap_value(&format!("{}{}", prefix, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Plain {
        prefix: String,
    }

    impl BaseGrammar for Plain {
        fn table_prefix(&self) -> &str {
            &self.prefix
        }
    }

    fn grammar(prefix: &str) -> Plain {
        Plain {
            prefix: prefix.to_string(),
        }
    }

    #[test]
    fn test_wrap_plain_and_qualified() {
        let g = grammar("");
        assert_eq!(g.wrap("name").unwrap(), "\"name\"");
        assert_eq!(g.wrap("users.name").unwrap(), "\"users\".\"name\"");
        assert_eq!(g.wrap("users.*").unwrap(), "\"users\".*");
        assert_eq!(g.wrap("*").unwrap(), "*");
    }

    #[test]
    fn test_wrap_alias() {
        let g = grammar("p_");
        assert_eq!(g.wrap("name as n").unwrap(), "\"name\" as \"n\"");
        assert_eq!(g.wrap("u.name AS n").unwrap(), "\"p_u\".\"name\" as \"n\"");
    }

    #[test]
    fn test_wrap_table_prefix() {
        let g = grammar("p_");
        assert_eq!(g.wrap_table("users"), "\"p_users\"");
        assert_eq!(g.wrap_table("users as u"), "\"p_users\" as \"p_u\"");
        assert_eq!(g.wrap_table("public.users"), "\"public\".\"p_users\"");
    }

    #[test]
    fn test_wrap_escapes_quotes() {
        let g = grammar("");
        assert_eq!(g.wrap("we\"ird").unwrap(), "\"we\"\"ird\"");
    }

    #[test]
    fn test_json_selector_unsupported() {
        let g = grammar("");
        assert_eq!(
            g.wrap("options->theme"),
            Err(GrammarError::Unsupported("JSON operations"))
        );
        assert_eq!(
            g.wrap("options->theme").unwrap_err().to_string(),
            "This database engine does not support JSON operations."
        );
    }

    #[test]
    fn test_json_field_and_path() {
        let g = grammar("");
        assert_eq!(
            g.wrap_json_field_and_path("meta->a->b").unwrap(),
            ("\"meta\"".to_string(), ", '$.\"a\".\"b\"'".to_string())
        );
        assert_eq!(
            g.wrap_json_field_and_path("meta").unwrap(),
            ("\"meta\"".to_string(), String::new())
        );
    }

    #[test]
    fn test_parameterize() {
        let g = grammar("");
        let values = vec![Operand::from(1), Operand::from(crate::sql::value::raw("now()"))];
        assert_eq!(g.parameterize(&values), "?, now()");
    }
}
