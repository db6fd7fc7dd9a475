//! SQLite grammar.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use super::base::BaseGrammar;
use super::helpers::{alias_of, json_scalar_binding};
use super::query::{delete_statement, from_table_name, update_statement, QueryGrammar};
use super::CompiledQuery;
use crate::error::GrammarResult;
use crate::sql::condition::DatePart;
use crate::sql::query::{BindingSlot, Bindings, Lock, Query, UpsertColumn};
use crate::sql::value::{Column, Operand, Record, Value};

/// SQLite grammar.
///
/// - No row locks
/// - Dates compared through `strftime`
/// - `update`/`delete` with joins or a limit are rewritten into a
///   `rowid in (select ...)` filter
/// - Writes into JSON paths are merged with `json_patch`
#[derive(Debug, Clone, Default)]
pub struct SqliteGrammar {
    prefix: String,
}

/// Right-hand side of one `set` assignment.
enum Assignment<'a> {
    Value(&'a Operand),
    /// Merged JSON object for every path written under one column.
    Patch(JsonValue),
}

impl SqliteGrammar {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    /// Plain assignments first, then one patch per JSON column.
    ///
    /// Table qualifiers are dropped: SQLite rejects `set "t"."c" = ?`.
    fn assignments<'a>(&self, values: &'a Record) -> Vec<(String, Assignment<'a>)> {
        let mut plain = Vec::new();
        let mut patches: BTreeMap<String, JsonValue> = BTreeMap::new();

        for (key, value) in values {
            if self.is_json_selector(key) {
                let path = key.split_once('.').map_or(key.as_str(), |(_, rest)| rest);
                let segments: Vec<&str> = path.split("->").collect();
                let field = segments[0].to_string();
                let leaf = match value {
                    Operand::Value(v) => v.to_json(),
                    Operand::Raw(expr) => JsonValue::String(expr.as_str().to_string()),
                };
                let patch = segments[1..].iter().rev().fold(leaf, |acc, segment| {
                    let mut map = Map::new();
                    map.insert(segment.to_string(), acc);
                    JsonValue::Object(map)
                });
                merge_json(
                    patches
                        .entry(field)
                        .or_insert_with(|| JsonValue::Object(Map::new())),
                    patch,
                );
            } else {
                let column = key.rsplit('.').next().unwrap_or(key).to_string();
                plain.push((column, Assignment::Value(value)));
            }
        }

        plain.extend(
            patches
                .into_iter()
                .map(|(column, doc)| (column, Assignment::Patch(doc))),
        );
        plain
    }

    /// `where "rowid" in (select alias.rowid from ...)`, keeping joins,
    /// order and limit in the sub-select.
    fn rowid_filter(&self, query: &Query) -> GrammarResult<String> {
        let alias = alias_of(from_table_name(query)?);
        let mut select = query.clone();
        select.columns = Some(vec![Column::Name(format!("{}.rowid", alias))]);
        Ok(format!(
            "where {} in ({})",
            self.wrap("rowid")?,
            self.compile_select(&select)?
        ))
    }
}

/// Deep-merge `patch` into `target`; objects merge key by key.
fn merge_json(target: &mut JsonValue, patch: JsonValue) {
    match (target, patch) {
        (JsonValue::Object(target), JsonValue::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

impl BaseGrammar for SqliteGrammar {
    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn wrap_json_selector(&self, value: &str) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(value)?;
        Ok(format!("json_extract({}{})", field, path))
    }
}

impl QueryGrammar for SqliteGrammar {
    /// `strftime(format, column) op cast(? as text)`.
    fn date_based_where(
        &self,
        part: DatePart,
        column: &Column,
        operator: &str,
        value: &Operand,
    ) -> GrammarResult<String> {
        let format = match part {
            DatePart::Date => "%Y-%m-%d",
            DatePart::Time => "%H:%M:%S",
            DatePart::Day => "%d",
            DatePart::Month => "%m",
            DatePart::Year => "%Y",
        };
        Ok(format!(
            "strftime('{}', {}) {} cast({} as text)",
            format,
            self.wrap_column(column)?,
            operator,
            self.parameter(value)
        ))
    }

    fn compile_json_contains(&self, column: &str, value: &str) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(column)?;
        Ok(format!(
            "exists (select 1 from json_each({}{}) where {}.{} is {})",
            field,
            path,
            self.wrap_value("json_each"),
            self.wrap_value("value"),
            value
        ))
    }

    fn compile_json_length(&self, column: &str, operator: &str, value: &str) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(column)?;
        Ok(format!("json_array_length({}{}) {} {}", field, path, operator, value))
    }

    fn compile_lock(&self, _lock: &Lock) -> String {
        String::new()
    }

    fn wrap_union(&self, sql: &str) -> String {
        format!("select * from ({})", sql)
    }

    fn compile_insert_or_ignore(&self, query: &Query, values: &[Record]) -> GrammarResult<String> {
        Ok(self
            .compile_insert(query, values)?
            .replacen("insert", "insert or ignore", 1))
    }

    fn compile_upsert(
        &self,
        query: &Query,
        values: &[Record],
        unique_by: &[String],
        update: &[UpsertColumn],
    ) -> GrammarResult<String> {
        let sql = self.compile_insert(query, values)?;
        let columns = update
            .iter()
            .map(|column| match column {
                UpsertColumn::Inserted(name) => Ok(format!(
                    "{} = {}.{}",
                    self.wrap(name)?,
                    self.wrap_value("excluded"),
                    self.wrap_value(name)
                )),
                UpsertColumn::Set(name, value) => {
                    Ok(format!("{} = {}", self.wrap(name)?, self.parameter(value)))
                }
            })
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(format!(
            "{} on conflict ({}) do update set {}",
            sql,
            self.columnize(unique_by)?,
            columns.join(", ")
        ))
    }

    fn compile_update(&self, query: &Query, values: &Record) -> GrammarResult<String> {
        if query.joins.is_empty() && query.limit.is_none() {
            return update_statement(self, query, values);
        }
        Ok(format!(
            "update {} set {} {}",
            self.wrap_table(from_table_name(query)?),
            self.compile_update_columns(query, values)?,
            self.rowid_filter(query)?
        ))
    }

    fn compile_update_columns(&self, _query: &Query, values: &Record) -> GrammarResult<String> {
        let columns = self
            .assignments(values)
            .into_iter()
            .map(|(column, assignment)| {
                let wrapped = self.wrap(&column)?;
                Ok(match assignment {
                    Assignment::Value(value) => format!("{} = {}", wrapped, self.parameter(value)),
                    Assignment::Patch(_) => format!(
                        "{} = json_patch(ifnull({}, json('{{}}')), json(?))",
                        wrapped, wrapped
                    ),
                })
            })
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(columns.join(", "))
    }

    /// Assigned values, then every clause binding except the select list.
    fn prepare_bindings_for_update(&self, bindings: &Bindings, values: &Record) -> Vec<Value> {
        let mut prepared: Vec<Value> = self
            .assignments(values)
            .into_iter()
            .filter_map(|(_, assignment)| match assignment {
                Assignment::Value(value) => value.binding().cloned(),
                Assignment::Patch(doc) => Some(Value::Text(doc.to_string())),
            })
            .collect();
        prepared.extend(bindings.flatten_except(&[BindingSlot::Select]));
        prepared
    }

    fn compile_delete(&self, query: &Query) -> GrammarResult<String> {
        if query.joins.is_empty() && query.limit.is_none() {
            return delete_statement(self, query);
        }
        Ok(format!(
            "delete from {} {}",
            self.wrap_table(from_table_name(query)?),
            self.rowid_filter(query)?
        ))
    }

    /// SQLite has no `truncate`; the autoincrement counter is reset too.
    fn compile_truncate(&self, query: &Query) -> GrammarResult<Vec<CompiledQuery>> {
        let table = from_table_name(query)?;
        Ok(vec![
            CompiledQuery::new(
                "delete from sqlite_sequence where name = ?",
                vec![Value::Text(format!("{}{}", self.prefix, table))],
            ),
            CompiledQuery::new(format!("delete from {}", self.wrap_table(table)), Vec::new()),
        ])
    }

    fn prepare_binding(&self, value: Value) -> Value {
        json_scalar_binding(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::condition::Conditions;
    use crate::sql::value::record;

    #[test]
    fn test_where_date_uses_strftime() {
        let g = SqliteGrammar::default();
        let query = Query::table("users").where_date("created_at", "=", "2024-01-01");
        assert_eq!(
            g.compile_select(&query).unwrap(),
            "select * from \"users\" where strftime('%Y-%m-%d', \"created_at\") = cast(? as text)"
        );
    }

    #[test]
    fn test_json_update_is_patched() {
        let g = SqliteGrammar::default();
        let query = Query::table("users").where_("id", "=", 1);
        let values = record([("options->theme", "dark"), ("users.name", "x")]);
        assert_eq!(
            g.compile_update(&query, &values).unwrap(),
            "update \"users\" set \"name\" = ?, \"options\" = json_patch(ifnull(\"options\", json('{}')), json(?)) where \"id\" = ?"
        );
        assert_eq!(
            g.prepare_bindings_for_update(&query.bindings, &values),
            vec![
                Value::Text("x".into()),
                Value::Text("{\"theme\":\"dark\"}".into()),
                Value::Int(1)
            ]
        );
    }

    #[test]
    fn test_nested_json_paths_merge() {
        let mut doc = serde_json::json!({"a": {"b": 1}});
        merge_json(&mut doc, serde_json::json!({"a": {"c": 2}}));
        assert_eq!(doc, serde_json::json!({"a": {"b": 1, "c": 2}}));
    }

    #[test]
    fn test_truncate_resets_sequence() {
        let g = SqliteGrammar::new("p_");
        let statements = g.compile_truncate(&Query::table("users")).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].bindings, vec![Value::Text("p_users".into())]);
        assert_eq!(statements[1].sql, "delete from \"p_users\"");
    }
}
