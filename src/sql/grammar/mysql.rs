//! MySQL / MariaDB grammar.

use super::base::BaseGrammar;
use super::helpers::quote_backtick;
use super::query::QueryGrammar;
use crate::error::GrammarResult;
use crate::sql::query::{BindingSlot, Bindings, Lock, Query, UpsertColumn};
use crate::sql::value::{Column, Operand, Record, Value};

/// MySQL grammar.
///
/// - Backtick identifiers
/// - JSON through `json_extract`/`json_contains`/`json_length`
/// - `update`/`delete` accept `order by` and `limit`
/// - Upserts via `on duplicate key update`
#[derive(Debug, Clone, Default)]
pub struct MySqlGrammar {
    prefix: String,
}

impl MySqlGrammar {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn json_column(&self, column: &Column) -> Option<GrammarResult<(String, String)>> {
        match column {
            Column::Name(name) if self.is_json_selector(name) => {
                Some(self.wrap_json_field_and_path(name))
            }
            _ => None,
        }
    }

    /// Append `order by` and `limit` to an update or delete without joins.
    fn with_orders_and_limit(&self, query: &Query, sql: String) -> GrammarResult<String> {
        let mut sql = sql.trim_end().to_string();
        if !query.orders.is_empty() {
            sql = format!("{} {}", sql, self.compile_orders(&query.orders)?);
        }
        if let Some(limit) = query.limit {
            sql = format!("{} {}", sql, self.compile_limit(limit));
        }
        Ok(sql)
    }

    /// `field = json_set(field, path, value)`.
    fn compile_json_update_column(&self, key: &str, value: &Operand) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(key)?;
        let value = match value {
            Operand::Value(Value::Bool(flag)) => flag.to_string(),
            Operand::Value(Value::Json(doc)) if doc.is_array() || doc.is_object() => {
                "cast(? as json)".to_string()
            }
            other => self.parameter(other),
        };
        Ok(format!("{} = json_set({}{}, {})", field, field, path, value))
    }
}

impl BaseGrammar for MySqlGrammar {
    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_backtick(ident)
    }

    fn wrap_json_selector(&self, value: &str) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(value)?;
        Ok(format!("json_unquote(json_extract({}{}))", field, path))
    }

    fn wrap_json_boolean_selector(&self, value: &str) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(value)?;
        Ok(format!("json_extract({}{})", field, path))
    }
}

impl QueryGrammar for MySqlGrammar {
    /// A JSON path also counts as null when it holds a JSON `null`.
    fn where_null(&self, column: &Column) -> GrammarResult<String> {
        if let Some(json) = self.json_column(column) {
            let (field, path) = json?;
            return Ok(format!(
                "(json_extract({f}{p}) is null OR json_type(json_extract({f}{p})) = 'NULL')",
                f = field,
                p = path
            ));
        }
        Ok(format!("{} is null", self.wrap_column(column)?))
    }

    fn where_not_null(&self, column: &Column) -> GrammarResult<String> {
        if let Some(json) = self.json_column(column) {
            let (field, path) = json?;
            return Ok(format!(
                "(json_extract({f}{p}) is not null AND json_type(json_extract({f}{p})) != 'NULL')",
                f = field,
                p = path
            ));
        }
        Ok(format!("{} is not null", self.wrap_column(column)?))
    }

    fn compile_json_contains(&self, column: &str, value: &str) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(column)?;
        Ok(format!("json_contains({}, {}{})", field, value, path))
    }

    fn compile_json_length(&self, column: &str, operator: &str, value: &str) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(column)?;
        Ok(format!("json_length({}{}) {} {}", field, path, operator, value))
    }

    fn compile_random(&self, seed: Option<&str>) -> String {
        format!("RAND({})", seed.unwrap_or_default())
    }

    fn compile_lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::Update => "for update".to_string(),
            Lock::Shared => "lock in share mode".to_string(),
            Lock::Raw(sql) => sql.clone(),
        }
    }

    fn compile_insert_default_values(&self, table: &str) -> String {
        format!("insert into {} () values ()", table)
    }

    fn compile_insert_or_ignore(&self, query: &Query, values: &[Record]) -> GrammarResult<String> {
        Ok(self
            .compile_insert(query, values)?
            .replacen("insert", "insert ignore", 1))
    }

    fn compile_upsert(
        &self,
        query: &Query,
        values: &[Record],
        _unique_by: &[String],
        update: &[UpsertColumn],
    ) -> GrammarResult<String> {
        let sql = self.compile_insert(query, values)?;
        let columns = update
            .iter()
            .map(|column| match column {
                UpsertColumn::Inserted(name) => {
                    let wrapped = self.wrap(name)?;
                    Ok(format!("{} = values({})", wrapped, wrapped))
                }
                UpsertColumn::Set(name, value) => {
                    Ok(format!("{} = {}", self.wrap(name)?, self.parameter(value)))
                }
            })
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(format!("{} on duplicate key update {}", sql, columns.join(", ")))
    }

    fn compile_update_columns(&self, _query: &Query, values: &Record) -> GrammarResult<String> {
        let columns = values
            .iter()
            .map(|(key, value)| {
                if self.is_json_selector(key) {
                    self.compile_json_update_column(key, value)
                } else {
                    Ok(format!("{} = {}", self.wrap(key)?, self.parameter(value)))
                }
            })
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(columns.join(", "))
    }

    fn compile_update_without_joins(
        &self,
        query: &Query,
        table: &str,
        columns: &str,
        wheres: &str,
    ) -> GrammarResult<String> {
        self.with_orders_and_limit(query, format!("update {} set {} {}", table, columns, wheres))
    }

    /// Booleans written into JSON paths are inlined, so they bind nothing.
    fn prepare_bindings_for_update(&self, bindings: &Bindings, values: &Record) -> Vec<Value> {
        let mut prepared = bindings.join.clone();
        prepared.extend(
            values
                .iter()
                .filter(|(key, value)| {
                    !(self.is_json_selector(key) && matches!(value, Operand::Value(Value::Bool(_))))
                })
                .filter_map(|(_, value)| value.binding())
                .cloned(),
        );
        prepared.extend(bindings.flatten_except(&[BindingSlot::Select, BindingSlot::Join]));
        prepared
    }

    fn compile_delete_without_joins(
        &self,
        query: &Query,
        table: &str,
        wheres: &str,
    ) -> GrammarResult<String> {
        self.with_orders_and_limit(query, format!("delete from {} {}", table, wheres))
    }
}
