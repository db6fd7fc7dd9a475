//! SQL Server grammar.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::base::{wrap_table_name, BaseGrammar};
use super::helpers::{json_scalar_binding, quote_bracket};
use super::query::{batch_columns, from_table_name, select_statement, QueryGrammar};
use crate::error::{GrammarError, GrammarResult};
use crate::sql::condition::DatePart;
use crate::sql::query::{BindingSlot, Bindings, Lock, Query, UpsertColumn};
use crate::sql::value::{raw, Column, Operand, Record, TableRef, Value};

static TABLE_VALUED_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)(\(.*?\))]$").expect("valid regex"));

/// SQL Server grammar.
///
/// - Bracket identifiers
/// - `top n` for a plain limit; offsets go through `row_number()`
/// - Row locks are table hints on the `from` clause
/// - Upserts via `merge`
#[derive(Debug, Clone, Default)]
pub struct SqlServerGrammar {
    prefix: String,
}

fn positive_offset(query: &Query) -> Option<u64> {
    query.offset.filter(|offset| *offset > 0)
}

fn positive_limit(query: &Query) -> Option<u64> {
    query.limit.filter(|limit| *limit > 0)
}

impl SqlServerGrammar {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    /// Page through `row_number()` over the query's ordering.
    fn compile_ansi_offset(&self, query: &Query, offset: u64) -> GrammarResult<String> {
        let mut parts = self.compile_components(query)?;

        if parts.orders.is_empty() {
            warn!(
                offset,
                "offset without an ordering; rows are numbered in an undefined order"
            );
            parts.orders = "order by (select 0)".to_string();
        }
        parts.columns = format!(
            "{}, row_number() over ({}) as row_num",
            parts.columns,
            std::mem::take(&mut parts.orders)
        );

        let out_of_range =
            || GrammarError::InvalidQuery(format!("offset {} is out of range", offset));
        let first = offset.checked_add(1).ok_or_else(out_of_range)?;
        let constraint = match positive_limit(query) {
            Some(limit) => {
                let last = offset.checked_add(limit).ok_or_else(out_of_range)?;
                format!("between {} and {}", first, last)
            }
            None => format!(">= {}", first),
        };

        Ok(format!(
            "select * from ({}) as temp_table where row_num {} order by row_num",
            parts.concatenate(),
            constraint
        ))
    }
}

impl BaseGrammar for SqlServerGrammar {
    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_bracket(ident)
    }

    /// `[dbo].[fn(1)]` becomes `[dbo].[fn](1)`.
    fn wrap_table(&self, table: &str) -> String {
        let wrapped = wrap_table_name(self, table);
        TABLE_VALUED_FUNCTION
            .replace(&wrapped, "$1]$2")
            .into_owned()
    }

    fn wrap_json_selector(&self, value: &str) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(value)?;
        Ok(format!("json_value({}{})", field, path))
    }

    fn wrap_json_boolean_value(&self, value: &str) -> String {
        format!("'{}'", value)
    }
}

impl QueryGrammar for SqlServerGrammar {
    /// Paging is done with `row_number()`, which has no place in a union.
    fn compile_select(&self, query: &Query) -> GrammarResult<String> {
        if !query.unions.is_empty() {
            if positive_offset(query).is_some() {
                return Err(GrammarError::Unsupported(
                    "offsets on the first query of a union",
                ));
            }
            if query.union_limit.is_some() || query.union_offset.is_some() {
                return Err(GrammarError::Unsupported("limits or offsets on a union"));
            }
        }
        match positive_offset(query) {
            Some(offset) => self.compile_ansi_offset(query, offset),
            None => select_statement(self, query),
        }
    }

    /// `select top n` when limiting without an offset.
    fn compile_columns(&self, query: &Query, columns: &[Column]) -> GrammarResult<String> {
        if query.aggregate.is_some() {
            return Ok(String::new());
        }
        let mut select = if query.distinct.is_enabled() {
            "select distinct ".to_string()
        } else {
            "select ".to_string()
        };
        if let (Some(limit), None) = (positive_limit(query), positive_offset(query)) {
            select.push_str(&format!("top {} ", limit));
        }
        Ok(format!("{}{}", select, self.columnize_columns(columns)?))
    }

    fn compile_from(&self, query: &Query, table: &TableRef) -> GrammarResult<String> {
        let from = format!("from {}", self.wrap_table_ref(table)?);
        Ok(match &query.lock {
            Some(Lock::Update) => format!("{} with(rowlock,updlock,holdlock)", from),
            Some(Lock::Shared) => format!("{} with(rowlock,holdlock)", from),
            Some(Lock::Raw(hint)) => format!("{} {}", from, hint),
            None => from,
        })
    }

    fn date_based_where(
        &self,
        part: DatePart,
        column: &Column,
        operator: &str,
        value: &Operand,
    ) -> GrammarResult<String> {
        let column = self.wrap_column(column)?;
        let expr = match part {
            DatePart::Date => format!("cast({} as date)", column),
            DatePart::Time => format!("cast({} as time)", column),
            other => format!("{}({})", other.as_str(), column),
        };
        Ok(format!("{} {} {}", expr, operator, self.parameter(value)))
    }

    fn compile_json_contains(&self, column: &str, value: &str) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(column)?;
        Ok(format!(
            "{} in (select [value] from openjson({}{}))",
            value, field, path
        ))
    }

    fn compile_json_length(&self, column: &str, operator: &str, value: &str) -> GrammarResult<String> {
        let (field, path) = self.wrap_json_field_and_path(column)?;
        Ok(format!(
            "(select count(*) from openjson({}{})) {} {}",
            field, path, operator, value
        ))
    }

    fn compile_random(&self, _seed: Option<&str>) -> String {
        "NEWID()".to_string()
    }

    fn compile_limit(&self, _limit: u64) -> String {
        String::new()
    }

    fn compile_offset(&self, _offset: u64) -> String {
        String::new()
    }

    fn compile_lock(&self, _lock: &Lock) -> String {
        String::new()
    }

    fn wrap_union(&self, sql: &str) -> String {
        format!("select * from ({}) as {}", sql, self.wrap_table("temp_table"))
    }

    /// `select top 1 1 [exists] from ...`.
    fn compile_exists(&self, query: &Query) -> GrammarResult<String> {
        let mut existence = query.clone();
        existence.columns = Some(vec![Column::Raw(raw("1 [exists]"))]);
        existence.limit = Some(1);
        self.compile_select(&existence)
    }

    fn compile_upsert(
        &self,
        query: &Query,
        values: &[Record],
        unique_by: &[String],
        update: &[UpsertColumn],
    ) -> GrammarResult<String> {
        let table = from_table_name(query)?;
        if values.is_empty() {
            return Err(GrammarError::InvalidQuery(
                "upsert requires at least one record".to_string(),
            ));
        }
        let columns = self.columnize(&batch_columns(values)?)?;
        let rows = values
            .iter()
            .map(|record| {
                let params = record
                    .values()
                    .map(|v| self.parameter(v))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", params)
            })
            .collect::<Vec<_>>()
            .join(", ");

        let on = unique_by
            .iter()
            .map(|column| {
                Ok(format!(
                    "{} = {}",
                    self.wrap(&format!("source_values.{}", column))?,
                    self.wrap(&format!("{}.{}", table, column))?
                ))
            })
            .collect::<GrammarResult<Vec<_>>>()?
            .join(" and ");

        let mut sql = format!(
            "merge {} using (values {}) {} ({}) on {} ",
            self.wrap_table(table),
            rows,
            self.wrap_table("source_values"),
            columns,
            on
        );

        if !update.is_empty() {
            let assignments = update
                .iter()
                .map(|column| match column {
                    UpsertColumn::Inserted(name) => Ok(format!(
                        "{} = {}",
                        self.wrap(name)?,
                        self.wrap(&format!("source_values.{}", name))?
                    )),
                    UpsertColumn::Set(name, value) => {
                        Ok(format!("{} = {}", self.wrap(name)?, self.parameter(value)))
                    }
                })
                .collect::<GrammarResult<Vec<_>>>()?;
            sql.push_str(&format!("when matched then update set {} ", assignments.join(", ")));
        }

        sql.push_str(&format!(
            "when not matched then insert ({}) values ({});",
            columns, columns
        ));
        Ok(sql)
    }

    /// `update alias set ... from table joins where ...`.
    fn compile_update_with_joins(
        &self,
        query: &Query,
        table: &str,
        columns: &str,
        wheres: &str,
    ) -> GrammarResult<String> {
        let alias = table.rsplit_once(" as ").map_or(table, |(_, alias)| alias);
        let joins = self.compile_joins(query, &query.joins)?;
        Ok(format!(
            "update {} set {} from {} {} {}",
            alias, columns, table, joins, wheres
        ))
    }

    fn prepare_bindings_for_update(&self, bindings: &Bindings, values: &Record) -> Vec<Value> {
        let mut prepared: Vec<Value> = values.values().filter_map(Operand::binding).cloned().collect();
        prepared.extend(bindings.flatten_except(&[BindingSlot::Select]));
        prepared
    }

    /// `delete top (n) from ...` for a limit without offset.
    fn compile_delete_without_joins(
        &self,
        query: &Query,
        table: &str,
        wheres: &str,
    ) -> GrammarResult<String> {
        let sql = format!("delete from {} {}", table, wheres);
        match (positive_limit(query), positive_offset(query)) {
            (Some(limit), None) => Ok(sql.replacen("delete", &format!("delete top ({})", limit), 1)),
            _ => Ok(sql),
        }
    }

    fn compile_savepoint(&self, name: &str) -> String {
        format!("SAVE TRANSACTION {}", name)
    }

    fn compile_savepoint_rollback(&self, name: &str) -> String {
        format!("ROLLBACK TRANSACTION {}", name)
    }

    /// Orders move into the select list on the offset path, so their
    /// bindings follow the select bindings.
    fn select_bindings(&self, query: &Query) -> Vec<Value> {
        if positive_offset(query).is_none() || query.bindings.order.is_empty() {
            return query.get_bindings();
        }
        let mut bindings = query.bindings.select.clone();
        bindings.extend(query.bindings.order.iter().cloned());
        bindings.extend(
            query
                .bindings
                .flatten_except(&[BindingSlot::Select, BindingSlot::Order]),
        );
        bindings
    }

    fn prepare_binding(&self, value: Value) -> Value {
        json_scalar_binding(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::condition::Conditions;

    #[test]
    fn test_top_without_offset() {
        let g = SqlServerGrammar::default();
        let query = Query::table("users").limit(10);
        assert_eq!(g.compile_select(&query).unwrap(), "select top 10 * from [users]");
    }

    #[test]
    fn test_offset_uses_row_number() {
        let g = SqlServerGrammar::default();
        let query = Query::table("users").order_by_desc("id").offset(20).limit(10);
        assert_eq!(
            g.compile_select(&query).unwrap(),
            "select * from (select *, row_number() over (order by [id] desc) as row_num from [users]) as temp_table where row_num between 21 and 30 order by row_num"
        );
    }

    #[test]
    fn test_offset_without_limit_or_order() {
        let g = SqlServerGrammar::default();
        let query = Query::table("users").offset(20);
        assert_eq!(
            g.compile_select(&query).unwrap(),
            "select * from (select *, row_number() over (order by (select 0)) as row_num from [users]) as temp_table where row_num >= 21 order by row_num"
        );
    }

    #[test]
    fn test_offset_overflow_is_an_invalid_query() {
        let g = SqlServerGrammar::default();
        let query = Query::table("t").order_by_desc("id").offset(u64::MAX).limit(5);
        assert!(matches!(
            g.compile_select(&query),
            Err(GrammarError::InvalidQuery(_))
        ));
        let open_ended = Query::table("t").offset(u64::MAX);
        assert!(g.compile_select(&open_ended).is_err());
    }

    #[test]
    fn test_lock_hints_follow_from() {
        let g = SqlServerGrammar::default();
        let query = Query::table("users").where_("id", "=", 1).lock_for_update();
        assert_eq!(
            g.compile_select(&query).unwrap(),
            "select * from [users] with(rowlock,updlock,holdlock) where [id] = ?"
        );
    }

    #[test]
    fn test_table_valued_function() {
        let g = SqlServerGrammar::default();
        assert_eq!(g.wrap_table("dbo.fn_users(1)"), "[dbo].[fn_users](1)");
    }

    #[test]
    fn test_order_bindings_move_on_offset_path() {
        let g = SqlServerGrammar::default();
        let query = Query::table("users")
            .where_("active", "=", 1)
            .order_by_raw("case when id = ? then 0 else 1 end", [7])
            .offset(5);
        assert_eq!(g.select_bindings(&query), vec![Value::Int(7), Value::Int(1)]);
    }
}
