//! PostgreSQL grammar.

use super::base::BaseGrammar;
use super::helpers::{alias_of, parse_json_path_array_keys, quote_string};
use super::query::{delete_statement, from_table_name, update_statement, QueryGrammar};
use super::CompiledQuery;
use crate::error::GrammarResult;
use crate::sql::condition::DatePart;
use crate::sql::query::{BindingSlot, Bindings, Distinct, Lock, Query, UpsertColumn};
use crate::sql::value::{Column, Operand, Record, Value};

/// PostgreSQL grammar.
///
/// - `distinct on (...)`
/// - JSON through the `->`/`->>` operators and `jsonb`
/// - `update`/`delete` with joins or a limit filter on `ctid`
/// - Upserts via `on conflict ... do update`
#[derive(Debug, Clone, Default)]
pub struct PostgresGrammar {
    prefix: String,
}

impl PostgresGrammar {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    /// Path segments as JSON operator operands: integers bare, keys quoted.
    fn wrap_json_path_attributes(&self, path: &[&str], quote: impl Fn(&str) -> String) -> Vec<String> {
        path.iter()
            .flat_map(|segment| parse_json_path_array_keys(segment))
            .map(|attribute| {
                if attribute.parse::<i64>().is_ok() {
                    attribute
                } else {
                    quote(&attribute)
                }
            })
            .collect()
    }

    /// `where "ctid" in (select alias.ctid from ...)`.
    fn ctid_filter(&self, query: &Query) -> GrammarResult<String> {
        let alias = alias_of(from_table_name(query)?);
        let mut select = query.clone();
        select.columns = Some(vec![Column::Name(format!("{}.ctid", alias))]);
        Ok(format!(
            "where {} in ({})",
            self.wrap("ctid")?,
            self.compile_select(&select)?
        ))
    }

    /// `field = jsonb_set(field::jsonb, '{"a","b"}', ?)`.
    fn compile_json_update_column(&self, key: &str, value: &Operand) -> GrammarResult<String> {
        let segments: Vec<&str> = key.split("->").collect();
        let field = self.wrap(segments[0])?;
        let path = self
            .wrap_json_path_attributes(&segments[1..], |attribute| format!("\"{}\"", attribute))
            .join(",");
        Ok(format!(
            "{} = jsonb_set({}::jsonb, '{{{}}}', {})",
            field,
            field,
            path,
            self.parameter(value)
        ))
    }
}

impl BaseGrammar for PostgresGrammar {
    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    /// `meta->'a'->>'b'`: every step but the last keeps JSON, the last
    /// extracts text.
    fn wrap_json_selector(&self, value: &str) -> GrammarResult<String> {
        let segments: Vec<&str> = value.split("->").collect();
        let field = self.wrap_segments(segments[0]);
        let mut path = self.wrap_json_path_attributes(&segments[1..], quote_string);

        match path.pop() {
            Some(attribute) if path.is_empty() => Ok(format!("{}->>{}", field, attribute)),
            Some(attribute) => Ok(format!("{}->{}->>{}", field, path.join("->"), attribute)),
            None => Ok(field),
        }
    }

    fn wrap_json_boolean_selector(&self, value: &str) -> GrammarResult<String> {
        let selector = self.wrap_json_selector(value)?.replace("->>", "->");
        Ok(format!("({})::jsonb", selector))
    }

    fn wrap_json_boolean_value(&self, value: &str) -> String {
        format!("'{}'::jsonb", value)
    }
}

impl QueryGrammar for PostgresGrammar {
    fn compile_columns(&self, query: &Query, columns: &[Column]) -> GrammarResult<String> {
        if query.aggregate.is_some() {
            return Ok(String::new());
        }
        let select = match &query.distinct {
            Distinct::Columns(on) => format!("select distinct on ({}) ", self.columnize_columns(on)?),
            Distinct::All => "select distinct ".to_string(),
            Distinct::Disabled => "select ".to_string(),
        };
        Ok(format!("{}{}", select, self.columnize_columns(columns)?))
    }

    /// `like` comparisons cast the column to text.
    fn where_basic(&self, column: &Column, operator: &str, value: &Operand) -> GrammarResult<String> {
        let column = self.wrap_column(column)?;
        let operator = operator.replace('?', "??");
        if operator.to_lowercase().contains("like") {
            return Ok(format!("{}::text {} {}", column, operator, self.parameter(value)));
        }
        Ok(format!("{} {} {}", column, operator, self.parameter(value)))
    }

    fn where_date(&self, column: &Column, operator: &str, value: &Operand) -> GrammarResult<String> {
        Ok(format!(
            "{}::date {} {}",
            self.wrap_column(column)?,
            operator,
            self.parameter(value)
        ))
    }

    fn where_time(&self, column: &Column, operator: &str, value: &Operand) -> GrammarResult<String> {
        Ok(format!(
            "{}::time {} {}",
            self.wrap_column(column)?,
            operator,
            self.parameter(value)
        ))
    }

    fn date_based_where(
        &self,
        part: DatePart,
        column: &Column,
        operator: &str,
        value: &Operand,
    ) -> GrammarResult<String> {
        Ok(format!(
            "extract({} from {}) {} {}",
            part.as_str(),
            self.wrap_column(column)?,
            operator,
            self.parameter(value)
        ))
    }

    fn compile_json_contains(&self, column: &str, value: &str) -> GrammarResult<String> {
        let column = self.wrap(column)?.replace("->>", "->");
        Ok(format!("({})::jsonb @> {}", column, value))
    }

    fn compile_json_length(&self, column: &str, operator: &str, value: &str) -> GrammarResult<String> {
        let column = self.wrap(column)?.replace("->>", "->");
        Ok(format!("json_array_length(({})::json) {} {}", column, operator, value))
    }

    fn compile_lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::Update => "for update".to_string(),
            Lock::Shared => "for share".to_string(),
            Lock::Raw(sql) => sql.clone(),
        }
    }

    fn compile_insert_get_id(
        &self,
        query: &Query,
        values: &Record,
        sequence: Option<&str>,
    ) -> GrammarResult<String> {
        Ok(format!(
            "{} returning {}",
            self.compile_insert(query, std::slice::from_ref(values))?,
            self.wrap(sequence.unwrap_or("id"))?
        ))
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
            self.ctid_filter(query)?
        ))
    }

    /// Table qualifiers are dropped from assigned columns.
    fn compile_update_columns(&self, _query: &Query, values: &Record) -> GrammarResult<String> {
        let columns = values
            .iter()
            .map(|(key, value)| {
                let column = key.rsplit('.').next().unwrap_or(key);
                if self.is_json_selector(column) {
                    self.compile_json_update_column(column, value)
                } else {
                    Ok(format!("{} = {}", self.wrap(column)?, self.parameter(value)))
                }
            })
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(columns.join(", "))
    }

    /// Values written into JSON paths bind as JSON text.
    fn prepare_bindings_for_update(&self, bindings: &Bindings, values: &Record) -> Vec<Value> {
        let mut prepared: Vec<Value> = values
            .iter()
            .filter_map(|(key, value)| {
                let value = value.binding()?;
                if self.is_json_selector(key) || matches!(value, Value::Json(_)) {
                    Some(Value::Text(value.to_json().to_string()))
                } else {
                    Some(value.clone())
                }
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
            self.ctid_filter(query)?
        ))
    }

    fn compile_truncate(&self, query: &Query) -> GrammarResult<Vec<CompiledQuery>> {
        Ok(vec![CompiledQuery::new(
            format!(
                "truncate {} restart identity cascade",
                self.wrap_table(from_table_name(query)?)
            ),
            Vec::new(),
        )])
    }
}
