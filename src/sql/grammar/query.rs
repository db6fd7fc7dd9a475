//! The query grammar trait and its default compilation rules.

use std::slice;

use super::base::BaseGrammar;
use super::helpers::{json_text_binding, remove_leading_boolean};
use super::CompiledQuery;
use crate::error::{GrammarError, GrammarResult};
use crate::sql::condition::{DatePart, Having, Where};
use crate::sql::join::JoinClause;
use crate::sql::query::{
    Aggregate, BindingSlot, Bindings, Distinct, Lock, Order, Query, UpsertColumn,
};
use crate::sql::value::{Column, Operand, Record, TableRef, Value};

/// Keyword introducing a condition list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    Where,
    On,
}

impl Conjunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conjunction::Where => "where",
            Conjunction::On => "on",
        }
    }

    /// Length of `where ` / `on `, stripped when a list is nested.
    fn prefix_len(&self) -> usize {
        match self {
            Conjunction::Where => 6,
            Conjunction::On => 3,
        }
    }
}

/// The compiled parts of a select, in statement order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Components {
    pub aggregate: String,
    pub columns: String,
    pub from: String,
    pub joins: String,
    pub wheres: String,
    pub groups: String,
    pub havings: String,
    pub orders: String,
    pub limit: String,
    pub offset: String,
    pub lock: String,
}

impl Components {
    /// Join the non-empty parts with single spaces.
    pub fn concatenate(&self) -> String {
        [
            &self.aggregate,
            &self.columns,
            &self.from,
            &self.joins,
            &self.wheres,
            &self.groups,
            &self.havings,
            &self.orders,
            &self.limit,
            &self.offset,
            &self.lock,
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

pub(crate) fn from_table(query: &Query) -> GrammarResult<&TableRef> {
    query
        .from
        .as_ref()
        .ok_or_else(|| GrammarError::InvalidQuery("statement has no table".to_string()))
}

/// The table name of a statement that must target a plain table.
pub(crate) fn from_table_name(query: &Query) -> GrammarResult<&str> {
    match from_table(query)? {
        TableRef::Name(name) => Ok(name),
        _ => Err(GrammarError::InvalidQuery(
            "statement requires a named table".to_string(),
        )),
    }
}

/// Compiles queries into one engine's SQL.
///
/// Every method has a default; a dialect grammar overrides the hooks where
/// its syntax differs.
pub trait QueryGrammar: BaseGrammar {
    // =========================================================================
    // References
    // =========================================================================

    fn wrap_column(&self, column: &Column) -> GrammarResult<String> {
        match column {
            Column::Name(name) => self.wrap(name),
            Column::Raw(expr) => Ok(expr.as_str().to_string()),
            Column::Sub { query, alias } => Ok(format!(
                "({}) as {}",
                self.compile_select(query)?,
                self.wrap(alias)?
            )),
        }
    }

    fn columnize_columns(&self, columns: &[Column]) -> GrammarResult<String> {
        let wrapped = columns
            .iter()
            .map(|c| self.wrap_column(c))
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(wrapped.join(", "))
    }

    fn wrap_table_ref(&self, table: &TableRef) -> GrammarResult<String> {
        match table {
            TableRef::Name(name) => Ok(self.wrap_table(name)),
            TableRef::Raw(expr) => Ok(expr.as_str().to_string()),
            TableRef::Sub { query, alias } => Ok(format!(
                "({}) as {}",
                self.compile_select(query)?,
                self.wrap_table(alias)
            )),
        }
    }

    // =========================================================================
    // Select
    // =========================================================================

    fn compile_select(&self, query: &Query) -> GrammarResult<String> {
        select_statement(self, query)
    }

    fn compile_components(&self, query: &Query) -> GrammarResult<Components> {
        let mut parts = Components::default();

        if let Some(aggregate) = &query.aggregate {
            parts.aggregate = self.compile_aggregate(query, aggregate)?;
        }
        let star = [Column::Name("*".to_string())];
        let columns = query.columns.as_deref().unwrap_or(&star[..]);
        parts.columns = self.compile_columns(query, columns)?;
        if let Some(from) = &query.from {
            parts.from = self.compile_from(query, from)?;
        }
        if !query.joins.is_empty() {
            parts.joins = self.compile_joins(query, &query.joins)?;
        }
        parts.wheres = self.compile_wheres(query)?;
        if !query.groups.is_empty() {
            parts.groups = self.compile_groups(&query.groups)?;
        }
        if !query.havings.is_empty() {
            parts.havings = self.compile_havings(&query.havings)?;
        }
        if !query.orders.is_empty() {
            parts.orders = self.compile_orders(&query.orders)?;
        }
        if let Some(limit) = query.limit {
            parts.limit = self.compile_limit(limit);
        }
        if let Some(offset) = query.offset {
            parts.offset = self.compile_offset(offset);
        }
        if let Some(lock) = &query.lock {
            parts.lock = self.compile_lock(lock);
        }

        Ok(parts)
    }

    /// An aggregate over a union runs against the union as a derived table.
    fn compile_union_aggregate(&self, query: &Query, aggregate: &Aggregate) -> GrammarResult<String> {
        let sql = self.compile_aggregate(query, aggregate)?;
        let mut inner = query.clone();
        inner.aggregate = None;
        Ok(format!(
            "{} from ({}) as {}",
            sql,
            self.compile_select(&inner)?,
            self.wrap_table("temp_table")
        ))
    }

    fn compile_aggregate(&self, query: &Query, aggregate: &Aggregate) -> GrammarResult<String> {
        let mut column = self.columnize_columns(&aggregate.columns)?;
        match &query.distinct {
            Distinct::Columns(columns) => {
                column = format!("distinct {}", self.columnize_columns(columns)?);
            }
            Distinct::All if column != "*" => column = format!("distinct {}", column),
            _ => {}
        }
        Ok(format!("select {}({}) as aggregate", aggregate.function, column))
    }

    fn compile_columns(&self, query: &Query, columns: &[Column]) -> GrammarResult<String> {
        if query.aggregate.is_some() {
            return Ok(String::new());
        }
        let select = if query.distinct.is_enabled() {
            "select distinct "
        } else {
            "select "
        };
        Ok(format!("{}{}", select, self.columnize_columns(columns)?))
    }

    fn compile_from(&self, _query: &Query, table: &TableRef) -> GrammarResult<String> {
        Ok(format!("from {}", self.wrap_table_ref(table)?))
    }

    fn compile_joins(&self, query: &Query, joins: &[JoinClause]) -> GrammarResult<String> {
        let compiled = joins
            .iter()
            .map(|join| {
                let mut table = self.wrap_table_ref(&join.table)?;
                if !join.joins.is_empty() {
                    table = format!("({} {})", table, self.compile_joins(query, &join.joins)?);
                }
                let on = self.compile_conditions(&join.wheres, Conjunction::On)?;
                Ok(format!("{} join {} {}", join.kind.as_str(), table, on)
                    .trim()
                    .to_string())
            })
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(compiled.join(" "))
    }

    // =========================================================================
    // Conditions
    // =========================================================================

    fn compile_wheres(&self, query: &Query) -> GrammarResult<String> {
        self.compile_conditions(&query.wheres, Conjunction::Where)
    }

    /// `where a = ? or b = ?`; empty when there are no conditions.
    fn compile_conditions(&self, wheres: &[Where], conjunction: Conjunction) -> GrammarResult<String> {
        if wheres.is_empty() {
            return Ok(String::new());
        }
        let parts = wheres
            .iter()
            .map(|w| Ok(format!("{} {}", w.boolean().as_str(), self.compile_where(w, conjunction)?)))
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(format!(
            "{} {}",
            conjunction.as_str(),
            remove_leading_boolean(&parts.join(" "))
        ))
    }

    /// Compile one condition, without its connector.
    fn compile_where(&self, clause: &Where, conjunction: Conjunction) -> GrammarResult<String> {
        match clause {
            Where::Raw { sql, .. } => Ok(sql.clone()),
            Where::Basic {
                column,
                operator,
                value,
                ..
            } => self.where_basic(column, operator, value),
            Where::In { column, values, .. } => self.where_in(column, values),
            Where::NotIn { column, values, .. } => self.where_not_in(column, values),
            Where::InRaw {
                column,
                values,
                not,
                ..
            } => self.where_in_raw(column, values, *not),
            Where::Null { column, .. } => self.where_null(column),
            Where::NotNull { column, .. } => self.where_not_null(column),
            Where::Between {
                column,
                low,
                high,
                not,
                ..
            } => self.where_between(column, low, high, *not),
            Where::BetweenColumns {
                column,
                low,
                high,
                not,
                ..
            } => self.where_between_columns(column, low, high, *not),
            Where::DateBased {
                part,
                column,
                operator,
                value,
                ..
            } => match part {
                DatePart::Date => self.where_date(column, operator, value),
                DatePart::Time => self.where_time(column, operator, value),
                _ => self.date_based_where(*part, column, operator, value),
            },
            Where::Column {
                first,
                operator,
                second,
                ..
            } => Ok(format!(
                "{} {} {}",
                self.wrap_column(first)?,
                operator,
                self.wrap_column(second)?
            )),
            Where::Nested { wheres, .. } => self.where_nested(wheres, conjunction),
            Where::Sub {
                column,
                operator,
                query,
                ..
            } => Ok(format!(
                "{} {} ({})",
                self.wrap_column(column)?,
                operator,
                self.compile_select(query)?
            )),
            Where::Exists { query, .. } => Ok(format!("exists ({})", self.compile_select(query)?)),
            Where::NotExists { query, .. } => {
                Ok(format!("not exists ({})", self.compile_select(query)?))
            }
            Where::RowValues {
                columns,
                operator,
                values,
                ..
            } => Ok(format!(
                "({}) {} ({})",
                self.columnize_columns(columns)?,
                operator,
                self.parameterize(values)
            )),
            Where::JsonBoolean {
                column,
                operator,
                value,
                ..
            } => {
                let column = self.wrap_json_boolean_selector(column)?;
                let value = self.wrap_json_boolean_value(if *value { "true" } else { "false" });
                Ok(format!("{} {} {}", column, operator, value))
            }
            Where::JsonContains {
                column, value, not, ..
            } => {
                let sql = self.compile_json_contains(column, &self.parameter(value))?;
                Ok(if *not { format!("not {}", sql) } else { sql })
            }
            Where::JsonLength {
                column,
                operator,
                value,
                ..
            } => self.compile_json_length(column, operator, &self.parameter(value)),
        }
    }

    fn where_basic(&self, column: &Column, operator: &str, value: &Operand) -> GrammarResult<String> {
        Ok(format!(
            "{} {} {}",
            self.wrap_column(column)?,
            operator.replace('?', "??"),
            self.parameter(value)
        ))
    }

    /// An empty list can never match.
    fn where_in(&self, column: &Column, values: &[Operand]) -> GrammarResult<String> {
        if values.is_empty() {
            return Ok("0 = 1".to_string());
        }
        Ok(format!("{} in ({})", self.wrap_column(column)?, self.parameterize(values)))
    }

    /// An empty list always matches.
    fn where_not_in(&self, column: &Column, values: &[Operand]) -> GrammarResult<String> {
        if values.is_empty() {
            return Ok("1 = 1".to_string());
        }
        Ok(format!("{} not in ({})", self.wrap_column(column)?, self.parameterize(values)))
    }

    fn where_in_raw(&self, column: &Column, values: &[i64], not: bool) -> GrammarResult<String> {
        if values.is_empty() {
            return Ok(if not { "1 = 1" } else { "0 = 1" }.to_string());
        }
        let list = values
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let operator = if not { "not in" } else { "in" };
        Ok(format!("{} {} ({})", self.wrap_column(column)?, operator, list))
    }

    fn where_null(&self, column: &Column) -> GrammarResult<String> {
        Ok(format!("{} is null", self.wrap_column(column)?))
    }

    fn where_not_null(&self, column: &Column) -> GrammarResult<String> {
        Ok(format!("{} is not null", self.wrap_column(column)?))
    }

    fn where_between(
        &self,
        column: &Column,
        low: &Operand,
        high: &Operand,
        not: bool,
    ) -> GrammarResult<String> {
        Ok(format!(
            "{} {} {} and {}",
            self.wrap_column(column)?,
            if not { "not between" } else { "between" },
            self.parameter(low),
            self.parameter(high)
        ))
    }

    fn where_between_columns(
        &self,
        column: &Column,
        low: &Column,
        high: &Column,
        not: bool,
    ) -> GrammarResult<String> {
        Ok(format!(
            "{} {} {} and {}",
            self.wrap_column(column)?,
            if not { "not between" } else { "between" },
            self.wrap_column(low)?,
            self.wrap_column(high)?
        ))
    }

    fn where_date(&self, column: &Column, operator: &str, value: &Operand) -> GrammarResult<String> {
        self.date_based_where(DatePart::Date, column, operator, value)
    }

    fn where_time(&self, column: &Column, operator: &str, value: &Operand) -> GrammarResult<String> {
        self.date_based_where(DatePart::Time, column, operator, value)
    }

    /// `part(column) operator ?`.
    fn date_based_where(
        &self,
        part: DatePart,
        column: &Column,
        operator: &str,
        value: &Operand,
    ) -> GrammarResult<String> {
        Ok(format!(
            "{}({}) {} {}",
            part.as_str(),
            self.wrap_column(column)?,
            operator,
            self.parameter(value)
        ))
    }

    /// `(a = ? or b = ?)`: the nested list without its keyword.
    fn where_nested(&self, wheres: &[Where], conjunction: Conjunction) -> GrammarResult<String> {
        let compiled = self.compile_conditions(wheres, conjunction)?;
        Ok(format!("({})", compiled.get(conjunction.prefix_len()..).unwrap_or("")))
    }

    fn compile_json_contains(&self, _column: &str, _value: &str) -> GrammarResult<String> {
        Err(GrammarError::Unsupported("JSON contains operations"))
    }

    fn compile_json_length(
        &self,
        _column: &str,
        _operator: &str,
        _value: &str,
    ) -> GrammarResult<String> {
        Err(GrammarError::Unsupported("JSON length operations"))
    }

    // =========================================================================
    // Grouping, ordering and paging
    // =========================================================================

    fn compile_groups(&self, groups: &[Column]) -> GrammarResult<String> {
        Ok(format!("group by {}", self.columnize_columns(groups)?))
    }

    fn compile_havings(&self, havings: &[Having]) -> GrammarResult<String> {
        let parts = havings
            .iter()
            .map(|h| self.compile_having(h))
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(format!("having {}", remove_leading_boolean(&parts.join(" "))))
    }

    /// One having condition, with its connector.
    fn compile_having(&self, having: &Having) -> GrammarResult<String> {
        match having {
            Having::Raw { sql, boolean } => Ok(format!("{} {}", boolean.as_str(), sql)),
            Having::Basic {
                column,
                operator,
                value,
                boolean,
            } => Ok(format!(
                "{} {} {} {}",
                boolean.as_str(),
                self.wrap_column(column)?,
                operator,
                self.parameter(value)
            )),
            Having::Between {
                column,
                low,
                high,
                not,
                boolean,
            } => Ok(format!(
                "{} {} {} {} and {}",
                boolean.as_str(),
                self.wrap_column(column)?,
                if *not { "not between" } else { "between" },
                self.parameter(low),
                self.parameter(high)
            )),
            Having::Null { column, boolean } => Ok(format!(
                "{} {} is null",
                boolean.as_str(),
                self.wrap_column(column)?
            )),
            Having::NotNull { column, boolean } => Ok(format!(
                "{} {} is not null",
                boolean.as_str(),
                self.wrap_column(column)?
            )),
        }
    }

    fn compile_orders(&self, orders: &[Order]) -> GrammarResult<String> {
        if orders.is_empty() {
            return Ok(String::new());
        }
        let parts = orders
            .iter()
            .map(|order| match order {
                Order::Column { column, direction } => {
                    Ok(format!("{} {}", self.wrap_column(column)?, direction.as_str()))
                }
                Order::Raw { sql } => Ok(sql.clone()),
                Order::Random { seed } => Ok(self.compile_random(seed.as_deref())),
            })
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(format!("order by {}", parts.join(", ")))
    }

    fn compile_random(&self, _seed: Option<&str>) -> String {
        "RANDOM()".to_string()
    }

    fn compile_limit(&self, limit: u64) -> String {
        format!("limit {}", limit)
    }

    fn compile_offset(&self, offset: u64) -> String {
        format!("offset {}", offset)
    }

    /// Only raw lock clauses are understood by default.
    fn compile_lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::Raw(sql) => sql.clone(),
            Lock::Update | Lock::Shared => String::new(),
        }
    }

    // =========================================================================
    // Unions
    // =========================================================================

    fn compile_unions(&self, query: &Query) -> GrammarResult<String> {
        let mut sql = String::new();
        for union in &query.unions {
            sql.push_str(if union.all { " union all " } else { " union " });
            sql.push_str(&self.wrap_union(&self.compile_select(&union.query)?));
        }
        if !query.union_orders.is_empty() {
            sql.push(' ');
            sql.push_str(&self.compile_orders(&query.union_orders)?);
        }
        if let Some(limit) = query.union_limit {
            sql.push(' ');
            sql.push_str(&self.compile_limit(limit));
        }
        if let Some(offset) = query.union_offset {
            sql.push(' ');
            sql.push_str(&self.compile_offset(offset));
        }
        Ok(sql.trim_start().to_string())
    }

    fn wrap_union(&self, sql: &str) -> String {
        format!("({})", sql)
    }

    /// `select exists(...) as "exists"`.
    fn compile_exists(&self, query: &Query) -> GrammarResult<String> {
        Ok(format!(
            "select exists({}) as {}",
            self.compile_select(query)?,
            self.wrap("exists")?
        ))
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert one or more records; every record uses the first one's keys.
    fn compile_insert(&self, query: &Query, values: &[Record]) -> GrammarResult<String> {
        let table = self.wrap_table_ref(from_table(query)?)?;

        let first = match values.first() {
            Some(first) if !first.is_empty() => first,
            _ => return Ok(self.compile_insert_default_values(&table)),
        };

        let columns = batch_columns(values)?;
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

        Ok(format!(
            "insert into {} ({}) values {}",
            table,
            self.columnize(&columns)?,
            rows
        ))
    }

    fn compile_insert_default_values(&self, table: &str) -> String {
        format!("insert into {} default values", table)
    }

    fn compile_insert_or_ignore(&self, _query: &Query, _values: &[Record]) -> GrammarResult<String> {
        Err(GrammarError::Unsupported("inserting while ignoring errors"))
    }

    fn compile_insert_get_id(
        &self,
        query: &Query,
        values: &Record,
        _sequence: Option<&str>,
    ) -> GrammarResult<String> {
        self.compile_insert(query, slice::from_ref(values))
    }

    /// `insert into t (cols) select ...`.
    fn compile_insert_using(
        &self,
        query: &Query,
        columns: &[String],
        source: &Query,
    ) -> GrammarResult<String> {
        Ok(format!(
            "insert into {} ({}) {}",
            self.wrap_table_ref(from_table(query)?)?,
            self.columnize(columns)?,
            self.compile_select(source)?
        ))
    }

    fn compile_upsert(
        &self,
        _query: &Query,
        _values: &[Record],
        _unique_by: &[String],
        _update: &[UpsertColumn],
    ) -> GrammarResult<String> {
        Err(GrammarError::Unsupported("upserts"))
    }

    // =========================================================================
    // Update
    // =========================================================================

    fn compile_update(&self, query: &Query, values: &Record) -> GrammarResult<String> {
        update_statement(self, query, values)
    }

    fn compile_update_columns(&self, _query: &Query, values: &Record) -> GrammarResult<String> {
        let columns = values
            .iter()
            .map(|(key, value)| Ok(format!("{} = {}", self.wrap(key)?, self.parameter(value))))
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(columns.join(", "))
    }

    fn compile_update_without_joins(
        &self,
        _query: &Query,
        table: &str,
        columns: &str,
        wheres: &str,
    ) -> GrammarResult<String> {
        Ok(format!("update {} set {} {}", table, columns, wheres))
    }

    fn compile_update_with_joins(
        &self,
        query: &Query,
        table: &str,
        columns: &str,
        wheres: &str,
    ) -> GrammarResult<String> {
        let joins = self.compile_joins(query, &query.joins)?;
        Ok(format!("update {} {} set {} {}", table, joins, columns, wheres))
    }

    /// Join bindings, then the assigned values, then everything else but the
    /// select list.
    fn prepare_bindings_for_update(&self, bindings: &Bindings, values: &Record) -> Vec<Value> {
        let mut prepared = bindings.join.clone();
        prepared.extend(values.values().filter_map(Operand::binding).cloned());
        prepared.extend(bindings.flatten_except(&[BindingSlot::Select, BindingSlot::Join]));
        prepared
    }

    // =========================================================================
    // Delete and truncate
    // =========================================================================

    fn compile_delete(&self, query: &Query) -> GrammarResult<String> {
        delete_statement(self, query)
    }

    fn compile_delete_without_joins(
        &self,
        _query: &Query,
        table: &str,
        wheres: &str,
    ) -> GrammarResult<String> {
        Ok(format!("delete from {} {}", table, wheres))
    }

    fn compile_delete_with_joins(
        &self,
        query: &Query,
        table: &str,
        wheres: &str,
    ) -> GrammarResult<String> {
        let alias = table.rsplit_once(" as ").map_or(table, |(_, alias)| alias);
        let joins = self.compile_joins(query, &query.joins)?;
        Ok(format!("delete {} from {} {} {}", alias, table, joins, wheres))
    }

    fn prepare_bindings_for_delete(&self, bindings: &Bindings) -> Vec<Value> {
        bindings.flatten_except(&[BindingSlot::Select])
    }

    /// Statements that empty the table, each with its own bindings.
    fn compile_truncate(&self, query: &Query) -> GrammarResult<Vec<CompiledQuery>> {
        let table = self.wrap_table_ref(from_table(query)?)?;
        Ok(vec![CompiledQuery::new(format!("truncate table {}", table), Vec::new())])
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    fn supports_savepoints(&self) -> bool {
        true
    }

    fn compile_savepoint(&self, name: &str) -> String {
        format!("SAVEPOINT {}", name)
    }

    fn compile_savepoint_rollback(&self, name: &str) -> String {
        format!("ROLLBACK TO SAVEPOINT {}", name)
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    /// Bindings of a compiled select, in placeholder order.
    fn select_bindings(&self, query: &Query) -> Vec<Value> {
        query.get_bindings()
    }

    /// Convert a value into what the driver binds.
    fn prepare_binding(&self, value: Value) -> Value {
        json_text_binding(value)
    }

    fn prepare_bindings(&self, values: Vec<Value>) -> Vec<Value> {
        values.into_iter().map(|v| self.prepare_binding(v)).collect()
    }
}

/// The shared select shape: components, then any unions.
pub fn select_statement<G: QueryGrammar + ?Sized>(grammar: &G, query: &Query) -> GrammarResult<String> {
    if let (false, Some(aggregate)) = (query.unions.is_empty(), &query.aggregate) {
        return grammar.compile_union_aggregate(query, aggregate);
    }

    let mut sql = grammar.compile_components(query)?.concatenate();

    if !query.unions.is_empty() {
        sql = format!("{} {}", grammar.wrap_union(&sql), grammar.compile_unions(query)?);
    }

    Ok(sql.trim().to_string())
}

/// The shared update shape; dispatches on whether the query has joins.
pub fn update_statement<G: QueryGrammar + ?Sized>(
    grammar: &G,
    query: &Query,
    values: &Record,
) -> GrammarResult<String> {
    let table = grammar.wrap_table_ref(from_table(query)?)?;
    let columns = grammar.compile_update_columns(query, values)?;
    let wheres = grammar.compile_wheres(query)?;

    let sql = if query.joins.is_empty() {
        grammar.compile_update_without_joins(query, &table, &columns, &wheres)?
    } else {
        grammar.compile_update_with_joins(query, &table, &columns, &wheres)?
    };
    Ok(sql.trim().to_string())
}

/// The shared delete shape; dispatches on whether the query has joins.
pub fn delete_statement<G: QueryGrammar + ?Sized>(grammar: &G, query: &Query) -> GrammarResult<String> {
    let table = grammar.wrap_table_ref(from_table(query)?)?;
    let wheres = grammar.compile_wheres(query)?;

    let sql = if query.joins.is_empty() {
        grammar.compile_delete_without_joins(query, &table, &wheres)?
    } else {
        grammar.compile_delete_with_joins(query, &table, &wheres)?
    };
    Ok(sql.trim().to_string())
}

/// Column list of a batch insert; every record must carry the same keys.
pub fn batch_columns(values: &[Record]) -> GrammarResult<Vec<String>> {
    let Some(first) = values.first() else {
        return Ok(Vec::new());
    };
    let mismatch = values
        .iter()
        .position(|record| !record.keys().eq(first.keys()));
    if let Some(position) = mismatch {
        return Err(GrammarError::InvalidQuery(format!(
            "record {} of the batch has different columns than the first",
            position + 1
        )));
    }
    Ok(first.keys().cloned().collect())
}

/// Bindings of a batch insert, record by record.
pub fn insert_bindings(values: &[Record]) -> Vec<Value> {
    values
        .iter()
        .flat_map(|record| record.values().filter_map(Operand::binding).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::condition::Conditions;

    #[derive(Debug)]
    struct Ansi;

    impl BaseGrammar for Ansi {
        fn table_prefix(&self) -> &str {
            ""
        }
    }

    impl QueryGrammar for Ansi {}

    #[test]
    fn test_components_concatenate_skips_empty() {
        let parts = Components {
            columns: "select *".into(),
            from: "from \"t\"".into(),
            limit: "limit 1".into(),
            ..Default::default()
        };
        assert_eq!(parts.concatenate(), "select * from \"t\" limit 1");
    }

    #[test]
    fn test_default_select() {
        let query = Query::table("users").where_("id", "=", 1);
        assert_eq!(
            Ansi.compile_select(&query).unwrap(),
            "select * from \"users\" where \"id\" = ?"
        );
    }

    #[test]
    fn test_question_mark_operator_is_escaped() {
        let query = Query::table("docs").where_("tags", "?|", "a");
        assert_eq!(
            Ansi.compile_select(&query).unwrap(),
            "select * from \"docs\" where \"tags\" ??| ?"
        );
    }

    #[test]
    fn test_nested_conditions_strip_keyword() {
        let query = Query::table("t")
            .where_("a", "=", 1)
            .or_where_nested(|q| q.where_("b", "=", 2).where_("c", "=", 3));
        assert_eq!(
            Ansi.compile_select(&query).unwrap(),
            "select * from \"t\" where \"a\" = ? or (\"b\" = ? and \"c\" = ?)"
        );
    }

    #[test]
    fn test_where_not_keeps_negation() {
        let query = Query::table("t").where_not(|q| q.where_("a", "=", 1));
        assert_eq!(
            Ansi.compile_select(&query).unwrap(),
            "select * from \"t\" where not (\"a\" = ?)"
        );
    }

    #[test]
    fn test_json_is_unsupported_by_default() {
        let query = Query::table("t").where_json_contains("tags", serde_json::json!("a"));
        assert_eq!(
            Ansi.compile_select(&query),
            Err(GrammarError::Unsupported("JSON contains operations"))
        );
    }

    #[test]
    fn test_missing_table_is_an_invalid_query() {
        let err = Ansi.compile_delete(&Query::new()).unwrap_err();
        assert!(matches!(err, GrammarError::InvalidQuery(_)));
    }

    #[test]
    fn test_insert_bindings_follow_record_order() {
        let records = vec![
            crate::sql::value::record([("b", 2), ("a", 1)]),
            crate::sql::value::record([("a", 3), ("b", 4)]),
        ];
        assert_eq!(
            insert_bindings(&records),
            vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]
        );
    }
}
