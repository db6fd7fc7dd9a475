//! SELECT query representation and its fluent builder.
//!
//! A [`Query`] records everything a grammar needs to compile a statement:
//! selected columns, source table, joins, conditions, grouping, ordering,
//! paging, locking and unions. Bound values are tracked per clause in
//! [`Bindings`] so they can be flattened in placeholder order.

use serde::{Deserialize, Serialize};

use super::condition::{Boolean, Conditions, Having, Where};
use super::grammar::{CompiledQuery, QueryGrammar};
use super::join::{JoinClause, JoinType};
use super::value::{Column, Operand, TableRef, Value};
use crate::error::GrammarResult;

// =============================================================================
// Bindings
// =============================================================================

/// Clause a binding belongs to. Declaration order is flattening order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSlot {
    Select,
    From,
    Join,
    Where,
    GroupBy,
    Having,
    Order,
    Union,
    UnionOrder,
}

impl BindingSlot {
    pub const ALL: [BindingSlot; 9] = [
        BindingSlot::Select,
        BindingSlot::From,
        BindingSlot::Join,
        BindingSlot::Where,
        BindingSlot::GroupBy,
        BindingSlot::Having,
        BindingSlot::Order,
        BindingSlot::Union,
        BindingSlot::UnionOrder,
    ];
}

/// Bound values grouped by the clause that introduced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bindings {
    pub select: Vec<Value>,
    pub from: Vec<Value>,
    pub join: Vec<Value>,
    #[serde(rename = "where")]
    pub where_: Vec<Value>,
    pub group_by: Vec<Value>,
    pub having: Vec<Value>,
    pub order: Vec<Value>,
    pub union: Vec<Value>,
    pub union_order: Vec<Value>,
}

impl Bindings {
    pub fn slot(&self, slot: BindingSlot) -> &[Value] {
        match slot {
            BindingSlot::Select => &self.select,
            BindingSlot::From => &self.from,
            BindingSlot::Join => &self.join,
            BindingSlot::Where => &self.where_,
            BindingSlot::GroupBy => &self.group_by,
            BindingSlot::Having => &self.having,
            BindingSlot::Order => &self.order,
            BindingSlot::Union => &self.union,
            BindingSlot::UnionOrder => &self.union_order,
        }
    }

    pub fn slot_mut(&mut self, slot: BindingSlot) -> &mut Vec<Value> {
        match slot {
            BindingSlot::Select => &mut self.select,
            BindingSlot::From => &mut self.from,
            BindingSlot::Join => &mut self.join,
            BindingSlot::Where => &mut self.where_,
            BindingSlot::GroupBy => &mut self.group_by,
            BindingSlot::Having => &mut self.having,
            BindingSlot::Order => &mut self.order,
            BindingSlot::Union => &mut self.union,
            BindingSlot::UnionOrder => &mut self.union_order,
        }
    }

    pub fn add(&mut self, slot: BindingSlot, value: impl Into<Value>) {
        self.slot_mut(slot).push(value.into());
    }

    pub fn extend(&mut self, slot: BindingSlot, values: impl IntoIterator<Item = Value>) {
        self.slot_mut(slot).extend(values);
    }

    /// Remove and return every value in a slot.
    pub fn take(&mut self, slot: BindingSlot) -> Vec<Value> {
        std::mem::take(self.slot_mut(slot))
    }

    /// All values in placeholder order.
    pub fn flatten(&self) -> Vec<Value> {
        self.flatten_except(&[])
    }

    /// All values in placeholder order, skipping the given slots.
    pub fn flatten_except(&self, skip: &[BindingSlot]) -> Vec<Value> {
        BindingSlot::ALL
            .iter()
            .filter(|slot| !skip.contains(slot))
            .flat_map(|slot| self.slot(*slot).iter().cloned())
            .collect()
    }
}

// =============================================================================
// Clause types
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// One `order by` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Order {
    Column {
        column: Column,
        #[serde(default)]
        direction: Direction,
    },
    Raw {
        sql: String,
    },
    /// Engine-specific random ordering, optionally seeded.
    Random {
        #[serde(default)]
        seed: Option<String>,
    },
}

/// Row locking requested for a select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lock {
    /// Exclusive lock (`for update`).
    Update,
    /// Shared lock.
    Shared,
    /// Engine-specific lock clause, emitted verbatim.
    Raw(String),
}

/// `select distinct` state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distinct {
    #[default]
    Disabled,
    All,
    /// Distinct over specific columns (`distinct on` in Postgres).
    Columns(Vec<Column>),
}

impl Distinct {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Distinct::Disabled)
    }
}

/// Aggregate function replacing the select list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub function: String,
    pub columns: Vec<Column>,
}

/// A query unioned onto this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Union {
    pub query: Box<Query>,
    #[serde(default)]
    pub all: bool,
}

/// What an upsert writes to a column when the row already exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpsertColumn {
    /// Take the value the insert would have written.
    Inserted(String),
    /// Write an explicit value.
    Set(String, Operand),
}

impl From<&str> for UpsertColumn {
    fn from(column: &str) -> Self {
        UpsertColumn::Inserted(column.to_string())
    }
}

impl UpsertColumn {
    pub fn column(&self) -> &str {
        match self {
            UpsertColumn::Inserted(column) | UpsertColumn::Set(column, _) => column,
        }
    }
}

// =============================================================================
// Query
// =============================================================================

/// A SELECT query under construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[must_use = "builders have no effect until used"]
pub struct Query {
    /// `None` selects `*`.
    pub columns: Option<Vec<Column>>,
    pub from: Option<TableRef>,
    pub joins: Vec<JoinClause>,
    pub wheres: Vec<Where>,
    pub groups: Vec<Column>,
    pub havings: Vec<Having>,
    pub orders: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub lock: Option<Lock>,
    pub distinct: Distinct,
    pub aggregate: Option<Aggregate>,
    pub unions: Vec<Union>,
    pub union_orders: Vec<Order>,
    pub union_limit: Option<u64>,
    pub union_offset: Option<u64>,
    pub bindings: Bindings,
}

impl Conditions for Query {
    fn wheres_mut(&mut self) -> &mut Vec<Where> {
        &mut self.wheres
    }

    fn add_where_binding(&mut self, value: Value) {
        self.bindings.add(BindingSlot::Where, value);
    }
}

impl Query {
    /// Create a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a query against a table.
    pub fn table(table: impl Into<TableRef>) -> Self {
        Self::new().from(table)
    }

    // =========================================================================
    // Source
    // =========================================================================

    pub fn from(mut self, table: impl Into<TableRef>) -> Self {
        self.from = Some(table.into());
        self
    }

    pub fn from_raw<V: Into<Value>>(
        mut self,
        sql: &str,
        bindings: impl IntoIterator<Item = V>,
    ) -> Self {
        self.from = Some(TableRef::Raw(super::value::raw(sql)));
        self.bindings
            .extend(BindingSlot::From, bindings.into_iter().map(Into::into));
        self
    }

    /// Select from `(query) as alias`.
    pub fn from_sub(mut self, query: Query, alias: &str) -> Self {
        self.bindings.extend(BindingSlot::From, query.bindings.flatten());
        self.from = Some(TableRef::Sub {
            query: Box::new(query),
            alias: alias.to_string(),
        });
        self
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Replace the select list.
    pub fn select<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self.bindings.take(BindingSlot::Select);
        self
    }

    /// Append to the select list.
    pub fn add_select<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.columns
            .get_or_insert_with(Vec::new)
            .extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn select_raw<V: Into<Value>>(
        mut self,
        sql: &str,
        bindings: impl IntoIterator<Item = V>,
    ) -> Self {
        self.columns
            .get_or_insert_with(Vec::new)
            .push(Column::Raw(super::value::raw(sql)));
        self.bindings
            .extend(BindingSlot::Select, bindings.into_iter().map(Into::into));
        self
    }

    /// Select `(query) as alias`.
    pub fn select_sub(mut self, query: Query, alias: &str) -> Self {
        self.bindings.extend(BindingSlot::Select, query.bindings.flatten());
        self.columns.get_or_insert_with(Vec::new).push(Column::Sub {
            query: Box::new(query),
            alias: alias.to_string(),
        });
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = Distinct::All;
        self
    }

    pub fn distinct_on<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.distinct = Distinct::Columns(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the select list with an aggregate call.
    pub fn set_aggregate<C: Into<Column>>(
        mut self,
        function: &str,
        columns: impl IntoIterator<Item = C>,
    ) -> Self {
        self.aggregate = Some(Aggregate {
            function: function.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        if self.groups.is_empty() {
            self.orders.clear();
            self.bindings.take(BindingSlot::Order);
        }
        self
    }

    // =========================================================================
    // Joins
    // =========================================================================

    /// Attach a prepared join clause.
    pub fn join_clause(mut self, join: JoinClause) -> Self {
        self.bindings
            .extend(BindingSlot::Join, join.bindings());
        self.joins.push(join);
        self
    }

    fn join_on(
        self,
        kind: JoinType,
        table: impl Into<TableRef>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.join_clause(JoinClause::new(kind, table).on(first, operator, second))
    }

    /// `inner join table on first operator second`.
    pub fn join(
        self,
        table: impl Into<TableRef>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.join_on(JoinType::Inner, table, first, operator, second)
    }

    pub fn left_join(
        self,
        table: impl Into<TableRef>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.join_on(JoinType::Left, table, first, operator, second)
    }

    pub fn right_join(
        self,
        table: impl Into<TableRef>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.join_on(JoinType::Right, table, first, operator, second)
    }

    pub fn cross_join(self, table: impl Into<TableRef>) -> Self {
        self.join_clause(JoinClause::new(JoinType::Cross, table))
    }

    /// Join with a bound comparison instead of a column comparison.
    pub fn join_where(
        self,
        table: impl Into<TableRef>,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.join_clause(JoinClause::new(JoinType::Inner, table).where_(column, operator, value))
    }

    /// Build a join with a closure over the clause.
    pub fn join_with(
        self,
        kind: JoinType,
        table: impl Into<TableRef>,
        f: impl FnOnce(JoinClause) -> JoinClause,
    ) -> Self {
        self.join_clause(f(JoinClause::new(kind, table)))
    }

    /// `inner join (query) as alias on first operator second`.
    pub fn join_sub(
        mut self,
        query: Query,
        alias: &str,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.bindings.extend(BindingSlot::Join, query.bindings.flatten());
        let table = TableRef::Sub {
            query: Box::new(query),
            alias: alias.to_string(),
        };
        self.join_on(JoinType::Inner, table, first, operator, second)
    }

    // =========================================================================
    // Grouping
    // =========================================================================

    pub fn group_by<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    fn push_having(mut self, having: Having, bindings: impl IntoIterator<Item = Value>) -> Self {
        self.havings.push(having);
        self.bindings.extend(BindingSlot::Having, bindings);
        self
    }

    fn having_with(
        self,
        boolean: Boolean,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        let value = value.into();
        let binding = value.binding().cloned();
        let having = Having::Basic {
            column: column.into(),
            operator: operator.to_string(),
            value,
            boolean,
        };
        self.push_having(having, binding)
    }

    pub fn having(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.having_with(Boolean::And, column, operator, value)
    }

    pub fn or_having(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.having_with(Boolean::Or, column, operator, value)
    }

    pub fn having_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        let (low, high) = (low.into(), high.into());
        let bindings: Vec<Value> = [&low, &high]
            .into_iter()
            .filter_map(Operand::binding)
            .cloned()
            .collect();
        let having = Having::Between {
            column: column.into(),
            low,
            high,
            not: false,
            boolean: Boolean::And,
        };
        self.push_having(having, bindings)
    }

    pub fn having_null(self, column: impl Into<Column>) -> Self {
        let having = Having::Null {
            column: column.into(),
            boolean: Boolean::And,
        };
        self.push_having(having, [])
    }

    pub fn having_not_null(self, column: impl Into<Column>) -> Self {
        let having = Having::NotNull {
            column: column.into(),
            boolean: Boolean::And,
        };
        self.push_having(having, [])
    }

    pub fn having_raw<V: Into<Value>>(
        self,
        sql: &str,
        bindings: impl IntoIterator<Item = V>,
    ) -> Self {
        let having = Having::Raw {
            sql: sql.to_string(),
            boolean: Boolean::And,
        };
        self.push_having(having, bindings.into_iter().map(Into::into))
    }

    pub fn or_having_raw<V: Into<Value>>(
        self,
        sql: &str,
        bindings: impl IntoIterator<Item = V>,
    ) -> Self {
        let having = Having::Raw {
            sql: sql.to_string(),
            boolean: Boolean::Or,
        };
        self.push_having(having, bindings.into_iter().map(Into::into))
    }

    // =========================================================================
    // Ordering and paging
    // =========================================================================

    /// Orders added after a union apply to the whole union.
    fn push_order(mut self, order: Order, bindings: Vec<Value>) -> Self {
        if self.unions.is_empty() {
            self.orders.push(order);
            self.bindings.extend(BindingSlot::Order, bindings);
        } else {
            self.union_orders.push(order);
            self.bindings.extend(BindingSlot::UnionOrder, bindings);
        }
        self
    }

    pub fn order_by(self, column: impl Into<Column>, direction: Direction) -> Self {
        let order = Order::Column {
            column: column.into(),
            direction,
        };
        self.push_order(order, Vec::new())
    }

    pub fn order_by_desc(self, column: impl Into<Column>) -> Self {
        self.order_by(column, Direction::Desc)
    }

    pub fn latest(self, column: impl Into<Column>) -> Self {
        self.order_by(column, Direction::Desc)
    }

    pub fn oldest(self, column: impl Into<Column>) -> Self {
        self.order_by(column, Direction::Asc)
    }

    pub fn order_by_raw<V: Into<Value>>(
        self,
        sql: &str,
        bindings: impl IntoIterator<Item = V>,
    ) -> Self {
        let order = Order::Raw {
            sql: sql.to_string(),
        };
        self.push_order(order, bindings.into_iter().map(Into::into).collect())
    }

    pub fn in_random_order(self) -> Self {
        self.push_order(Order::Random { seed: None }, Vec::new())
    }

    pub fn in_random_order_seeded(self, seed: impl ToString) -> Self {
        let order = Order::Random {
            seed: Some(seed.to_string()),
        };
        self.push_order(order, Vec::new())
    }

    /// Drop every ordering and its bindings.
    pub fn reorder(mut self) -> Self {
        self.orders.clear();
        self.union_orders.clear();
        self.bindings.take(BindingSlot::Order);
        self.bindings.take(BindingSlot::UnionOrder);
        self
    }

    /// Limits set after a union apply to the whole union.
    pub fn limit(mut self, value: u64) -> Self {
        if self.unions.is_empty() {
            self.limit = Some(value);
        } else {
            self.union_limit = Some(value);
        }
        self
    }

    pub fn offset(mut self, value: u64) -> Self {
        if self.unions.is_empty() {
            self.offset = Some(value);
        } else {
            self.union_offset = Some(value);
        }
        self
    }

    pub fn take(self, value: u64) -> Self {
        self.limit(value)
    }

    pub fn skip(self, value: u64) -> Self {
        self.offset(value)
    }

    /// Page numbers start at 1.
    pub fn for_page(self, page: u64, per_page: u64) -> Self {
        self.offset(page.saturating_sub(1).saturating_mul(per_page))
            .limit(per_page)
    }

    // =========================================================================
    // Unions and locks
    // =========================================================================

    pub fn union(mut self, query: Query) -> Self {
        self.bindings.extend(BindingSlot::Union, query.bindings.flatten());
        self.unions.push(Union {
            query: Box::new(query),
            all: false,
        });
        self
    }

    pub fn union_all(mut self, query: Query) -> Self {
        self.bindings.extend(BindingSlot::Union, query.bindings.flatten());
        self.unions.push(Union {
            query: Box::new(query),
            all: true,
        });
        self
    }

    pub fn lock(mut self, lock: Lock) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn lock_for_update(self) -> Self {
        self.lock(Lock::Update)
    }

    pub fn shared_lock(self) -> Self {
        self.lock(Lock::Shared)
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    /// Every bound value in placeholder order.
    pub fn get_bindings(&self) -> Vec<Value> {
        self.bindings.flatten()
    }

    /// Compile to a select statement with its bindings.
    pub fn to_sql(&self, grammar: &dyn QueryGrammar) -> GrammarResult<CompiledQuery> {
        let sql = grammar.compile_select(self)?;
        Ok(CompiledQuery::new(sql, grammar.prepare_bindings(grammar.select_bindings(self))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::value::raw;

    #[test]
    fn test_bindings_flatten_in_slot_order() {
        let mut bindings = Bindings::default();
        bindings.add(BindingSlot::Order, 5);
        bindings.add(BindingSlot::Where, 2);
        bindings.add(BindingSlot::Select, 1);
        bindings.add(BindingSlot::Having, 4);
        bindings.add(BindingSlot::Join, "j");

        assert_eq!(
            bindings.flatten(),
            vec![
                Value::Int(1),
                Value::Text("j".into()),
                Value::Int(2),
                Value::Int(4),
                Value::Int(5)
            ]
        );
        assert_eq!(
            bindings.flatten_except(&[BindingSlot::Select, BindingSlot::Join]),
            vec![Value::Int(2), Value::Int(4), Value::Int(5)]
        );
    }

    #[test]
    fn test_where_null_shortcut() {
        let query = Query::table("users")
            .where_("deleted_at", "=", Value::Null)
            .where_("email", "<>", Value::Null);
        assert!(matches!(query.wheres[0], Where::Null { .. }));
        assert!(matches!(query.wheres[1], Where::NotNull { .. }));
        assert!(query.get_bindings().is_empty());
    }

    #[test]
    fn test_json_boolean_shortcut() {
        let query = Query::table("users").where_("options->enabled", "=", true);
        assert!(matches!(query.wheres[0], Where::JsonBoolean { value: true, .. }));
        assert!(query.get_bindings().is_empty());
    }

    #[test]
    fn test_raw_operand_has_no_binding() {
        let query = Query::table("users").where_("created_at", "<", raw("now()"));
        assert!(query.get_bindings().is_empty());
    }

    #[test]
    fn test_nested_bindings_merge_into_where() {
        let query = Query::table("users")
            .where_("a", "=", 1)
            .where_nested(|q| q.where_("b", "=", 2).or_where("c", "=", 3));
        assert_eq!(query.wheres.len(), 2);
        assert_eq!(
            query.bindings.slot(BindingSlot::Where),
            &[Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn test_empty_nested_group_is_ignored() {
        let query = Query::table("users").where_nested(|q| q);
        assert!(query.wheres.is_empty());
    }

    #[test]
    fn test_limit_after_union_targets_union() {
        let query = Query::table("a")
            .limit(5)
            .union(Query::table("b"))
            .limit(10)
            .offset(2)
            .order_by("id", Direction::Asc);
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.union_limit, Some(10));
        assert_eq!(query.union_offset, Some(2));
        assert_eq!(query.union_orders.len(), 1);
        assert!(query.orders.is_empty());
    }

    #[test]
    fn test_for_page() {
        let query = Query::table("users").for_page(3, 15);
        assert_eq!(query.limit, Some(15));
        assert_eq!(query.offset, Some(30));

        let far = Query::table("users").for_page(u64::MAX, 100);
        assert_eq!(far.offset, Some(u64::MAX));
    }

    #[test]
    fn test_day_values_are_padded() {
        let query = Query::table("orders").where_day("created_at", "=", 5);
        assert_eq!(query.get_bindings(), vec![Value::Text("05".into())]);
    }

    #[test]
    fn test_select_resets_select_bindings() {
        let query = Query::table("users")
            .select_raw("? as flag", [1])
            .select(["id"]);
        assert!(query.bindings.slot(BindingSlot::Select).is_empty());
        assert_eq!(query.columns, Some(vec![Column::from("id")]));
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "from": "users",
            "wheres": [
                {"type": "basic", "column": "age", "operator": ">", "value": 18, "boolean": "and"},
                {"type": "in", "column": "role", "values": ["admin", "staff"], "boolean": "or"}
            ],
            "orders": [{"type": "column", "column": "name", "direction": "desc"}],
            "limit": 10,
            "bindings": {"where": [18, "admin", "staff"]}
        }"#;
        let query: Query = serde_json::from_str(json).unwrap();
        assert_eq!(query.from, Some(TableRef::from("users")));
        assert_eq!(query.wheres.len(), 2);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.get_bindings().len(), 3);
    }
}
