//! Join clauses.

use serde::{Deserialize, Serialize};

use super::condition::{Conditions, Where};
use super::value::{Column, TableRef, Value};

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Cross => "cross",
        }
    }
}

/// A join: target table, its `on` conditions, and optionally nested joins
/// that are parenthesized together with the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use = "builders have no effect until used"]
pub struct JoinClause {
    pub kind: JoinType,
    pub table: TableRef,
    #[serde(default)]
    pub wheres: Vec<Where>,
    #[serde(default)]
    pub joins: Vec<JoinClause>,
    /// Values bound by nested joins.
    #[serde(default)]
    pub join_bindings: Vec<Value>,
    /// Values bound by the `on` conditions.
    #[serde(default)]
    pub where_bindings: Vec<Value>,
}

impl JoinClause {
    pub fn new(kind: JoinType, table: impl Into<TableRef>) -> Self {
        Self {
            kind,
            table: table.into(),
            wheres: Vec::new(),
            joins: Vec::new(),
            join_bindings: Vec::new(),
            where_bindings: Vec::new(),
        }
    }

    /// All bound values in placeholder order: nested joins compile inside
    /// the parenthesized target, ahead of the `on` clause.
    pub fn bindings(&self) -> Vec<Value> {
        self.join_bindings
            .iter()
            .chain(&self.where_bindings)
            .cloned()
            .collect()
    }

    /// `on first operator second`.
    pub fn on(self, first: impl Into<Column>, operator: &str, second: impl Into<Column>) -> Self {
        self.where_column(first, operator, second)
    }

    pub fn or_on(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.or_where_column(first, operator, second)
    }

    /// Nest another join inside this one: `join (a inner join b on ...) on ...`.
    pub fn join(mut self, join: JoinClause) -> Self {
        self.join_bindings.extend(join.bindings());
        self.joins.push(join);
        self
    }
}

impl Conditions for JoinClause {
    fn wheres_mut(&mut self) -> &mut Vec<Where> {
        &mut self.wheres
    }

    fn add_where_binding(&mut self, value: Value) {
        self.where_bindings.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::condition::Boolean;

    #[test]
    fn test_on_collects_column_conditions() {
        let join = JoinClause::new(JoinType::Left, "contacts")
            .on("users.id", "=", "contacts.user_id")
            .or_on("users.email", "=", "contacts.email");
        assert_eq!(join.wheres.len(), 2);
        assert!(matches!(join.wheres[1], Where::Column { boolean: Boolean::Or, .. }));
        assert!(join.bindings().is_empty());
    }

    #[test]
    fn test_where_on_join_binds() {
        let join = JoinClause::new(JoinType::Inner, "contacts")
            .on("users.id", "=", "contacts.user_id")
            .where_("contacts.active", "=", 1);
        assert_eq!(join.bindings(), vec![Value::Int(1)]);
    }

    #[test]
    fn test_nested_join_carries_bindings() {
        let inner = JoinClause::new(JoinType::Inner, "b").where_("b.kind", "=", "x");
        let outer = JoinClause::new(JoinType::Inner, "a").join(inner);
        assert_eq!(outer.joins.len(), 1);
        assert_eq!(outer.bindings(), vec![Value::Text("x".into())]);
    }

    #[test]
    fn test_nested_join_bindings_precede_on_bindings() {
        let outer = JoinClause::new(JoinType::Inner, "a")
            .where_("a.x", "=", 1)
            .join(JoinClause::new(JoinType::Inner, "b").where_("b.k", "=", "x"))
            .where_("a.y", "=", 2);
        assert_eq!(
            outer.bindings(),
            vec![Value::Text("x".into()), Value::Int(1), Value::Int(2)]
        );
    }
}
