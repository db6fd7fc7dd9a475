//! Where and having condition nodes, and the fluent methods that produce them.
//!
//! Every node carries the [`Boolean`] that joins it to the node before it.
//! The grammar strips the leading connector of the first node when it
//! compiles the list.

use serde::{Deserialize, Serialize};

use super::query::{BindingSlot, Query};
use super::value::{Column, Operand, Value};

/// Connector joining a condition to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Boolean {
    #[default]
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
    #[serde(rename = "and not")]
    AndNot,
    #[serde(rename = "or not")]
    OrNot,
}

impl Boolean {
    pub fn as_str(&self) -> &'static str {
        match self {
            Boolean::And => "and",
            Boolean::Or => "or",
            Boolean::AndNot => "and not",
            Boolean::OrNot => "or not",
        }
    }

    /// The negated form used by `where not (...)` groups.
    pub fn negated(self) -> Self {
        match self {
            Boolean::And | Boolean::AndNot => Boolean::AndNot,
            Boolean::Or | Boolean::OrNot => Boolean::OrNot,
        }
    }
}

/// Date component compared by a date-based where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePart {
    Date,
    Time,
    Day,
    Month,
    Year,
}

impl DatePart {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatePart::Date => "date",
            DatePart::Time => "time",
            DatePart::Day => "day",
            DatePart::Month => "month",
            DatePart::Year => "year",
        }
    }
}

/// A where condition node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Where {
    Basic {
        column: Column,
        operator: String,
        value: Operand,
        boolean: Boolean,
    },
    In {
        column: Column,
        values: Vec<Operand>,
        boolean: Boolean,
    },
    NotIn {
        column: Column,
        values: Vec<Operand>,
        boolean: Boolean,
    },
    /// Integer list inlined into the SQL instead of bound.
    InRaw {
        column: Column,
        values: Vec<i64>,
        #[serde(default)]
        not: bool,
        boolean: Boolean,
    },
    Null {
        column: Column,
        boolean: Boolean,
    },
    NotNull {
        column: Column,
        boolean: Boolean,
    },
    Between {
        column: Column,
        low: Operand,
        high: Operand,
        #[serde(default)]
        not: bool,
        boolean: Boolean,
    },
    BetweenColumns {
        column: Column,
        low: Column,
        high: Column,
        #[serde(default)]
        not: bool,
        boolean: Boolean,
    },
    DateBased {
        part: DatePart,
        column: Column,
        operator: String,
        value: Operand,
        boolean: Boolean,
    },
    Column {
        first: Column,
        operator: String,
        second: Column,
        boolean: Boolean,
    },
    Nested {
        wheres: Vec<Where>,
        boolean: Boolean,
    },
    Sub {
        column: Column,
        operator: String,
        query: Box<Query>,
        boolean: Boolean,
    },
    Exists {
        query: Box<Query>,
        boolean: Boolean,
    },
    NotExists {
        query: Box<Query>,
        boolean: Boolean,
    },
    RowValues {
        columns: Vec<Column>,
        operator: String,
        values: Vec<Operand>,
        boolean: Boolean,
    },
    JsonBoolean {
        column: String,
        operator: String,
        value: bool,
        boolean: Boolean,
    },
    JsonContains {
        column: String,
        value: Operand,
        #[serde(default)]
        not: bool,
        boolean: Boolean,
    },
    JsonLength {
        column: String,
        operator: String,
        value: Operand,
        boolean: Boolean,
    },
    Raw {
        sql: String,
        boolean: Boolean,
    },
}

impl Where {
    pub fn boolean(&self) -> Boolean {
        match self {
            Where::Basic { boolean, .. }
            | Where::In { boolean, .. }
            | Where::NotIn { boolean, .. }
            | Where::InRaw { boolean, .. }
            | Where::Null { boolean, .. }
            | Where::NotNull { boolean, .. }
            | Where::Between { boolean, .. }
            | Where::BetweenColumns { boolean, .. }
            | Where::DateBased { boolean, .. }
            | Where::Column { boolean, .. }
            | Where::Nested { boolean, .. }
            | Where::Sub { boolean, .. }
            | Where::Exists { boolean, .. }
            | Where::NotExists { boolean, .. }
            | Where::RowValues { boolean, .. }
            | Where::JsonBoolean { boolean, .. }
            | Where::JsonContains { boolean, .. }
            | Where::JsonLength { boolean, .. }
            | Where::Raw { boolean, .. } => *boolean,
        }
    }
}

/// A having condition node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Having {
    Basic {
        column: Column,
        operator: String,
        value: Operand,
        boolean: Boolean,
    },
    Between {
        column: Column,
        low: Operand,
        high: Operand,
        #[serde(default)]
        not: bool,
        boolean: Boolean,
    },
    Null {
        column: Column,
        boolean: Boolean,
    },
    NotNull {
        column: Column,
        boolean: Boolean,
    },
    Raw {
        sql: String,
        boolean: Boolean,
    },
}

fn bindings_of<'a>(operands: impl IntoIterator<Item = &'a Operand>) -> Vec<Value> {
    operands
        .into_iter()
        .filter_map(Operand::binding)
        .cloned()
        .collect()
}

// =============================================================================
// Fluent where methods
// =============================================================================

/// Fluent where methods shared by [`Query`] and
/// [`JoinClause`](super::join::JoinClause).
///
/// Implementors only say where nodes and their bindings go; every builder
/// method is provided.
pub trait Conditions: Sized {
    fn wheres_mut(&mut self) -> &mut Vec<Where>;

    fn add_where_binding(&mut self, value: Value);

    /// Append a node and the values it binds.
    fn push_where(mut self, clause: Where, bindings: impl IntoIterator<Item = Value>) -> Self {
        self.wheres_mut().push(clause);
        for value in bindings {
            self.add_where_binding(value);
        }
        self
    }

    /// `column operator value`, joined with `boolean`.
    ///
    /// A null value with `=` becomes `is null` (`!=`/`<>` become
    /// `is not null`). A boolean compared against a JSON selector becomes a
    /// JSON boolean comparison with no binding.
    fn where_with(
        self,
        boolean: Boolean,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        let column = column.into();
        let value = value.into();

        if value.is_null() {
            match operator {
                "=" => return self.push_where(Where::Null { column, boolean }, []),
                "!=" | "<>" => return self.push_where(Where::NotNull { column, boolean }, []),
                _ => {}
            }
        }

        let json_boolean = match (&column, &value) {
            (Column::Name(name), Operand::Value(Value::Bool(flag))) if name.contains("->") => {
                Some((name.clone(), *flag))
            }
            _ => None,
        };
        if let Some((column, value)) = json_boolean {
            let clause = Where::JsonBoolean {
                column,
                operator: operator.to_string(),
                value,
                boolean,
            };
            return self.push_where(clause, []);
        }

        let binding = value.binding().cloned();
        self.push_where(
            Where::Basic {
                column,
                operator: operator.to_string(),
                value,
                boolean,
            },
            binding,
        )
    }

    fn where_(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.where_with(Boolean::And, column, operator, value)
    }

    fn or_where(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_with(Boolean::Or, column, operator, value)
    }

    /// Group conditions built by `f` in parentheses.
    fn where_nested_with(self, boolean: Boolean, f: impl FnOnce(Query) -> Query) -> Self {
        let mut nested = f(Query::new());
        if nested.wheres.is_empty() {
            return self;
        }
        let bindings = nested.bindings.take(BindingSlot::Where);
        self.push_where(
            Where::Nested {
                wheres: nested.wheres,
                boolean,
            },
            bindings,
        )
    }

    fn where_nested(self, f: impl FnOnce(Query) -> Query) -> Self {
        self.where_nested_with(Boolean::And, f)
    }

    fn or_where_nested(self, f: impl FnOnce(Query) -> Query) -> Self {
        self.where_nested_with(Boolean::Or, f)
    }

    /// `and not (...)`.
    fn where_not(self, f: impl FnOnce(Query) -> Query) -> Self {
        self.where_nested_with(Boolean::AndNot, f)
    }

    fn or_where_not(self, f: impl FnOnce(Query) -> Query) -> Self {
        self.where_nested_with(Boolean::OrNot, f)
    }

    fn where_column(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        let clause = Where::Column {
            first: first.into(),
            operator: operator.to_string(),
            second: second.into(),
            boolean: Boolean::And,
        };
        self.push_where(clause, [])
    }

    fn or_where_column(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        let clause = Where::Column {
            first: first.into(),
            operator: operator.to_string(),
            second: second.into(),
            boolean: Boolean::Or,
        };
        self.push_where(clause, [])
    }

    fn where_raw<V: Into<Value>>(self, sql: &str, bindings: impl IntoIterator<Item = V>) -> Self {
        let bindings: Vec<Value> = bindings.into_iter().map(Into::into).collect();
        self.push_where(
            Where::Raw {
                sql: sql.to_string(),
                boolean: Boolean::And,
            },
            bindings,
        )
    }

    fn or_where_raw<V: Into<Value>>(
        self,
        sql: &str,
        bindings: impl IntoIterator<Item = V>,
    ) -> Self {
        let bindings: Vec<Value> = bindings.into_iter().map(Into::into).collect();
        self.push_where(
            Where::Raw {
                sql: sql.to_string(),
                boolean: Boolean::Or,
            },
            bindings,
        )
    }

    fn where_in_with<V: Into<Operand>>(
        self,
        boolean: Boolean,
        not: bool,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let column = column.into();
        let values: Vec<Operand> = values.into_iter().map(Into::into).collect();
        let bindings = bindings_of(&values);
        let clause = if not {
            Where::NotIn {
                column,
                values,
                boolean,
            }
        } else {
            Where::In {
                column,
                values,
                boolean,
            }
        };
        self.push_where(clause, bindings)
    }

    fn where_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.where_in_with(Boolean::And, false, column, values)
    }

    fn or_where_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.where_in_with(Boolean::Or, false, column, values)
    }

    fn where_not_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.where_in_with(Boolean::And, true, column, values)
    }

    fn or_where_not_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.where_in_with(Boolean::Or, true, column, values)
    }

    /// `column in (1, 2, 3)` with the integers written into the SQL.
    fn where_integer_in_raw(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = i64>,
    ) -> Self {
        let clause = Where::InRaw {
            column: column.into(),
            values: values.into_iter().collect(),
            not: false,
            boolean: Boolean::And,
        };
        self.push_where(clause, [])
    }

    fn where_integer_not_in_raw(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = i64>,
    ) -> Self {
        let clause = Where::InRaw {
            column: column.into(),
            values: values.into_iter().collect(),
            not: true,
            boolean: Boolean::And,
        };
        self.push_where(clause, [])
    }

    fn where_null(self, column: impl Into<Column>) -> Self {
        let clause = Where::Null {
            column: column.into(),
            boolean: Boolean::And,
        };
        self.push_where(clause, [])
    }

    fn or_where_null(self, column: impl Into<Column>) -> Self {
        let clause = Where::Null {
            column: column.into(),
            boolean: Boolean::Or,
        };
        self.push_where(clause, [])
    }

    fn where_not_null(self, column: impl Into<Column>) -> Self {
        let clause = Where::NotNull {
            column: column.into(),
            boolean: Boolean::And,
        };
        self.push_where(clause, [])
    }

    fn or_where_not_null(self, column: impl Into<Column>) -> Self {
        let clause = Where::NotNull {
            column: column.into(),
            boolean: Boolean::Or,
        };
        self.push_where(clause, [])
    }

    fn where_between_with(
        self,
        boolean: Boolean,
        not: bool,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        let (low, high) = (low.into(), high.into());
        let bindings = bindings_of([&low, &high]);
        let clause = Where::Between {
            column: column.into(),
            low,
            high,
            not,
            boolean,
        };
        self.push_where(clause, bindings)
    }

    fn where_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.where_between_with(Boolean::And, false, column, low, high)
    }

    fn or_where_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.where_between_with(Boolean::Or, false, column, low, high)
    }

    fn where_not_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.where_between_with(Boolean::And, true, column, low, high)
    }

    fn where_between_columns(
        self,
        column: impl Into<Column>,
        low: impl Into<Column>,
        high: impl Into<Column>,
    ) -> Self {
        let clause = Where::BetweenColumns {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            not: false,
            boolean: Boolean::And,
        };
        self.push_where(clause, [])
    }

    /// Compare one component of a date/time column.
    ///
    /// Integer days and months are zero-padded to two digits.
    fn where_date_part(
        self,
        boolean: Boolean,
        part: DatePart,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        let value = match (part, value.into()) {
            (DatePart::Day | DatePart::Month, Operand::Value(Value::Int(n))) => {
                Operand::Value(Value::Text(format!("{:02}", n)))
            }
            (_, other) => other,
        };
        let binding = value.binding().cloned();
        let clause = Where::DateBased {
            part,
            column: column.into(),
            operator: operator.to_string(),
            value,
            boolean,
        };
        self.push_where(clause, binding)
    }

    fn where_date(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_date_part(Boolean::And, DatePart::Date, column, operator, value)
    }

    fn where_time(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_date_part(Boolean::And, DatePart::Time, column, operator, value)
    }

    fn where_day(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_date_part(Boolean::And, DatePart::Day, column, operator, value)
    }

    fn where_month(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_date_part(Boolean::And, DatePart::Month, column, operator, value)
    }

    fn where_year(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.where_date_part(Boolean::And, DatePart::Year, column, operator, value)
    }

    /// `column operator (select ...)`.
    fn where_sub(self, column: impl Into<Column>, operator: &str, query: Query) -> Self {
        let bindings = query.bindings.flatten();
        let clause = Where::Sub {
            column: column.into(),
            operator: operator.to_string(),
            query: Box::new(query),
            boolean: Boolean::And,
        };
        self.push_where(clause, bindings)
    }

    fn where_exists_with(self, boolean: Boolean, not: bool, query: Query) -> Self {
        let bindings = query.bindings.flatten();
        let query = Box::new(query);
        let clause = if not {
            Where::NotExists { query, boolean }
        } else {
            Where::Exists { query, boolean }
        };
        self.push_where(clause, bindings)
    }

    fn where_exists(self, query: Query) -> Self {
        self.where_exists_with(Boolean::And, false, query)
    }

    fn or_where_exists(self, query: Query) -> Self {
        self.where_exists_with(Boolean::Or, false, query)
    }

    fn where_not_exists(self, query: Query) -> Self {
        self.where_exists_with(Boolean::And, true, query)
    }

    fn or_where_not_exists(self, query: Query) -> Self {
        self.where_exists_with(Boolean::Or, true, query)
    }

    /// `(a, b) operator (?, ?)`.
    fn where_row_values<C: Into<Column>, V: Into<Operand>>(
        self,
        columns: impl IntoIterator<Item = C>,
        operator: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Operand> = values.into_iter().map(Into::into).collect();
        let bindings = bindings_of(&values);
        let clause = Where::RowValues {
            columns: columns.into_iter().map(Into::into).collect(),
            operator: operator.to_string(),
            values,
            boolean: Boolean::And,
        };
        self.push_where(clause, bindings)
    }

    /// The JSON document at `column` contains `value`.
    ///
    /// The value is bound as a JSON document; each grammar decides how it is
    /// encoded (see `QueryGrammar::prepare_binding`).
    fn where_json_contains_with(
        self,
        boolean: Boolean,
        not: bool,
        column: &str,
        value: serde_json::Value,
    ) -> Self {
        let value = Operand::Value(Value::Json(value));
        let binding = value.binding().cloned();
        let clause = Where::JsonContains {
            column: column.to_string(),
            value,
            not,
            boolean,
        };
        self.push_where(clause, binding)
    }

    fn where_json_contains(self, column: &str, value: serde_json::Value) -> Self {
        self.where_json_contains_with(Boolean::And, false, column, value)
    }

    fn where_json_doesnt_contain(self, column: &str, value: serde_json::Value) -> Self {
        self.where_json_contains_with(Boolean::And, true, column, value)
    }

    fn where_json_length(self, column: &str, operator: &str, value: impl Into<Operand>) -> Self {
        let value = value.into();
        let binding = value.binding().cloned();
        let clause = Where::JsonLength {
            column: column.to_string(),
            operator: operator.to_string(),
            value,
            boolean: Boolean::And,
        };
        self.push_where(clause, binding)
    }
}
