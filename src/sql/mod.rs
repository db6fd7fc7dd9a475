//! Query building and compilation.
//!
//! - [`query`] - the fluent [`Query`] builder and its binding slots
//! - [`condition`] - where/having nodes and the [`Conditions`] builder trait
//! - [`join`] - join clauses
//! - [`value`] - bound values, raw expressions, column and table references
//! - [`grammar`] - per-dialect compilation into SQL text
//!
//! Running a query against a [`Connection`](crate::connection::Connection)
//! lives in the private `execute` module as inherent methods on [`Query`].

pub mod condition;
mod execute;
pub mod grammar;
pub mod join;
pub mod query;
pub mod value;

#[cfg(test)]
pub mod test_utils;

pub use condition::{Boolean, Conditions, DatePart, Having, Where};
pub use grammar::{
    BaseGrammar, CompiledQuery, Dialect, MySqlGrammar, PostgresGrammar, QueryGrammar,
    SqlServerGrammar, SqliteGrammar,
};
pub use join::{JoinClause, JoinType};
pub use query::{
    Aggregate, BindingSlot, Bindings, Direction, Distinct, Lock, Order, Query, Union, UpsertColumn,
};
pub use value::{raw, record, Column, Expression, Operand, Record, Row, TableRef, Value};
