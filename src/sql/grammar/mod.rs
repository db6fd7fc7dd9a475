//! Query grammars: compile a [`Query`](super::query::Query) into dialect SQL.
//!
//! Each supported engine has one grammar struct that implements
//! [`QueryGrammar`]. The trait defaults produce the shared SQL shape; dialects
//! override only the hooks where their syntax differs:
//!
//! | Concern | MySQL | Postgres | SQLite | SQL Server |
//! |---------|-------|----------|--------|------------|
//! | Identifier quote | `` ` `` | `"` | `"` | `[]` |
//! | Paging | `limit`/`offset` | `limit`/`offset` | `limit`/`offset` | `top` / `row_number()` |
//! | Random order | `RAND()` | `RANDOM()` | `RANDOM()` | `NEWID()` |
//! | JSON extract | `json_extract` | `->`/`->>` | `json_extract` | `json_value` |
//! | Upsert | `on duplicate key` | `on conflict` | `on conflict` | `merge` |

mod base;
pub mod helpers;
mod mysql;
mod postgres;
mod query;
mod sqlite;
mod sqlserver;

pub use base::{wrap_table_name, BaseGrammar};
pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use query::{
    batch_columns, delete_statement, insert_bindings, select_statement, update_statement,
    Components, Conjunction, QueryGrammar,
};
pub use sqlite::SqliteGrammar;
pub use sqlserver::SqlServerGrammar;

use serde::{Deserialize, Serialize};
use std::fmt;

use super::value::Value;

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "mariadb")]
    MySql,
    #[serde(alias = "pgsql", alias = "postgresql")]
    Postgres,
    #[serde(alias = "sqlite3")]
    Sqlite,
    #[serde(alias = "sqlsrv", alias = "mssql")]
    SqlServer,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::MySql,
        Dialect::Postgres,
        Dialect::Sqlite,
        Dialect::SqlServer,
    ];

    /// Dialect name for display/logging.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::SqlServer => "sqlserver",
        }
    }

    /// The query grammar for this engine with the given table prefix.
    pub fn query_grammar(&self, prefix: &str) -> Box<dyn QueryGrammar> {
        match self {
            Dialect::MySql => Box::new(MySqlGrammar::new(prefix)),
            Dialect::Postgres => Box::new(PostgresGrammar::new(prefix)),
            Dialect::Sqlite => Box::new(SqliteGrammar::new(prefix)),
            Dialect::SqlServer => Box::new(SqlServerGrammar::new(prefix)),
        }
    }

    /// The schema grammar for this engine with the given table prefix.
    pub fn schema_grammar(&self, prefix: &str) -> Box<dyn crate::schema::SchemaGrammar> {
        crate::schema::grammar::for_dialect(*self, prefix)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compiled statement and the values for its placeholders, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
