//! Database connections.
//!
//! A [`Connection`] runs compiled statements and hands back rows. It also
//! owns the configuration the grammars read: the dialect and the table
//! prefix.
//!
//! - [`SqliteConnection`] executes against SQLite through rusqlite
//! - [`PretendConnection`] records statements without running them, for dry
//!   runs and for compiling against engines with no live driver

mod pretend;
mod sqlite;

pub use pretend::PretendConnection;
pub use sqlite::SqliteConnection;

use crate::config::ConnectionConfig;
use crate::error::{GrammarError, Result};
use crate::schema::SchemaGrammar;
use crate::sql::{CompiledQuery, Dialect, QueryGrammar, Row, Value};

/// A live (or pretend) database connection.
pub trait Connection {
    fn config(&self) -> &ConnectionConfig;

    /// Run one statement and return every row it produces.
    ///
    /// Statements that produce no rows return an empty vector.
    fn execute(&self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>>;

    /// Id generated by the most recent insert.
    fn last_insert_id(&self) -> Result<i64>;

    fn table_prefix(&self) -> &str {
        &self.config().prefix
    }

    fn dialect(&self) -> Dialect {
        self.config().driver.dialect()
    }

    fn query_grammar(&self) -> Box<dyn QueryGrammar> {
        self.dialect().query_grammar(self.table_prefix())
    }

    fn schema_grammar(&self) -> Box<dyn SchemaGrammar> {
        self.dialect().schema_grammar(self.table_prefix())
    }

    fn run(&self, statement: &CompiledQuery) -> Result<Vec<Row>> {
        self.execute(&statement.sql, &statement.bindings)
    }

    /// Open a savepoint inside the current transaction.
    fn savepoint(&self, name: &str) -> Result<()> {
        let grammar = self.query_grammar();
        if !grammar.supports_savepoints() {
            return Err(GrammarError::Unsupported("savepoints").into());
        }
        self.execute(&grammar.compile_savepoint(name), &[])?;
        Ok(())
    }

    /// Roll back to a savepoint opened with [`Connection::savepoint`].
    fn rollback_to_savepoint(&self, name: &str) -> Result<()> {
        let grammar = self.query_grammar();
        if !grammar.supports_savepoints() {
            return Err(GrammarError::Unsupported("savepoints").into());
        }
        self.execute(&grammar.compile_savepoint_rollback(name), &[])?;
        Ok(())
    }
}
