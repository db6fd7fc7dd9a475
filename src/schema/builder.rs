//! Schema builder: runs blueprints and introspection queries on a
//! connection.

use tracing::debug;

use super::blueprint::Blueprint;
use super::grammar::SchemaGrammar;
use crate::connection::Connection;
use crate::error::Result;
use crate::sql::{Row, Value};

/// Entry point for schema changes on one connection.
///
/// ```ignore
/// let schema = SchemaBuilder::new(&conn);
/// schema.create("users", |table| {
///     table.id();
///     table.string("email", 255).unique();
/// })?;
/// assert!(schema.has_table("users")?);
/// ```
pub struct SchemaBuilder<'a> {
    conn: &'a dyn Connection,
    grammar: Box<dyn SchemaGrammar>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(conn: &'a dyn Connection) -> Self {
        Self {
            conn,
            grammar: conn.schema_grammar(),
        }
    }

    pub fn grammar(&self) -> &dyn SchemaGrammar {
        self.grammar.as_ref()
    }

    fn blueprint(&self, table: &str) -> Blueprint {
        Blueprint::new(table).with_prefix(self.conn.table_prefix())
    }

    fn build(&self, mut blueprint: Blueprint) -> Result<()> {
        debug!(table = %blueprint.table, dialect = %self.conn.dialect(), "building blueprint");
        blueprint.build(self.conn)
    }

    /// Text values of `key` from a listing query.
    fn names(rows: Vec<Row>, key: &str) -> Vec<String> {
        rows.into_iter()
            .filter_map(|mut row| match row.remove(key) {
                Some(Value::Text(name)) => Some(name),
                _ => None,
            })
            .collect()
    }

    // =========================================================================
    // Table operations
    // =========================================================================

    pub fn create(&self, table: &str, define: impl FnOnce(&mut Blueprint)) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.create();
        define(&mut blueprint);
        self.build(blueprint)
    }

    /// Modify an existing table.
    pub fn table(&self, table: &str, define: impl FnOnce(&mut Blueprint)) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        define(&mut blueprint);
        self.build(blueprint)
    }

    pub fn drop(&self, table: &str) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.drop();
        self.build(blueprint)
    }

    pub fn drop_if_exists(&self, table: &str) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.drop_if_exists();
        self.build(blueprint)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut blueprint = self.blueprint(from);
        blueprint.rename(to);
        self.build(blueprint)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn has_table(&self, table: &str) -> Result<bool> {
        let query = self.grammar.compile_table_exists(self.conn.config(), table);
        Ok(!self.conn.run(&query)?.is_empty())
    }

    pub fn get_column_listing(&self, table: &str) -> Result<Vec<String>> {
        let query = self.grammar.compile_column_listing(self.conn.config(), table);
        Ok(Self::names(self.conn.run(&query)?, "column_name"))
    }

    /// Case-insensitive.
    pub fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        self.has_columns(table, &[column])
    }

    pub fn has_columns(&self, table: &str, columns: &[&str]) -> Result<bool> {
        let listing: Vec<String> = self
            .get_column_listing(table)?
            .into_iter()
            .map(|c| c.to_lowercase())
            .collect();
        Ok(columns.iter().all(|c| listing.contains(&c.to_lowercase())))
    }

    /// Full names of every table in the database.
    pub fn get_all_tables(&self) -> Result<Vec<String>> {
        let query = self.grammar.compile_get_all_tables(self.conn.config());
        Ok(Self::names(self.conn.run(&query)?, "table_name"))
    }

    pub fn drop_all_tables(&self) -> Result<()> {
        let tables = self.get_all_tables()?;
        if tables.is_empty() {
            return Ok(());
        }

        self.disable_foreign_key_constraints()?;
        for statement in self.grammar.compile_drop_all_tables(&tables) {
            self.conn.execute(&statement, &[])?;
        }
        self.enable_foreign_key_constraints()
    }

    pub fn enable_foreign_key_constraints(&self) -> Result<()> {
        self.conn
            .execute(&self.grammar.compile_enable_foreign_key_constraints(), &[])?;
        Ok(())
    }

    pub fn disable_foreign_key_constraints(&self) -> Result<()> {
        self.conn
            .execute(&self.grammar.compile_disable_foreign_key_constraints(), &[])?;
        Ok(())
    }
}
