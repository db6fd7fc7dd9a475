//! Running queries against a [`Connection`].
//!
//! Every method compiles with the connection's grammar, prepares the
//! bindings for that grammar and executes the result.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::sql::grammar::insert_bindings;
use crate::sql::query::{Query, UpsertColumn};
use crate::sql::value::{raw, Column, Operand, Record, Row, Value};

/// Loose truthiness of a value returned by the engine.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Int(i) => *i != 0,
        Value::Float(x) => *x != 0.0,
        Value::Text(s) => !s.is_empty() && s != "0",
        Value::Json(_) => true,
    }
}

impl Query {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Run the select and return every row.
    pub fn get(&self, conn: &dyn Connection) -> Result<Vec<Row>> {
        let grammar = conn.query_grammar();
        let compiled = self.to_sql(grammar.as_ref())?;
        conn.run(&compiled)
    }

    /// Run the select with `limit 1`.
    pub fn first(&self, conn: &dyn Connection) -> Result<Option<Row>> {
        Ok(self.clone().limit(1).get(conn)?.into_iter().next())
    }

    /// Run an aggregate function over the columns and return its value.
    pub fn aggregate<C: Into<Column>>(
        &self,
        conn: &dyn Connection,
        function: &str,
        columns: impl IntoIterator<Item = C>,
    ) -> Result<Value> {
        let rows = self.clone().set_aggregate(function, columns).get(conn)?;
        rows.into_iter()
            .next()
            .and_then(|mut row| row.remove("aggregate"))
            .ok_or_else(|| Error::UnexpectedResult(format!("{} returned no rows", function)))
    }

    pub fn count(&self, conn: &dyn Connection) -> Result<i64> {
        match self.aggregate(conn, "count", ["*"])? {
            Value::Int(n) => Ok(n),
            Value::Float(x) => Ok(x as i64),
            Value::Text(s) => s
                .parse()
                .map_err(|_| Error::UnexpectedResult(format!("count returned {:?}", s))),
            other => Err(Error::UnexpectedResult(format!("count returned {}", other))),
        }
    }

    pub fn max(&self, conn: &dyn Connection, column: &str) -> Result<Value> {
        self.aggregate(conn, "max", [column])
    }

    pub fn min(&self, conn: &dyn Connection, column: &str) -> Result<Value> {
        self.aggregate(conn, "min", [column])
    }

    pub fn sum(&self, conn: &dyn Connection, column: &str) -> Result<Value> {
        self.aggregate(conn, "sum", [column])
    }

    pub fn avg(&self, conn: &dyn Connection, column: &str) -> Result<Value> {
        self.aggregate(conn, "avg", [column])
    }

    /// Whether the select matches at least one row.
    pub fn exists(&self, conn: &dyn Connection) -> Result<bool> {
        let grammar = conn.query_grammar();
        let sql = grammar.compile_exists(self)?;
        let bindings = grammar.prepare_bindings(grammar.select_bindings(self));
        let rows = conn.execute(&sql, &bindings)?;
        Ok(rows
            .first()
            .and_then(|row| row.get("exists"))
            .is_some_and(is_truthy))
    }

    pub fn doesnt_exist(&self, conn: &dyn Connection) -> Result<bool> {
        Ok(!self.exists(conn)?)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert a batch of records.
    pub fn insert(&self, conn: &dyn Connection, values: &[Record]) -> Result<()> {
        let grammar = conn.query_grammar();
        let sql = grammar.compile_insert(self, values)?;
        conn.execute(&sql, &grammar.prepare_bindings(insert_bindings(values)))?;
        Ok(())
    }

    /// Insert a single record; compiles exactly as a one-record batch.
    pub fn insert_one(&self, conn: &dyn Connection, values: &Record) -> Result<()> {
        self.insert(conn, std::slice::from_ref(values))
    }

    /// Insert a batch, skipping rows the engine rejects.
    pub fn insert_or_ignore(&self, conn: &dyn Connection, values: &[Record]) -> Result<()> {
        let grammar = conn.query_grammar();
        let sql = grammar.compile_insert_or_ignore(self, values)?;
        conn.execute(&sql, &grammar.prepare_bindings(insert_bindings(values)))?;
        Ok(())
    }

    /// Insert one record and return its generated id.
    ///
    /// Grammars that return the id from the statement itself (`returning`)
    /// are read from the first row; otherwise the connection reports it.
    pub fn insert_get_id(
        &self,
        conn: &dyn Connection,
        values: &Record,
        sequence: Option<&str>,
    ) -> Result<i64> {
        let grammar = conn.query_grammar();
        let sql = grammar.compile_insert_get_id(self, values, sequence)?;
        let bindings = grammar.prepare_bindings(insert_bindings(std::slice::from_ref(values)));
        let rows = conn.execute(&sql, &bindings)?;

        let column = sequence.unwrap_or("id");
        match rows.first().and_then(|row| row.get(column)) {
            Some(Value::Int(id)) => Ok(*id),
            _ => conn.last_insert_id(),
        }
    }

    /// `insert into ... select ...`.
    pub fn insert_using(
        &self,
        conn: &dyn Connection,
        columns: &[String],
        source: &Query,
    ) -> Result<()> {
        let grammar = conn.query_grammar();
        let sql = grammar.compile_insert_using(self, columns, source)?;
        let bindings = grammar.prepare_bindings(grammar.select_bindings(source));
        conn.execute(&sql, &bindings)?;
        Ok(())
    }

    /// Insert, or update the listed columns when `unique_by` collides.
    ///
    /// An empty batch runs nothing and returns zero.
    pub fn upsert(
        &self,
        conn: &dyn Connection,
        values: &[Record],
        unique_by: &[String],
        update: &[UpsertColumn],
    ) -> Result<usize> {
        if values.is_empty() {
            return Ok(0);
        }

        let grammar = conn.query_grammar();
        let sql = grammar.compile_upsert(self, values, unique_by, update)?;

        let mut bindings = insert_bindings(values);
        bindings.extend(update.iter().filter_map(|column| match column {
            UpsertColumn::Set(_, value) => value.binding().cloned(),
            UpsertColumn::Inserted(_) => None,
        }));

        conn.execute(&sql, &grammar.prepare_bindings(bindings))?;
        Ok(values.len())
    }

    pub fn update(&self, conn: &dyn Connection, values: &Record) -> Result<()> {
        let grammar = conn.query_grammar();
        let sql = grammar.compile_update(self, values)?;
        let bindings = grammar.prepare_bindings_for_update(&self.bindings, values);
        conn.execute(&sql, &grammar.prepare_bindings(bindings))?;
        Ok(())
    }

    /// Add `amount` to a numeric column.
    pub fn increment(&self, conn: &dyn Connection, column: &str, amount: i64) -> Result<()> {
        self.adjust(conn, column, "+", amount)
    }

    pub fn decrement(&self, conn: &dyn Connection, column: &str, amount: i64) -> Result<()> {
        self.adjust(conn, column, "-", amount)
    }

    fn adjust(&self, conn: &dyn Connection, column: &str, operator: &str, amount: i64) -> Result<()> {
        let grammar = conn.query_grammar();
        let expression = format!("{} {} {}", grammar.wrap(column)?, operator, amount);
        let mut values = Record::new();
        values.insert(column.to_string(), Operand::Raw(raw(expression)));
        self.update(conn, &values)
    }

    pub fn delete(&self, conn: &dyn Connection) -> Result<()> {
        let grammar = conn.query_grammar();
        let sql = grammar.compile_delete(self)?;
        let bindings = grammar.prepare_bindings_for_delete(&self.bindings);
        conn.execute(&sql, &grammar.prepare_bindings(bindings))?;
        Ok(())
    }

    /// Empty the table; some engines need more than one statement.
    pub fn truncate(&self, conn: &dyn Connection) -> Result<()> {
        let grammar = conn.query_grammar();
        for statement in grammar.compile_truncate(self)? {
            conn.run(&statement)?;
        }
        Ok(())
    }
}
