//! SQLite connection backed by rusqlite.

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::params_from_iter;
use tracing::debug;

use super::Connection;
use crate::config::{ConnectionConfig, ConnectionError, Driver};
use crate::error::{Error, Result};
use crate::sql::{Row, Value};

/// A SQLite database opened from a [`ConnectionConfig`].
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    config: ConnectionConfig,
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqliteConnection {
    /// Open the database named by the config; `:memory:` opens an in-memory
    /// database.
    pub fn open(config: ConnectionConfig) -> Result<Self> {
        if config.driver != Driver::Sqlite {
            return Err(ConnectionError::InvalidConfig(format!(
                "driver {} cannot open a SQLite database",
                config.driver_name()
            ))
            .into());
        }

        let conn = if config.database == ":memory:" {
            rusqlite::Connection::open_in_memory()?
        } else {
            rusqlite::Connection::open(&config.database)?
        };
        debug!(database = %config.database, "opened sqlite connection");

        Ok(Self { conn, config })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::open(ConnectionConfig::sqlite_memory())
    }

    /// Open an in-memory database with a table prefix.
    pub fn open_in_memory_with_prefix(prefix: &str) -> Result<Self> {
        Self::open(ConnectionConfig::sqlite_memory().with_prefix(prefix))
    }

    /// Run several statements with no bindings.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(|source| Error::Query {
            sql: sql.to_string(),
            source,
        })
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(x) => SqlValue::Real(*x),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Json(doc) => SqlValue::Text(doc.to_string()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(x) => Value::Float(x),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

impl Connection for SqliteConnection {
    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn execute(&self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>> {
        debug!(sql, bindings = bindings.len(), "executing statement");

        let query_error = |source| Error::Query {
            sql: sql.to_string(),
            source,
        };

        let mut statement = self.conn.prepare(sql).map_err(query_error)?;
        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = statement
            .query(params_from_iter(bindings.iter().map(to_sql_value)))
            .map_err(query_error)?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(query_error)? {
            let mut record = Row::new();
            for (index, name) in columns.iter().enumerate() {
                let value = row.get_ref(index).map_err(query_error)?;
                record.insert(name.clone(), from_sql_value(value));
            }
            result.push(record);
        }

        Ok(result)
    }

    fn last_insert_id(&self) -> Result<i64> {
        Ok(self.conn.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_returns_rows() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch("create table t (id integer primary key, name text)")
            .unwrap();
        conn.execute("insert into t (name) values (?)", &[Value::from("a")])
            .unwrap();
        assert_eq!(conn.last_insert_id().unwrap(), 1);

        let rows = conn.execute("select id, name from t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], Value::Text("a".into()));
        assert_eq!(rows[0]["id"], Value::Int(1));
    }

    #[test]
    fn test_failed_statement_reports_sql() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        let err = conn.execute("select * from missing", &[]).unwrap_err();
        assert!(err.to_string().contains("(SQL: select * from missing)"));
    }

    #[test]
    fn test_rejects_other_drivers() {
        let config = ConnectionConfig::new(Driver::MySql, "app");
        assert!(SqliteConnection::open(config).is_err());
    }
}
