//! Database connection configuration.
//!
//! Supports configuration via environment variables:
//! - `QUILL_DB_DRIVER`: Database driver (mysql, pgsql, sqlite, sqlsrv)
//! - `QUILL_DB_NAME`: Database name (file path for SQLite)
//! - `QUILL_DB_PREFIX`: Table prefix (optional)
//! - `QUILL_DB_SCHEMA`: Default schema (optional)

use std::env;

use crate::sql::Dialect;

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported driver: {0}. Supported: mysql, pgsql, sqlite, sqlsrv")]
    UnsupportedDriver(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// MySQL / MariaDB
    MySql,
    /// PostgreSQL
    Postgres,
    /// SQLite (file or in-memory)
    Sqlite,
    /// Microsoft SQL Server
    SqlServer,
}

impl Driver {
    /// Parse driver from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConnectionError> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Driver::MySql),
            "pgsql" | "postgres" | "postgresql" => Ok(Driver::Postgres),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "sqlsrv" | "sqlserver" | "mssql" => Ok(Driver::SqlServer),
            other => Err(ConnectionError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Canonical driver name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::MySql => "mysql",
            Driver::Postgres => "pgsql",
            Driver::Sqlite => "sqlite",
            Driver::SqlServer => "sqlsrv",
        }
    }

    /// SQL dialect spoken by this driver.
    pub fn dialect(&self) -> Dialect {
        match self {
            Driver::MySql => Dialect::MySql,
            Driver::Postgres => Dialect::Postgres,
            Driver::Sqlite => Dialect::Sqlite,
            Driver::SqlServer => Dialect::SqlServer,
        }
    }
}

impl From<Dialect> for Driver {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::MySql => Driver::MySql,
            Dialect::Postgres => Driver::Postgres,
            Dialect::Sqlite => Driver::Sqlite,
            Dialect::SqlServer => Driver::SqlServer,
        }
    }
}

/// Database connection configuration.
///
/// Everything the grammars read from a connection lives here: the table
/// prefix, and the defaults MySQL applies to `create table`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    /// Database driver.
    pub driver: Driver,
    /// Database name, or the file path for SQLite.
    pub database: String,
    /// Prefix prepended to every table name.
    pub prefix: String,
    /// Default schema (Postgres).
    pub schema: Option<String>,
    /// Default character set for new tables (MySQL).
    pub charset: Option<String>,
    /// Default collation for new tables (MySQL).
    pub collation: Option<String>,
    /// Default storage engine for new tables (MySQL).
    pub engine: Option<String>,
}

impl ConnectionConfig {
    /// Create a config for the given driver with no prefix.
    pub fn new(driver: Driver, database: impl Into<String>) -> Self {
        Self {
            driver,
            database: database.into(),
            prefix: String::new(),
            schema: None,
            charset: None,
            collation: None,
            engine: None,
        }
    }

    /// Create a config for an in-memory SQLite database.
    pub fn sqlite_memory() -> Self {
        Self::new(Driver::Sqlite, ":memory:")
    }

    /// Set the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `QUILL_DB_DRIVER`: mysql, pgsql, sqlite or sqlsrv
    ///
    /// Optional:
    /// - `QUILL_DB_NAME`: database name (defaults to `:memory:` for SQLite)
    /// - `QUILL_DB_PREFIX`, `QUILL_DB_SCHEMA`, `QUILL_DB_CHARSET`,
    ///   `QUILL_DB_COLLATION`, `QUILL_DB_ENGINE`
    pub fn from_env() -> Result<Self, ConnectionError> {
        let driver_str = env::var("QUILL_DB_DRIVER")
            .map_err(|_| ConnectionError::MissingEnvVar("QUILL_DB_DRIVER".to_string()))?;

        let driver = Driver::from_str(&driver_str)?;

        let database = match driver {
            Driver::Sqlite => env::var("QUILL_DB_NAME").unwrap_or_else(|_| ":memory:".to_string()),
            _ => env::var("QUILL_DB_NAME")
                .map_err(|_| ConnectionError::MissingEnvVar("QUILL_DB_NAME".to_string()))?,
        };

        Ok(Self {
            driver,
            database,
            prefix: env::var("QUILL_DB_PREFIX").unwrap_or_default(),
            schema: env::var("QUILL_DB_SCHEMA").ok(),
            charset: env::var("QUILL_DB_CHARSET").ok(),
            collation: env::var("QUILL_DB_COLLATION").ok(),
            engine: env::var("QUILL_DB_ENGINE").ok(),
        })
    }

    /// Schema used for introspection, falling back to the driver default.
    pub fn schema_or_default(&self) -> &str {
        match (&self.schema, self.driver) {
            (Some(schema), _) => schema,
            (None, Driver::SqlServer) => "dbo",
            (None, _) => "public",
        }
    }

    /// Get the driver name.
    pub fn driver_name(&self) -> &'static str {
        self.driver.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_parsing() {
        assert_eq!(Driver::from_str("mysql").unwrap(), Driver::MySql);
        assert_eq!(Driver::from_str("pgsql").unwrap(), Driver::Postgres);
        assert_eq!(Driver::from_str("Postgres").unwrap(), Driver::Postgres);
        assert_eq!(Driver::from_str("sqlite").unwrap(), Driver::Sqlite);
        assert_eq!(Driver::from_str("mssql").unwrap(), Driver::SqlServer);
        assert!(Driver::from_str("duckdb").is_err());
    }

    #[test]
    fn test_driver_dialect() {
        assert_eq!(Driver::SqlServer.dialect(), Dialect::SqlServer);
        assert_eq!(Driver::from(Dialect::Sqlite), Driver::Sqlite);
    }

    #[test]
    fn test_prefix_builder() {
        let config = ConnectionConfig::sqlite_memory().with_prefix("app_");
        assert_eq!(config.prefix, "app_");
        assert_eq!(config.database, ":memory:");
        assert_eq!(config.driver_name(), "sqlite");
    }

    #[test]
    fn test_default_schema() {
        let pg = ConnectionConfig::new(Driver::Postgres, "app");
        assert_eq!(pg.schema_or_default(), "public");

        let mut sqlsrv = ConnectionConfig::new(Driver::SqlServer, "app");
        assert_eq!(sqlsrv.schema_or_default(), "dbo");
        sqlsrv.schema = Some("sales".to_string());
        assert_eq!(sqlsrv.schema_or_default(), "sales");
    }
}
