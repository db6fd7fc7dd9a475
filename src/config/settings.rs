//! TOML-based configuration for quill.
//!
//! Supports a config file (quill.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! default = "app"
//!
//! [connections.app]
//! driver = "mysql"
//! database = "${APP_DATABASE}"
//! prefix = "app_"
//! charset = "utf8mb4"
//! collation = "utf8mb4_unicode_ci"
//! engine = "InnoDB"
//!
//! [connections.local]
//! driver = "sqlite"
//! database = "./data/local.sqlite"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::{ConnectionConfig, Driver};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the connection used when none is requested.
    pub default: Option<String>,

    /// Named database connections.
    pub connections: HashMap<String, ConnectionSettings>,
}

/// Connection configuration as written in the settings file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Database driver (mysql, pgsql, sqlite, sqlsrv).
    pub driver: String,

    /// Database name or SQLite path (supports ${ENV_VAR} expansion).
    #[serde(default)]
    pub database: String,

    /// Table prefix.
    #[serde(default)]
    pub prefix: String,

    /// Default schema for this connection.
    #[serde(default)]
    pub schema: Option<String>,

    #[serde(default)]
    pub charset: Option<String>,

    #[serde(default)]
    pub collation: Option<String>,

    #[serde(default)]
    pub engine: Option<String>,
}

impl ConnectionSettings {
    /// Get the driver type.
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        Driver::from_str(&self.driver)
            .map_err(|_| SettingsError::UnsupportedDriver(self.driver.clone()))
    }

    /// Get the database name with environment variables expanded.
    pub fn resolved_database(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.database)
    }

    /// Resolve into a connection config.
    pub fn to_config(&self) -> Result<ConnectionConfig, SettingsError> {
        Ok(ConnectionConfig {
            driver: self.driver_type()?,
            database: self.resolved_database()?,
            prefix: expand_env_vars(&self.prefix)?,
            schema: self.schema.clone(),
            charset: self.charset.clone(),
            collation: self.collation.clone(),
            engine: self.engine.clone(),
        })
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `QUILL_CONFIG`
    /// 2. `./quill.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("QUILL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("quill.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Get the default connection: the one named by `default`, then one
    /// literally called "default", then any.
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(name) = &self.default {
            return self.connections.get_key_value(name).map(|(k, v)| (k.as_str(), v));
        }
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        self.connections.iter().next().map(|(k, v)| (k.as_str(), v))
    }
}

/// Expand environment variables in a string.
///
/// Supports both `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                var_name.push(ch);
                chars.next();
            }
            if var_name.is_empty() {
                // lone $
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
