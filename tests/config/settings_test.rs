//! Tests for loading quill.toml settings from disk.

use quill::config::{Driver, Settings, SettingsError};
use quill::connection::{Connection, SqliteConnection};
use std::env;
use std::fs;
use std::path::PathBuf;

fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = env::temp_dir().join(format!("quill_{}_{}.toml", name, std::process::id()));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_from_file_resolves_connections() {
    env::set_var("QUILL_SETTINGS_TEST_DB", "warehouse");
    let path = write_config(
        "resolve",
        r#"
default = "reporting"

[connections.reporting]
driver = "pgsql"
database = "${QUILL_SETTINGS_TEST_DB}"
prefix = "rpt_"
schema = "analytics"

[connections.legacy]
driver = "mssql"
database = "crm"
"#,
    );

    let settings = Settings::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let (name, reporting) = settings.default_connection().unwrap();
    assert_eq!(name, "reporting");
    let config = reporting.to_config().unwrap();
    assert_eq!(config.driver, Driver::Postgres);
    assert_eq!(config.database, "warehouse");
    assert_eq!(config.prefix, "rpt_");
    assert_eq!(config.schema_or_default(), "analytics");

    let legacy = settings.get_connection("legacy").unwrap().to_config().unwrap();
    assert_eq!(legacy.driver, Driver::SqlServer);
    assert_eq!(legacy.schema_or_default(), "dbo");

    env::remove_var("QUILL_SETTINGS_TEST_DB");
}

#[test]
fn test_missing_file() {
    let path = env::temp_dir().join("quill_settings_test_does_not_exist.toml");
    assert!(matches!(
        Settings::from_file(&path),
        Err(SettingsError::FileNotFound(missing)) if missing == path
    ));
}

#[test]
fn test_malformed_file() {
    let path = write_config("malformed", "[connections.app\ndriver = ");
    let result = Settings::from_file(&path);
    fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(SettingsError::ParseError(_))));
}

#[test]
fn test_missing_env_var_in_database() {
    let path = write_config(
        "missing_env",
        r#"
[connections.app]
driver = "mysql"
database = "${QUILL_SETTINGS_TEST_UNSET_12345}"
"#,
    );
    let settings = Settings::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let app = settings.get_connection("app").unwrap();
    assert!(matches!(
        app.to_config(),
        Err(SettingsError::MissingEnvVar(name)) if name == "QUILL_SETTINGS_TEST_UNSET_12345"
    ));
}

#[test]
fn test_connection_named_default_is_preferred() {
    let path = write_config(
        "named_default",
        r#"
[connections.other]
driver = "mysql"

[connections.default]
driver = "sqlite"
database = ":memory:"
"#,
    );
    let settings = Settings::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let (name, conn) = settings.default_connection().unwrap();
    assert_eq!(name, "default");
    assert_eq!(conn.driver_type().unwrap(), Driver::Sqlite);
}

#[test]
fn test_sqlite_connection_from_settings() {
    let path = write_config(
        "open",
        r#"
[connections.local]
driver = "sqlite"
database = ":memory:"
prefix = "t_"
"#,
    );
    let settings = Settings::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let config = settings.get_connection("local").unwrap().to_config().unwrap();
    let conn = SqliteConnection::open(config).unwrap();
    assert_eq!(conn.config().prefix, "t_");
    assert_eq!(conn.dialect().name(), "sqlite");
}
