//! Quill CLI - Compile JSON-described queries and blueprints to SQL
//!
//! Usage:
//!   quill query <query.json> [--dialect <dialect>] [--prefix <prefix>]
//!   quill schema <blueprint.json> [--dialect <dialect>] [--connection <name>] [--execute]
//!
//! Examples:
//!   quill query users.json --dialect sqlserver
//!   quill schema create_users.json --dialect mysql --output json
//!   quill schema create_users.json --connection local --execute

use clap::{Parser, Subcommand, ValueEnum};
use quill::config::{ConnectionConfig, Driver, Settings};
use quill::connection::{Connection, SqliteConnection};
use quill::schema::Blueprint;
use quill::sql::{CompiledQuery, Dialect, Query};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Quill - A multi-dialect SQL query and schema grammar compiler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON query description to a select statement
    Query {
        /// Path to the query .json file
        file: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Compile a JSON blueprint to DDL statements
    Schema {
        /// Path to the blueprint .json file
        file: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,

        /// Run the statements (SQLite connections only)
        #[arg(long)]
        execute: bool,
    },
}

#[derive(clap::Args)]
struct Target {
    /// SQL dialect to generate (ignored when --connection is given)
    #[arg(short, long, default_value = "mysql")]
    dialect: DialectArg,

    /// Table prefix (ignored when --connection is given)
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Named connection from quill.toml
    #[arg(short, long)]
    connection: Option<String>,
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Mysql,
    Postgres,
    Sqlite,
    Sqlserver,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Sqlserver => Dialect::SqlServer,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// SQL statements only
    Sql,
    /// Statements with their bindings as JSON
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            file,
            target,
            output,
        } => cmd_query(&file, target, output),
        Commands::Schema {
            file,
            target,
            output,
            execute,
        } => cmd_schema(&file, target, output, execute),
    }
}

/// Resolve the connection config from quill.toml or the command line.
fn resolve_config(target: Target) -> Result<ConnectionConfig, String> {
    match target.connection {
        Some(name) => {
            let settings = Settings::load().map_err(|e| e.to_string())?;
            let connection = settings.get_connection(&name).map_err(|e| e.to_string())?;
            info!(connection = %name, driver = %connection.driver, "using configured connection");
            connection.to_config().map_err(|e| e.to_string())
        }
        None => {
            let dialect: Dialect = target.dialect.into();
            Ok(ConnectionConfig::new(Driver::from(dialect), "").with_prefix(target.prefix))
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(file: &Path) -> Result<T, String> {
    let source = fs::read_to_string(file)
        .map_err(|e| format!("Error reading file '{}': {}", file.display(), e))?;
    serde_json::from_str(&source).map_err(|e| format!("Error parsing '{}': {}", file.display(), e))
}

fn print_statements(statements: &[CompiledQuery], output: OutputFormat) -> Result<(), String> {
    match output {
        OutputFormat::Sql => {
            for statement in statements {
                println!("{};", statement.sql);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(statements).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn cmd_query(file: &Path, target: Target, output: OutputFormat) -> ExitCode {
    match compile_query(file, target, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn compile_query(file: &Path, target: Target, output: OutputFormat) -> Result<(), String> {
    let config = resolve_config(target)?;
    let query: Query = read_json(file)?;
    let grammar = config.driver.dialect().query_grammar(&config.prefix);
    let compiled = query.to_sql(grammar.as_ref()).map_err(|e| e.to_string())?;
    debug!(bindings = compiled.bindings.len(), "compiled query");
    print_statements(&[compiled], output)
}

fn cmd_schema(file: &Path, target: Target, output: OutputFormat, execute: bool) -> ExitCode {
    match compile_schema(file, target, output, execute) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Schema error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn compile_schema(file: &Path, target: Target, output: OutputFormat, execute: bool) -> Result<(), String> {
    let config = resolve_config(target)?;
    let mut blueprint: Blueprint = read_json(file)?;
    blueprint.prefix = config.prefix.clone();

    if execute {
        if config.driver != Driver::Sqlite {
            return Err(format!(
                "--execute needs a sqlite connection, not {}",
                config.driver.as_str()
            ));
        }
        let conn = SqliteConnection::open(config).map_err(|e| e.to_string())?;
        blueprint.build(&conn).map_err(|e| e.to_string())?;
        info!(table = %blueprint.table, database = %conn.config().database, "schema applied");
        return Ok(());
    }

    let grammar = config.driver.dialect().schema_grammar(&config.prefix);
    let statements: Vec<CompiledQuery> = blueprint
        .to_sql(&config, grammar.as_ref())
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(|sql| CompiledQuery::new(sql, Vec::new()))
        .collect();
    print_statements(&statements, output)
}
