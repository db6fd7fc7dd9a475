//! Schema grammars: compile blueprint commands into DDL.
//!
//! [`SchemaGrammar::compile_command`] dispatches each command to its
//! `compile_*` method. A method that returns no statements means the dialect
//! has nothing to run for that command; the command is skipped.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

pub use mysql::MySqlSchemaGrammar;
pub use postgres::PostgresSchemaGrammar;
pub use sqlite::SqliteSchemaGrammar;
pub use sqlserver::SqlServerSchemaGrammar;

use super::blueprint::Blueprint;
use super::column::{ColumnDefinition, ColumnType};
use super::command::{Command, ForeignKey, IndexCommand, IndexKind};
use crate::config::ConnectionConfig;
use crate::error::{GrammarError, GrammarResult};
use crate::sql::grammar::helpers::{quote_string, quote_string_list};
use crate::sql::grammar::BaseGrammar;
use crate::sql::{CompiledQuery, Dialect, Operand, Value};

/// Schema grammar for a dialect.
pub fn for_dialect(dialect: Dialect, prefix: &str) -> Box<dyn SchemaGrammar> {
    match dialect {
        Dialect::MySql => Box::new(MySqlSchemaGrammar::new(prefix)),
        Dialect::Postgres => Box::new(PostgresSchemaGrammar::new(prefix)),
        Dialect::Sqlite => Box::new(SqliteSchemaGrammar::new(prefix)),
        Dialect::SqlServer => Box::new(SqlServerSchemaGrammar::new(prefix)),
    }
}

/// Column modifiers, applied in the order a grammar lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Unsigned,
    Charset,
    Collate,
    VirtualAs,
    StoredAs,
    Nullable,
    Default,
    Increment,
    Comment,
    After,
    First,
    Persisted,
}

/// Render a column default: raw SQL as written, booleans as `'1'`/`'0'`,
/// everything else quoted.
pub fn default_value(value: &Operand) -> String {
    match value {
        Operand::Raw(expr) => expr.as_str().to_string(),
        Operand::Value(value) => match value {
            Value::Null => "null".to_string(),
            Value::Bool(flag) => if *flag { "'1'" } else { "'0'" }.to_string(),
            Value::Int(i) => format!("'{}'", i),
            Value::Float(x) => format!("'{}'", ryu::Buffer::new().format(*x)),
            Value::Text(s) => quote_string(s),
            Value::Json(doc) => quote_string(&doc.to_string()),
        },
    }
}

pub trait SchemaGrammar: BaseGrammar {
    fn dialect(&self) -> Dialect;

    // =========================================================================
    // Columns
    // =========================================================================

    /// The dialect's type for a column.
    fn type_sql(&self, column: &ColumnDefinition) -> GrammarResult<String>;

    /// Modifiers in the order they are appended after the type.
    fn modifiers(&self) -> &'static [Modifier];

    fn modifier_sql(
        &self,
        modifier: Modifier,
        blueprint: &Blueprint,
        column: &ColumnDefinition,
    ) -> GrammarResult<Option<String>>;

    /// `name type modifiers...`.
    fn column_sql(&self, blueprint: &Blueprint, column: &ColumnDefinition) -> GrammarResult<String> {
        let mut sql = format!("{} {}", self.wrap(&column.name)?, self.type_sql(column)?);
        for modifier in self.modifiers() {
            if let Some(fragment) = self.modifier_sql(*modifier, blueprint, column)? {
                sql.push_str(&fragment);
            }
        }
        Ok(sql)
    }

    /// Definitions of the columns being added.
    fn added_columns_sql(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        blueprint
            .added_columns()
            .into_iter()
            .map(|column| self.column_sql(blueprint, column))
            .collect()
    }

    /// Extra commands a dialect derives from column attributes.
    fn fluent_commands(&self, _blueprint: &Blueprint) -> Vec<Command> {
        Vec::new()
    }

    /// Reject command combinations the dialect cannot apply.
    fn validate_commands(&self, _blueprint: &Blueprint) -> GrammarResult<()> {
        Ok(())
    }

    fn wrap_blueprint_table(&self, blueprint: &Blueprint) -> String {
        self.wrap_table(&blueprint.table)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn compile_command(
        &self,
        blueprint: &Blueprint,
        command: &Command,
        config: &ConnectionConfig,
    ) -> GrammarResult<Vec<String>> {
        match command {
            Command::Create => self.compile_create(blueprint, config),
            Command::Add => self.compile_add(blueprint),
            Command::Change => self.compile_change(blueprint),
            Command::Drop => self.compile_drop(blueprint),
            Command::DropIfExists => self.compile_drop_if_exists(blueprint),
            Command::Rename { to } => self.compile_rename(blueprint, to),
            Command::Index(index) => match index.kind {
                IndexKind::Primary => self.compile_primary(blueprint, index),
                IndexKind::Unique => self.compile_unique(blueprint, index),
                IndexKind::Index => self.compile_index(blueprint, index),
                IndexKind::SpatialIndex => self.compile_spatial_index(blueprint, index),
            },
            Command::Foreign(key) => self.compile_foreign(blueprint, key),
            Command::DropColumn { columns } => self.compile_drop_column(blueprint, columns),
            Command::RenameColumn { from, to } => self.compile_rename_column(blueprint, from, to),
            Command::DropIndex { kind, name } => self.compile_drop_index(blueprint, *kind, name),
            Command::DropForeign { name } => self.compile_drop_foreign(blueprint, name),
            Command::RenameIndex { from, to } => self.compile_rename_index(blueprint, from, to),
            Command::Comment { column, comment } => self.compile_comment(blueprint, column, comment),
            Command::TableComment { comment } => self.compile_table_comment(blueprint, comment),
            Command::AutoIncrementStartingValue { column, value } => {
                self.compile_auto_increment_starting_value(blueprint, column, *value)
            }
        }
    }

    fn compile_create(&self, blueprint: &Blueprint, config: &ConnectionConfig) -> GrammarResult<Vec<String>>;

    fn compile_add(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>>;

    fn compile_change(&self, _blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        Err(GrammarError::Unsupported("changing columns"))
    }

    fn compile_drop(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        Ok(vec![format!("drop table {}", self.wrap_blueprint_table(blueprint))])
    }

    fn compile_drop_if_exists(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "drop table if exists {}",
            self.wrap_blueprint_table(blueprint)
        )])
    }

    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> GrammarResult<Vec<String>>;

    fn compile_primary(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>>;

    fn compile_unique(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>>;

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>>;

    fn compile_spatial_index(&self, _blueprint: &Blueprint, _index: &IndexCommand) -> GrammarResult<Vec<String>> {
        Err(GrammarError::Unsupported("spatial indexes"))
    }

    /// `alter table t add constraint k foreign key (...) references r (...)`.
    fn compile_foreign(&self, blueprint: &Blueprint, key: &ForeignKey) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} add constraint {} {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap_value(&key.name),
            self.foreign_key_clause(key)?
        )])
    }

    /// `foreign key (...) references r (...) [on delete x] [on update y]`.
    fn foreign_key_clause(&self, key: &ForeignKey) -> GrammarResult<String> {
        let mut sql = format!(
            "foreign key ({}) references {} ({})",
            self.columnize(&key.columns)?,
            self.wrap_table(&key.on),
            self.columnize(&key.references)?
        );
        if let Some(action) = &key.on_delete {
            sql.push_str(&format!(" on delete {}", action));
        }
        if let Some(action) = &key.on_update {
            sql.push_str(&format!(" on update {}", action));
        }
        Ok(sql)
    }

    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> GrammarResult<Vec<String>>;

    fn compile_rename_column(&self, blueprint: &Blueprint, from: &str, to: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} rename column {} to {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap(from)?,
            self.wrap(to)?
        )])
    }

    fn compile_drop_index(&self, blueprint: &Blueprint, kind: IndexKind, name: &str) -> GrammarResult<Vec<String>>;

    fn compile_drop_foreign(&self, blueprint: &Blueprint, name: &str) -> GrammarResult<Vec<String>>;

    fn compile_rename_index(&self, _blueprint: &Blueprint, _from: &str, _to: &str) -> GrammarResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn compile_comment(&self, _blueprint: &Blueprint, _column: &str, _comment: &str) -> GrammarResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn compile_table_comment(&self, _blueprint: &Blueprint, _comment: &str) -> GrammarResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn compile_auto_increment_starting_value(
        &self,
        _blueprint: &Blueprint,
        _column: &str,
        _value: u64,
    ) -> GrammarResult<Vec<String>> {
        Ok(Vec::new())
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns one row if the table exists.
    fn compile_table_exists(&self, config: &ConnectionConfig, table: &str) -> CompiledQuery;

    /// Returns one row per column with a `column_name` key.
    fn compile_column_listing(&self, config: &ConnectionConfig, table: &str) -> CompiledQuery;

    /// Returns one row per table with a `table_name` key.
    fn compile_get_all_tables(&self, config: &ConnectionConfig) -> CompiledQuery;

    /// Drop tables by their full (already prefixed) names.
    fn compile_drop_all_tables(&self, tables: &[String]) -> Vec<String>;

    fn compile_enable_foreign_key_constraints(&self) -> String;

    fn compile_disable_foreign_key_constraints(&self) -> String;
}

/// Shared handling for `precision` on date and time types: `name(p)` or
/// `name`.
pub(crate) fn with_precision(name: &str, precision: Option<u32>) -> String {
    match precision {
        Some(p) => format!("{}({})", name, p),
        None => name.to_string(),
    }
}

/// Whether a column is an auto-increment integer.
pub(crate) fn is_serial_increment(column: &ColumnDefinition) -> bool {
    column.auto_increment && column.kind.is_serial()
}

/// Enum/set values as a quoted, comma separated list.
pub(crate) fn allowed_values(kind: &ColumnType) -> String {
    match kind {
        ColumnType::Enum { allowed } | ColumnType::Set { allowed } => {
            quote_string_list(allowed)
        }
        _ => String::new(),
    }
}
