//! SQLite schema grammar.

use super::{allowed_values, default_value, is_serial_increment, Modifier, SchemaGrammar};
use crate::config::ConnectionConfig;
use crate::error::{GrammarError, GrammarResult};
use crate::schema::blueprint::Blueprint;
use crate::schema::column::{ColumnDefinition, ColumnType};
use crate::schema::command::{Command, ForeignKey, IndexCommand, IndexKind};
use crate::sql::grammar::BaseGrammar;
use crate::sql::{CompiledQuery, Dialect, Value};

const MODIFIERS: &[Modifier] = &[
    Modifier::VirtualAs,
    Modifier::StoredAs,
    Modifier::Nullable,
    Modifier::Default,
    Modifier::Increment,
];

/// SQLite schema grammar.
///
/// - Foreign keys and the primary key are declared inside `create table`
/// - Each added or dropped column is its own `alter table` statement
/// - Column changes and foreign key drops are rejected up front
#[derive(Debug, Clone, Default)]
pub struct SqliteSchemaGrammar {
    prefix: String,
}

impl SqliteSchemaGrammar {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    /// `, foreign key(...) references "t"(...)` for every foreign command.
    fn inline_foreign_keys(&self, blueprint: &Blueprint) -> GrammarResult<String> {
        let mut sql = String::new();
        for key in blueprint.commands.iter().filter_map(|c| match c {
            Command::Foreign(key) => Some(key),
            _ => None,
        }) {
            sql.push_str(&self.inline_foreign_key(key)?);
        }
        Ok(sql)
    }

    fn inline_foreign_key(&self, key: &ForeignKey) -> GrammarResult<String> {
        let mut sql = format!(
            ", foreign key({}) references {}({})",
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

    fn inline_primary_key(&self, blueprint: &Blueprint) -> GrammarResult<String> {
        let primary = blueprint.commands.iter().find_map(|c| match c {
            Command::Index(index) if index.kind == IndexKind::Primary => Some(index),
            _ => None,
        });
        match primary {
            Some(index) => Ok(format!(", primary key ({})", self.columnize(&index.columns)?)),
            None => Ok(String::new()),
        }
    }

    fn create_index(&self, blueprint: &Blueprint, index: &IndexCommand, unique: bool) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "create {}index {} on {} ({})",
            if unique { "unique " } else { "" },
            self.wrap_value(&index.name),
            self.wrap_blueprint_table(blueprint),
            self.columnize(&index.columns)?
        )])
    }

    fn datetime_type(column: &ColumnDefinition) -> String {
        if column.use_current {
            "datetime default CURRENT_TIMESTAMP".to_string()
        } else {
            "datetime".to_string()
        }
    }
}

impl BaseGrammar for SqliteSchemaGrammar {
    fn table_prefix(&self) -> &str {
        &self.prefix
    }
}

impl SchemaGrammar for SqliteSchemaGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn type_sql(&self, column: &ColumnDefinition) -> GrammarResult<String> {
        Ok(match &column.kind {
            ColumnType::Char { .. }
            | ColumnType::String { .. }
            | ColumnType::Uuid
            | ColumnType::IpAddress
            | ColumnType::MacAddress => "varchar".into(),
            ColumnType::TinyText
            | ColumnType::Text
            | ColumnType::MediumText
            | ColumnType::LongText
            | ColumnType::Json
            | ColumnType::Jsonb => "text".into(),
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::MediumInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::Year => "integer".into(),
            ColumnType::Float { .. } | ColumnType::Double { .. } => "float".into(),
            ColumnType::Decimal { .. } => "numeric".into(),
            ColumnType::Boolean => "tinyint(1)".into(),
            ColumnType::Enum { .. } => format!(
                "varchar check ({} in ({}))",
                self.wrap(&column.name)?,
                allowed_values(&column.kind)
            ),
            ColumnType::Set { .. } => return Err(GrammarError::Unsupported("set columns")),
            ColumnType::Date => "date".into(),
            ColumnType::DateTime { .. }
            | ColumnType::DateTimeTz { .. }
            | ColumnType::Timestamp { .. }
            | ColumnType::TimestampTz { .. } => Self::datetime_type(column),
            ColumnType::Time { .. } | ColumnType::TimeTz { .. } => "time".into(),
            ColumnType::Binary => "blob".into(),
        })
    }

    fn modifiers(&self) -> &'static [Modifier] {
        MODIFIERS
    }

    fn modifier_sql(
        &self,
        modifier: Modifier,
        _blueprint: &Blueprint,
        column: &ColumnDefinition,
    ) -> GrammarResult<Option<String>> {
        Ok(match modifier {
            Modifier::VirtualAs => column.virtual_as.as_ref().map(|e| format!(" as ({})", e)),
            Modifier::StoredAs => column.stored_as.as_ref().map(|e| format!(" as ({}) stored", e)),
            Modifier::Nullable if !column.is_generated() => {
                Some(if column.nullable { " null" } else { " not null" }.into())
            }
            Modifier::Default if !column.is_generated() => column
                .default
                .as_ref()
                .map(|d| format!(" default {}", default_value(d))),
            Modifier::Increment if is_serial_increment(column) => Some(" primary key autoincrement".into()),
            _ => None,
        })
    }

    fn validate_commands(&self, blueprint: &Blueprint) -> GrammarResult<()> {
        let count = |name: &str| blueprint.commands.iter().filter(|c| c.name() == name).count();

        if count("dropColumn") > 1 || count("renameColumn") > 1 {
            return Err(GrammarError::InvalidBlueprint(
                "SQLite doesn't support multiple calls to dropColumn / renameColumn in a single modification."
                    .into(),
            ));
        }
        if count("dropForeign") > 0 {
            return Err(GrammarError::InvalidBlueprint(
                "SQLite doesn't support dropping foreign keys (you would need to re-create the table).".into(),
            ));
        }
        if !blueprint.changed_columns().is_empty() {
            return Err(GrammarError::InvalidBlueprint(
                "SQLite doesn't support changing columns (you would need to re-create the table).".into(),
            ));
        }
        Ok(())
    }

    fn compile_create(&self, blueprint: &Blueprint, _config: &ConnectionConfig) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "{} table {} ({}{}{})",
            if blueprint.temporary { "create temporary" } else { "create" },
            self.wrap_blueprint_table(blueprint),
            self.added_columns_sql(blueprint)?.join(", "),
            self.inline_foreign_keys(blueprint)?,
            self.inline_primary_key(blueprint)?
        )])
    }

    fn compile_add(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        let table = self.wrap_blueprint_table(blueprint);
        Ok(self
            .added_columns_sql(blueprint)?
            .into_iter()
            .map(|column| format!("alter table {} add column {}", table, column))
            .collect())
    }

    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} rename to {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap_table(to)
        )])
    }

    /// Declared inside `create table`.
    fn compile_primary(&self, _blueprint: &Blueprint, _index: &IndexCommand) -> GrammarResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn compile_unique(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        self.create_index(blueprint, index, true)
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        self.create_index(blueprint, index, false)
    }

    /// Declared inside `create table`.
    fn compile_foreign(&self, _blueprint: &Blueprint, _key: &ForeignKey) -> GrammarResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> GrammarResult<Vec<String>> {
        let table = self.wrap_blueprint_table(blueprint);
        columns
            .iter()
            .map(|column| Ok(format!("alter table {} drop column {}", table, self.wrap(column)?)))
            .collect()
    }

    fn compile_drop_index(&self, _blueprint: &Blueprint, kind: IndexKind, name: &str) -> GrammarResult<Vec<String>> {
        match kind {
            IndexKind::Primary => Ok(Vec::new()),
            IndexKind::SpatialIndex => Err(GrammarError::Unsupported("spatial indexes")),
            IndexKind::Unique | IndexKind::Index => Ok(vec![format!("drop index {}", self.wrap_value(name))]),
        }
    }

    /// Rejected by validation before compilation.
    fn compile_drop_foreign(&self, _blueprint: &Blueprint, _name: &str) -> GrammarResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn compile_table_exists(&self, _config: &ConnectionConfig, table: &str) -> CompiledQuery {
        CompiledQuery::new(
            "select * from sqlite_master where type = 'table' and name = ?",
            vec![Value::Text(format!("{}{}", self.prefix, table))],
        )
    }

    fn compile_column_listing(&self, _config: &ConnectionConfig, table: &str) -> CompiledQuery {
        CompiledQuery::new(
            "select name as column_name from pragma_table_info(?)",
            vec![Value::Text(format!("{}{}", self.prefix, table))],
        )
    }

    fn compile_get_all_tables(&self, _config: &ConnectionConfig) -> CompiledQuery {
        CompiledQuery::new(
            "select name as table_name from sqlite_master where type = 'table' and name not like 'sqlite_%'",
            Vec::new(),
        )
    }

    fn compile_drop_all_tables(&self, tables: &[String]) -> Vec<String> {
        tables
            .iter()
            .map(|t| format!("drop table if exists {}", self.wrap_value(t)))
            .collect()
    }

    fn compile_enable_foreign_key_constraints(&self) -> String {
        "PRAGMA foreign_keys = ON;".to_string()
    }

    fn compile_disable_foreign_key_constraints(&self) -> String {
        "PRAGMA foreign_keys = OFF;".to_string()
    }
}
