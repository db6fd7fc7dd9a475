//! PostgreSQL schema grammar.

use super::{allowed_values, default_value, is_serial_increment, Modifier, SchemaGrammar};
use crate::config::ConnectionConfig;
use crate::error::{GrammarError, GrammarResult};
use crate::schema::blueprint::Blueprint;
use crate::schema::column::{ColumnDefinition, ColumnType};
use crate::schema::command::{Command, ForeignKey, IndexCommand, IndexKind};
use crate::sql::grammar::helpers::prefix_array;
use crate::sql::grammar::BaseGrammar;
use crate::sql::{CompiledQuery, Dialect, Value};

const MODIFIERS: &[Modifier] = &[
    Modifier::Collate,
    Modifier::Increment,
    Modifier::Nullable,
    Modifier::Default,
    Modifier::VirtualAs,
    Modifier::StoredAs,
];

/// PostgreSQL schema grammar.
///
/// Auto-increment integers become `serial` types; column comments are
/// separate `comment on column` statements.
#[derive(Debug, Clone, Default)]
pub struct PostgresSchemaGrammar {
    prefix: String,
}

impl PostgresSchemaGrammar {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn integer_type(column: &ColumnDefinition, serial: &str, plain: &str) -> String {
        if column.auto_increment { serial } else { plain }.to_string()
    }

    /// `timestamp(p) with[out] time zone`, optionally defaulting to now.
    fn timestamp_type(name: &str, precision: Option<u32>, zone: bool, column: &ColumnDefinition) -> String {
        let precision = precision.map_or_else(String::new, |p| format!("({})", p));
        let zone = if zone { "with" } else { "without" };
        let sql = format!("{}{} {} time zone", name, precision, zone);
        if column.use_current {
            format!("{} default CURRENT_TIMESTAMP", sql)
        } else {
            sql
        }
    }

    fn qualified_name(&self, config: &ConnectionConfig, table: &str) -> Vec<Value> {
        vec![
            Value::from(config.database.as_str()),
            Value::from(config.schema_or_default()),
            Value::Text(format!("{}{}", self.prefix, table)),
        ]
    }
}

impl BaseGrammar for PostgresSchemaGrammar {
    fn table_prefix(&self) -> &str {
        &self.prefix
    }
}

impl SchemaGrammar for PostgresSchemaGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn type_sql(&self, column: &ColumnDefinition) -> GrammarResult<String> {
        Ok(match &column.kind {
            ColumnType::Char { length } => format!("char({})", length),
            ColumnType::String { length } => format!("varchar({})", length),
            ColumnType::TinyText | ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => {
                "text".into()
            }
            ColumnType::TinyInteger | ColumnType::SmallInteger => {
                Self::integer_type(column, "smallserial", "smallint")
            }
            ColumnType::MediumInteger | ColumnType::Integer => Self::integer_type(column, "serial", "integer"),
            ColumnType::BigInteger => Self::integer_type(column, "bigserial", "bigint"),
            ColumnType::Float { .. } | ColumnType::Double { .. } => "double precision".into(),
            ColumnType::Decimal { total, places } => format!("decimal({}, {})", total, places),
            ColumnType::Boolean => "boolean".into(),
            ColumnType::Enum { .. } => format!(
                "varchar(255) check ({} in ({}))",
                self.wrap(&column.name)?,
                allowed_values(&column.kind)
            ),
            ColumnType::Set { .. } => return Err(GrammarError::Unsupported("set columns")),
            ColumnType::Json => "json".into(),
            ColumnType::Jsonb => "jsonb".into(),
            ColumnType::Date => "date".into(),
            ColumnType::DateTime { precision } | ColumnType::Timestamp { precision } => {
                Self::timestamp_type("timestamp", *precision, false, column)
            }
            ColumnType::DateTimeTz { precision } | ColumnType::TimestampTz { precision } => {
                Self::timestamp_type("timestamp", *precision, true, column)
            }
            ColumnType::Time { precision } => Self::timestamp_type("time", *precision, false, column),
            ColumnType::TimeTz { precision } => Self::timestamp_type("time", *precision, true, column),
            ColumnType::Year => "integer".into(),
            ColumnType::Binary => "bytea".into(),
            ColumnType::Uuid => "uuid".into(),
            ColumnType::IpAddress => "inet".into(),
            ColumnType::MacAddress => "macaddr".into(),
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
            Modifier::Collate => column
                .collation
                .as_ref()
                .map(|c| format!(" collate {}", self.wrap_value(c))),
            Modifier::Increment if is_serial_increment(column) => Some(" primary key".into()),
            Modifier::Nullable => Some(if column.nullable { " null" } else { " not null" }.into()),
            Modifier::Default => column.default.as_ref().map(|d| format!(" default {}", default_value(d))),
            Modifier::VirtualAs => column
                .virtual_as
                .as_ref()
                .map(|e| format!(" generated always as ({})", e)),
            Modifier::StoredAs => column
                .stored_as
                .as_ref()
                .map(|e| format!(" generated always as ({}) stored", e)),
            _ => None,
        })
    }

    /// Starting values for serial columns, then column comments.
    fn fluent_commands(&self, blueprint: &Blueprint) -> Vec<Command> {
        let columns = blueprint.added_columns();
        let starting = columns.iter().filter(|c| c.auto_increment).filter_map(|c| {
            c.starting_value.map(|value| Command::AutoIncrementStartingValue {
                column: c.name.clone(),
                value,
            })
        });
        let comments = blueprint.columns.iter().filter_map(|c| {
            c.comment.as_ref().map(|comment| Command::Comment {
                column: c.name.clone(),
                comment: comment.clone(),
            })
        });
        starting.chain(comments).collect()
    }

    fn compile_create(&self, blueprint: &Blueprint, _config: &ConnectionConfig) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "{} table {} ({})",
            if blueprint.temporary { "create temporary" } else { "create" },
            self.wrap_blueprint_table(blueprint),
            self.added_columns_sql(blueprint)?.join(", ")
        )])
    }

    fn compile_add(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        let columns = prefix_array("add column", &self.added_columns_sql(blueprint)?);
        Ok(vec![format!(
            "alter table {} {}",
            self.wrap_blueprint_table(blueprint),
            columns.join(", ")
        )])
    }

    /// One `alter column` clause each for the type, nullability and
    /// default of every changed column.
    fn compile_change(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        let mut clauses = Vec::new();
        for column in blueprint.changed_columns() {
            let name = self.wrap(&column.name)?;
            clauses.push(format!("alter column {} type {}", name, self.type_sql(column)?));
            clauses.push(format!(
                "alter column {} {} not null",
                name,
                if column.nullable { "drop" } else { "set" }
            ));
            clauses.push(match &column.default {
                Some(default) => format!("alter column {} set default {}", name, default_value(default)),
                None => format!("alter column {} drop default", name),
            });
        }
        Ok(vec![format!(
            "alter table {} {}",
            self.wrap_blueprint_table(blueprint),
            clauses.join(", ")
        )])
    }

    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} rename to {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap_table(to)
        )])
    }

    fn compile_primary(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} add primary key ({})",
            self.wrap_blueprint_table(blueprint),
            self.columnize(&index.columns)?
        )])
    }

    fn compile_unique(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} add constraint {} unique ({})",
            self.wrap_blueprint_table(blueprint),
            self.wrap_value(&index.name),
            self.columnize(&index.columns)?
        )])
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        let algorithm = index
            .algorithm
            .as_ref()
            .map_or_else(String::new, |a| format!(" using {}", a));
        Ok(vec![format!(
            "create index {} on {}{} ({})",
            self.wrap_value(&index.name),
            self.wrap_blueprint_table(blueprint),
            algorithm,
            self.columnize(&index.columns)?
        )])
    }

    fn compile_spatial_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        let mut index = index.clone();
        index.algorithm = Some("gist".into());
        self.compile_index(blueprint, &index)
    }

    fn compile_foreign(&self, blueprint: &Blueprint, key: &ForeignKey) -> GrammarResult<Vec<String>> {
        let mut sql = format!(
            "alter table {} add constraint {} {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap_value(&key.name),
            self.foreign_key_clause(key)?
        );
        if let Some(deferrable) = key.deferrable {
            sql.push_str(if deferrable { " deferrable" } else { " not deferrable" });
        }
        if let (Some(true), Some(immediate)) = (key.deferrable, key.initially_immediate) {
            sql.push_str(if immediate {
                " initially immediate"
            } else {
                " initially deferred"
            });
        }
        Ok(vec![sql])
    }

    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> GrammarResult<Vec<String>> {
        let columns = prefix_array("drop column", &self.wrap_array(columns)?);
        Ok(vec![format!(
            "alter table {} {}",
            self.wrap_blueprint_table(blueprint),
            columns.join(", ")
        )])
    }

    /// The primary key constraint is always `<table>_pkey`.
    fn compile_drop_index(&self, blueprint: &Blueprint, kind: IndexKind, name: &str) -> GrammarResult<Vec<String>> {
        let table = self.wrap_blueprint_table(blueprint);
        Ok(vec![match kind {
            IndexKind::Primary => format!(
                "alter table {} drop constraint {}",
                table,
                self.wrap_value(&format!("{}{}_pkey", self.prefix, blueprint.table))
            ),
            IndexKind::Unique => format!("alter table {} drop constraint {}", table, self.wrap_value(name)),
            IndexKind::Index | IndexKind::SpatialIndex => format!("drop index {}", self.wrap_value(name)),
        }])
    }

    fn compile_drop_foreign(&self, blueprint: &Blueprint, name: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} drop constraint {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap_value(name)
        )])
    }

    fn compile_rename_index(&self, _blueprint: &Blueprint, from: &str, to: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter index {} rename to {}",
            self.wrap_value(from),
            self.wrap_value(to)
        )])
    }

    fn compile_comment(&self, blueprint: &Blueprint, column: &str, comment: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "comment on column {}.{} is {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap(column)?,
            self.quote_string(comment)
        )])
    }

    fn compile_table_comment(&self, blueprint: &Blueprint, comment: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "comment on table {} is {}",
            self.wrap_blueprint_table(blueprint),
            self.quote_string(comment)
        )])
    }

    fn compile_auto_increment_starting_value(
        &self,
        blueprint: &Blueprint,
        column: &str,
        value: u64,
    ) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter sequence {}{}_{}_seq restart with {}",
            self.prefix, blueprint.table, column, value
        )])
    }

    fn compile_table_exists(&self, config: &ConnectionConfig, table: &str) -> CompiledQuery {
        CompiledQuery::new(
            "select * from information_schema.tables where table_catalog = ? and table_schema = ? and table_name = ? and table_type = 'BASE TABLE'",
            self.qualified_name(config, table),
        )
    }

    fn compile_column_listing(&self, config: &ConnectionConfig, table: &str) -> CompiledQuery {
        CompiledQuery::new(
            "select column_name from information_schema.columns where table_catalog = ? and table_schema = ? and table_name = ?",
            self.qualified_name(config, table),
        )
    }

    fn compile_get_all_tables(&self, config: &ConnectionConfig) -> CompiledQuery {
        CompiledQuery::new(
            "select tablename as table_name from pg_catalog.pg_tables where schemaname = ?",
            vec![Value::from(config.schema_or_default())],
        )
    }

    fn compile_drop_all_tables(&self, tables: &[String]) -> Vec<String> {
        let tables: Vec<String> = tables.iter().map(|t| self.wrap_value(t)).collect();
        vec![format!("drop table {} cascade", tables.join(","))]
    }

    fn compile_enable_foreign_key_constraints(&self) -> String {
        "SET CONSTRAINTS ALL IMMEDIATE;".to_string()
    }

    fn compile_disable_foreign_key_constraints(&self) -> String {
        "SET CONSTRAINTS ALL DEFERRED;".to_string()
    }
}
