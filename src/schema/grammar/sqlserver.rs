//! SQL Server schema grammar.

use super::{allowed_values, default_value, is_serial_increment, with_precision, Modifier, SchemaGrammar};
use crate::config::ConnectionConfig;
use crate::error::{GrammarError, GrammarResult};
use crate::schema::blueprint::Blueprint;
use crate::schema::column::{ColumnDefinition, ColumnType};
use crate::schema::command::{IndexCommand, IndexKind};
use crate::sql::grammar::helpers::{quote_bracket, quote_string};
use crate::sql::grammar::BaseGrammar;
use crate::sql::{CompiledQuery, Dialect, Value};

const MODIFIERS: &[Modifier] = &[
    Modifier::Increment,
    Modifier::Collate,
    Modifier::Nullable,
    Modifier::Default,
    Modifier::Persisted,
];

/// SQL Server schema grammar.
///
/// Text is `nvarchar`, auto-increment is `identity`, and renames go through
/// `sp_rename`. Dropping a column first drops its default constraint.
#[derive(Debug, Clone, Default)]
pub struct SqlServerSchemaGrammar {
    prefix: String,
}

impl SqlServerSchemaGrammar {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn datetime_type(name: &str, precision: Option<u32>, fallback: &str, column: &ColumnDefinition) -> String {
        let sql = match precision {
            Some(_) => with_precision(name, precision),
            None => fallback.to_string(),
        };
        if column.use_current {
            format!("{} default CURRENT_TIMESTAMP", sql)
        } else {
            sql
        }
    }

    /// Batch that drops the default constraints of the given columns.
    fn drop_default_constraints(&self, blueprint: &Blueprint, columns: &[String]) -> String {
        let table = format!("{}{}", self.prefix, blueprint.table).replace('\'', "''");
        let columns = columns
            .iter()
            .map(|c| quote_string(c))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "DECLARE @sql NVARCHAR(MAX) = '';\
             SELECT @sql += 'ALTER TABLE [dbo].[{table}] DROP CONSTRAINT ' + OBJECT_NAME([default_object_id]) + ';' \
             FROM SYS.COLUMNS \
             WHERE [object_id] = OBJECT_ID('[dbo].[{table}]') AND [name] in ({columns}) AND [default_object_id] <> 0;\
             EXEC(@sql)",
            table = table,
            columns = columns
        )
    }
}

impl BaseGrammar for SqlServerSchemaGrammar {
    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_bracket(ident)
    }
}

impl SchemaGrammar for SqlServerSchemaGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn type_sql(&self, column: &ColumnDefinition) -> GrammarResult<String> {
        Ok(match &column.kind {
            ColumnType::Char { length } => format!("nchar({})", length),
            ColumnType::String { length } => format!("nvarchar({})", length),
            ColumnType::TinyText
            | ColumnType::Text
            | ColumnType::MediumText
            | ColumnType::LongText
            | ColumnType::Json
            | ColumnType::Jsonb => "nvarchar(max)".into(),
            ColumnType::TinyInteger => "tinyint".into(),
            ColumnType::SmallInteger => "smallint".into(),
            ColumnType::MediumInteger | ColumnType::Integer | ColumnType::Year => "int".into(),
            ColumnType::BigInteger => "bigint".into(),
            ColumnType::Float { .. } | ColumnType::Double { .. } => "float".into(),
            ColumnType::Decimal { total, places } => format!("decimal({}, {})", total, places),
            ColumnType::Boolean => "bit".into(),
            ColumnType::Enum { .. } => format!(
                "nvarchar(255) check ({} in ({}))",
                self.wrap(&column.name)?,
                allowed_values(&column.kind)
            ),
            ColumnType::Set { .. } => return Err(GrammarError::Unsupported("set columns")),
            ColumnType::Date => "date".into(),
            ColumnType::DateTime { precision } | ColumnType::Timestamp { precision } => {
                Self::datetime_type("datetime2", *precision, "datetime", column)
            }
            ColumnType::DateTimeTz { precision } | ColumnType::TimestampTz { precision } => {
                Self::datetime_type("datetimeoffset", *precision, "datetimeoffset", column)
            }
            ColumnType::Time { precision } | ColumnType::TimeTz { precision } => with_precision("time", *precision),
            ColumnType::Binary => "varbinary(max)".into(),
            ColumnType::Uuid => "uniqueidentifier".into(),
            ColumnType::IpAddress => "nvarchar(45)".into(),
            ColumnType::MacAddress => "nvarchar(17)".into(),
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
            Modifier::Increment if is_serial_increment(column) => Some(" identity primary key".into()),
            Modifier::Collate => column.collation.as_ref().map(|c| format!(" collate {}", c)),
            Modifier::Nullable if column.virtual_as.is_none() => {
                Some(if column.nullable { " null" } else { " not null" }.into())
            }
            Modifier::Default => column.default.as_ref().map(|d| format!(" default {}", default_value(d))),
            Modifier::Persisted if column.persisted => Some(" persisted".into()),
            _ => None,
        })
    }

    /// Computed columns are `name as (expression)` with no type.
    fn column_sql(&self, blueprint: &Blueprint, column: &ColumnDefinition) -> GrammarResult<String> {
        let mut sql = match &column.virtual_as {
            Some(expression) => format!("{} as ({})", self.wrap(&column.name)?, expression),
            None => format!("{} {}", self.wrap(&column.name)?, self.type_sql(column)?),
        };
        for modifier in self.modifiers() {
            if let Some(fragment) = self.modifier_sql(*modifier, blueprint, column)? {
                sql.push_str(&fragment);
            }
        }
        Ok(sql)
    }

    fn compile_create(&self, blueprint: &Blueprint, _config: &ConnectionConfig) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "create table {} ({})",
            self.wrap_blueprint_table(blueprint),
            self.added_columns_sql(blueprint)?.join(", ")
        )])
    }

    fn compile_add(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} add {}",
            self.wrap_blueprint_table(blueprint),
            self.added_columns_sql(blueprint)?.join(", ")
        )])
    }

    fn compile_change(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        let table = self.wrap_blueprint_table(blueprint);
        blueprint
            .changed_columns()
            .into_iter()
            .map(|column| {
                Ok(format!(
                    "alter table {} alter column {}",
                    table,
                    self.column_sql(blueprint, column)?
                ))
            })
            .collect()
    }

    /// Guarded by an existence check on `sys.sysobjects`.
    fn compile_drop_if_exists(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "if exists (select * from sys.sysobjects where id = object_id({}, 'U')) drop table {}",
            quote_string(&format!("{}{}", self.prefix, blueprint.table)),
            self.wrap_blueprint_table(blueprint)
        )])
    }

    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "sp_rename {}, {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap_table(to)
        )])
    }

    fn compile_primary(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} add constraint {} primary key ({})",
            self.wrap_blueprint_table(blueprint),
            self.wrap_value(&index.name),
            self.columnize(&index.columns)?
        )])
    }

    fn compile_unique(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "create unique index {} on {} ({})",
            self.wrap_value(&index.name),
            self.wrap_blueprint_table(blueprint),
            self.columnize(&index.columns)?
        )])
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "create index {} on {} ({})",
            self.wrap_value(&index.name),
            self.wrap_blueprint_table(blueprint),
            self.columnize(&index.columns)?
        )])
    }

    fn compile_spatial_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "create spatial index {} on {} ({})",
            self.wrap_value(&index.name),
            self.wrap_blueprint_table(blueprint),
            self.columnize(&index.columns)?
        )])
    }

    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> GrammarResult<Vec<String>> {
        Ok(vec![
            self.drop_default_constraints(blueprint, columns),
            format!(
                "alter table {} drop column {}",
                self.wrap_blueprint_table(blueprint),
                self.wrap_array(columns)?.join(", ")
            ),
        ])
    }

    fn compile_rename_column(&self, blueprint: &Blueprint, from: &str, to: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "sp_rename {}, {}, N'COLUMN'",
            quote_string(&self.wrap(&format!("{}.{}", blueprint.table, from))?),
            self.wrap(to)?
        )])
    }

    fn compile_drop_index(&self, blueprint: &Blueprint, kind: IndexKind, name: &str) -> GrammarResult<Vec<String>> {
        let table = self.wrap_blueprint_table(blueprint);
        Ok(vec![match kind {
            IndexKind::Primary => format!("alter table {} drop constraint {}", table, self.wrap_value(name)),
            _ => format!("drop index {} on {}", self.wrap_value(name), table),
        }])
    }

    fn compile_drop_foreign(&self, blueprint: &Blueprint, name: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} drop constraint {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap_value(name)
        )])
    }

    fn compile_rename_index(&self, blueprint: &Blueprint, from: &str, to: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "sp_rename {}, {}, N'INDEX'",
            quote_string(&self.wrap(&format!("{}.{}", blueprint.table, from))?),
            self.wrap(to)?
        )])
    }

    fn compile_table_exists(&self, _config: &ConnectionConfig, table: &str) -> CompiledQuery {
        CompiledQuery::new(
            "select * from sys.sysobjects where id = object_id(?) and xtype in ('U', 'V')",
            vec![Value::Text(format!("{}{}", self.prefix, table))],
        )
    }

    fn compile_column_listing(&self, _config: &ConnectionConfig, table: &str) -> CompiledQuery {
        CompiledQuery::new(
            "select name as column_name from sys.columns where object_id = object_id(?)",
            vec![Value::Text(format!("{}{}", self.prefix, table))],
        )
    }

    fn compile_get_all_tables(&self, _config: &ConnectionConfig) -> CompiledQuery {
        CompiledQuery::new(
            "select name as table_name from sys.tables where type = 'U'",
            Vec::new(),
        )
    }

    fn compile_drop_all_tables(&self, tables: &[String]) -> Vec<String> {
        let tables: Vec<String> = tables.iter().map(|t| self.wrap_value(t)).collect();
        vec![format!("drop table {}", tables.join(", "))]
    }

    fn compile_enable_foreign_key_constraints(&self) -> String {
        "EXEC sp_msforeachtable @command1=\"print '?'\", @command2=\"ALTER TABLE ? WITH CHECK CHECK CONSTRAINT all\";"
            .to_string()
    }

    fn compile_disable_foreign_key_constraints(&self) -> String {
        "EXEC sp_msforeachtable \"ALTER TABLE ? NOCHECK CONSTRAINT all\";".to_string()
    }
}
