//! MySQL schema grammar.

use super::{allowed_values, default_value, is_serial_increment, with_precision, Modifier, SchemaGrammar};
use crate::config::ConnectionConfig;
use crate::error::GrammarResult;
use crate::schema::blueprint::Blueprint;
use crate::schema::column::{ColumnDefinition, ColumnType};
use crate::schema::command::{Command, IndexCommand, IndexKind};
use crate::sql::grammar::helpers::{prefix_array, quote_backtick};
use crate::sql::grammar::BaseGrammar;
use crate::sql::{CompiledQuery, Dialect, Value};

const MODIFIERS: &[Modifier] = &[
    Modifier::Unsigned,
    Modifier::Charset,
    Modifier::Collate,
    Modifier::VirtualAs,
    Modifier::StoredAs,
    Modifier::Nullable,
    Modifier::Default,
    Modifier::Increment,
    Modifier::Comment,
    Modifier::After,
    Modifier::First,
];

#[derive(Debug, Clone, Default)]
pub struct MySqlSchemaGrammar {
    prefix: String,
}

impl MySqlSchemaGrammar {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    /// `alter table t add <kind> name[ using x](cols)`.
    fn compile_key(&self, blueprint: &Blueprint, index: &IndexCommand, kind: &str) -> GrammarResult<Vec<String>> {
        let algorithm = index
            .algorithm
            .as_ref()
            .map_or_else(String::new, |a| format!(" using {}", a));
        Ok(vec![format!(
            "alter table {} add {} {}{}({})",
            self.wrap_blueprint_table(blueprint),
            kind,
            self.wrap_value(&index.name),
            algorithm,
            self.columnize(&index.columns)?
        )])
    }

    /// `datetime(p)` with the current-timestamp clauses.
    fn timestamp_type(&self, name: &str, precision: Option<u32>, column: &ColumnDefinition) -> String {
        let mut sql = with_precision(name, precision);
        let current = with_precision("CURRENT_TIMESTAMP", precision);
        if column.use_current {
            sql.push_str(&format!(" default {}", current));
        }
        if column.use_current_on_update {
            sql.push_str(&format!(" on update {}", current));
        }
        sql
    }
}

impl BaseGrammar for MySqlSchemaGrammar {
    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_backtick(ident)
    }
}

impl SchemaGrammar for MySqlSchemaGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn type_sql(&self, column: &ColumnDefinition) -> GrammarResult<String> {
        Ok(match &column.kind {
            ColumnType::Char { length } => format!("char({})", length),
            ColumnType::String { length } => format!("varchar({})", length),
            ColumnType::TinyText => "tinytext".into(),
            ColumnType::Text => "text".into(),
            ColumnType::MediumText => "mediumtext".into(),
            ColumnType::LongText => "longtext".into(),
            ColumnType::TinyInteger => "tinyint".into(),
            ColumnType::SmallInteger => "smallint".into(),
            ColumnType::MediumInteger => "mediumint".into(),
            ColumnType::Integer => "int".into(),
            ColumnType::BigInteger => "bigint".into(),
            ColumnType::Float { total, places } => format!("double({}, {})", total, places),
            ColumnType::Double {
                total: Some(total),
                places: Some(places),
            } => format!("double({}, {})", total, places),
            ColumnType::Double { .. } => "double".into(),
            ColumnType::Decimal { total, places } => format!("decimal({}, {})", total, places),
            ColumnType::Boolean => "tinyint(1)".into(),
            ColumnType::Enum { .. } => format!("enum({})", allowed_values(&column.kind)),
            ColumnType::Set { .. } => format!("set({})", allowed_values(&column.kind)),
            ColumnType::Json | ColumnType::Jsonb => "json".into(),
            ColumnType::Date => "date".into(),
            ColumnType::DateTime { precision } | ColumnType::DateTimeTz { precision } => {
                self.timestamp_type("datetime", *precision, column)
            }
            ColumnType::Time { precision } | ColumnType::TimeTz { precision } => {
                with_precision("time", *precision)
            }
            ColumnType::Timestamp { precision } | ColumnType::TimestampTz { precision } => {
                self.timestamp_type("timestamp", *precision, column)
            }
            ColumnType::Year => "year".into(),
            ColumnType::Binary => "blob".into(),
            ColumnType::Uuid => "char(36)".into(),
            ColumnType::IpAddress => "varchar(45)".into(),
            ColumnType::MacAddress => "varchar(17)".into(),
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
            Modifier::Unsigned if column.unsigned => Some(" unsigned".into()),
            Modifier::Charset => column.charset.as_ref().map(|c| format!(" character set {}", c)),
            Modifier::Collate => column.collation.as_ref().map(|c| format!(" collate '{}'", c)),
            Modifier::VirtualAs => column.virtual_as.as_ref().map(|e| format!(" as ({})", e)),
            Modifier::StoredAs => column.stored_as.as_ref().map(|e| format!(" as ({}) stored", e)),
            Modifier::Nullable if !column.is_generated() => {
                Some(if column.nullable { " null" } else { " not null" }.into())
            }
            Modifier::Default => column.default.as_ref().map(|d| format!(" default {}", default_value(d))),
            Modifier::Increment if is_serial_increment(column) => Some(" auto_increment primary key".into()),
            Modifier::Comment => column
                .comment
                .as_ref()
                .map(|c| format!(" comment {}", self.quote_string(c))),
            Modifier::After => match &column.after {
                Some(after) => Some(format!(" after {}", self.wrap(after)?)),
                None => None,
            },
            Modifier::First if column.first => Some(" first".into()),
            _ => None,
        })
    }

    fn fluent_commands(&self, blueprint: &Blueprint) -> Vec<Command> {
        blueprint
            .added_columns()
            .into_iter()
            .filter(|c| c.auto_increment)
            .filter_map(|c| {
                c.starting_value.map(|value| Command::AutoIncrementStartingValue {
                    column: c.name.clone(),
                    value,
                })
            })
            .collect()
    }

    /// `create [temporary] table t (...)` with charset, collation and engine
    /// from the blueprint, falling back to the connection.
    fn compile_create(&self, blueprint: &Blueprint, config: &ConnectionConfig) -> GrammarResult<Vec<String>> {
        let mut sql = format!(
            "{} table {} ({})",
            if blueprint.temporary { "create temporary" } else { "create" },
            self.wrap_blueprint_table(blueprint),
            self.added_columns_sql(blueprint)?.join(", ")
        );

        if let Some(charset) = blueprint.charset.as_ref().or(config.charset.as_ref()) {
            sql.push_str(&format!(" default character set {}", charset));
        }
        if let Some(collation) = blueprint.collation.as_ref().or(config.collation.as_ref()) {
            sql.push_str(&format!(" collate '{}'", collation));
        }
        if let Some(engine) = blueprint.engine.as_ref().or(config.engine.as_ref()) {
            sql.push_str(&format!(" engine = {}", engine));
        }

        Ok(vec![sql])
    }

    fn compile_add(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        let columns = prefix_array("add", &self.added_columns_sql(blueprint)?);
        Ok(vec![format!(
            "alter table {} {}",
            self.wrap_blueprint_table(blueprint),
            columns.join(", ")
        )])
    }

    fn compile_change(&self, blueprint: &Blueprint) -> GrammarResult<Vec<String>> {
        let columns = blueprint
            .changed_columns()
            .into_iter()
            .map(|column| Ok(format!("modify {}", self.column_sql(blueprint, column)?)))
            .collect::<GrammarResult<Vec<_>>>()?;
        Ok(vec![format!(
            "alter table {} {}",
            self.wrap_blueprint_table(blueprint),
            columns.join(", ")
        )])
    }

    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "rename table {} to {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap_table(to)
        )])
    }

    fn compile_primary(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        let algorithm = index
            .algorithm
            .as_ref()
            .map_or_else(String::new, |a| format!("using {}", a));
        Ok(vec![format!(
            "alter table {} add primary key {}({})",
            self.wrap_blueprint_table(blueprint),
            algorithm,
            self.columnize(&index.columns)?
        )])
    }

    fn compile_unique(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        self.compile_key(blueprint, index, "unique")
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        self.compile_key(blueprint, index, "index")
    }

    fn compile_spatial_index(&self, blueprint: &Blueprint, index: &IndexCommand) -> GrammarResult<Vec<String>> {
        self.compile_key(blueprint, index, "spatial index")
    }

    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> GrammarResult<Vec<String>> {
        let columns = prefix_array("drop", &self.wrap_array(columns)?);
        Ok(vec![format!(
            "alter table {} {}",
            self.wrap_blueprint_table(blueprint),
            columns.join(", ")
        )])
    }

    fn compile_drop_index(&self, blueprint: &Blueprint, kind: IndexKind, name: &str) -> GrammarResult<Vec<String>> {
        let table = self.wrap_blueprint_table(blueprint);
        Ok(vec![match kind {
            IndexKind::Primary => format!("alter table {} drop primary key", table),
            _ => format!("alter table {} drop index {}", table, self.wrap_value(name)),
        }])
    }

    fn compile_drop_foreign(&self, blueprint: &Blueprint, name: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} drop foreign key {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap_value(name)
        )])
    }

    fn compile_rename_index(&self, blueprint: &Blueprint, from: &str, to: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} rename index {} to {}",
            self.wrap_blueprint_table(blueprint),
            self.wrap_value(from),
            self.wrap_value(to)
        )])
    }

    fn compile_table_comment(&self, blueprint: &Blueprint, comment: &str) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} comment = {}",
            self.wrap_blueprint_table(blueprint),
            self.quote_string(comment)
        )])
    }

    fn compile_auto_increment_starting_value(
        &self,
        blueprint: &Blueprint,
        _column: &str,
        value: u64,
    ) -> GrammarResult<Vec<String>> {
        Ok(vec![format!(
            "alter table {} auto_increment = {}",
            self.wrap_blueprint_table(blueprint),
            value
        )])
    }

    fn compile_table_exists(&self, config: &ConnectionConfig, table: &str) -> CompiledQuery {
        CompiledQuery::new(
            "select * from information_schema.tables where table_schema = ? and table_name = ? and table_type = 'BASE TABLE'",
            vec![
                Value::from(config.database.as_str()),
                Value::Text(format!("{}{}", self.prefix, table)),
            ],
        )
    }

    fn compile_column_listing(&self, config: &ConnectionConfig, table: &str) -> CompiledQuery {
        CompiledQuery::new(
            "select column_name as `column_name` from information_schema.columns where table_schema = ? and table_name = ?",
            vec![
                Value::from(config.database.as_str()),
                Value::Text(format!("{}{}", self.prefix, table)),
            ],
        )
    }

    fn compile_get_all_tables(&self, config: &ConnectionConfig) -> CompiledQuery {
        CompiledQuery::new(
            "select table_name as `table_name` from information_schema.tables where table_schema = ? and table_type = 'BASE TABLE'",
            vec![Value::from(config.database.as_str())],
        )
    }

    fn compile_drop_all_tables(&self, tables: &[String]) -> Vec<String> {
        let tables: Vec<String> = tables.iter().map(|t| self.wrap_value(t)).collect();
        vec![format!("drop table {}", tables.join(","))]
    }

    fn compile_enable_foreign_key_constraints(&self) -> String {
        "SET FOREIGN_KEY_CHECKS=1;".to_string()
    }

    fn compile_disable_foreign_key_constraints(&self) -> String {
        "SET FOREIGN_KEY_CHECKS=0;".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Driver;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new(Driver::MySql, "app")
    }

    #[test]
    fn test_create_with_engine_and_charset() {
        let mut table = Blueprint::new("users");
        table.create();
        table.increments("id");
        table.string("email", 255);
        let mut config = config();
        config.charset = Some("utf8mb4".into());
        config.engine = Some("InnoDB".into());

        let statements = table.to_sql(&config, &MySqlSchemaGrammar::default()).unwrap();
        assert_eq!(
            statements,
            vec!["create table `users` (`id` int unsigned not null auto_increment primary key, `email` varchar(255) not null) default character set utf8mb4 engine = InnoDB"]
        );
    }

    #[test]
    fn test_add_with_modifiers() {
        let mut table = Blueprint::new("users");
        table.string("nick", 50).nullable().after("name").comment("shown name");
        let statements = table.to_sql(&config(), &MySqlSchemaGrammar::default()).unwrap();
        assert_eq!(
            statements,
            vec!["alter table `users` add `nick` varchar(50) null comment 'shown name' after `name`"]
        );
    }

    #[test]
    fn test_timestamp_use_current() {
        let mut table = Blueprint::new("users");
        table.timestamp("seen_at", Some(3)).use_current().use_current_on_update();
        let statements = table.to_sql(&config(), &MySqlSchemaGrammar::default()).unwrap();
        assert_eq!(
            statements,
            vec!["alter table `users` add `seen_at` timestamp(3) default CURRENT_TIMESTAMP(3) on update CURRENT_TIMESTAMP(3) not null"]
        );
    }

    #[test]
    fn test_starting_value() {
        let mut table = Blueprint::new("users");
        table.create();
        table.id().starting_value(1000);
        let statements = table.to_sql(&config(), &MySqlSchemaGrammar::default()).unwrap();
        assert_eq!(statements[1], "alter table `users` auto_increment = 1000");
    }
}
