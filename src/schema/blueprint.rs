//! Blueprints: schema changes for one table, recorded then compiled once.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::column::{ColumnDefinition, ColumnType, IndexMarker};
use super::command::{Command, ForeignKey, IndexCommand, IndexKind};
use super::grammar::SchemaGrammar;
use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::error::{GrammarResult, Result};

/// Recorded schema changes for a single table.
///
/// Columns and commands are collected through the fluent methods, then
/// [`Blueprint::to_sql`] turns them into statements for one dialect.
///
/// ```ignore
/// let mut table = Blueprint::new("users");
/// table.create();
/// table.id();
/// table.string("email", 255).unique();
/// table.timestamps();
/// let statements = table.to_sql(&config, grammar.as_ref())?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub table: String,
    /// Prepended to the table in generated index names.
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub temporary: bool,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(skip)]
    implied: bool,
}

impl Blueprint {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            prefix: String::new(),
            columns: Vec::new(),
            commands: Vec::new(),
            temporary: false,
            engine: None,
            charset: None,
            collation: None,
            implied: false,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    /// Compile every command into SQL statements, in order.
    ///
    /// Implied commands are added the first time this runs; dialect
    /// validation happens before any statement is produced.
    pub fn to_sql(
        &mut self,
        config: &ConnectionConfig,
        grammar: &dyn SchemaGrammar,
    ) -> GrammarResult<Vec<String>> {
        self.add_implied_commands(grammar);
        grammar.validate_commands(self)?;

        let mut statements = Vec::new();
        for command in &self.commands {
            let compiled = grammar.compile_command(self, command, config)?;
            if compiled.is_empty() {
                trace!(command = command.name(), "no compiler for command, skipping");
            }
            statements.extend(compiled);
        }
        Ok(statements)
    }

    /// Compile and execute against a connection.
    pub fn build(&mut self, conn: &dyn Connection) -> Result<()> {
        let grammar = conn.schema_grammar();
        for statement in self.to_sql(conn.config(), grammar.as_ref())? {
            trace!(sql = %statement, table = %self.table, "running schema statement");
            conn.execute(&statement, &[])?;
        }
        Ok(())
    }

    /// Add the commands the columns imply: `add`/`change`, fluent indexes,
    /// then the grammar's fluent commands. Runs once per blueprint.
    pub fn add_implied_commands(&mut self, grammar: &dyn SchemaGrammar) {
        if self.implied {
            return;
        }
        self.implied = true;

        if !self.creating() {
            if !self.added_columns().is_empty() {
                self.commands.insert(0, Command::Add);
            }
            if !self.changed_columns().is_empty() {
                self.commands.insert(0, Command::Change);
            }
        }

        self.add_fluent_indexes();

        let fluent = grammar.fluent_commands(self);
        self.commands.extend(fluent);
    }

    /// Turn column index markers into index commands and clear them.
    fn add_fluent_indexes(&mut self) {
        let mut indexes = Vec::new();
        for column in &mut self.columns {
            for kind in IndexKind::ALL {
                let marker = match kind {
                    IndexKind::Primary => column.primary.take(),
                    IndexKind::Unique => column.unique.take(),
                    IndexKind::Index => column.index.take(),
                    IndexKind::SpatialIndex => column.spatial_index.take(),
                };
                if let Some(marker) = marker {
                    let name = match marker {
                        IndexMarker::Default => None,
                        IndexMarker::Named(name) => Some(name),
                    };
                    indexes.push((kind, column.name.clone(), name));
                }
            }
        }

        for (kind, column, name) in indexes {
            self.push_index(kind, vec![column], name.as_deref(), None);
        }
    }

    /// Whether the blueprint creates its table.
    pub fn creating(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::Create))
    }

    pub fn added_columns(&self) -> Vec<&ColumnDefinition> {
        self.columns.iter().filter(|c| !c.change).collect()
    }

    pub fn changed_columns(&self) -> Vec<&ColumnDefinition> {
        self.columns.iter().filter(|c| c.change).collect()
    }

    /// `prefix + table + _ + columns + _ + kind`, lowercased, with `-` and
    /// `.` replaced by `_`.
    pub fn index_name(&self, kind: &str, columns: &[String]) -> String {
        format!("{}{}_{}_{}", self.prefix, self.table, columns.join("_"), kind)
            .to_lowercase()
            .replace(['-', '.'], "_")
    }

    // =========================================================================
    // Table commands
    // =========================================================================

    pub fn create(&mut self) -> &mut Self {
        self.commands.push(Command::Create);
        self
    }

    /// Create the table as a temporary table.
    pub fn temporary(&mut self) -> &mut Self {
        self.temporary = true;
        self
    }

    pub fn drop(&mut self) -> &mut Self {
        self.commands.push(Command::Drop);
        self
    }

    pub fn drop_if_exists(&mut self) -> &mut Self {
        self.commands.push(Command::DropIfExists);
        self
    }

    pub fn rename(&mut self, to: impl Into<String>) -> &mut Self {
        self.commands.push(Command::Rename { to: to.into() });
        self
    }

    pub fn engine(&mut self, engine: impl Into<String>) -> &mut Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collation(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = Some(collation.into());
        self
    }

    /// Comment on the table itself.
    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.commands.push(Command::TableComment {
            comment: comment.into(),
        });
        self
    }

    // =========================================================================
    // Column commands
    // =========================================================================

    pub fn drop_column<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.commands.push(Command::DropColumn {
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn rename_column(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.commands.push(Command::RenameColumn {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Drop `created_at` and `updated_at`.
    pub fn drop_timestamps(&mut self) -> &mut Self {
        self.drop_column(["created_at", "updated_at"])
    }

    pub fn drop_soft_deletes(&mut self) -> &mut Self {
        self.drop_column(["deleted_at"])
    }

    pub fn drop_remember_token(&mut self) -> &mut Self {
        self.drop_column(["remember_token"])
    }

    // =========================================================================
    // Indexes and keys
    // =========================================================================

    fn push_index(
        &mut self,
        kind: IndexKind,
        columns: Vec<String>,
        name: Option<&str>,
        algorithm: Option<&str>,
    ) {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.index_name(kind.as_str(), &columns),
        };
        self.commands.push(Command::Index(IndexCommand {
            kind,
            name,
            columns,
            algorithm: algorithm.map(str::to_string),
        }));
    }

    fn index_command<S: Into<String>>(
        &mut self,
        kind: IndexKind,
        columns: impl IntoIterator<Item = S>,
        name: Option<&str>,
    ) -> &mut Self {
        let columns = columns.into_iter().map(Into::into).collect();
        self.push_index(kind, columns, name, None);
        self
    }

    pub fn primary<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>, name: Option<&str>) -> &mut Self {
        self.index_command(IndexKind::Primary, columns, name)
    }

    pub fn unique<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>, name: Option<&str>) -> &mut Self {
        self.index_command(IndexKind::Unique, columns, name)
    }

    pub fn index<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>, name: Option<&str>) -> &mut Self {
        self.index_command(IndexKind::Index, columns, name)
    }

    /// Plain index using a specific method, e.g. `hash`.
    pub fn index_using<S: Into<String>>(
        &mut self,
        columns: impl IntoIterator<Item = S>,
        algorithm: &str,
    ) -> &mut Self {
        let columns = columns.into_iter().map(Into::into).collect();
        self.push_index(IndexKind::Index, columns, None, Some(algorithm));
        self
    }

    pub fn spatial_index<S: Into<String>>(
        &mut self,
        columns: impl IntoIterator<Item = S>,
        name: Option<&str>,
    ) -> &mut Self {
        self.index_command(IndexKind::SpatialIndex, columns, name)
    }

    /// Add a foreign key; an unnamed key gets the generated name.
    pub fn foreign(&mut self, mut key: ForeignKey) -> &mut Self {
        if key.name.is_empty() {
            key.name = self.index_name("foreign", &key.columns);
        }
        self.commands.push(Command::Foreign(key));
        self
    }

    fn drop_index_command(&mut self, kind: IndexKind, name: String) -> &mut Self {
        self.commands.push(Command::DropIndex { kind, name });
        self
    }

    /// Drop the primary key; without a name the generated one is used.
    pub fn drop_primary(&mut self, name: Option<&str>) -> &mut Self {
        let name = name.map_or_else(|| self.index_name("primary", &[]), str::to_string);
        self.drop_index_command(IndexKind::Primary, name)
    }

    pub fn drop_unique(&mut self, name: &str) -> &mut Self {
        self.drop_index_command(IndexKind::Unique, name.to_string())
    }

    pub fn drop_index(&mut self, name: &str) -> &mut Self {
        self.drop_index_command(IndexKind::Index, name.to_string())
    }

    pub fn drop_spatial_index(&mut self, name: &str) -> &mut Self {
        self.drop_index_command(IndexKind::SpatialIndex, name.to_string())
    }

    /// Drop the index of `kind` over `columns` by its generated name.
    pub fn drop_index_on<S: Into<String>>(
        &mut self,
        kind: IndexKind,
        columns: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let name = self.index_name(kind.as_str(), &columns);
        self.drop_index_command(kind, name)
    }

    pub fn drop_foreign(&mut self, name: &str) -> &mut Self {
        self.commands.push(Command::DropForeign {
            name: name.to_string(),
        });
        self
    }

    pub fn rename_index(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.commands.push(Command::RenameIndex {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Add a column of any type.
    pub fn add_column(&mut self, name: &str, kind: ColumnType) -> &mut ColumnDefinition {
        self.columns.push(ColumnDefinition::new(name, kind));
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Auto-incrementing unsigned big integer `id`.
    pub fn id(&mut self) -> &mut ColumnDefinition {
        self.big_increments("id")
    }

    pub fn increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Integer).unsigned().auto_increment()
    }

    pub fn tiny_increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TinyInteger).unsigned().auto_increment()
    }

    pub fn small_increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::SmallInteger).unsigned().auto_increment()
    }

    pub fn medium_increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MediumInteger).unsigned().auto_increment()
    }

    pub fn big_increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::BigInteger).unsigned().auto_increment()
    }

    pub fn char(&mut self, name: &str, length: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Char { length })
    }

    pub fn string(&mut self, name: &str, length: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::String { length })
    }

    pub fn tiny_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TinyText)
    }

    pub fn text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Text)
    }

    pub fn medium_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MediumText)
    }

    pub fn long_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::LongText)
    }

    pub fn tiny_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TinyInteger)
    }

    pub fn small_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::SmallInteger)
    }

    pub fn medium_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MediumInteger)
    }

    pub fn integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Integer)
    }

    pub fn big_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::BigInteger)
    }

    pub fn unsigned_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.integer(name).unsigned()
    }

    pub fn unsigned_big_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.big_integer(name).unsigned()
    }

    /// Unsigned big integer meant to reference another table's `id`.
    pub fn foreign_id(&mut self, name: &str) -> &mut ColumnDefinition {
        self.unsigned_big_integer(name)
    }

    pub fn float(&mut self, name: &str, total: u32, places: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Float { total, places })
    }

    pub fn double(&mut self, name: &str, total: Option<u32>, places: Option<u32>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Double { total, places })
    }

    pub fn decimal(&mut self, name: &str, total: u32, places: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Decimal { total, places })
    }

    pub fn boolean(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Boolean)
    }

    pub fn enumeration<S: Into<String>>(
        &mut self,
        name: &str,
        allowed: impl IntoIterator<Item = S>,
    ) -> &mut ColumnDefinition {
        let allowed = allowed.into_iter().map(Into::into).collect();
        self.add_column(name, ColumnType::Enum { allowed })
    }

    pub fn set<S: Into<String>>(&mut self, name: &str, allowed: impl IntoIterator<Item = S>) -> &mut ColumnDefinition {
        let allowed = allowed.into_iter().map(Into::into).collect();
        self.add_column(name, ColumnType::Set { allowed })
    }

    pub fn json(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Json)
    }

    pub fn jsonb(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Jsonb)
    }

    pub fn date(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Date)
    }

    pub fn date_time(&mut self, name: &str, precision: Option<u32>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::DateTime { precision })
    }

    pub fn date_time_tz(&mut self, name: &str, precision: Option<u32>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::DateTimeTz { precision })
    }

    pub fn time(&mut self, name: &str, precision: Option<u32>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Time { precision })
    }

    pub fn time_tz(&mut self, name: &str, precision: Option<u32>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TimeTz { precision })
    }

    pub fn timestamp(&mut self, name: &str, precision: Option<u32>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Timestamp { precision })
    }

    pub fn timestamp_tz(&mut self, name: &str, precision: Option<u32>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TimestampTz { precision })
    }

    /// Nullable `created_at` and `updated_at`.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at", None).nullable();
        self.timestamp("updated_at", None).nullable();
    }

    pub fn timestamps_tz(&mut self) {
        self.timestamp_tz("created_at", None).nullable();
        self.timestamp_tz("updated_at", None).nullable();
    }

    /// Nullable `deleted_at`.
    pub fn soft_deletes(&mut self) -> &mut ColumnDefinition {
        self.timestamp("deleted_at", None).nullable()
    }

    pub fn soft_deletes_tz(&mut self) -> &mut ColumnDefinition {
        self.timestamp_tz("deleted_at", None).nullable()
    }

    pub fn year(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Year)
    }

    pub fn binary(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Binary)
    }

    pub fn uuid(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Uuid)
    }

    pub fn ip_address(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::IpAddress)
    }

    pub fn mac_address(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MacAddress)
    }

    /// Nullable `remember_token` string of 100 characters.
    pub fn remember_token(&mut self) -> &mut ColumnDefinition {
        self.string("remember_token", 100).nullable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::grammar::{MySqlSchemaGrammar, PostgresSchemaGrammar};

    #[test]
    fn test_index_name() {
        let table = Blueprint::new("users").with_prefix("Pre-");
        assert_eq!(
            table.index_name("unique", &["email".into(), "org.id".into()]),
            "pre_users_email_org_id_unique"
        );
    }

    #[test]
    fn test_implied_add_goes_first() {
        let mut table = Blueprint::new("users");
        table.string("foo", 255);
        table.string("bar", 255);
        table.index(["foo"], None);
        table.add_implied_commands(&MySqlSchemaGrammar::default());
        assert_eq!(table.commands[0], Command::Add);
        assert_eq!(table.commands.len(), 2);
    }

    #[test]
    fn test_change_is_unshifted_before_add() {
        let mut table = Blueprint::new("users");
        table.string("name", 100).change();
        table.integer("age");
        table.add_implied_commands(&MySqlSchemaGrammar::default());
        assert_eq!(table.commands[..2], [Command::Change, Command::Add]);
    }

    #[test]
    fn test_create_suppresses_implied_add() {
        let mut table = Blueprint::new("users");
        table.create();
        table.id();
        table.add_implied_commands(&MySqlSchemaGrammar::default());
        assert_eq!(table.commands, vec![Command::Create]);
    }

    #[test]
    fn test_fluent_indexes_expand_and_clear() {
        let mut table = Blueprint::new("users");
        table.create();
        table.string("email", 255).unique();
        table.string("slug", 255).index_named("by_slug");
        table.add_implied_commands(&MySqlSchemaGrammar::default());

        let names: Vec<&str> = table
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::Index(index) => Some(index.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["users_email_unique", "by_slug"]);
        assert!(table.columns.iter().all(|c| c.unique.is_none() && c.index.is_none()));
    }

    #[test]
    fn test_implied_commands_run_once() {
        let mut table = Blueprint::new("users");
        table.string("foo", 255).comment("first");
        let grammar = PostgresSchemaGrammar::default();
        table.add_implied_commands(&grammar);
        table.add_implied_commands(&grammar);
        assert_eq!(table.commands.len(), 2);
    }

    #[test]
    fn test_foreign_key_gets_generated_name() {
        let mut table = Blueprint::new("posts");
        table.foreign(ForeignKey::new(["user_id"]).on("users"));
        match &table.commands[0] {
            Command::Foreign(key) => assert_eq!(key.name, "posts_user_id_foreign"),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
