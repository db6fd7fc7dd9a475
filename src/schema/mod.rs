//! Schema building: blueprints, column definitions and schema grammars.
//!
//! A [`Blueprint`] records the changes for one table. Compiling it adds the
//! commands its columns imply, validates them for the dialect and produces
//! one or more DDL statements per command. [`SchemaBuilder`] wraps the
//! compile-then-execute cycle for a connection.

pub mod blueprint;
pub mod builder;
pub mod column;
pub mod command;
pub mod grammar;

pub use blueprint::Blueprint;
pub use builder::SchemaBuilder;
pub use column::{ColumnDefinition, ColumnType, IndexMarker};
pub use command::{Command, ForeignKey, IndexCommand, IndexKind};
pub use grammar::{
    MySqlSchemaGrammar, PostgresSchemaGrammar, SchemaGrammar, SqlServerSchemaGrammar,
    SqliteSchemaGrammar,
};
