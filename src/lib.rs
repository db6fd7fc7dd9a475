//! # Quill
//!
//! A multi-dialect SQL query and schema grammar compiler.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │  Query (fluent builder)  │   │  Blueprint (table DDL)   │
//! └──────────────────────────┘   └──────────────────────────┘
//!              │                              │
//!              ▼ [QueryGrammar]               ▼ [SchemaGrammar]
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │ CompiledQuery            │   │ Vec<String>              │
//! │ (sql + ordered bindings) │   │ (ordered statements)     │
//! └──────────────────────────┘   └──────────────────────────┘
//!              │                              │
//!              └──────────────┬───────────────┘
//!                             ▼ [Connection]
//!                   MySQL · Postgres · SQLite · SQL Server
//! ```
//!
//! Grammars are pure: compiling never touches a connection and never
//! mutates its input. Only [`connection::Connection`] runs statements.

pub mod config;
pub mod connection;
pub mod error;
pub mod schema;
pub mod sql;

pub use error::{Error, GrammarError, GrammarResult, Result};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{ConnectionConfig, Driver, Settings};
    pub use crate::connection::{Connection, PretendConnection, SqliteConnection};
    pub use crate::error::{Error, GrammarError, GrammarResult, Result};
    pub use crate::schema::{
        Blueprint, ColumnDefinition, ColumnType, ForeignKey, SchemaBuilder, SchemaGrammar,
    };
    pub use crate::sql::{
        raw, record, Boolean, CompiledQuery, Conditions, Dialect, Direction, JoinClause, Lock,
        Operand, Query, QueryGrammar, Record, Row, UpsertColumn, Value,
    };
}
