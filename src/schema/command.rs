//! Commands recorded on a blueprint.

use serde::{Deserialize, Serialize};

/// Kind of an index, also the suffix of generated index names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
    SpatialIndex,
}

impl IndexKind {
    pub const ALL: [IndexKind; 4] = [
        IndexKind::Primary,
        IndexKind::Unique,
        IndexKind::Index,
        IndexKind::SpatialIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Primary => "primary",
            IndexKind::Unique => "unique",
            IndexKind::Index => "index",
            IndexKind::SpatialIndex => "spatialIndex",
        }
    }
}

/// An index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCommand {
    pub kind: IndexKind,
    pub name: String,
    pub columns: Vec<String>,
    /// Index method, e.g. `btree` or `hash`.
    #[serde(default)]
    pub algorithm: Option<String>,
}

/// A foreign key constraint.
///
/// An empty `name` is replaced with the generated index name when the key is
/// added to a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[must_use = "builders have no effect until used"]
pub struct ForeignKey {
    #[serde(default)]
    pub name: String,
    pub columns: Vec<String>,
    pub on: String,
    pub references: Vec<String>,
    #[serde(default)]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub on_update: Option<String>,
    /// Postgres only.
    #[serde(default)]
    pub deferrable: Option<bool>,
    #[serde(default)]
    pub initially_immediate: Option<bool>,
}

impl ForeignKey {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: String::new(),
            columns: columns.into_iter().map(Into::into).collect(),
            on: String::new(),
            references: vec!["id".to_string()],
            on_delete: None,
            on_update: None,
            deferrable: None,
            initially_immediate: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn references<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.references = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn on(mut self, table: impl Into<String>) -> Self {
        self.on = table.into();
        self
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }

    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.on_update = Some(action.into());
        self
    }

    pub fn cascade_on_delete(self) -> Self {
        self.on_delete("cascade")
    }

    pub fn deferrable(mut self, deferrable: bool) -> Self {
        self.deferrable = Some(deferrable);
        self
    }

    pub fn initially_immediate(mut self, immediate: bool) -> Self {
        self.initially_immediate = Some(immediate);
        self
    }
}

/// A schema operation, compiled in order by a schema grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    Create,
    /// Add every non-change column.
    Add,
    /// Modify every change column.
    Change,
    Drop,
    DropIfExists,
    Rename { to: String },
    Index(IndexCommand),
    Foreign(ForeignKey),
    DropColumn { columns: Vec<String> },
    RenameColumn { from: String, to: String },
    DropIndex { kind: IndexKind, name: String },
    DropForeign { name: String },
    RenameIndex { from: String, to: String },
    /// Comment on a single column.
    Comment { column: String, comment: String },
    TableComment { comment: String },
    /// Start an auto-increment column at a given value.
    AutoIncrementStartingValue { column: String, value: u64 },
}

impl Command {
    /// Command name as used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create => "create",
            Command::Add => "add",
            Command::Change => "change",
            Command::Drop => "drop",
            Command::DropIfExists => "dropIfExists",
            Command::Rename { .. } => "rename",
            Command::Index(index) => index.kind.as_str(),
            Command::Foreign(_) => "foreign",
            Command::DropColumn { .. } => "dropColumn",
            Command::RenameColumn { .. } => "renameColumn",
            Command::DropIndex { kind, .. } => match kind {
                IndexKind::Primary => "dropPrimary",
                IndexKind::Unique => "dropUnique",
                IndexKind::Index => "dropIndex",
                IndexKind::SpatialIndex => "dropSpatialIndex",
            },
            Command::DropForeign { .. } => "dropForeign",
            Command::RenameIndex { .. } => "renameIndex",
            Command::Comment { .. } => "comment",
            Command::TableComment { .. } => "tableComment",
            Command::AutoIncrementStartingValue { .. } => "autoIncrementStartingValue",
        }
    }
}
